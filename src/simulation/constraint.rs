//! Holonomic constraints `f(q1, q2) = 0` from user expressions
//!
//! A constraint is compiled once per configuration into a small expression
//! tree and interpreted on every evaluation. There is no code execution path:
//! the language only knows numbers, `q1`, `q2`, a fixed set of constants and
//! functions, and arithmetic.
//!
//! Compilation fails closed. [`Constraint::compile`] turns any error into
//! [`Constraint::Unconstrained`] and logs a warning. Whether a constraint is
//! active is decided by the variant tag, never by evaluating `f(q) == 0`.
//!
//! Grammar:
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/' | '%') unary)*
//! unary := ('+' | '-') unary | power
//! power := atom (('^' | '**') unary)?
//! atom  := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! A leading `Math.` on identifiers is accepted and ignored.
//!
//! Nesting is capped at [`MAX_DEPTH`] and length at [`MAX_TOKENS`], which
//! bounds the recursion of parsing, evaluation and drop alike.

use std::fmt;

use tracing::warn;

use super::error::ConstraintError;
use super::states::NVec2;

/// Deepest accepted nesting of parentheses, calls and unary signs
pub const MAX_DEPTH: usize = 256;

/// Longest accepted expression, in tokens
pub const MAX_TOKENS: usize = 2048;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::Caret => f.write_str("^"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, ConstraintError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent part: e / E, optional sign, digits
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ConstraintError::InvalidNumber(text.clone()))?;
                out.push((Token::Num(n), start));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let name = text.strip_prefix("Math.").unwrap_or(&text).to_string();
                out.push((Token::Ident(name), start));
                continue;
            }
            '+' => out.push((Token::Plus, start)),
            '-' => out.push((Token::Minus, start)),
            '*' => {
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                    out.push((Token::Caret, start));
                } else {
                    out.push((Token::Star, start));
                }
            }
            '/' => out.push((Token::Slash, start)),
            '%' => out.push((Token::Percent, start)),
            '^' => out.push((Token::Caret, start)),
            '(' => out.push((Token::LParen, start)),
            ')' => out.push((Token::RParen, start)),
            ',' => out.push((Token::Comma, start)),
            ch => return Err(ConstraintError::UnexpectedChar { ch, pos: start }),
        }
        i += 1;
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func1 {
    Sin, Cos, Tan, Asin, Acos, Atan, Sinh, Cosh, Tanh,
    Sqrt, Cbrt, Exp, Ln, Log10, Log2, Abs, Sign, Floor, Ceil,
}

impl Func1 {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "sqrt" => Self::Sqrt,
            "cbrt" => Self::Cbrt,
            "exp" => Self::Exp,
            "ln" | "log" => Self::Ln,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "abs" => Self::Abs,
            "sign" => Self::Sign,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            _ => return None,
        })
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Sqrt => x.sqrt(),
            Self::Cbrt => x.cbrt(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Log10 => x.log10(),
            Self::Log2 => x.log2(),
            Self::Abs => x.abs(),
            Self::Sign => {
                if x == 0.0 || x.is_nan() { x } else { x.signum() }
            }
            Self::Floor => x.floor(),
            Self::Ceil => x.ceil(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func2 {
    Atan2, Pow, Hypot, Min, Max,
}

impl Func2 {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "atan2" => Self::Atan2,
            "pow" => Self::Pow,
            "hypot" => Self::Hypot,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        })
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Atan2 => a.atan2(b),
            Self::Pow => a.powf(b),
            Self::Hypot => a.hypot(b),
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add, Sub, Mul, Div, Rem, Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Const(f64),
    Q1,
    Q2,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call1(Func1, Box<Expr>),
    Call2(Func2, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, q1: f64, q2: f64) -> f64 {
        match self {
            Expr::Const(c) => *c,
            Expr::Q1 => q1,
            Expr::Q2 => q2,
            Expr::Neg(e) => -e.eval(q1, q2),
            Expr::Binary(op, a, b) => {
                let (a, b) = (a.eval(q1, q2), b.eval(q1, q2));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Rem => a % b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call1(f, a) => f.apply(a.eval(q1, q2)),
            Expr::Call2(f, a, b) => f.apply(a.eval(q1, q2), b.eval(q1, q2)),
        }
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        t
    }

    fn unexpected(&self) -> ConstraintError {
        match self.tokens.get(self.pos) {
            Some((t, at)) => ConstraintError::UnexpectedToken {
                found: t.to_string(),
                pos: *at,
            },
            None => ConstraintError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, want: Token) -> Result<(), ConstraintError> {
        if self.peek() == Some(&want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Run `f` one nesting level down
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ConstraintError>,
    ) -> Result<T, ConstraintError> {
        if self.depth >= MAX_DEPTH {
            return Err(ConstraintError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn expr(&mut self) -> Result<Expr, ConstraintError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, ConstraintError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, ConstraintError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let e = self.nested(Self::unary)?;
                Ok(Expr::Neg(Box::new(e)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ConstraintError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exp = self.nested(Self::unary)?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ConstraintError> {
        let err = self.unexpected();
        match self.next() {
            Some(Token::Num(n)) => Ok(Expr::Const(n)),
            Some(Token::LParen) => self.nested(|p| {
                let e = p.expr()?;
                p.expect(Token::RParen)?;
                Ok(e)
            }),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.nested(|p| p.call(name))
                } else {
                    self.variable(&name)
                }
            }
            _ => Err(err),
        }
    }

    fn variable(&self, name: &str) -> Result<Expr, ConstraintError> {
        match name {
            "q1" => Ok(Expr::Q1),
            "q2" => Ok(Expr::Q2),
            "pi" | "PI" => Ok(Expr::Const(std::f64::consts::PI)),
            "e" | "E" => Ok(Expr::Const(std::f64::consts::E)),
            _ => Err(ConstraintError::UnknownIdentifier(name.to_string())),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, ConstraintError> {
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            args.push(self.expr()?);
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                args.push(self.expr()?);
            }
        }
        self.expect(Token::RParen)?;

        let arity = |expected: usize, found: usize| ConstraintError::Arity {
            name: name.clone(),
            expected,
            found,
        };
        if let Some(f) = Func1::lookup(&name) {
            let found = args.len();
            let mut it = args.into_iter();
            return match (it.next(), it.next()) {
                (Some(a), None) => Ok(Expr::Call1(f, Box::new(a))),
                _ => Err(arity(1, found)),
            };
        }
        if let Some(f) = Func2::lookup(&name) {
            let found = args.len();
            let mut it = args.into_iter();
            return match (it.next(), it.next(), it.next()) {
                (Some(a), Some(b), None) => Ok(Expr::Call2(f, Box::new(a), Box::new(b))),
                _ => Err(arity(2, found)),
            };
        }
        Err(ConstraintError::UnknownFunction(name))
    }
}

/// Compiled expression with the source it came from
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    source: String,
    root: Expr,
}

impl CompiledExpr {
    pub fn parse(src: &str) -> Result<Self, ConstraintError> {
        let tokens = tokenize(src)?;
        if tokens.len() > MAX_TOKENS {
            return Err(ConstraintError::TooLong {
                tokens: tokens.len(),
                limit: MAX_TOKENS,
            });
        }
        let mut parser = Parser { tokens, pos: 0, depth: 0 };
        let root = parser.expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.unexpected());
        }
        Ok(Self {
            source: src.trim().to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, q1: f64, q2: f64) -> f64 {
        self.root.eval(q1, q2)
    }
}

/// Scalar constraint on the coordinates
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Constraint {
    /// Canonical zero function
    #[default]
    Unconstrained,
    Expression(CompiledExpr),
}

impl Constraint {
    /// Compile `src`, failing closed to [`Constraint::Unconstrained`].
    /// Absent or blank input is unconstrained without a warning.
    pub fn compile(src: Option<&str>) -> Self {
        let Some(src) = src.filter(|s| !s.trim().is_empty()) else {
            return Constraint::Unconstrained;
        };
        match Self::try_compile(src) {
            Ok(c) => c,
            Err(err) => {
                warn!(expression = src, error = %err, "constraint rejected, running unconstrained");
                Constraint::Unconstrained
            }
        }
    }

    pub fn try_compile(src: &str) -> Result<Self, ConstraintError> {
        CompiledExpr::parse(src).map(Constraint::Expression)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Constraint::Expression(_))
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Constraint::Unconstrained => None,
            Constraint::Expression(e) => Some(e.source()),
        }
    }

    pub fn eval(&self, q: NVec2) -> f64 {
        match self {
            Constraint::Unconstrained => 0.0,
            Constraint::Expression(e) => e.eval(q.x, q.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn eval(src: &str, q1: f64, q2: f64) -> f64 {
        CompiledExpr::parse(src).unwrap().eval(q1, q2)
    }

    #[test]
    fn precedence_and_associativity() {
        assert_abs_diff_eq!(eval("1 + 2 * 3", 0.0, 0.0), 7.0);
        assert_abs_diff_eq!(eval("(1 + 2) * 3", 0.0, 0.0), 9.0);
        assert_abs_diff_eq!(eval("2 ^ 3 ^ 2", 0.0, 0.0), 512.0);
        assert_abs_diff_eq!(eval("2 ** 3", 0.0, 0.0), 8.0);
        assert_abs_diff_eq!(eval("-2 ^ 2", 0.0, 0.0), -4.0);
        assert_abs_diff_eq!(eval("10 - 4 - 3", 0.0, 0.0), 3.0);
        assert_abs_diff_eq!(eval("7 % 4", 0.0, 0.0), 3.0);
        assert_abs_diff_eq!(eval("1.5e2 + 2E-1", 0.0, 0.0), 150.2);
    }

    #[test]
    fn variables_constants_and_functions() {
        assert_abs_diff_eq!(eval("q1 - q2", 3.0, 1.0), 2.0);
        assert_abs_diff_eq!(eval("q1^2 + q2^2 - 1", 0.6, 0.8), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(eval("Math.cos(q1) + Math.PI", 0.0, 0.0), 1.0 + std::f64::consts::PI);
        assert_abs_diff_eq!(eval("hypot(q1, q2)", 3.0, 4.0), 5.0);
        assert_abs_diff_eq!(eval("pow(q2, 3) + atan2(0, 1)", 0.0, 2.0), 8.0);
        assert_abs_diff_eq!(eval("log(e)", 0.0, 0.0), 1.0);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert_eq!(CompiledExpr::parse("q1 +"), Err(ConstraintError::UnexpectedEnd));
        assert!(matches!(CompiledExpr::parse("q1 $ q2"), Err(ConstraintError::UnexpectedChar { ch: '$', .. })));
        assert!(matches!(CompiledExpr::parse("q3"), Err(ConstraintError::UnknownIdentifier(_))));
        assert!(matches!(CompiledExpr::parse("frob(q1)"), Err(ConstraintError::UnknownFunction(_))));
        assert!(matches!(CompiledExpr::parse("sin(q1, q2)"), Err(ConstraintError::Arity { expected: 1, found: 2, .. })));
        assert!(matches!(CompiledExpr::parse("(q1"), Err(ConstraintError::UnexpectedEnd)));
        assert!(matches!(CompiledExpr::parse("q1 q2"), Err(ConstraintError::UnexpectedToken { .. })));
        assert!(matches!(CompiledExpr::parse("1..2"), Err(ConstraintError::InvalidNumber(_))));
    }

    #[test]
    fn compile_fails_closed() {
        let c = Constraint::compile(Some("q1 +"));
        assert_eq!(c, Constraint::Unconstrained);
        assert!(!c.is_active());
        assert_eq!(c.eval(NVec2::new(1.0, 2.0)), 0.0);

        assert!(!Constraint::compile(None).is_active());
        assert!(!Constraint::compile(Some("   ")).is_active());
    }

    #[test]
    fn deep_nesting_is_rejected_not_a_crash() {
        let huge = "(".repeat(200_000) + "q1" + &")".repeat(200_000);
        assert!(CompiledExpr::parse(&huge).is_err());
        assert_eq!(Constraint::compile(Some(&huge)), Constraint::Unconstrained);

        let deep = "(".repeat(1000) + "q1" + &")".repeat(1000);
        assert_eq!(CompiledExpr::parse(&deep), Err(ConstraintError::TooDeep { limit: MAX_DEPTH }));
        assert_eq!(Constraint::compile(Some(&deep)), Constraint::Unconstrained);

        let signs = "-".repeat(1000) + "q1";
        assert_eq!(CompiledExpr::parse(&signs), Err(ConstraintError::TooDeep { limit: MAX_DEPTH }));

        let powers = vec!["q1"; 1000].join("^");
        assert_eq!(CompiledExpr::parse(&powers), Err(ConstraintError::TooDeep { limit: MAX_DEPTH }));

        let calls = "sin(".repeat(MAX_DEPTH + 1) + "q1" + &")".repeat(MAX_DEPTH + 1);
        assert!(matches!(CompiledExpr::parse(&calls), Err(ConstraintError::TooDeep { .. })));

        let shallow = "(".repeat(100) + "q1" + &")".repeat(100);
        assert_abs_diff_eq!(eval(&shallow, 0.25, 0.0), 0.25);
    }

    #[test]
    fn long_flat_chains_are_rejected() {
        let chain = vec!["q1"; 100_000].join(" + ");
        assert!(matches!(CompiledExpr::parse(&chain), Err(ConstraintError::TooLong { .. })));
        assert!(!Constraint::compile(Some(&chain)).is_active());

        let ok = vec!["q1"; 500].join(" + ");
        assert_abs_diff_eq!(eval(&ok, 1.0, 0.0), 500.0);
    }

    #[test]
    fn constraint_through_origin_is_still_active() {
        let c = Constraint::compile(Some("q1 - q2"));
        assert!(c.is_active());
        assert_eq!(c.eval(NVec2::zeros()), 0.0);
        assert_eq!(c.source(), Some("q1 - q2"));
    }
}
