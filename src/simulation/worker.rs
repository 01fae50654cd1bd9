//! Dedicated integration thread
//!
//! The worker owns an [`Engine`] and answers [`StepRequest`]s over crossbeam
//! channels; nothing is shared with the caller. Every reply is stamped with
//! the configuration generation and the request id. Reconfiguring bumps the
//! generation, and [`SimulationWorker::latest`] drops replies that belong to
//! an older generation or were superseded by a newer request. In-flight
//! batches are never interrupted, only ignored.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, warn};

use super::engine::{Configuration, Engine};
use super::orchestrator::{run_batch, StepRequest, StepResponse};

enum Command {
    Configure { generation: u64, config: Box<Configuration> },
    Advance { generation: u64, id: u64, request: StepRequest },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReply {
    pub generation: u64,
    pub id: u64,
    pub response: StepResponse,
}

pub struct SimulationWorker {
    commands: Sender<Command>,
    replies: Receiver<WorkerReply>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
    next_id: u64,
}

impl SimulationWorker {
    pub fn spawn(config: Configuration) -> Self {
        let (commands, command_rx) = channel::unbounded::<Command>();
        let (reply_tx, replies) = channel::unbounded::<WorkerReply>();

        let handle = thread::spawn(move || {
            let mut engine = Engine::new(config);
            let mut generation = 0u64;

            for command in command_rx.iter() {
                match command {
                    Command::Configure { generation: g, config } => {
                        engine = Engine::new(*config);
                        generation = g;
                    }
                    Command::Advance { generation: g, id, request } => {
                        if g != generation {
                            continue; // queued before the last reconfigure
                        }
                        let response = run_batch(&engine, &request);
                        if reply_tx.send(WorkerReply { generation, id, response }).is_err() {
                            break;
                        }
                    }
                    Command::Shutdown => break,
                }
            }
            debug!("simulation worker stopped");
        });

        Self {
            commands,
            replies,
            handle: Some(handle),
            generation: 0,
            next_id: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Swap the configuration. Replies to earlier requests become stale.
    pub fn configure(&mut self, config: Configuration) {
        self.generation += 1;
        let command = Command::Configure {
            generation: self.generation,
            config: Box::new(config),
        };
        if self.commands.send(command).is_err() {
            warn!(generation = self.generation, "simulation worker is gone, configuration dropped");
        }
    }

    /// Queue a batch; returns its id
    pub fn submit(&mut self, request: StepRequest) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let command = Command::Advance {
            generation: self.generation,
            id,
            request,
        };
        if self.commands.send(command).is_err() {
            warn!(id, "simulation worker is gone, batch dropped");
        }
        id
    }

    /// Block until the reply for `id` arrives, skipping any others
    pub fn wait_for(&self, id: u64) -> Option<StepResponse> {
        for reply in self.replies.iter() {
            if reply.generation == self.generation && reply.id == id {
                return Some(reply.response);
            }
        }
        None
    }

    /// Drain pending replies and keep the newest current one
    pub fn latest(&self) -> Option<WorkerReply> {
        let mut best: Option<WorkerReply> = None;
        for reply in self.replies.try_iter() {
            if reply.generation != self.generation {
                continue;
            }
            if best.as_ref().map_or(true, |b| reply.id > b.id) {
                best = Some(reply);
            }
        }
        best
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::StateVector;

    #[test]
    fn stopped_worker_answers_nothing() {
        let mut worker = SimulationWorker::spawn(Configuration::default());
        worker.stop();

        worker.configure(Configuration::default());
        let id = worker.submit(StepRequest {
            initial_state: StateVector { q: [0.0, 0.0], v: [1.0, 0.0] },
            dt: 0.01,
            step_count: 3,
            log_interval: 0,
            reference_energy: None,
            first_step_index: 0,
        });
        assert_eq!(id, 1);
        assert_eq!(worker.generation(), 1);
        assert!(worker.wait_for(id).is_none());
        assert!(worker.latest().is_none());
    }
}
