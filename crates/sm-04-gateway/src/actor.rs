//! The engine actor.
//!
//! The engine client is single-threaded and non-reentrant, so one dedicated
//! worker thread owns it for its whole life. Every call enters through a
//! command channel and runs on that thread; results travel back over
//! per-request oneshot channels.

use crate::error::GatewayError;
use crate::ports::ChatEngine;
use shared_types::{EngineObject, EngineRequest, EngineResult};
use tokio::sync::oneshot;
use tracing::{debug, trace};

enum Command {
    /// Blocking execute path.
    Execute(EngineRequest, oneshot::Sender<EngineResult<EngineObject>>),
    /// Callback-based send path; the reply fires whenever the engine is done.
    Send(EngineRequest, oneshot::Sender<EngineResult<EngineObject>>),
    /// Fire-and-forget send; the result is dropped.
    SendAndForget(EngineRequest),
}

/// Handle to the engine worker. Cloneable; dropping every handle stops the
/// worker once its queue drains.
#[derive(Clone)]
pub struct EngineHandle {
    commands: std::sync::mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Spawn the worker thread that owns `engine` and drain commands on it.
    pub fn spawn(engine: Box<dyn ChatEngine>) -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<Command>();
        std::thread::Builder::new()
            .name("engine-worker".into())
            .spawn(move || run(engine, rx))
            .ok();
        Self { commands: tx }
    }

    /// Dispatch one request, selecting the blocking execute path when
    /// `execute_directly` is set.
    pub async fn dispatch(
        &self,
        request: EngineRequest,
        execute_directly: bool,
    ) -> Result<EngineResult<EngineObject>, GatewayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = if execute_directly {
            Command::Execute(request, reply_tx)
        } else {
            Command::Send(request, reply_tx)
        };
        self.commands
            .send(command)
            .map_err(|_| GatewayError::ChannelClosed)?;
        reply_rx.await.map_err(|_| GatewayError::ChannelClosed)
    }

    /// Dispatch a request whose result nobody waits for.
    pub fn dispatch_and_forget(&self, request: EngineRequest) {
        let _ = self.commands.send(Command::SendAndForget(request));
    }
}

fn run(mut engine: Box<dyn ChatEngine>, commands: std::sync::mpsc::Receiver<Command>) {
    debug!("Engine worker started");
    while let Ok(command) = commands.recv() {
        match command {
            Command::Execute(request, reply) => {
                trace!("Engine execute");
                let _ = reply.send(engine.execute(&request));
            }
            Command::Send(request, reply) => {
                trace!("Engine send");
                engine.send(
                    &request,
                    Box::new(move |result| {
                        let _ = reply.send(result);
                    }),
                );
            }
            Command::SendAndForget(request) => {
                engine.send(&request, Box::new(|_| {}));
            }
        }
    }
    debug!("Engine worker stopped");
}
