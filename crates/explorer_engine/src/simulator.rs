use std::sync::Arc;
use std::time::Duration;

use explorer_core::{Msg, SessionEpoch, SourceId};
use explorer_logging::explorer_trace;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::TickCadence;
use crate::RandomSource;

/// One progress step produced by a simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTick {
    pub epoch: SessionEpoch,
    pub source_id: SourceId,
    pub increment: f64,
    pub failure_roll: f64,
}

impl From<SourceTick> for Msg {
    fn from(tick: SourceTick) -> Self {
        Msg::SourceTick {
            epoch: tick.epoch,
            source_id: tick.source_id,
            increment: tick.increment,
            failure_roll: tick.failure_roll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReply {
    Continue,
    Stop,
}

/// Receiver for simulator ticks; the reply decides whether ticking goes on.
pub trait TickSink: Send + Sync {
    fn deliver(&self, tick: SourceTick) -> TickReply;
}

/// Drives one source's progress on its own randomized cadence.
pub struct ProgressSimulator {
    epoch: SessionEpoch,
    source_id: SourceId,
    cadence: TickCadence,
    random: Box<dyn RandomSource>,
}

impl ProgressSimulator {
    pub fn new(
        epoch: SessionEpoch,
        source_id: SourceId,
        cadence: TickCadence,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            epoch,
            source_id,
            cadence,
            random,
        }
    }

    pub fn spawn(
        self,
        runtime: &Handle,
        tracker: &TaskTracker,
        sink: Arc<dyn TickSink>,
        token: CancellationToken,
    ) -> SimulatorHandle {
        let epoch = self.epoch;
        let source_id = self.source_id.clone();
        let task = tracker.spawn_on(self.run(sink, token.clone()), runtime);
        SimulatorHandle {
            epoch,
            source_id,
            token,
            task,
        }
    }

    /// Ticks until the sink says stop or the token is cancelled.
    pub async fn run(mut self, sink: Arc<dyn TickSink>, token: CancellationToken) {
        loop {
            let delay = self.next_delay();
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
            if token.is_cancelled() {
                break;
            }

            let tick = SourceTick {
                epoch: self.epoch,
                source_id: self.source_id.clone(),
                increment: self.random.range(0.0, self.cadence.max_increment),
                failure_roll: self.random.unit(),
            };
            if sink.deliver(tick) == TickReply::Stop {
                break;
            }
        }
        explorer_trace!(
            "Simulator for {} stopped (session {})",
            self.source_id,
            self.epoch
        );
    }

    fn next_delay(&mut self) -> Duration {
        let seconds = self.random.range(
            self.cadence.min.as_secs_f64(),
            self.cadence.max.as_secs_f64(),
        );
        Duration::from_secs_f64(seconds.max(0.0))
    }
}

/// Cancellable handle to a running simulator, tagged with its session epoch.
#[derive(Debug)]
pub struct SimulatorHandle {
    epoch: SessionEpoch,
    source_id: SourceId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn cancel(&self) {
        self.token.cancel();
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
