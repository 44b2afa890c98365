//! Explorer engine: timers, progress simulation and effect execution.
mod config;
mod orchestrator;
mod random;
mod schedule;
mod simulator;

pub use config::{ConfigError, OrchestratorConfig, TickCadence};
pub use orchestrator::{Orchestrator, OrchestratorEvent, SourceClickHandler};
pub use random::{RandomSource, SeededRandom};
pub use schedule::ScheduleManager;
pub use simulator::{ProgressSimulator, SimulatorHandle, SourceTick, TickReply, TickSink};
