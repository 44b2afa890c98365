//! Explorer core: pure search-session state machine and view-model helpers.
mod effect;
mod msg;
mod progress;
mod source;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use progress::{ProgressState, SourceStatus, COMPLETE_INFO, ERROR_INFO, PROGRESS_COMPLETE};
pub use source::{RegistryError, Source, SourceCategory, SourceId, SourceRegistry};
pub use state::{ProgressSnapshot, SearchState, SessionEpoch, DEFAULT_FAILURE_PROBABILITY};
pub use update::update;
pub use view_model::{PanelViewModel, SourceRowView};
