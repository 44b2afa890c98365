use serde::Serialize;

use crate::{SessionEpoch, SourceCategory, SourceId, SourceStatus};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PanelViewModel {
    pub searching: bool,
    pub epoch: SessionEpoch,
    pub rows: Vec<SourceRowView>,
    pub completed: usize,
    pub failed: usize,
    pub in_flight: usize,
    #[serde(skip)]
    pub dirty: bool,
}

impl PanelViewModel {
    /// Sources that reached a terminal state this session.
    pub fn settled(&self) -> usize {
        self.completed + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRowView {
    pub id: SourceId,
    pub name: String,
    pub category: SourceCategory,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}
