use crate::{SessionEpoch, Source, SourceId, SourceStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Schedule one staggered start trigger per source, in registry order.
    BeginSession {
        epoch: SessionEpoch,
        sources: Vec<SourceId>,
    },
    /// Cancel pending triggers and every running simulator.
    EndSession { epoch: SessionEpoch },
    StartSimulator {
        epoch: SessionEpoch,
        source_id: SourceId,
    },
    SourceSettled {
        epoch: SessionEpoch,
        source_id: SourceId,
        status: SourceStatus,
    },
    /// Forward a row activation to the host's click handler.
    NotifySourceSelected { source: Source },
}
