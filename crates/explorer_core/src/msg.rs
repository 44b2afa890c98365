use crate::{SessionEpoch, SourceId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// External search controller reported whether a search is in progress.
    SearchingChanged(bool),
    /// Staggered start trigger fired for a source.
    SourceTriggered {
        epoch: SessionEpoch,
        source_id: SourceId,
    },
    /// One simulator tick for a source.
    ///
    /// `failure_roll` is a uniform draw in `[0, 1)`; it only matters on the
    /// tick that carries the source to completion.
    SourceTick {
        epoch: SessionEpoch,
        source_id: SourceId,
        increment: f64,
        failure_roll: f64,
    },
    /// User activated a source row.
    SourceSelected(SourceId),
    /// Fallback for placeholder wiring.
    NoOp,
}
