use explorer_logging::{explorer_debug, explorer_trace, session_info};

use crate::state::TickResult;
use crate::{Effect, Msg, SearchState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SearchState, msg: Msg) -> (SearchState, Vec<Effect>) {
    let effects = match msg {
        Msg::SearchingChanged(true) => {
            if state.is_searching() {
                return (state, Vec::new());
            }
            let epoch = state.begin_session();
            session_info!(
                "Session {} started across {} sources",
                epoch,
                state.registry().len()
            );
            vec![Effect::BeginSession {
                epoch,
                sources: state.registry().ids(),
            }]
        }
        Msg::SearchingChanged(false) => {
            if !state.is_searching() {
                return (state, Vec::new());
            }
            let epoch = state.end_session();
            session_info!("Session {} ended; all sources reset to idle", epoch);
            vec![Effect::EndSession { epoch }]
        }
        Msg::SourceTriggered { epoch, source_id } => {
            if state.apply_trigger(epoch, &source_id) {
                explorer_debug!("Source {} triggered in session {}", source_id, epoch);
                vec![Effect::StartSimulator { epoch, source_id }]
            } else {
                explorer_trace!(
                    "Dropped trigger for {} (session {}, current {})",
                    source_id,
                    epoch,
                    state.epoch()
                );
                Vec::new()
            }
        }
        Msg::SourceTick {
            epoch,
            source_id,
            increment,
            failure_roll,
        } => match state.apply_tick(epoch, &source_id, increment, failure_roll) {
            TickResult::Settled(status) => {
                explorer_debug!("Source {} settled as {:?} in session {}", source_id, status, epoch);
                vec![Effect::SourceSettled {
                    epoch,
                    source_id,
                    status,
                }]
            }
            TickResult::Advanced => Vec::new(),
            TickResult::Ignored => {
                explorer_trace!("Dropped tick for {} (session {})", source_id, epoch);
                Vec::new()
            }
        },
        Msg::SourceSelected(source_id) => match state.registry().get(&source_id) {
            Some(source) => vec![Effect::NotifySourceSelected {
                source: source.clone(),
            }],
            None => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
