use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use explorer_core::SourceId;
use explorer_logging::explorer_trace;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Fires one deferred start trigger per source, staggered by registry index.
///
/// Triggers are driven by a single task so they always fire in the order the
/// sources were given, even when the stagger interval is zero.
pub struct ScheduleManager {
    runtime: Handle,
    tracker: TaskTracker,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    scheduled: usize,
    fired: Arc<AtomicUsize>,
}

impl ScheduleManager {
    pub fn new(runtime: Handle, tracker: TaskTracker) -> Self {
        Self {
            runtime,
            tracker,
            token: CancellationToken::new(),
            task: None,
            scheduled: 0,
            fired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Schedules `on_trigger(sources[k])` at `k * stagger` from now.
    ///
    /// Anything still pending from an earlier call is cancelled first.
    pub fn start<F>(&mut self, sources: Vec<SourceId>, stagger: Duration, on_trigger: F)
    where
        F: Fn(SourceId) + Send + 'static,
    {
        self.cancel();
        self.token = CancellationToken::new();
        self.scheduled = sources.len();
        self.fired = Arc::new(AtomicUsize::new(0));

        let token = self.token.clone();
        let fired = self.fired.clone();
        let origin = Instant::now();
        let task = self.tracker.spawn_on(
            async move {
                for (index, source_id) in sources.into_iter().enumerate() {
                    let deadline = trigger_deadline(origin, stagger, index);
                    tokio::select! {
                        biased;
                        () = token.cancelled() => return,
                        () = tokio::time::sleep_until(deadline) => {}
                    }
                    if token.is_cancelled() {
                        return;
                    }
                    explorer_trace!("Start trigger {} for source {}", index, source_id);
                    fired.fetch_add(1, Ordering::SeqCst);
                    on_trigger(source_id);
                }
            },
            &self.runtime,
        );
        self.task = Some(task);
    }

    /// Aborts triggers that have not fired yet. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.scheduled = self.fired.load(Ordering::SeqCst);
    }

    /// Number of triggers scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.scheduled
            .saturating_sub(self.fired.load(Ordering::SeqCst))
    }
}

impl Drop for ScheduleManager {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Deadlines past what `Instant` can represent are parked this far ahead.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn trigger_deadline(origin: Instant, stagger: Duration, index: usize) -> Instant {
    let offset = stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
    origin
        .checked_add(offset)
        .unwrap_or_else(|| origin + FAR_FUTURE)
}
