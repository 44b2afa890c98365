use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError, Weak};

use explorer_core::{
    update, Effect, Msg, PanelViewModel, ProgressSnapshot, SearchState, SessionEpoch, Source,
    SourceId, SourceRegistry, SourceStatus,
};
use explorer_logging::{explorer_debug, explorer_info, explorer_warn, session_info};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::simulator::{ProgressSimulator, SimulatorHandle, SourceTick, TickReply, TickSink};
use crate::{ConfigError, OrchestratorConfig, RandomSource, ScheduleManager, SeededRandom};

/// Callback invoked when the user activates a source row.
pub type SourceClickHandler = Arc<dyn Fn(&Source) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    /// The panel changed; carries the fresh view.
    Updated(PanelViewModel),
    SourceSettled {
        source_id: SourceId,
        status: SourceStatus,
    },
}

/// Owns the per-source progress state and every timer that mutates it.
///
/// Searching is driven by a single boolean signal. Each session is tagged
/// with an epoch; triggers and ticks scheduled under an older epoch are
/// discarded, so cancelling is atomic with respect to in-flight timers.
pub struct Orchestrator {
    inner: Arc<Inner>,
    event_rx: mpsc::Receiver<OrchestratorEvent>,
}

impl Orchestrator {
    /// Builds an orchestrator whose timers run on `runtime`.
    pub fn new(
        registry: SourceRegistry,
        config: OrchestratorConfig,
        runtime: Handle,
    ) -> Result<Self, ConfigError> {
        let random = Box::new(SeededRandom::from_optional_seed(config.seed));
        Self::with_random(registry, config, random, runtime)
    }

    pub fn with_random(
        registry: SourceRegistry,
        config: OrchestratorConfig,
        random: Box<dyn RandomSource>,
        runtime: Handle,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (event_tx, event_rx) = mpsc::channel();
        let tracker = TaskTracker::new();
        let slots = registry.len();
        let state = SearchState::new(registry).with_failure_probability(config.failure_probability);

        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            timers: Mutex::new(SessionTimers::new(
                ScheduleManager::new(runtime.clone(), tracker.clone()),
                slots,
            )),
            config,
            random: Mutex::new(random),
            runtime,
            tracker,
            event_tx,
            on_source_click: Mutex::new(None),
            disposed: AtomicBool::new(false),
        });
        Ok(Self { inner, event_rx })
    }

    pub fn with_source_click_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Source) + Send + Sync + 'static,
    {
        *lock(&self.inner.on_source_click) = Some(Arc::new(handler));
        self
    }

    /// Reacts to the external "search in progress" signal. Repeated identical
    /// values are ignored.
    pub fn on_searching_changed(&self, searching: bool) {
        if self.inner.is_disposed() {
            explorer_debug!("Ignoring searching={} after dispose", searching);
            return;
        }
        self.inner.dispatch(Msg::SearchingChanged(searching));
    }

    pub fn start(&self) {
        self.on_searching_changed(true);
    }

    pub fn stop(&self) {
        self.on_searching_changed(false);
    }

    /// Forwards a row activation to the click handler, if one is set.
    pub fn on_source_selected(&self, source_id: &str) {
        self.inner.dispatch(Msg::SourceSelected(source_id.to_string()));
    }

    pub fn state(&self) -> ProgressSnapshot {
        lock(&self.inner.state).snapshot()
    }

    pub fn view(&self) -> PanelViewModel {
        lock(&self.inner.state).view()
    }

    pub fn epoch(&self) -> SessionEpoch {
        lock(&self.inner.state).epoch()
    }

    pub fn is_searching(&self) -> bool {
        lock(&self.inner.state).is_searching()
    }

    /// True once every source reached a terminal state in the running session.
    pub fn is_settled(&self) -> bool {
        lock(&self.inner.state).is_settled()
    }

    /// Start triggers scheduled for the current session that have not fired yet.
    pub fn pending_triggers(&self) -> usize {
        lock(&self.inner.timers).schedule.pending()
    }

    /// Simulators of the current session that are still ticking.
    pub fn active_simulators(&self) -> usize {
        lock(&self.inner.timers)
            .slots
            .iter()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn try_recv(&self) -> Option<OrchestratorEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Stops the running session and revokes every timer. Later signals are ignored.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.dispatch(Msg::SearchingChanged(false));
        lock(&self.inner.timers).revoke();
        self.inner.tracker.close();
        explorer_info!("Orchestrator disposed");
    }

    /// Disposes and waits until every spawned trigger and simulator task has exited.
    pub async fn shutdown(self) {
        self.dispose();
        let tracker = self.inner.tracker.clone();
        drop(self);
        tracker.wait().await;
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct Inner {
    state: Mutex<SearchState>,
    timers: Mutex<SessionTimers>,
    config: OrchestratorConfig,
    random: Mutex<Box<dyn RandomSource>>,
    runtime: Handle,
    tracker: TaskTracker,
    event_tx: mpsc::Sender<OrchestratorEvent>,
    on_source_click: Mutex<Option<SourceClickHandler>>,
    disposed: AtomicBool,
}

impl Inner {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Applies `msg` to the state, then runs the resulting effects with the
    /// state lock released.
    fn dispatch(self: &Arc<Self>, msg: Msg) {
        let effects = {
            let mut guard = lock(&self.state);
            let state = std::mem::take(&mut *guard);
            let (mut state, effects) = update(state, msg);
            if state.consume_dirty() {
                self.emit(OrchestratorEvent::Updated(state.view()));
            }
            *guard = state;
            effects
        };

        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(self: &Arc<Self>, effect: Effect) {
        match effect {
            Effect::BeginSession { epoch, sources } => self.begin_timers(epoch, sources),
            Effect::EndSession { epoch } => {
                let mut timers = lock(&self.timers);
                timers.revoke();
                session_info!("Revoked all timers of session {}", epoch);
            }
            Effect::StartSimulator { epoch, source_id } => self.start_simulator(epoch, source_id),
            Effect::SourceSettled {
                epoch,
                source_id,
                status,
            } => {
                lock(&self.timers).release(epoch, &source_id);
                self.emit(OrchestratorEvent::SourceSettled { source_id, status });
            }
            Effect::NotifySourceSelected { source } => {
                let handler = lock(&self.on_source_click).clone();
                match handler {
                    Some(handler) => handler(&source),
                    None => explorer_debug!("No click handler for source {}", source.id),
                }
            }
        }
    }

    fn begin_timers(self: &Arc<Self>, epoch: SessionEpoch, sources: Vec<SourceId>) {
        let mut timers = lock(&self.timers);
        if !self.is_current(epoch) {
            return;
        }
        timers.revoke();
        timers.activate(epoch);

        let weak = Arc::downgrade(self);
        timers
            .schedule
            .start(sources, self.config.stagger_interval, move |source_id| {
                if let Some(inner) = weak.upgrade() {
                    inner.dispatch(Msg::SourceTriggered { epoch, source_id });
                }
            });
    }

    fn start_simulator(self: &Arc<Self>, epoch: SessionEpoch, source_id: SourceId) {
        let mut timers = lock(&self.timers);
        if timers.epoch != Some(epoch) {
            return;
        }
        let index = {
            let state = lock(&self.state);
            if !state.accepts_ticks(epoch, &source_id) {
                return;
            }
            state.registry().index_of(&source_id)
        };
        let Some(index) = index else {
            return;
        };

        let random = lock(&self.random).fork();
        let sink: Arc<dyn TickSink> = Arc::new(SessionSink {
            inner: Arc::downgrade(self),
        });
        let handle = ProgressSimulator::new(epoch, source_id, self.config.cadence(), random).spawn(
            &self.runtime,
            &self.tracker,
            sink,
            timers.token.child_token(),
        );
        if let Some(previous) = timers.slots[index].replace(handle) {
            explorer_warn!(
                "Replacing simulator for {} (session {})",
                previous.source_id(),
                previous.epoch()
            );
            previous.cancel();
        }
    }

    fn is_current(&self, epoch: SessionEpoch) -> bool {
        let state = lock(&self.state);
        state.is_searching() && state.epoch() == epoch
    }

    fn emit(&self, event: OrchestratorEvent) {
        // Nobody listening is fine.
        let _ = self.event_tx.send(event);
    }
}

/// Timer table of the active session: one simulator slot per source.
struct SessionTimers {
    epoch: Option<SessionEpoch>,
    token: CancellationToken,
    schedule: ScheduleManager,
    slots: Vec<Option<SimulatorHandle>>,
}

impl SessionTimers {
    fn new(schedule: ScheduleManager, slots: usize) -> Self {
        Self {
            epoch: None,
            token: CancellationToken::new(),
            schedule,
            slots: std::iter::repeat_with(|| None).take(slots).collect(),
        }
    }

    fn activate(&mut self, epoch: SessionEpoch) {
        self.epoch = Some(epoch);
        self.token = CancellationToken::new();
    }

    /// Cancels pending triggers and every simulator. Idempotent.
    fn revoke(&mut self) {
        self.epoch = None;
        self.schedule.cancel();
        self.token.cancel();
        for handle in self.slots.iter_mut().filter_map(Option::take) {
            handle.cancel();
        }
    }

    /// Forgets a simulator that settled on its own.
    fn release(&mut self, epoch: SessionEpoch, source_id: &str) {
        if self.epoch != Some(epoch) {
            return;
        }
        for slot in &mut self.slots {
            if slot
                .as_ref()
                .is_some_and(|handle| handle.source_id() == source_id)
            {
                *slot = None;
            }
        }
    }
}

/// Routes simulator ticks back into the orchestrator without keeping it alive.
struct SessionSink {
    inner: Weak<Inner>,
}

impl TickSink for SessionSink {
    fn deliver(&self, tick: SourceTick) -> TickReply {
        let Some(inner) = self.inner.upgrade() else {
            return TickReply::Stop;
        };
        if inner.is_disposed() {
            return TickReply::Stop;
        }
        let epoch = tick.epoch;
        let source_id = tick.source_id.clone();
        inner.dispatch(tick.into());
        if lock(&inner.state).accepts_ticks(epoch, &source_id) {
            TickReply::Continue
        } else {
            TickReply::Stop
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
