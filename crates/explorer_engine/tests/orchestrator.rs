use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use explorer_core::{
    ProgressState, Source, SourceCategory, SourceRegistry, SourceStatus, COMPLETE_INFO, ERROR_INFO,
};
use explorer_engine::{
    ConfigError, Orchestrator, OrchestratorConfig, OrchestratorEvent, RandomSource,
};
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;
use tokio::time::sleep;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(explorer_logging::initialize_for_tests);
}

/// Midpoint draws: 1 s between ticks, +10% per tick, failure roll 0.5.
struct FixedRandom(f64);

impl RandomSource for FixedRandom {
    fn unit(&mut self) -> f64 {
        self.0
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(FixedRandom(self.0))
    }
}

/// Midpoint draws that count live streams and total draws.
struct CountedRandom {
    live: Arc<AtomicUsize>,
    draws: Arc<AtomicUsize>,
}

impl CountedRandom {
    fn new(live: Arc<AtomicUsize>, draws: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { live, draws }
    }
}

impl Drop for CountedRandom {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RandomSource for CountedRandom {
    fn unit(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::SeqCst);
        0.5
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(CountedRandom::new(self.live.clone(), self.draws.clone()))
    }
}

fn registry() -> SourceRegistry {
    SourceRegistry::new(vec![
        Source::new("a", "Alpha", SourceCategory::Database),
        Source::new("b", "Beta", SourceCategory::Web),
    ])
    .unwrap()
}

fn orchestrator(failure_probability: f64) -> Orchestrator {
    init_logging();
    let config = OrchestratorConfig {
        failure_probability,
        ..OrchestratorConfig::default()
    };
    Orchestrator::with_random(
        registry(),
        config,
        Box::new(FixedRandom(0.5)),
        Handle::current(),
    )
    .unwrap()
}

fn drain(orchestrator: &Orchestrator) -> Vec<OrchestratorEvent> {
    std::iter::from_fn(|| orchestrator.try_recv()).collect()
}

fn progress_of(orchestrator: &Orchestrator, id: &str) -> Option<f64> {
    orchestrator.state().get(id).and_then(ProgressState::progress)
}

fn assert_all_idle(orchestrator: &Orchestrator) {
    let state = orchestrator.state();
    assert_eq!(state.len(), 2);
    for progress in state.values() {
        assert_eq!(progress, &ProgressState::Idle);
        assert_eq!(progress.info(), None);
    }
}

#[tokio::test(start_paused = true)]
async fn two_sources_complete_in_stagger_order() {
    let orchestrator = orchestrator(0.0);
    orchestrator.on_searching_changed(true);

    let state = orchestrator.state();
    assert_eq!(state.len(), 2);
    assert!(state
        .values()
        .all(|p| *p == ProgressState::Searching { progress: 0.0 }));
    assert_eq!(orchestrator.pending_triggers(), 2);

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(progress_of(&orchestrator, "a"), Some(10.0));
    assert_eq!(progress_of(&orchestrator, "b"), Some(0.0));

    sleep(Duration::from_millis(250)).await;
    assert_eq!(progress_of(&orchestrator, "b"), Some(10.0));
    assert_eq!(orchestrator.pending_triggers(), 0);
    assert_eq!(orchestrator.active_simulators(), 2);

    sleep(Duration::from_millis(8800)).await;
    let a = orchestrator.state()["a"].clone();
    assert_eq!(a.status(), SourceStatus::Complete);
    assert_eq!(a.progress(), Some(100.0));
    assert_eq!(a.info(), Some(COMPLETE_INFO));
    assert_eq!(progress_of(&orchestrator, "b"), Some(90.0));
    assert!(!orchestrator.is_settled());

    sleep(Duration::from_millis(250)).await;
    assert!(orchestrator.is_settled());
    assert_eq!(orchestrator.active_simulators(), 0);
    let view = orchestrator.view();
    assert_eq!(view.completed, 2);
    assert_eq!(view.failed, 0);

    let settled: Vec<_> = drain(&orchestrator)
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::SourceSettled { source_id, status } => Some((source_id, status)),
            OrchestratorEvent::Updated(_) => None,
        })
        .collect();
    assert_eq!(
        settled,
        vec![
            ("a".to_string(), SourceStatus::Complete),
            ("b".to_string(), SourceStatus::Complete),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn settled_sources_do_not_change_for_rest_of_session() {
    let orchestrator = orchestrator(0.0);
    orchestrator.start();
    sleep(Duration::from_millis(10_500)).await;
    let settled = orchestrator.state();

    sleep(Duration::from_secs(30)).await;

    assert_eq!(orchestrator.state(), settled);
    assert!(orchestrator.is_searching());
}

#[tokio::test(start_paused = true)]
async fn injected_failures_are_terminal_error_values() {
    let orchestrator = orchestrator(1.0);
    orchestrator.start();
    sleep(Duration::from_millis(10_500)).await;

    for progress in orchestrator.state().values() {
        assert_eq!(progress.status(), SourceStatus::Error);
        assert_eq!(progress.progress(), Some(100.0));
        assert_eq!(progress.info(), Some(ERROR_INFO));
    }
    assert_eq!(orchestrator.view().failed, 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_first_tick_leaves_everything_idle() {
    let orchestrator = orchestrator(0.0);
    orchestrator.on_searching_changed(true);
    sleep(Duration::from_millis(50)).await;

    orchestrator.on_searching_changed(false);
    assert_all_idle(&orchestrator);
    assert_eq!(orchestrator.pending_triggers(), 0);
    assert_eq!(orchestrator.active_simulators(), 0);
    drain(&orchestrator);

    sleep(Duration::from_secs(20)).await;

    assert!(drain(&orchestrator).is_empty());
    assert_all_idle(&orchestrator);
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_session_discards_in_flight_ticks() {
    let orchestrator = orchestrator(0.0);
    orchestrator.start();
    sleep(Duration::from_millis(2100)).await;
    assert_eq!(progress_of(&orchestrator, "a"), Some(20.0));
    assert_eq!(progress_of(&orchestrator, "b"), Some(10.0));

    orchestrator.stop();
    drain(&orchestrator);
    sleep(Duration::from_secs(20)).await;

    assert!(drain(&orchestrator).is_empty());
    assert_all_idle(&orchestrator);
    assert!(!orchestrator
        .state()
        .values()
        .any(|p| p.status() == SourceStatus::Searching));
}

#[tokio::test(start_paused = true)]
async fn new_session_does_not_inherit_old_timers() {
    let orchestrator = orchestrator(0.0);
    orchestrator.start();
    let first = orchestrator.epoch();
    sleep(Duration::from_millis(2100)).await;

    orchestrator.stop();
    orchestrator.start();
    assert!(orchestrator.epoch() > first);
    assert_eq!(progress_of(&orchestrator, "a"), Some(0.0));

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(progress_of(&orchestrator, "a"), Some(10.0));
    assert_eq!(progress_of(&orchestrator, "b"), Some(0.0));
}

#[tokio::test(start_paused = true)]
async fn repeated_start_signal_does_not_double_schedule() {
    let orchestrator = orchestrator(0.0);
    orchestrator.on_searching_changed(true);
    let epoch = orchestrator.epoch();
    orchestrator.on_searching_changed(true);

    assert_eq!(orchestrator.epoch(), epoch);
    assert_eq!(orchestrator.pending_triggers(), 2);

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(progress_of(&orchestrator, "a"), Some(10.0));
    assert_eq!(orchestrator.active_simulators(), 2);
}

#[tokio::test(start_paused = true)]
async fn dispose_revokes_timers_and_ignores_later_signals() {
    let orchestrator = orchestrator(0.0);
    orchestrator.start();
    sleep(Duration::from_millis(1100)).await;

    orchestrator.dispose();
    assert_all_idle(&orchestrator);
    assert_eq!(orchestrator.active_simulators(), 0);

    orchestrator.start();
    assert!(!orchestrator.is_searching());
    drain(&orchestrator);
    sleep(Duration::from_secs(20)).await;

    assert!(drain(&orchestrator).is_empty());
    assert_all_idle(&orchestrator);
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_spawned_tasks() {
    init_logging();
    let live = Arc::new(AtomicUsize::new(0));
    let draws = Arc::new(AtomicUsize::new(0));
    let orchestrator = Orchestrator::with_random(
        registry(),
        OrchestratorConfig::default(),
        Box::new(CountedRandom::new(live.clone(), draws.clone())),
        Handle::current(),
    )
    .unwrap();
    orchestrator.start();
    sleep(Duration::from_millis(500)).await;
    // Root stream plus one fork per running simulator.
    assert_eq!(live.load(Ordering::SeqCst), 3);
    assert_eq!(orchestrator.active_simulators(), 2);

    orchestrator.shutdown().await;

    assert_eq!(live.load(Ordering::SeqCst), 0);
    let settled_draws = draws.load(Ordering::SeqCst);
    sleep(Duration::from_secs(20)).await;
    assert_eq!(draws.load(Ordering::SeqCst), settled_draws);
}

#[tokio::test(start_paused = true)]
async fn source_selection_is_forwarded_to_handler() {
    let clicked = Arc::new(Mutex::new(Vec::new()));
    let sink = clicked.clone();
    let orchestrator = orchestrator(0.0)
        .with_source_click_handler(move |source| sink.lock().unwrap().push(source.clone()));

    orchestrator.on_source_selected("b");
    orchestrator.on_source_selected("missing");

    assert_eq!(
        *clicked.lock().unwrap(),
        vec![Source::new("b", "Beta", SourceCategory::Web)]
    );
    assert_all_idle(&orchestrator);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let inverted = OrchestratorConfig {
        tick_min: Duration::from_secs(2),
        tick_max: Duration::from_secs(1),
        ..OrchestratorConfig::default()
    };
    let err = Orchestrator::new(registry(), inverted, Handle::current())
        .err()
        .expect("config rejected");
    assert_eq!(
        err,
        ConfigError::InvertedTickRange {
            min: Duration::from_secs(2),
            max: Duration::from_secs(1),
        }
    );

    let no_progress = OrchestratorConfig {
        max_increment: 0.0,
        ..OrchestratorConfig::default()
    };
    assert_eq!(
        no_progress.validate(),
        Err(ConfigError::NonPositiveIncrement(0.0))
    );

    let probability = OrchestratorConfig {
        failure_probability: 1.5,
        ..OrchestratorConfig::default()
    };
    assert_eq!(
        probability.validate(),
        Err(ConfigError::FailureProbabilityOutOfRange(1.5))
    );
    assert_eq!(OrchestratorConfig::default().validate(), Ok(()));
}
