use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use explorer_core::PanelViewModel;
use explorer_engine::{Orchestrator, OrchestratorEvent};
use explorer_logging::{explorer_info, explorer_warn};

use super::cli::{Cli, OutputFormat};
use super::config::load_config;
use super::render::{render_json, render_text};

/// Cadence at which the panel is redrawn from queued orchestrator events.
const RENDER_INTERVAL: Duration = Duration::from_millis(75);

/// Runs one search session and renders the panel until it settles, is
/// cancelled, or times out.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?
        .with_overrides(cli.seed, cli.failure_probability);
    let registry = config.registry()?;
    let orchestrator_config = config.orchestrator_config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()?;

    let orchestrator = Orchestrator::new(registry, orchestrator_config, runtime.handle().clone())?
        .with_source_click_handler(|source| {
            explorer_info!(
                "Source selected: {} [{}] ({})",
                source.name,
                source.id,
                source.category
            );
        });

    let mut panel = Panel {
        out: io::stdout().lock(),
        format: cli.format,
        query: cli.query.clone(),
        started_at: Utc::now(),
    };
    let began = Instant::now();
    let cancel_after = cli.cancel_after_ms.map(Duration::from_millis);
    let timeout = Duration::from_millis(cli.timeout_ms);

    explorer_info!("Starting search {:?}", cli.query);
    orchestrator.on_searching_changed(true);
    if let Some(source_id) = cli.select.as_deref() {
        orchestrator.on_source_selected(source_id);
    }

    loop {
        panel.drain(&orchestrator)?;
        if orchestrator.is_settled() {
            let view = orchestrator.view();
            explorer_info!(
                "All sources settled: {} complete, {} failed",
                view.completed,
                view.failed
            );
            break;
        }
        let elapsed = began.elapsed();
        if cancel_after.is_some_and(|limit| elapsed >= limit) {
            explorer_info!("Cancelling search after {:?}", elapsed);
            orchestrator.on_searching_changed(false);
            panel.drain(&orchestrator)?;
            break;
        }
        if elapsed >= timeout {
            explorer_warn!("Search did not settle within {:?}; stopping", timeout);
            orchestrator.on_searching_changed(false);
            panel.drain(&orchestrator)?;
            break;
        }
        thread::sleep(RENDER_INTERVAL);
    }

    runtime.block_on(orchestrator.shutdown());
    Ok(())
}

struct Panel<W: Write> {
    out: W,
    format: OutputFormat,
    query: String,
    started_at: DateTime<Utc>,
}

impl<W: Write> Panel<W> {
    /// Renders the latest queued view, if any; intermediate views are skipped.
    fn drain(&mut self, orchestrator: &Orchestrator) -> io::Result<()> {
        let mut latest = None;
        while let Some(event) = orchestrator.try_recv() {
            match event {
                OrchestratorEvent::Updated(view) => latest = Some(view),
                OrchestratorEvent::SourceSettled { source_id, status } => {
                    explorer_info!("Source {} settled: {:?}", source_id, status);
                }
            }
        }
        match latest {
            Some(view) => self.render(&view),
            None => Ok(()),
        }
    }

    fn render(&mut self, view: &PanelViewModel) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => render_text(&mut self.out, &self.query, self.started_at, view)?,
            OutputFormat::Json => render_json(&mut self.out, &self.query, self.started_at, view)?,
        }
        self.out.flush()
    }
}
