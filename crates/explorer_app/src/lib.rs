//! Terminal host for the knowledge-graph explorer's data-sources panel.
mod host;

pub use host::app::run;
pub use host::cli::{Cli, LogTarget, OutputFormat};
pub use host::config::{load_config, AppConfig, CatalogError};
pub use host::logging;
pub use host::render::{format_source_row, progress_bar, render_json, render_text};
