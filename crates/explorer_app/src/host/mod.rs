pub(crate) mod app;
pub(crate) mod cli;
pub(crate) mod config;
pub mod logging;
pub(crate) mod render;
