use std::io::Write;
use std::time::Duration;

use explorer_app::{load_config, AppConfig, CatalogError};
use explorer_core::{RegistryError, SourceCategory, SourceRegistry};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn missing_path_uses_defaults_and_builtin_catalog() {
    let config = load_config(None).unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.registry().unwrap(), SourceRegistry::default_catalog());
    let orchestrator = config.orchestrator_config().unwrap();
    assert_eq!(orchestrator.stagger_interval, Duration::from_millis(300));
    assert_eq!(orchestrator.tick_min, Duration::from_millis(500));
    assert_eq!(orchestrator.tick_max, Duration::from_millis(1500));
}

#[test]
fn ron_file_supplies_catalog_and_timings() {
    let file = write_config(
        r#"(
            sources: Some([
                (id: "edgar", name: "SEC EDGAR", category: api),
                (id: "registry", name: "Company Registry", category: database),
            ]),
            stagger_ms: 100,
            failure_probability: 0.0,
            seed: Some(9),
        )"#,
    );

    let config = load_config(Some(file.path())).unwrap();
    let registry = config.registry().unwrap();
    let ids: Vec<_> = registry.list().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["edgar", "registry"]);
    assert_eq!(registry.get("registry").unwrap().category, SourceCategory::Database);

    let orchestrator = config.orchestrator_config().unwrap();
    assert_eq!(orchestrator.stagger_interval, Duration::from_millis(100));
    assert_eq!(orchestrator.tick_max, Duration::from_millis(1500));
    assert_eq!(orchestrator.failure_probability, 0.0);
    assert_eq!(orchestrator.seed, Some(9));
}

#[test]
fn command_line_overrides_win() {
    let config = AppConfig {
        seed: Some(1),
        ..AppConfig::default()
    }
    .with_overrides(Some(5), Some(1.0));

    assert_eq!(config.seed, Some(5));
    assert_eq!(config.failure_probability, 1.0);

    let untouched = AppConfig::default().with_overrides(None, None);
    assert_eq!(untouched, AppConfig::default());
}

#[test]
fn duplicate_source_ids_are_reported() {
    let file = write_config(
        r#"(sources: Some([
            (id: "a", name: "A", category: web),
            (id: "a", name: "A2", category: web),
        ]))"#,
    );

    let err = load_config(Some(file.path())).unwrap().registry().unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Registry(RegistryError::DuplicateId(ref id)) if id == "a"
    ));
}

#[test]
fn empty_catalog_is_rejected() {
    let config = AppConfig {
        sources: Some(Vec::new()),
        ..AppConfig::default()
    };

    assert!(matches!(config.registry(), Err(CatalogError::EmptyCatalog)));
}

#[test]
fn invalid_timings_are_rejected() {
    let config = AppConfig {
        tick_min_ms: 2000,
        tick_max_ms: 1000,
        ..AppConfig::default()
    };

    assert!(matches!(
        config.orchestrator_config(),
        Err(CatalogError::Config(_))
    ));
}

#[test]
fn malformed_file_reports_parse_error() {
    let file = write_config("(sources: Some([ (id: ");

    assert!(matches!(
        load_config(Some(file.path())),
        Err(CatalogError::Parse { .. })
    ));
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.ron");

    assert!(matches!(
        load_config(Some(path.as_path())),
        Err(CatalogError::Io { .. })
    ));
}
