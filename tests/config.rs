use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;

use gene_harvester::config::{Config, ConfigLoader, DEFAULT_BASE_URL, resolve_contact};
use gene_harvester::error::HarvestError;

#[test]
fn load_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gene-harvester.json");
    fs::write(
        &path,
        r#"{"contact": " lab@example.org ", "base_url": "http://localhost:8080/eutils/", "timeout_secs": 90, "extra": true}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::load(&path).unwrap();
    assert_eq!(resolved.contact.as_deref(), Some("lab@example.org"));
    assert_eq!(resolved.base_url, "http://localhost:8080/eutils");
    assert_eq!(resolved.tool, "gene-harvester");
    assert_eq!(resolved.timeout, Some(Duration::from_secs(90)));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, HarvestError::ConfigRead(_));
}

#[test]
fn broken_config_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{contact:").unwrap();
    assert_matches!(ConfigLoader::load(&path), Err(HarvestError::ConfigParse(_)));
}

#[test]
fn contact_prefers_command_line() {
    let resolved = ConfigLoader::resolve_config(Config {
        contact: Some("config@example.org".to_string()),
        ..Config::default()
    });
    assert_eq!(
        resolve_contact(Some("cli@example.org".to_string()), &resolved).unwrap(),
        "cli@example.org"
    );
    assert_eq!(
        resolve_contact(None, &resolved).unwrap(),
        "config@example.org"
    );
}

#[test]
fn contact_is_required() {
    let resolved = ConfigLoader::resolve_config(Config::default());
    assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
    assert_matches!(
        resolve_contact(Some("  ".to_string()), &resolved),
        Err(HarvestError::MissingContact)
    );
}
