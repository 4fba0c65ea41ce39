//! Tests for config loading.

use reqmark::config::{Config, config_path, load_config};

#[test]
fn test_missing_config_uses_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let config = load_config(&config_path(temp.path())).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.settings_dir, ".vscode");
    assert_eq!(config.file_name, "annotations.json");
    assert!(!config.palette.is_empty());
    assert_eq!(config.default_color, "#FFFF00");
    assert!(config.palette.contains(&config.default_color));
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = config_path(temp.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r##"{ "settings_dir": ".reqmark", "palette": ["#ABCDEF"] }"##).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.settings_dir, ".reqmark");
    assert_eq!(config.palette, ["#ABCDEF"]);
    assert_eq!(config.file_name, "annotations.json");

    let storage = config.storage(temp.path());
    assert_eq!(
        storage.path().unwrap(),
        temp.path().join(".reqmark").join("annotations.json")
    );
}

#[test]
fn test_malformed_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    std::fs::write(&path, "settings_dir = nope").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}
