// tests/config_test.rs
use bumpr::config::{load_config, Config, CONFIG_FILE_NAME};
use bumpr::domain::VersionPart;
use bumpr::BumprError;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
file = "setup.py"
files = ["README.rst", "docs/conf.py"]
vcs = "hg"
tests = """
tox -e py
tox -e docs
"""
publish = "python setup.py sdist upload"
timeout = 120

[bump]
part = "minor"
suffix = "rc"
message = "Release {version}"

[prepare]
suffix = "dev"

[changelog]
file = "CHANGELOG.rst"
bump = "{version} ({date:%Y-%m-%d})"

[[hooks]]
point = "after_publish"
command = "./notify.sh"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();

    assert_eq!(config.file, Some(PathBuf::from("setup.py")));
    assert_eq!(config.files.len(), 2);
    assert_eq!(config.vcs, "hg");
    assert_eq!(config.tests.as_deref().map(|t| t.lines().count()), Some(2));
    assert_eq!(config.timeout, Some(120));
    assert_eq!(config.bump.part, Some(VersionPart::Minor));
    assert_eq!(config.bump.suffix.as_deref(), Some("rc"));
    assert_eq!(config.bump.message, "Release {version}");
    let changelog = config.changelog.as_ref().unwrap();
    assert_eq!(changelog.separator, "-");
    assert_eq!(changelog.prepare, "Current");
    assert_eq!(config.hooks[0].point, "after_publish");
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_custom_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, BumprError::File { .. }));
}

#[test]
fn test_invalid_toml_names_the_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"file = [unclosed").unwrap();
    temp_file.flush().unwrap();

    let err = load_config(Some(temp_file.path())).unwrap_err();
    assert!(matches!(err, BumprError::Config(_)));
    assert!(err
        .to_string()
        .contains(&temp_file.path().display().to_string()));
}

#[test]
#[serial]
fn test_working_directory_config_is_used() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "file = \"pkg/__init__.py\"\ncommit = false\n",
    )
    .unwrap();
    let original_dir = env::current_dir().unwrap();

    env::set_current_dir(dir.path()).expect("Could not change to temp dir");
    let config = load_config(None);
    env::set_current_dir(original_dir).unwrap();

    let config = config.unwrap();
    assert_eq!(config.file, Some(PathBuf::from("pkg/__init__.py")));
    assert!(!config.commit);
}

#[test]
#[serial]
fn test_custom_path_wins_over_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "file = \"local.py\"\n").unwrap();
    let custom = dir.path().join("release.toml");
    fs::write(&custom, "file = \"custom.py\"\n").unwrap();
    let original_dir = env::current_dir().unwrap();

    env::set_current_dir(dir.path()).expect("Could not change to temp dir");
    let config = load_config(Some(&custom));
    env::set_current_dir(original_dir).unwrap();

    assert_eq!(config.unwrap().file, Some(PathBuf::from("custom.py")));
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let config = Config {
        file: Some(PathBuf::from("setup.py")),
        timeout: Some(0),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}
