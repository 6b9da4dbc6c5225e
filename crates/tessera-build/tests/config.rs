mod common;

use common::target;
use std::path::{Path, PathBuf};
use tessera_build::{BuildConfig, BuildError, Mode, CONFIG_FILE};
use tessera_layout::TargetData;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_bin_path_from_environment() {
    let config = BuildConfig::with_env(Mode::Build, target(), no_env).unwrap();
    assert_eq!(config.bin_path, PathBuf::from("bin"));

    let config = BuildConfig::with_env(Mode::Build, target(), |key| {
        (key == "TESSERA_ROOT").then(|| "/opt/tessera".to_string())
    })
    .unwrap();
    assert_eq!(config.bin_path, PathBuf::from("/opt/tessera/bin"));

    let config = BuildConfig::with_env(Mode::Build, target(), |key| match key {
        "TESSERA_BIN" => Some("/usr/local/bin".to_string()),
        "TESSERA_ROOT" => Some("/opt/tessera".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.bin_path, PathBuf::from("/usr/local/bin"));
}

#[test]
fn test_output_path() {
    let mut config = BuildConfig::with_env(Mode::Install, target(), no_env).unwrap();
    assert_eq!(config.output_path("example.com/cmd/hello"), Path::new("bin/hello"));

    config.out_file = Some(PathBuf::from("a.out"));
    assert_eq!(config.output_path("example.com/cmd/hello"), Path::new("a.out"));

    let windows = TargetData::parse("x86_64-pc-windows-msvc").unwrap();
    let config = BuildConfig::with_env(Mode::Install, windows, no_env).unwrap();
    assert_eq!(config.app_ext, ".exe");
    assert_eq!(config.output_path("hello"), Path::new("bin/hello.exe"));
}

#[test]
fn test_missing_config_file_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = BuildConfig::with_env(Mode::Run, target(), no_env)
        .unwrap()
        .load(&dir.path().join(CONFIG_FILE))
        .unwrap();
    assert_eq!(config.bin_path, PathBuf::from("bin"));
    assert_eq!(config.mode, Mode::Run);
}

#[test]
fn test_config_file_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(&path, "[build]\nbin = \"out\"\ntarget = \"x86_64-pc-windows-msvc\"\n").unwrap();

    let config = BuildConfig::with_env(Mode::Install, target(), no_env).unwrap().load(&path).unwrap();
    assert_eq!(config.bin_path, dir.path().join("out"));
    assert_eq!(config.app_ext, ".exe");
    assert_eq!(config.output_path("example.com/tool"), dir.path().join("out").join("tool.exe"));
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(&path, "[build]\nlinker = \"gcc\"\n").unwrap();

    let err = BuildConfig::with_env(Mode::Install, target(), no_env).unwrap().load(&path).unwrap_err();
    assert!(matches!(err, BuildError::Config { .. }));
}
