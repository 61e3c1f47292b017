//! 仓库内置的配置与时间线文件

use std::path::PathBuf;

use intro_host::{HostConfig, check_timeline_file};
use intro_runtime::{LoaderKind, Timeline, catalog};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

#[test]
fn test_default_config_file() {
    let config = HostConfig::load(workspace_root().join("config.json"));
    assert_eq!(config, HostConfig::default());
    config.validate().unwrap();
}

#[test]
fn test_asset_timelines_check_clean() {
    let dir = workspace_root().join("assets/timelines");
    for name in ["scenario.json", "soc.json"] {
        let result = check_timeline_file(&dir.join(name)).unwrap();
        assert!(result.is_empty(), "{}: {:?}", name, result.diagnostics);
    }
}

/// 导出的 soc 时间线与内置版本一致
#[test]
fn test_soc_asset_matches_catalog() {
    let text = std::fs::read_to_string(workspace_root().join("assets/timelines/soc.json")).unwrap();
    let from_file = Timeline::from_json(&text).unwrap();
    let builtin = catalog::timeline(LoaderKind::Soc).unwrap();

    assert_eq!(from_file.to_json().unwrap(), builtin.to_json().unwrap());
}
