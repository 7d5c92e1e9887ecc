//! Ensures all workspace crates use `version.workspace = true` and that
//! internal path dependencies pin the workspace version.

use std::path::{Path, PathBuf};

const MEMBERS: [&str; 3] = [
    "crates/tagdiff-core",
    "crates/tagdiff-sources",
    "crates/tagdiff-cli",
];

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn read_toml(path: &Path) -> toml::Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    content.parse().unwrap()
}

fn workspace_version() -> String {
    let doc = read_toml(&workspace_root().join("Cargo.toml"));
    doc["workspace"]["package"]["version"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn all_crates_use_workspace_version() {
    for krate in MEMBERS {
        let doc = read_toml(&workspace_root().join(krate).join("Cargo.toml"));
        let uses_workspace = doc["package"]["version"]
            .as_table()
            .and_then(|t| t.get("workspace"))
            .and_then(|v| v.as_bool());
        assert_eq!(
            uses_workspace,
            Some(true),
            "{} should use version.workspace = true",
            krate
        );
    }
}

#[test]
fn workspace_members_match_crate_list() {
    let doc = read_toml(&workspace_root().join("Cargo.toml"));
    let members: Vec<&str> = doc["workspace"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m.as_str())
        .collect();
    assert_eq!(members, MEMBERS.to_vec());
}

#[test]
fn internal_dependencies_pin_workspace_version() {
    let doc = read_toml(&workspace_root().join("Cargo.toml"));
    let ws_version = workspace_version();
    let deps = doc["workspace"]["dependencies"].as_table().unwrap();
    for name in ["tagdiff-core", "tagdiff-sources"] {
        assert_eq!(
            deps[name]["version"].as_str(),
            Some(ws_version.as_str()),
            "{} dependency version should match the workspace",
            name
        );
    }
}

#[test]
fn workspace_version_matches_cargo_pkg() {
    let ws_version = workspace_version();
    let pkg_version = env!("CARGO_PKG_VERSION");
    assert_eq!(
        ws_version, pkg_version,
        "workspace version ({}) != CARGO_PKG_VERSION ({})",
        ws_version, pkg_version
    );
}

#[test]
fn core_library_carries_no_runtime_or_http_stack() {
    let doc = read_toml(&workspace_root().join("crates/tagdiff-core/Cargo.toml"));
    let deps = doc["dependencies"].as_table().unwrap();
    for forbidden in ["tokio", "reqwest"] {
        assert!(
            !deps.contains_key(forbidden),
            "tagdiff-core must not depend on {} outside dev-dependencies",
            forbidden
        );
    }
    assert!(doc["dev-dependencies"]
        .as_table()
        .is_some_and(|t| t.contains_key("tokio")));
}
