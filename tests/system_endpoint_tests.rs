//! Host information endpoint tests
//!
//! Covers:
//! - GET /api/system
//! - GET /api/drives, including the text fallback
//! - GET /api/catalog

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{build_app_state, build_state_with, send_json, ScriptedRunner};

const LSBLK_JSON: &str = r#"{
   "blockdevices": [
      {"name": "sda", "size": "1.8T", "type": "disk", "fstype": null,
         "children": [
            {"name": "sda1", "size": "1.8T", "type": "part", "fstype": "ext4"}
         ]
      },
      {"name": "mmcblk0", "size": "29.7G", "type": "disk", "fstype": null,
         "children": [
            {"name": "mmcblk0p1", "size": "512M", "type": "part", "fstype": "vfat"},
            {"name": "mmcblk0p2", "size": "29.2G", "type": "part", "fstype": "ext4"},
            {"name": "mmcblk0p3", "size": "1G", "type": "part", "fstype": "swap"}
         ]
      }
   ]
}"#;

const LSBLK_TEXT: &str = "\
NAME        SIZE TYPE FSTYPE
sda         1.8T disk
└─sda1      1.8T part ntfs
";

// ============================================================================
// GET /api/system
// ============================================================================

#[tokio::test]
async fn test_system_info_shape() {
    let runner = ScriptedRunner::new()
        .ok(&["docker", "--version"], "Docker version 27.0.3, build 7d4bcd8\n")
        .ok(&["tailscale", "ip", "-4"], "100.101.102.103\n")
        .ok(
            &["df"],
            "Filesystem 1B-blocks Used Available Use% Mounted on\n/dev/root 62000000000 12000000000 47000000000 21% /\n",
        );
    let env = build_state_with(runner, None);

    let (status, body) = send_json(env.app(), "GET", "/api/system", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docker_installed"], true);
    assert_eq!(body["docker_version"], "Docker version 27.0.3, build 7d4bcd8");
    assert_eq!(body["tailscale_installed"], true);
    assert_eq!(body["tailscale_ip"], "100.101.102.103");
    assert_eq!(body["disk_total"], 62_000_000_000u64);
    assert_eq!(body["disk_free"], 47_000_000_000u64);
    assert_eq!(body["installation_status"], "not_started");
    assert_eq!(body["architecture"], std::env::consts::ARCH);
    assert!(body["cpu_cores"].as_u64().unwrap() >= 1);
    assert!(body["raspberry_pi"]["is_raspberry_pi"].is_boolean());
    assert!(body["transcoding"]["recommended_method"].is_string());
}

#[tokio::test]
async fn test_system_info_survives_missing_tools() {
    let runner = ScriptedRunner::new()
        .fail(&["docker"], "docker: not found")
        .fail(&["tailscale"], "tailscale: not found")
        .fail(&["df"], "df: not found");
    let env = build_state_with(runner, None);

    let (status, body) = send_json(env.app(), "GET", "/api/system", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docker_installed"], false);
    assert_eq!(body["docker_version"], serde_json::Value::Null);
    assert_eq!(body["tailscale_installed"], false);
    assert_eq!(body["disk_total"], 0);
}

// ============================================================================
// GET /api/drives
// ============================================================================

#[tokio::test]
async fn test_drives_from_json_listing() {
    let runner = ScriptedRunner::new().ok(&["lsblk", "-o", "NAME,SIZE,TYPE,FSTYPE", "-J"], LSBLK_JSON);
    let env = build_state_with(runner, None);

    let (status, body) = send_json(env.app(), "GET", "/api/drives", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["drives"],
        json!([
            {"device": "/dev/sda1", "size": "1.8T", "type": "ext4"},
            {"device": "/dev/mmcblk0p1", "size": "512M", "type": "vfat"},
            {"device": "/dev/mmcblk0p2", "size": "29.2G", "type": "ext4"}
        ])
    );
}

#[tokio::test]
async fn test_drives_fall_back_to_text_listing() {
    let runner = ScriptedRunner::new()
        .fail(&["lsblk", "-o", "NAME,SIZE,TYPE,FSTYPE", "-J"], "lsblk: unknown option -- 'J'")
        .ok(&["lsblk"], LSBLK_TEXT);
    let env = build_state_with(runner, None);

    let (_, body) = send_json(env.app(), "GET", "/api/drives", None).await;

    assert_eq!(
        body["drives"],
        json!([{"device": "/dev/sda1", "size": "1.8T", "type": "ntfs"}])
    );
    assert_eq!(env.runner.count_matching(&["lsblk"]), 2);
}

#[tokio::test]
async fn test_drives_empty_when_lsblk_missing() {
    let runner = ScriptedRunner::new().fail(&["lsblk"], "lsblk: not found");
    let env = build_state_with(runner, None);

    let (status, body) = send_json(env.app(), "GET", "/api/drives", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drives"], json!([]));
}

// ============================================================================
// GET /api/catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_lists_every_app() {
    let env = build_app_state();

    let (status, body) = send_json(env.app(), "GET", "/api/catalog", None).await;

    assert_eq!(status, StatusCode::OK);
    let apps = body["apps"].as_array().unwrap();
    assert_eq!(apps.len(), pipvr::services::catalog::APPS.len());

    let sonarr = apps.iter().find(|a| a["name"] == "sonarr").unwrap();
    assert_eq!(sonarr["category"], "arr_apps");
    assert_eq!(sonarr["ports"], json!([8989]));
    assert!(sonarr["image"].as_str().unwrap().contains("sonarr"));
}
