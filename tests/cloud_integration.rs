// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests against a mocked vendor cloud using wiremock.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use livhub_lib::coordinator::{CommandPolicy, Coordinator, CoordinatorConfig};
use livhub_lib::error::{Error, RequestError, UpdateFailed};
use livhub_lib::protocol::{ApiConfig, RainmakerClient};
use livhub_lib::types::{LedBrightness, RgbColor, SystemStatus};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fixtures
// ============================================================================

fn id_token(user_id: &str) -> String {
    let encode = |bytes: &[u8]| URL_SAFE_NO_PAD.encode(bytes);
    format!(
        "{}.{}.{}",
        encode(br#"{"alg":"RS256"}"#.as_slice()),
        encode(json!({"custom:user_id": user_id}).to_string().as_bytes()),
        encode(b"sig".as_slice())
    )
}

fn hub_params(name: &str, power: bool, brightness: u8) -> Value {
    json!({
        "LIV Hub": {
            "Name": name,
            "Hub ID": format!("SERIAL-{name}"),
            "LED Hue": 200,
            "LED Brightness": brightness,
            "Enable Repellers": power,
            "System Status": 3,
            "Error": 0,
            "Refill Life": 64.5,
            "System Runtime": 1565
        },
        "Time": {"TZ": "America/New_York"}
    })
}

fn connectivity(online: bool) -> Value {
    json!({"connectivity": {"connected": online, "timestamp": 1_757_107_867_638_i64}})
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/login2"))
        .and(body_json(json!({"user_name": "user@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accesstoken": "access-1",
            "idtoken": id_token("user-1"),
            "refreshtoken": "refresh-1"
        })))
        .mount(server)
        .await;
}

async fn mount_node_list(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/v1/user/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nodes": ids })))
        .mount(server)
        .await;
}

async fn mount_node(server: &MockServer, node_id: &str, params: Value, online: bool) {
    Mock::given(method("GET"))
        .and(path("/v1/user/nodes/params"))
        .and(query_param("nodeid", node_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(params))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/user/nodes/status"))
        .and(query_param("nodeid", node_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(connectivity(online)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/user/nodes/config"))
        .and(query_param("nodeid", node_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {"fw_version": "5.3.2", "model": "thermacell-hub"}
        })))
        .mount(server)
        .await;
}

/// Two online hubs, both powered off with the LED at 50%.
async fn two_hub_cloud() -> MockServer {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_node_list(&server, &["n1", "n2"]).await;
    mount_node(&server, "n1", hub_params("Patio", false, 50), true).await;
    mount_node(&server, "n2", hub_params("Deck", false, 50), true).await;
    server
}

fn coordinator_for(server: &MockServer, config: CoordinatorConfig) -> Coordinator<RainmakerClient> {
    let api = ApiConfig::new("user@example.com", "secret")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(300));
    Coordinator::connect(api, config.with_refresh_after_command(false)).unwrap()
}

async fn mount_accepting_put(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/v1/user/nodes/params"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(server)
        .await;
}

// ============================================================================
// Polling
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test]
    async fn poll_builds_canonical_records() {
        let server = two_hub_cloud().await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());

        assert_eq!(coordinator.refresh().await.unwrap(), 2);

        let node = coordinator.store().node("n1").unwrap();
        assert_eq!(node.name(), "Patio");
        assert_eq!(node.serial(), Some("SERIAL-Patio"));
        assert_eq!(node.fw_version(), "5.3.2");
        assert_eq!(node.model(), "Thermacell LIV Hub");
        assert_eq!(node.runtime().to_string(), "1 day, 2 hours, 5 minutes");
        assert!(node.online());

        let hub = node.device("LIV Hub").unwrap();
        assert!(!hub.power());
        assert!(!hub.led_power());
        assert_eq!(hub.led_brightness().value(), 128);
        assert_eq!(hub.system_status(), SystemStatus::Off);
        assert!((hub.refill_life() - 64.5).abs() < f64::EPSILON);
        assert!(node.device("Time").is_none());
    }

    #[tokio::test]
    async fn offline_hub_reads_not_connected() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_node_list(&server, &["n1"]).await;
        mount_node(&server, "n1", hub_params("Patio", true, 50), false).await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());

        coordinator.refresh().await.unwrap();

        assert!(!coordinator.store().is_online("n1"));
        assert!(!coordinator.store().is_available("n1"));
        assert_eq!(
            coordinator.device("n1", "LIV Hub").unwrap().system_status(),
            SystemStatus::NotConnected
        );
    }

    #[tokio::test]
    async fn zero_nodes_fails_and_keeps_previous_state() {
        let server = two_hub_cloud().await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());
        coordinator.refresh().await.unwrap();
        let before = coordinator.store().nodes();

        server.reset().await;
        mount_login(&server).await;
        mount_node_list(&server, &[]).await;

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, UpdateFailed::NoNodes));
        assert_eq!(coordinator.store().nodes(), before);
        assert!(coordinator.store().is_stale());
    }

    #[tokio::test]
    async fn unauthorized_poll_reauthenticates_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/login2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accesstoken": "access-1",
                "idtoken": id_token("user-1")
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/user/nodes"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/user/nodes"))
            .and(header("authorization", "access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nodes": ["n1"]})))
            .expect(1)
            .mount(&server)
            .await;
        mount_node(&server, "n1", hub_params("Patio", true, 50), true).await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());

        assert_eq!(coordinator.refresh().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn exhausted_timeouts_fail_the_poll() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/user/nodes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"nodes": ["n1"]}))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(3)
            .mount(&server)
            .await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            UpdateFailed::Request(RequestError::Timeout { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn node_with_failing_params_is_skipped() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_node_list(&server, &["n1", "n2"]).await;
        mount_node(&server, "n1", hub_params("Patio", true, 50), true).await;
        Mock::given(method("GET"))
            .and(path("/v1/user/nodes/params"))
            .and(query_param("nodeid", "n2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());

        assert_eq!(coordinator.refresh().await.unwrap(), 1);
        assert!(coordinator.store().node("n2").is_none());
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn brightness_143_is_sent_as_56_percent() {
        let server = two_hub_cloud().await;
        Mock::given(method("PUT"))
            .and(path("/v1/user/nodes/params"))
            .and(query_param("nodeid", "n1"))
            .and(body_json(json!({"LIV Hub": {"LED Brightness": 56}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());
        coordinator.refresh().await.unwrap();

        coordinator
            .set_device_led_brightness("n1", "LIV Hub", LedBrightness::new(143))
            .await
            .unwrap();

        // The cloud now reports the new percentage
        server.reset().await;
        mount_login(&server).await;
        mount_node_list(&server, &["n1", "n2"]).await;
        mount_node(&server, "n1", hub_params("Patio", false, 56), true).await;
        mount_node(&server, "n2", hub_params("Deck", false, 50), true).await;
        coordinator.refresh().await.unwrap();

        let host = coordinator
            .device("n1", "LIV Hub")
            .unwrap()
            .led_brightness()
            .value();
        assert!((142..=144).contains(&host));
    }

    #[tokio::test]
    async fn failed_power_toggle_changes_nothing() {
        let server = two_hub_cloud().await;
        Mock::given(method("PUT"))
            .and(path("/v1/user/nodes/params"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());
        coordinator.refresh().await.unwrap();
        let before = coordinator.store().nodes();

        let err = coordinator
            .set_device_power("n1", "LIV Hub", true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Request(RequestError::Status { status: 500, .. })
        ));
        assert_eq!(coordinator.store().nodes(), before);
    }

    #[tokio::test]
    async fn speculative_failure_restores_device() {
        let server = two_hub_cloud().await;
        Mock::given(method("PUT"))
            .and(path("/v1/user/nodes/params"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        let config = CoordinatorConfig::new().with_command_policy(CommandPolicy::Speculative);
        let coordinator = coordinator_for(&server, config);
        coordinator.refresh().await.unwrap();
        let before = coordinator.store().nodes();

        assert!(
            coordinator
                .set_device_led_color("n1", "LIV Hub", RgbColor::new(255, 0, 0))
                .await
                .is_err()
        );
        assert_eq!(coordinator.store().nodes(), before);
    }

    #[tokio::test]
    async fn commands_never_touch_other_nodes() {
        let server = two_hub_cloud().await;
        mount_accepting_put(&server).await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());
        coordinator.refresh().await.unwrap();
        let other_before = coordinator.store().node("n2").unwrap();

        coordinator
            .set_device_power("n1", "LIV Hub", true)
            .await
            .unwrap();
        coordinator
            .set_device_led_power("n1", "LIV Hub", false)
            .await
            .unwrap();
        coordinator
            .set_device_led_color("n1", "LIV Hub", RgbColor::new(0, 0, 255))
            .await
            .unwrap();
        coordinator
            .set_device_led_brightness("n1", "LIV Hub", LedBrightness::new(200))
            .await
            .unwrap();
        coordinator.reset_refill_life("n1", "LIV Hub").await.unwrap();

        assert_eq!(coordinator.store().node("n2").unwrap(), other_before);

        let target = coordinator.device("n1", "LIV Hub").unwrap();
        assert!(target.power());
        assert!(target.led_power());
        assert_eq!(target.led_brightness().value(), 200);
        assert_eq!(target.led_hue().value(), 240);
        assert!((target.refill_life() - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn poll_started_before_command_keeps_patch() {
        let server = two_hub_cloud().await;
        mount_accepting_put(&server).await;
        let coordinator = coordinator_for(&server, CoordinatorConfig::default());
        coordinator.refresh().await.unwrap();

        // A poll that was already in flight when the command landed
        let started = coordinator.store().generation();
        coordinator
            .set_device_power("n1", "LIV Hub", true)
            .await
            .unwrap();
        let stale_records = {
            let probe = coordinator_for(&server, CoordinatorConfig::default());
            probe.refresh().await.unwrap();
            probe.store().nodes()
        };
        coordinator.store().reconcile(started, stale_records);

        assert!(coordinator.device("n1", "LIV Hub").unwrap().power());

        // A poll started after the command is taken as truth
        coordinator.refresh().await.unwrap();
        assert!(!coordinator.device("n1", "LIV Hub").unwrap().power());
    }
}
