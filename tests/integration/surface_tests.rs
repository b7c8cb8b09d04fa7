//! Integration tests for the status/config surface: routing, form
//! submission semantics and the HTTP-task bridge.

use std::thread;
use std::time::Duration;

use super::mock_hw::{LogSink, MockHardware};

use dumpload::adapters::region::MemoryRegion;
use dumpload::app::service::RegulatorService;
use dumpload::config::RegulatorConfig;
use dumpload::store::{ConfigStore, REGION_SIZE};
use dumpload::surface::channels::{BridgeError, SurfaceBridge};
use dumpload::surface::handler::{Method, Response, route};

fn running_service(volts: f32) -> (RegulatorService<MemoryRegion>, MockHardware, LogSink) {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    let mut svc = RegulatorService::new(store);
    let mut hw = MockHardware::with_voltages(&[volts]);
    let mut sink = LogSink::new();
    svc.start(&mut hw, &mut sink).unwrap();
    (svc, hw, sink)
}

fn json(resp: &Response) -> serde_json::Value {
    match resp {
        Response::Json { body, .. } => serde_json::from_str(body).unwrap(),
        Response::Redirect { .. } => panic!("expected JSON, got redirect"),
    }
}

// ── GET ───────────────────────────────────────────────────────

#[test]
fn status_reports_readings_and_decision() {
    let (mut svc, _hw, mut sink) = running_service(27.25);
    for path in ["/", "/api/status", "/api/status?refresh=1"] {
        let resp = route(&mut svc, Method::Get, path, b"", &mut sink);
        assert_eq!(resp.status(), 200, "{path}");
        let v = json(&resp);
        assert_eq!(v["bus_voltage"], 27.25);
        assert_eq!(v["current"], 1.0);
        assert_eq!(v["dump_active"], false);
        assert_eq!(v["degraded"], false);
    }
}

#[test]
fn config_reports_live_values() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    let resp = route(&mut svc, Method::Get, "/api/config", b"", &mut sink);
    let v = json(&resp);
    let d = RegulatorConfig::default();
    assert_eq!(v["absorption_voltage"].as_f64().unwrap() as f32, d.absorption_voltage);
    assert_eq!(v["manual_override"], false);
}

#[test]
fn unknown_route_and_wrong_method() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    assert_eq!(route(&mut svc, Method::Get, "/nope", b"", &mut sink).status(), 404);
    assert_eq!(route(&mut svc, Method::Post, "/api/status", b"", &mut sink).status(), 405);
    assert_eq!(route(&mut svc, Method::Other, "/api/config", b"", &mut sink).status(), 405);
}

// ── POST ──────────────────────────────────────────────────────

#[test]
fn valid_post_redirects_and_persists() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    let resp = route(
        &mut svc,
        Method::Post,
        "/api/config",
        b"abs=34.0&float=32.0&hyst=0.5&override=on",
        &mut sink,
    );
    assert_eq!(resp, Response::Redirect { location: "/" });
    assert_eq!(svc.config().absorption_voltage, 34.0);
    assert!(svc.config().manual_override);
    assert!(!svc.config().manual_dump_load);
    assert_eq!(svc.store().storage().commit_count(), 1);
}

#[test]
fn each_submission_resets_unticked_boxes() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    route(&mut svc, Method::Post, "/api/config", b"override=on&manual=on", &mut sink);
    assert!(svc.config().manual_override && svc.config().manual_dump_load);

    route(&mut svc, Method::Post, "/api/config", b"abs=29.0", &mut sink);
    assert!(!svc.config().manual_override);
    assert!(!svc.config().manual_dump_load);
}

#[test]
fn partially_invalid_post_lists_rejected_fields() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    let resp = route(
        &mut svc,
        Method::Post,
        "/api/config",
        b"abs=30.0&hyst=-1&float=lots",
        &mut sink,
    );
    assert_eq!(resp.status(), 422);
    let v = json(&resp);
    let rejected: Vec<&str> = v["rejected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(rejected, vec!["float", "hyst"]);

    // Good field kept, bad fields retained their prior values.
    let d = RegulatorConfig::default();
    assert_eq!(svc.config().absorption_voltage, 30.0);
    assert_eq!(svc.config().hysteresis, d.hysteresis);
    assert_eq!(svc.config().float_voltage, d.float_voltage);
}

#[test]
fn undecodable_keys_do_not_sink_the_submission() {
    for body in [&b"abs=30&%FF=1"[..], b"abs=30&x%zz=1"] {
        let (mut svc, _hw, mut sink) = running_service(27.0);
        let resp = route(&mut svc, Method::Post, "/api/config", body, &mut sink);
        assert_eq!(resp, Response::Redirect { location: "/" });
        assert_eq!(svc.config().absorption_voltage, 30.0);
    }
}

#[test]
fn oversized_body_is_refused() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    let big = vec![b'x'; 1024];
    assert_eq!(route(&mut svc, Method::Post, "/api/config", &big, &mut sink).status(), 413);
    assert_eq!(*svc.config(), RegulatorConfig::default());
}

#[test]
fn save_failure_answers_500() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    svc.store_mut().storage_mut().fail_commits(true);
    let resp = route(&mut svc, Method::Post, "/api/config", b"hyst=1.5", &mut sink);
    assert_eq!(resp.status(), 500);
    assert_eq!(svc.config().hysteresis, 1.5, "in-memory copy stays authoritative");
}

#[test]
fn save_failure_still_lists_rejected_fields() {
    let (mut svc, _hw, mut sink) = running_service(27.0);
    svc.store_mut().storage_mut().fail_commits(true);
    let resp = route(
        &mut svc,
        Method::Post,
        "/api/config",
        b"hyst=1.5&float=lots&abs=500",
        &mut sink,
    );
    assert_eq!(resp.status(), 500);
    let v = json(&resp);
    let rejected: Vec<&str> = v["rejected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(rejected, vec!["float", "abs"]);
}

// ── Bridge ────────────────────────────────────────────────────

#[test]
fn bridge_round_trips_a_request() {
    static BRIDGE: SurfaceBridge = SurfaceBridge::new();
    let (mut svc, _hw, mut sink) = running_service(27.0);

    let client = thread::spawn(|| {
        BRIDGE.submit(Method::Post, "/api/config", b"abs=31.5", Duration::from_secs(5))
    });

    // Act as the control loop until the request has been answered.
    let mut served = 0;
    for _ in 0..1000 {
        served += BRIDGE.serve_pending(&mut svc, &mut sink, 4);
        if served > 0 {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(served, 1);

    let resp = client.join().unwrap().unwrap();
    assert_eq!(resp, Response::Redirect { location: "/" });
    assert_eq!(svc.config().absorption_voltage, 31.5);
    assert_eq!(BRIDGE.latest_status().map(|s| s.bus_voltage), Some(27.0));
}

#[test]
fn bridge_times_out_without_a_loop() {
    static BRIDGE: SurfaceBridge = SurfaceBridge::new();
    let result = BRIDGE.submit(Method::Get, "/api/status", b"", Duration::from_millis(20));
    assert_eq!(result, Err(BridgeError::Timeout));
}

#[test]
fn bridge_refuses_oversized_path() {
    static BRIDGE: SurfaceBridge = SurfaceBridge::new();
    let long = "/".repeat(100);
    let result = BRIDGE.submit(Method::Get, &long, b"", Duration::from_millis(20));
    assert_eq!(result, Err(BridgeError::TooLarge));
}

#[test]
fn expired_request_is_never_applied() {
    static BRIDGE: SurfaceBridge = SurfaceBridge::new();
    let (mut svc, _hw, mut sink) = running_service(27.0);

    let result = BRIDGE.submit(Method::Post, "/api/config", b"abs=40", Duration::from_millis(1));
    assert_eq!(result, Err(BridgeError::Timeout));

    assert_eq!(BRIDGE.serve_pending(&mut svc, &mut sink, 4), 0);
    assert_eq!(BRIDGE.pending(), 0, "expired request discarded");
    assert_eq!(*svc.config(), RegulatorConfig::default());
    assert_eq!(svc.store().storage().commit_count(), 0);
}

#[test]
fn concurrent_waiters_each_get_their_own_reply() {
    static BRIDGE: SurfaceBridge = SurfaceBridge::new();
    let (mut svc, _hw, mut sink) = running_service(27.0);

    for _ in 0..20 {
        let clients: Vec<_> = (0..2)
            .map(|_| {
                thread::spawn(|| {
                    BRIDGE.submit(Method::Get, "/api/status", b"", Duration::from_secs(5))
                })
            })
            .collect();

        while !clients.iter().all(|c| c.is_finished()) {
            BRIDGE.serve_pending(&mut svc, &mut sink, 4);
            thread::sleep(Duration::from_millis(1));
        }
        for client in clients {
            assert_eq!(client.join().unwrap().map(|r| r.status()), Ok(200));
        }
    }
}

#[test]
fn serve_pending_respects_budget() {
    static BRIDGE: SurfaceBridge = SurfaceBridge::new();
    let (mut svc, _hw, mut sink) = running_service(27.0);

    let clients: Vec<_> = (0..3)
        .map(|_| {
            thread::spawn(|| {
                BRIDGE.submit(Method::Get, "/api/status", b"", Duration::from_secs(5))
            })
        })
        .collect();
    for _ in 0..1000 {
        if BRIDGE.pending() == 3 {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(BRIDGE.pending(), 3);

    assert_eq!(BRIDGE.serve_pending(&mut svc, &mut sink, 2), 2);
    assert_eq!(BRIDGE.serve_pending(&mut svc, &mut sink, 2), 1);
    assert_eq!(BRIDGE.serve_pending(&mut svc, &mut sink, 2), 0);
    for client in clients {
        assert!(client.join().unwrap().is_ok());
    }
}
