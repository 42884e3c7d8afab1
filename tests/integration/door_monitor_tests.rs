//! Integration tests for the `DoorMonitor` control loop.
//!
//! Drives startup, door sampling, reconnection and shutdown through the
//! port traits with a manual clock, verifying indicator colours, published
//! payloads and emitted events.

use super::mock_hw::*;

use doorwatch::adapters::mqtt::MqttAdapter;
use doorwatch::app::events::AppEvent;
use doorwatch::app::ports::colour;
use doorwatch::app::service::DoorMonitor;
use doorwatch::config::SystemConfig;
use doorwatch::error::{ConnectError, PublishError};
use doorwatch::fsm::DoorState;

const STATUS: &str = "doorwatch/feeds/system-status";

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_walks_the_indicator_through_boot_colours() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.net.up = false;

    rig.start().unwrap();

    assert_eq!(
        rig.hw.colours,
        vec![colour::STARTING, colour::NETWORK_UP, colour::NORMAL]
    );
    assert_eq!(rig.net.connects, 1);
    assert_eq!(rig.status_feed(), vec!["Door sensor is connected"]);
    assert_eq!(
        rig.client().subscriptions,
        vec!["doorwatch/feeds/reset-button", "doorwatch/feeds/status-button"]
    );
    assert_eq!(rig.client().identities, vec!["deadbeefcafe"]);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(DoorState::Closed)]);
}

#[test]
fn start_skips_the_join_when_network_is_already_up() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.start().unwrap();
    assert_eq!(rig.net.connects, 0);
    assert!(rig.monitor.telemetry().is_connected());
}

#[test]
fn offline_start_schedules_a_reconnect() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.net.up = false;
    rig.net.fail_connects = 1;

    assert_eq!(rig.start(), Err(ConnectError::NetworkDown));
    assert_eq!(rig.hw.colours, vec![colour::STARTING]);
    assert_eq!(
        rig.sink.events,
        vec![
            AppEvent::Started(DoorState::Closed),
            AppEvent::TelemetryLost { retry_in_secs: 2 },
        ]
    );
    assert!(rig.monitor.backoff().is_armed());

    // The retry is due two seconds after boot.
    for _ in 0..19 {
        rig.step(100);
    }
    assert!(!rig.monitor.telemetry().is_connected());
    rig.step(100);
    assert!(rig.monitor.telemetry().is_connected());
    assert_eq!(rig.hw.colours.last(), Some(&colour::NORMAL));
}

#[test]
fn refused_broker_leaves_monitor_offline() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.client_mut().refuse_connects = 1;

    assert_eq!(rig.start(), Err(ConnectError::Rejected));
    assert_eq!(rig.hw.colours, vec![colour::STARTING, colour::NETWORK_UP]);
    assert!(rig.status_feed().is_empty());
}

// ── Door sampling ─────────────────────────────────────────────

#[test]
fn closed_door_at_boot_publishes_nothing() {
    let mut rig = Rig::started();
    for _ in 0..10 {
        assert_eq!(rig.step(100), None);
    }
    assert_eq!(rig.monitor.state(), DoorState::Closed);
    assert_eq!(rig.status_feed(), vec!["Door sensor is connected"]);
}

#[test]
fn opened_door_is_published_after_the_window() {
    let mut rig = Rig::started();
    rig.hw.level = true;

    assert_eq!(rig.step(100), None); // level change seen
    let edge = rig.step(100).expect("stable for the full window");

    assert_eq!(edge.from, DoorState::Closed);
    assert_eq!(edge.to, DoorState::Open);
    assert_eq!(rig.monitor.state(), DoorState::Open);
    assert_eq!(rig.status_feed().last().map(String::as_str), Some("OPEN"));
    assert!(rig.sink.events.contains(&AppEvent::DoorChanged {
        from: DoorState::Closed,
        to: DoorState::Open,
    }));
}

#[test]
fn open_then_closed_publishes_both_labels_once() {
    let mut rig = Rig::started();
    rig.hw.level = true;
    for _ in 0..5 {
        rig.step(100);
    }
    rig.hw.level = false;
    for _ in 0..5 {
        rig.step(100);
    }

    assert_eq!(
        rig.status_feed(),
        vec!["Door sensor is connected", "OPEN", "CLOSED"]
    );
    assert_eq!(rig.monitor.state(), DoorState::Closed);
}

#[test]
fn contact_bounce_is_suppressed() {
    let mut rig = Rig::started();
    for i in 0..20 {
        rig.hw.level = i % 2 == 0;
        assert_eq!(rig.step(50), None);
    }
    assert_eq!(rig.monitor.state(), DoorState::Closed);
    assert_eq!(rig.status_feed().len(), 1);
}

#[test]
fn short_window_opens_on_the_sixth_sample() {
    let cfg = SystemConfig {
        debounce_window_ms: 2,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(cfg);
    rig.start().unwrap();

    let levels = [false, false, false, true, true, true];
    let mut edges = Vec::new();
    for (i, level) in levels.into_iter().enumerate() {
        rig.hw.level = level;
        if let Some(edge) = rig.tick() {
            edges.push((i, edge.to));
        }
        rig.clock.advance(1);
    }

    assert_eq!(edges, vec![(5, DoorState::Open)]);
}

#[test]
fn failed_publish_keeps_the_new_state() {
    let mut rig = Rig::started();
    rig.client_mut().fail_publishes = 1;
    rig.hw.level = true;

    rig.step(100);
    let edge = rig.step(100);

    assert_eq!(edge.map(|e| e.to), Some(DoorState::Open));
    assert_eq!(rig.monitor.state(), DoorState::Open);
    assert!(!rig.status_feed().iter().any(|p| p == "OPEN"));
    assert_eq!(rig.monitor.telemetry().failed_count(), 1);

    // No retry: the state is only republished on the next edge.
    for _ in 0..5 {
        rig.step(100);
    }
    assert!(!rig.status_feed().iter().any(|p| p == "OPEN"));
}

#[test]
fn sensor_read_failure_is_skipped_until_it_recovers() {
    let mut rig = Rig::started();
    rig.hw.read_fails = true;
    rig.hw.level = true;
    for _ in 0..5 {
        assert_eq!(rig.step(100), None);
    }
    assert_eq!(rig.monitor.state(), DoorState::Closed);

    rig.hw.read_fails = false;
    rig.step(100);
    assert_eq!(rig.step(100).map(|e| e.to), Some(DoorState::Open));
}

// ── Publishing while offline ──────────────────────────────────

#[test]
fn publish_while_disconnected_counts_a_failure() {
    let mut rig = Rig::new(SystemConfig::default());
    let result = rig.monitor.telemetry_mut().publish_str(STATUS, "OPEN");
    assert_eq!(result, Err(PublishError::NotConnected));
    assert_eq!(rig.monitor.telemetry().failed_count(), 1);
    assert!(rig.client().published.is_empty());
}

#[test]
fn edge_while_offline_is_resynced_after_reconnect() {
    let mut rig = Rig::started();
    rig.client_mut().lose_connection = true;
    rig.hw.level = true;

    rig.step(100); // loss detected, level change seen
    rig.step(100); // OPEN, not deliverable
    assert_eq!(rig.monitor.state(), DoorState::Open);
    assert!(!rig.status_feed().iter().any(|p| p == "OPEN"));

    for _ in 0..20 {
        rig.step(100);
    }
    assert!(rig.monitor.telemetry().is_connected());
    assert_eq!(rig.status_feed().last().map(String::as_str), Some("OPEN"));
}

// ── Reconnection ──────────────────────────────────────────────

#[test]
fn lost_session_reconnects_after_two_seconds() {
    let mut rig = Rig::started();
    rig.client_mut().lose_connection = true;

    rig.step(100);
    assert_eq!(rig.hw.colours.last(), Some(&colour::STARTING));
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::TelemetryLost { retry_in_secs: 2 })
    );

    for _ in 0..19 {
        rig.step(100);
        assert!(!rig.monitor.telemetry().is_connected());
    }
    rig.step(100);
    assert_eq!(rig.clock.now_ms, 2_100);
    assert!(rig.monitor.telemetry().is_connected());
    assert_eq!(rig.client().connects, 2);
    assert_eq!(rig.hw.colours.last(), Some(&colour::NORMAL));
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::TelemetryRestored { attempts: 1 }));
    assert_eq!(
        rig.status_feed(),
        vec![
            "Door sensor is connected",
            "Door sensor is connected",
            "CLOSED"
        ]
    );
    // Command topics are subscribed again on the new session.
    assert_eq!(rig.client().subscriptions.len(), 4);
}

#[test]
fn refused_reconnects_back_off_exponentially() {
    let mut rig = Rig::started();
    rig.client_mut().lose_connection = true;
    rig.client_mut().refuse_connects = 2;

    let mut reconnected_at = None;
    for _ in 0..200 {
        rig.step(100);
        if rig.monitor.telemetry().is_connected() {
            reconnected_at = Some(rig.clock.now_ms);
            break;
        }
    }

    // Loss at 100 ms, attempts at 2.1 s, 6.1 s and 14.1 s.
    assert_eq!(reconnected_at, Some(14_100));
    assert_eq!(rig.client().connects, 4);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::TelemetryRestored { attempts: 3 }));
    assert_eq!(rig.monitor.backoff().attempts(), 0);
}

#[test]
fn network_loss_is_rejoined_before_the_broker() {
    let mut rig = Rig::started();
    rig.client_mut().lose_connection = true;
    rig.net.up = false;

    for _ in 0..21 {
        rig.step(100);
    }
    assert_eq!(rig.net.connects, 1);
    assert!(rig.net.up);
    assert!(rig.monitor.telemetry().is_connected());
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_announces_and_releases_everything() {
    let mut rig = Rig::started();
    rig.monitor
        .shutdown(&mut rig.hw, &mut rig.net, &mut rig.sink);

    assert_eq!(
        rig.status_feed().last().map(String::as_str),
        Some("Door sensor is disconnecting")
    );
    assert!(!rig.client().session);
    assert!(!rig.monitor.telemetry().is_connected());
    assert_eq!(rig.net.disconnects, 1);
    assert_eq!(rig.hw.last_colour(), Some(colour::STOPPED));
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::Stopping));
}

#[test]
fn shutdown_while_offline_publishes_nothing() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.monitor
        .shutdown(&mut rig.hw, &mut rig.net, &mut rig.sink);
    assert!(rig.client().published.is_empty());
    assert_eq!(rig.hw.last_colour(), Some(colour::STOPPED));
}

#[test]
fn run_ticks_until_stop_and_feeds_every_iteration() {
    let mut rig = Rig::started();
    let mut checks = 0;
    let mut feeds = 0;

    rig.monitor.run(
        &mut rig.hw,
        &mut rig.net,
        &mut rig.clock,
        &mut rig.sink,
        |_| {
            checks += 1;
            checks > 4
        },
        || feeds += 1,
    );

    assert_eq!(feeds, 4);
    assert_eq!(rig.monitor.tick_count(), 4);
    assert_eq!(rig.clock.delays, vec![100; 4]);
    assert_eq!(rig.hw.last_colour(), Some(colour::STOPPED));
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::Stopping));
}

#[test]
fn run_publishes_edges_between_stop_checks() {
    let mut rig = Rig::started();
    rig.hw.level = true;

    rig.monitor.run(
        &mut rig.hw,
        &mut rig.net,
        &mut rig.clock,
        &mut rig.sink,
        |now| now >= 1_000,
        || {},
    );

    assert_eq!(
        rig.status_feed(),
        vec![
            "Door sensor is connected",
            "OPEN",
            "Door sensor is disconnecting"
        ]
    );
}

// ── Simulated MQTT adapter ────────────────────────────────────

#[test]
fn end_to_end_with_simulated_broker() {
    let cfg = SystemConfig::default();
    let mut monitor = DoorMonitor::new(cfg, MqttAdapter::new(5_000), "deadbeefcafe", 0);
    let mut hw = MockHardware::new();
    let mut net = MockNet::new();
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    monitor.start(&mut hw, &mut net, &mut clock, &mut sink).unwrap();
    assert_eq!(monitor.telemetry().client().subscriptions().len(), 2);

    hw.level = true;
    for _ in 0..3 {
        clock.advance(100);
        monitor.tick(&mut hw, &mut net, &mut clock, &mut sink);
    }
    assert!(monitor.telemetry().client().inject("doorwatch/feeds/status-button", b"1"));
    monitor.tick(&mut hw, &mut net, &mut clock, &mut sink);

    let payloads: Vec<&[u8]> = monitor
        .telemetry()
        .client()
        .published()
        .iter()
        .map(|(_, p)| p.as_slice())
        .collect();
    assert_eq!(
        payloads,
        vec![
            b"Door sensor is connected".as_slice(),
            b"OPEN".as_slice(),
            b"System alive".as_slice(),
            b"OPEN".as_slice(),
        ]
    );

    monitor.telemetry().client().drop_connection();
    monitor.tick(&mut hw, &mut net, &mut clock, &mut sink);
    assert!(!monitor.telemetry().is_connected());
    assert!(!monitor.telemetry().client().has_session());
    assert_eq!(hw.last_colour(), Some(colour::STARTING));
}
