//! Session setup and teardown ordering.

mod support;

use std::time::Duration;

use ndiview::capture::frame::FrameKind;
use ndiview::capture::source::{SourceError, Tally, HW_ACCEL_METADATA};
use ndiview::pipeline::{Session, ShutdownFlag};
use ndiview::ReceiverConfig;

use support::{init_test_tracing, sources, Event, EventLog, MockReceiver, MockSource, MockSurface, Scripted};

fn config() -> ReceiverConfig {
    ReceiverConfig {
        discovery_timeout: Duration::ZERO,
        capture_timeout: Duration::ZERO,
        ..ReceiverConfig::default()
    }
}

fn assert_teardown_order(log: &EventLog) {
    let surface = log.position(&Event::SurfaceReleased).expect("surface released");
    let receiver = log.position(&Event::ReceiverDestroyed).expect("receiver destroyed");
    let subsystem = log.position(&Event::SubsystemShutdown).expect("subsystem shut down");
    assert!(surface < receiver, "surface must go before the receiver");
    assert!(receiver < subsystem, "receiver must go before the subsystem");
}

#[test]
fn full_session_tears_down_in_order() {
    init_test_tracing();
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    let receiver = MockReceiver::new(
        vec![
            Scripted::None,
            Scripted::video([1, 2, 3, 255]),
            Scripted::Audio,
            Scripted::video([4, 5, 6, 255]),
            Scripted::StatusChange,
        ],
        &log,
    )
    .shutdown_after(5, &shutdown);
    let source = MockSource::new(&log, vec![vec![], sources(&["STUDIO (Cam 1)"])], Some(receiver));

    let mut session = Session::open(source, MockSurface::new(&log), &config(), &shutdown)
        .expect("open succeeds")
        .expect("a source is found");
    let stats = session.run(&shutdown);
    session.teardown();

    assert_eq!(stats.uploads, 2);
    assert_eq!(log.count(&Event::Release(FrameKind::Audio)), 1);
    assert_eq!(log.count(&Event::Connected("STUDIO (Cam 1)".into())), 1);
    assert_teardown_order(&log);

    // nothing happens after the subsystem is gone
    assert_eq!(log.events().last(), Some(&Event::SubsystemShutdown));
}

#[test]
fn open_announces_tally_and_hardware_decoding() {
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    let receiver = MockReceiver::new(Vec::new(), &log);
    let source = MockSource::new(&log, vec![sources(&["A"])], Some(receiver));

    let session = Session::open(source, MockSurface::new(&log), &config(), &shutdown)
        .unwrap()
        .unwrap();

    let connected = log.position(&Event::Connected("A".into())).unwrap();
    let finder_dropped = log.position(&Event::FinderDropped).unwrap();
    let tally = log
        .position(&Event::Tally(Tally {
            on_program: true,
            on_preview: true,
        }))
        .unwrap();
    let hw_accel = log
        .position(&Event::Metadata(HW_ACCEL_METADATA.to_string()))
        .unwrap();

    assert!(connected < finder_dropped);
    assert!(finder_dropped < tally);
    assert!(tally < hw_accel);

    session.teardown();
    assert_teardown_order(&log);
}

#[test]
fn hardware_decoding_request_can_be_disabled() {
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    let receiver = MockReceiver::new(Vec::new(), &log);
    let source = MockSource::new(&log, vec![sources(&["A"])], Some(receiver));
    let config = ReceiverConfig {
        hardware_acceleration: false,
        ..config()
    };

    let session = Session::open(source, MockSurface::new(&log), &config, &shutdown)
        .unwrap()
        .unwrap();
    session.teardown();

    assert!(!log
        .events()
        .iter()
        .any(|e| matches!(e, Event::Metadata(_))));
}

#[test]
fn first_listed_source_is_chosen() {
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    let receiver = MockReceiver::new(Vec::new(), &log);
    let source = MockSource::new(
        &log,
        vec![sources(&["ZULU", "ALPHA", "MIKE"])],
        Some(receiver),
    );

    let session = Session::open(source, MockSurface::new(&log), &config(), &shutdown)
        .unwrap()
        .unwrap();
    session.teardown();

    let connects: Vec<Event> = log
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Connected(_)))
        .collect();
    assert_eq!(connects, vec![Event::Connected("ZULU".into())]);
}

#[test]
fn cancelled_discovery_releases_surface_then_subsystem() {
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    shutdown.request();
    let source = MockSource::new(&log, vec![sources(&["A"])], None);

    let session = Session::open(source, MockSurface::new(&log), &config(), &shutdown).unwrap();

    assert!(session.is_none());
    assert_eq!(log.position(&Event::Connected("A".into())), None);
    assert_eq!(
        log.events(),
        vec![
            Event::FinderCreated,
            Event::FinderDropped,
            Event::SurfaceReleased,
            Event::SubsystemShutdown,
        ]
    );
}

#[test]
fn failed_connect_releases_everything() {
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    let source = MockSource::new(&log, vec![sources(&["GONE"])], None);

    let result = Session::open(source, MockSurface::new(&log), &config(), &shutdown);

    assert!(matches!(result, Err(SourceError::ReceiverCreate(name)) if name == "GONE"));
    let surface = log.position(&Event::SurfaceReleased).unwrap();
    let subsystem = log.position(&Event::SubsystemShutdown).unwrap();
    assert!(log.position(&Event::FinderDropped).unwrap() < surface);
    assert!(surface < subsystem);
}

#[test]
fn window_close_tears_down_in_order() {
    let log = EventLog::default();
    let shutdown = ShutdownFlag::new();
    let receiver = MockReceiver::new(vec![Scripted::video([9, 9, 9, 255]); 4], &log);
    let source = MockSource::new(&log, vec![sources(&["A"])], Some(receiver));
    let surface = MockSurface::new(&log).close_after(2);

    let mut session = Session::open(source, surface, &config(), &shutdown)
        .unwrap()
        .unwrap();
    let stats = session.run(&shutdown);
    session.teardown();

    assert_eq!(stats.iterations, 2);
    assert!(!shutdown.is_requested());
    assert_teardown_order(&log);
}
