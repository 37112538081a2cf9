use chrono::Duration;
use tripreplay_core::clock::{default_start_time, PlaybackClock, PlaybackSpeed, PlaybackState};
use tripreplay_core::demo::DemoGenerator;
use tripreplay_core::replay::ReplaySession;
use tripreplay_core::state::TripStatus;
use tripreplay_core::triplog::TripId;

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn test_clock_never_passes_max_time() {
    let start = default_start_time();
    let max = start + Duration::seconds(12);
    let mut clock = PlaybackClock::new(start, max);
    clock.play();

    for speed in PlaybackSpeed::ALL {
        clock.set_speed(speed);
        for _ in 0..10 {
            clock.tick();
            assert!(clock.sim_time() <= max);
        }
    }
    assert_eq!(clock.sim_time(), max);
    assert_eq!(clock.state(), PlaybackState::Playing);
}

#[test]
fn test_speed_change_applies_on_next_tick() {
    let mut clock = PlaybackClock::default();
    clock.play();
    clock.tick();
    clock.set_speed(PlaybackSpeed::X2);
    assert_eq!(clock.sim_time(), default_start_time() + Duration::seconds(1));
    clock.tick();
    assert_eq!(clock.sim_time(), default_start_time() + Duration::seconds(3));
}

#[test]
fn test_demo_fleet_plays_to_completion() {
    init_test_logging();
    let start = default_start_time();
    let mut generator = DemoGenerator::new(42, start).with_sample_interval(Duration::minutes(10));
    let trips = generator.generate_fleet();
    let end = trips
        .iter()
        .filter_map(|t| t.log.as_ref()?.end_time())
        .max()
        .unwrap();

    let mut session = ReplaySession::new(trips, PlaybackClock::new(start, end));
    assert_eq!(session.state(TripId(2)).unwrap().status, TripStatus::Idle);
    assert_eq!(session.state(TripId(3)).unwrap().status, TripStatus::Idle);

    session.set_speed(PlaybackSpeed::X5);
    session.play();
    let mut previous_path_len = 0;
    while session.tick() {
        let path_len = session.state(TripId(1)).unwrap().path.len();
        assert!(path_len >= previous_path_len);
        previous_path_len = path_len;
        for state in session.states() {
            assert!((0.0..=100.0).contains(&state.progress));
        }
    }

    assert!(session.clock().is_at_end());
    let metrics = session.metrics();
    assert_eq!(metrics.completed, 2);
    assert_eq!(metrics.cancelled, 1);
    assert_eq!(metrics.active, 0);
    assert!((metrics.total_distance_km - (4500.0 + 35.0 + 64.0)).abs() < 1e-6);
    assert_eq!(metrics.avg_speed_kmh, 0.0);
}

#[test]
fn test_snapshot_reflects_clock_and_selection() {
    let mut session = ReplaySession::new(Vec::new(), PlaybackClock::default());
    session.toggle_play();
    session.set_speed(PlaybackSpeed::X2);
    session.select_trip(Some(TripId(4)));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.playback, PlaybackState::Playing);
    assert_eq!(snapshot.speed, PlaybackSpeed::X2);
    assert_eq!(snapshot.selected_trip, Some(TripId(4)));
    assert!(snapshot.data_error);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["speed"], serde_json::json!(2));
    assert_eq!(json["playback"], serde_json::json!("playing"));
    assert_eq!(json["dataError"], serde_json::json!(true));
}
