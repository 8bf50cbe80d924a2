//! Integration tests for the feed → controller → report pipeline

use hand_rehab_monitor::audit::AuditLog;
use hand_rehab_monitor::config::Config;
use hand_rehab_monitor::core::{
    Channel, Classification, DashboardController, FeedState, Finger, PostureBand, ReportBuilder,
    SampleOutcome, SensorLayout, SessionReport,
};
use hand_rehab_monitor::feed::{read_line_lossy, FeedUpdate, ReplaySource, Subscription};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

fn single_flex(flex: i64, accel_x: f64) -> String {
    format!(
        r#"{{"FlexSensor": {{"RawValue": {flex}, "Voltage": 1.5}},
            "MPU6050": {{"Acceleration_X": {accel_x}, "Acceleration_Y": 0.0, "Acceleration_Z": 0.0,
                         "Gyro_X": 0.0, "Gyro_Y": 0.0, "Gyro_Z": 0.0}}}}"#
    )
}

fn five_finger(thumb: i64, force: f64) -> String {
    format!(r#"{{"FlexSensor": {{"Flex1": {{"RawValue": {thumb}}}}}, "ForceSensor": {{"RawValue": {force}}}}}"#)
}

/// Drain a subscription into the controller until the source finishes.
fn drain(subscription: &Subscription, controller: &mut DashboardController, audit: &AuditLog) {
    loop {
        match subscription.recv_timeout(Duration::from_secs(5)) {
            Ok(update) => match controller.on_update(&update) {
                SampleOutcome::Accepted { evicted } => audit.record_accepted(evicted),
                SampleOutcome::Skipped => audit.record_skipped(),
            },
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => panic!("feed stalled"),
        }
    }
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("hand-rehab-pipeline-test");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(format!("{name}-{}", std::process::id()))
}

#[test]
fn test_window_keeps_last_capacity_samples_in_order() {
    let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);

    for i in 0..40 {
        controller.on_sample(&single_flex(i, 0.0));
        assert!(controller.buffer().len() <= 31);
    }

    let flex: Vec<i32> = controller
        .buffer()
        .all()
        .filter_map(|s| s.flex())
        .collect();
    let expected: Vec<i32> = (9..40).collect();
    assert_eq!(flex, expected);
}

#[test]
fn test_loading_until_first_valid_sample() {
    let mut controller = DashboardController::new(SensorLayout::FiveFinger, 31);
    assert_eq!(controller.state(), FeedState::Loading);
    assert!(controller.latest().is_none());
    assert!(controller.classify_latest().is_none());
    assert_eq!(controller.averages().get(Channel::Flex1), 0.0);

    assert_eq!(controller.on_sample("null"), SampleOutcome::Skipped);
    assert_eq!(controller.on_sample("{}"), SampleOutcome::Skipped);
    assert_eq!(controller.state(), FeedState::Loading);

    assert!(controller.on_sample(&five_finger(100, 1.0)).is_accepted());
    assert_eq!(controller.state(), FeedState::Ready);

    controller.on_sample("garbage");
    assert_eq!(controller.state(), FeedState::Ready);
}

#[test]
fn test_mean_of_ten_twenty_thirty() {
    let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);
    for flex in [10, 20, 30] {
        controller.on_sample(&single_flex(flex, 0.0));
    }
    let averages = controller.averages();
    assert_eq!(averages.rounded(Channel::Flex), 20.0);

    // Queries have no side effects
    assert_eq!(controller.averages(), averages);
}

#[test]
fn test_rule_set_a_through_controller() {
    let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);

    controller.on_sample(&single_flex(700, 0.9));
    match controller.classify_latest() {
        Some(Classification::Movement(m)) => assert_eq!(m.label(), "Flexion, Ulnar Deviation"),
        other => panic!("unexpected classification: {other:?}"),
    }

    controller.on_sample(&single_flex(400, 0.0));
    let movement = controller.current_movement().unwrap();
    assert!(movement.is_neutral());
    assert_eq!(movement.label(), "Neutral Position");
}

#[test]
fn test_rule_set_b_boundaries_through_controller() {
    let mut controller = DashboardController::new(SensorLayout::FiveFinger, 31);
    let cases = [
        (112, PostureBand::Neutral, false, false),
        (113, PostureBand::MidRange, true, true),
        (225, PostureBand::MidRange, true, true),
        (226, PostureBand::Full, true, false),
    ];

    for (flex, band, arom, fine_motor) in cases {
        controller.on_sample(&five_finger(flex, 0.0));
        let assessment = controller.assess_finger(Finger::Thumb).unwrap();
        assert_eq!(assessment.band, band, "flex {flex}");
        assert_eq!(assessment.flags.arom, arom, "flex {flex}");
        assert_eq!(assessment.flags.fine_motor, fine_motor, "flex {flex}");
    }

    controller.on_sample(&five_finger(150, 2.0));
    assert!(!controller.assess_finger(Finger::Thumb).unwrap().flags.grasp_adequate);
    controller.on_sample(&five_finger(150, 2.01));
    assert!(controller.assess_finger(Finger::Thumb).unwrap().flags.grasp_adequate);

    // Fingers without a reading are not assessed
    assert!(controller.assess_finger(Finger::Pinky).is_none());
}

#[test]
fn test_manual_subscription_feeds_controller() {
    let (sink, subscription) = Subscription::channel(8);
    let mut controller = DashboardController::new(SensorLayout::SingleFlex, 3);
    let audit = AuditLog::new();

    let producer = std::thread::spawn(move || {
        for flex in [100, 200, 700, 800] {
            assert!(sink.push(single_flex(flex, 0.0)));
        }
        assert!(sink.send(FeedUpdate::new("not json")));
    });
    producer.join().unwrap();

    drain(&subscription, &mut controller, &audit);
    subscription.unsubscribe();

    let stats = audit.stats();
    assert_eq!(stats.payloads_received, 5);
    assert_eq!(stats.samples_accepted, 4);
    assert_eq!(stats.payloads_skipped, 1);
    assert_eq!(stats.samples_evicted, 1);

    assert_eq!(controller.buffer().len(), 3);
    assert_eq!(controller.latest().and_then(|s| s.flex()), Some(800));
}

#[test]
fn test_invalid_utf8_line_is_skipped_not_fatal() {
    let mut data = single_flex(700, 0.9).replace('\n', " ").into_bytes();
    data.extend_from_slice(b"\n\xff\xfe\n");
    data.extend_from_slice(single_flex(200, 0.0).replace('\n', " ").as_bytes());
    data.push(b'\n');

    let mut reader = Cursor::new(data);
    let mut buf = Vec::new();
    let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);
    let audit = AuditLog::new();
    while let Some(line) = read_line_lossy(&mut reader, &mut buf).unwrap() {
        match controller.on_sample(line.trim()) {
            SampleOutcome::Accepted { evicted } => audit.record_accepted(evicted),
            SampleOutcome::Skipped => audit.record_skipped(),
        }
    }

    assert_eq!(audit.stats().samples_accepted, 2);
    assert_eq!(audit.stats().payloads_skipped, 1);
    assert_eq!(controller.latest().and_then(|s| s.flex()), Some(200));
}

#[test]
fn test_replay_file_to_report() {
    let path = temp_path("replay.jsonl");
    let lines = [
        five_finger(95, 1.0),
        String::new(),
        five_finger(140, 2.5),
        "[1, 2, 3]".to_string(),
        five_finger(230, 3.0),
    ];
    std::fs::write(&path, lines.join("\n")).unwrap();

    let source = ReplaySource::from_path(&path).unwrap();
    let subscription = Subscription::open(source, 4).unwrap();
    let mut controller = DashboardController::new(SensorLayout::FiveFinger, 31);
    let audit = AuditLog::new();

    drain(&subscription, &mut controller, &audit);
    subscription.unsubscribe();

    assert_eq!(audit.stats().samples_accepted, 3);
    assert_eq!(audit.stats().payloads_skipped, 1);

    let averages = controller.averages();
    assert_eq!(averages.rounded(Channel::Flex1), 155.0);
    assert_eq!(averages.rounded(Channel::Force), 2.17);
    // Missing fingers are excluded, not averaged as zero
    assert_eq!(averages.get(Channel::Flex2), 0.0);
    // IMU channels default to zero in this layout
    assert_eq!(averages.get(Channel::AccelX), 0.0);

    let json = ReportBuilder::new()
        .with_session_id("SESS-TEST".to_string())
        .build_json(&controller);
    let report: SessionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(report.layout, SensorLayout::FiveFinger);
    assert_eq!(report.sample_count, 3);
    assert_eq!(report.session_id.as_deref(), Some("SESS-TEST"));
    assert_eq!(report.assessments.len(), 1);
    assert_eq!(report.assessments[0].band, PostureBand::Full);
    assert!(report.assessments[0].flags.grasp_adequate);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_unsubscribe_stops_paced_replay() {
    let feed: String = (0..100)
        .map(|i| single_flex(i, 0.0).replace('\n', " ") + "\n")
        .collect();
    let source = ReplaySource::from_reader("slow", Cursor::new(feed))
        .with_interval(Duration::from_secs(10));
    let subscription = Subscription::open(source, 4).unwrap();

    let first = subscription.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(first.body.contains("RawValue"));

    let started = std::time::Instant::now();
    subscription.unsubscribe();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_series_keeps_gaps_and_time_labels() {
    use chrono::{TimeZone, Utc};

    let mut controller = DashboardController::new(SensorLayout::SingleFlex, 31);
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 1).unwrap();

    controller.on_update(&FeedUpdate::at(t0, single_flex(500, 0.0)));
    controller.on_update(&FeedUpdate::at(t1, r#"{"MPU6050": {"Gyro_X": 0.7}}"#));

    let flex = controller.series(Channel::Flex);
    assert_eq!(flex.len(), 2);
    assert_eq!(flex[0].time_label, "14:05:00");
    assert_eq!(flex[0].value, Some(500.0));
    assert_eq!(flex[1].time_label, "14:05:01");
    assert_eq!(flex[1].value, None);

    // The gap is excluded from the mean
    assert_eq!(controller.averages().get(Channel::Flex), 500.0);
    assert_eq!(
        controller.current_movement().unwrap().label(),
        "External Rotation"
    );
}

#[test]
fn test_controller_from_config() {
    let mut config = Config {
        layout: SensorLayout::SingleFlex,
        buffer_capacity: 2,
        display_timezone: "Asia/Kolkata".to_string(),
        ..Config::default()
    };
    config.thresholds.movement.flexion_min = 500.0;

    let mut controller = DashboardController::from_config(&config).unwrap();
    assert_eq!(controller.layout(), SensorLayout::SingleFlex);

    controller.on_sample(&single_flex(550, 0.0));
    assert_eq!(controller.current_movement().unwrap().label(), "Flexion");

    for flex in [1, 2, 3] {
        controller.on_sample(&single_flex(flex, 0.0));
    }
    assert_eq!(controller.buffer().len(), 2);

    config.buffer_capacity = 0;
    assert!(DashboardController::from_config(&config).is_err());
}
