//! Demonstration of the Hand Rehab Monitor pipeline.
//!
//! This example shows how to:
//! 1. Open a subscription on a replayed feed
//! 2. Feed updates into the dashboard controller
//! 3. Classify the latest sample and summarize the window
//! 4. Track the session in an audit log
//! 5. Build a session report
//!
//! Run with: cargo run --example replay_demo

use std::io::Cursor;
use std::time::Duration;

use hand_rehab_monitor::{
    audit::AuditLog,
    core::{Channel, DashboardController, ReportBuilder, SampleOutcome, SensorLayout},
    feed::{ReplaySource, Subscription, DEFAULT_FEED_CAPACITY},
    DISCLAIMER,
};

const SINGLE_FLEX_FEED: &str = include_str!("sample_feed.jsonl");
const FIVE_FINGER_FEED: &str = include_str!("five_finger_feed.jsonl");

fn main() {
    println!("Hand Rehab Monitor - Replay Demo");
    println!("================================");
    println!();

    println!("{DISCLAIMER}");
    println!();

    run_layout(SensorLayout::SingleFlex, SINGLE_FLEX_FEED);
    println!();
    run_layout(SensorLayout::FiveFinger, FIVE_FINGER_FEED);
}

fn run_layout(layout: SensorLayout, feed: &'static str) {
    println!("Layout: {layout}");
    println!("----------------------");

    let source = ReplaySource::from_reader(layout.to_string(), Cursor::new(feed))
        .with_interval(Duration::from_millis(50));
    let subscription = match Subscription::open(source, DEFAULT_FEED_CAPACITY) {
        Ok(subscription) => subscription,
        Err(e) => {
            eprintln!("Error opening feed: {e}");
            return;
        }
    };

    let mut controller = DashboardController::new(layout, 5);
    let audit_log = AuditLog::new();

    loop {
        match subscription.recv_timeout(Duration::from_millis(500)) {
            Ok(update) => match controller.on_update(&update) {
                SampleOutcome::Accepted { evicted } => {
                    audit_log.record_accepted(evicted);
                    if let Some(classification) = controller.classify_latest() {
                        println!("  {classification}");
                    }
                }
                SampleOutcome::Skipped => {
                    audit_log.record_skipped();
                    println!("  (skipped malformed update)");
                }
            },
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    subscription.unsubscribe();

    println!();
    let averages = controller.averages();
    for group in layout.chart_groups() {
        let values: Vec<String> = group
            .channels
            .iter()
            .map(|&c| format!("{} {:.2}", c.label(), averages.get(c)))
            .collect();
        println!("  {}: {}", group.title, values.join(", "));
    }

    if let Some(summary) = controller.movement_summary() {
        println!("  Averaged movement: {summary}");
    }

    let flex_channel = layout.flex_channels()[0];
    let flex_series = controller.series(flex_channel);
    println!(
        "  {} series: {} points ({} gaps)",
        flex_channel.key(),
        flex_series.len(),
        flex_series.iter().filter(|p| p.value.is_none()).count()
    );
    if layout == SensorLayout::FiveFinger {
        println!("  Force now: {:?}", controller.latest().and_then(|s| s.force));
        println!("  Force mean: {:.2}", averages.get(Channel::Force));
    }

    let report = ReportBuilder::new().build(&controller);
    println!(
        "  Report: {} samples, {} assessments",
        report.sample_count,
        report.assessments.len()
    );
    println!();
    println!("{}", audit_log.summary());
}
