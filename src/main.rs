//! Hand Rehab Monitor CLI
//!
//! Sliding-window movement classification for a hand rehabilitation glove.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use hand_rehab_monitor::{
    audit::create_shared_log_with_persistence,
    config::Config,
    core::{
        rules::{
            AROM_DESCRIPTION, FINE_MOTOR_DESCRIPTION, GRASP_DESCRIPTION, PROM_DESCRIPTION,
        },
        Classification, DashboardController, ReportBuilder, SampleOutcome, SensorLayout,
    },
    feed::{read_line_lossy, ReplaySource, Subscription, DEFAULT_FEED_CAPACITY},
    DISCLAIMER, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hand-rehab")]
#[command(author = "Hand Rehab")]
#[command(version = VERSION)]
#[command(about = "Sliding-window movement classification for a hand rehabilitation glove", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to a feed and classify every update as it arrives
    Watch {
        /// JSON-lines feed to replay, or "-" for standard input
        #[arg(long, short, default_value = "-")]
        input: PathBuf,

        /// Glove layout (single_flex or five_finger); overrides the config file
        #[arg(long)]
        layout: Option<SensorLayout>,

        /// Pause between replayed updates in milliseconds; overrides the config file
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Skip writing a session report on exit
        #[arg(long)]
        no_export: bool,
    },

    /// Ingest a whole recording and print the window summary
    Summary {
        /// JSON-lines recording
        #[arg(long, short)]
        input: PathBuf,

        /// Glove layout (single_flex or five_finger); overrides the config file
        #[arg(long)]
        layout: Option<SensorLayout>,

        /// Print the session report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Classify a single payload
    Classify {
        /// Glove layout (single_flex or five_finger); overrides the config file
        #[arg(long)]
        layout: Option<SensorLayout>,

        /// Payload as JSON text
        payload: String,
    },

    /// Show configuration and cumulative statistics
    Status,

    /// Show configuration
    Config {
        /// Overwrite the config file with the default configuration
        #[arg(long)]
        reset: bool,
    },

    /// Display usage disclaimer
    Disclaimer,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch {
            input,
            layout,
            interval_ms,
            no_export,
        } => cmd_watch(&input, layout, interval_ms, no_export),
        Commands::Summary {
            input,
            layout,
            json,
        } => cmd_summary(&input, layout, json),
        Commands::Classify { layout, payload } => cmd_classify(layout, &payload),
        Commands::Status => cmd_status(),
        Commands::Config { reset } => cmd_config(reset),
        Commands::Disclaimer => {
            println!("{DISCLAIMER}");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Load the config file, falling back to defaults when it is unreadable.
fn load_config(layout: Option<SensorLayout>) -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("could not load configuration, using defaults: {e}");
        Config::default()
    });
    if let Some(layout) = layout {
        config.layout = layout;
    }
    config
}

fn is_stdin(input: &Path) -> bool {
    input.as_os_str() == "-"
}

fn cmd_watch(
    input: &Path,
    layout: Option<SensorLayout>,
    interval_ms: Option<u64>,
    no_export: bool,
) -> Result<()> {
    let mut config = load_config(layout);
    if let Some(ms) = interval_ms {
        config.replay_interval = Duration::from_millis(ms);
    }
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("could not create directories: {e}");
    }

    let mut controller =
        DashboardController::from_config(&config).context("invalid configuration")?;

    println!("Hand Rehab Monitor v{VERSION}");
    println!();
    println!("  Layout: {}", config.layout);
    println!("  Window: {} samples", config.buffer_capacity);
    println!("  Timezone: {}", config.display_timezone);
    println!(
        "  Feed: {}",
        if is_stdin(input) {
            "stdin".to_string()
        } else {
            input.display().to_string()
        }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let source = if is_stdin(input) {
        ReplaySource::from_stdin()
    } else {
        ReplaySource::from_path(input).context("opening feed")?
    };
    let source = source.with_interval(config.replay_interval);

    let audit_log = create_shared_log_with_persistence(config.data_path.join("audit.json"));
    let report_builder =
        ReportBuilder::new().with_session_id(format!("SESS-{}", Utc::now().timestamp_millis()));
    tracing::info!(instance_id = %report_builder.instance_id(), "session started");

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let subscription =
        Subscription::open(source, DEFAULT_FEED_CAPACITY).context("subscribing to feed")?;

    while running.load(Ordering::SeqCst) {
        match subscription.recv_timeout(Duration::from_millis(100)) {
            Ok(update) => match controller.on_update(&update) {
                SampleOutcome::Accepted { evicted } => {
                    audit_log.record_accepted(evicted);
                    if let (Some(sample), Some(classification)) =
                        (controller.latest(), controller.classify_latest())
                    {
                        println!("[{}] {}", sample.time_label, classification);
                    }
                }
                SampleOutcome::Skipped => audit_log.record_skipped(),
            },
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::info!("feed ended");
                break;
            }
        }
    }

    println!();
    println!("Stopping...");

    if let Some(summary) = controller.movement_summary() {
        println!("Averaged movement: {summary}");
    }

    if !no_export && controller.is_ready() {
        let export_path = config.export_path.join(format!(
            "session_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        match write_report(&report_builder, &controller, &export_path) {
            Ok(()) => {
                audit_log.record_report_exported();
                println!("Exported session report to {export_path:?}");
            }
            Err(e) => eprintln!("Error writing session report: {e:#}"),
        }
    }

    if let Err(e) = audit_log.save() {
        tracing::warn!("could not save audit log: {e}");
    }

    println!();
    println!("{}", audit_log.summary());

    if is_stdin(input) {
        // The stdin reader can stay blocked on a read that never completes,
        // so joining its worker is not an option.
        std::process::exit(0);
    }
    subscription.unsubscribe();
    Ok(())
}

fn write_report(
    builder: &ReportBuilder,
    controller: &DashboardController,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let report = builder.build(controller);
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), samples = report.sample_count, "session report exported");
    Ok(())
}

fn cmd_summary(input: &Path, layout: Option<SensorLayout>, json: bool) -> Result<()> {
    let config = load_config(layout);
    let mut controller =
        DashboardController::from_config(&config).context("invalid configuration")?;

    let file = std::fs::File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut reader = std::io::BufReader::new(file);
    let mut buf = Vec::new();
    let mut accepted = 0usize;
    let mut skipped = 0usize;
    while let Some(line) = read_line_lossy(&mut reader, &mut buf)
        .with_context(|| format!("reading {}", input.display()))?
    {
        if line.trim().is_empty() {
            continue;
        }
        if controller.on_sample(line.trim()).is_accepted() {
            accepted += 1;
        } else {
            skipped += 1;
        }
    }

    if json {
        println!("{}", ReportBuilder::new().build_json(&controller));
        return Ok(());
    }

    println!("Session Summary ({})", config.layout);
    println!("================");
    println!();
    println!("Updates accepted: {accepted}");
    println!("Updates skipped: {skipped}");
    println!(
        "Samples in window: {} of {}",
        controller.buffer().len(),
        controller.buffer().capacity()
    );
    println!();

    if !controller.is_ready() {
        println!("No sensor data found in {input:?}");
        return Ok(());
    }

    let averages = controller.averages();
    println!("Averages:");
    for (channel, value) in &averages.means {
        println!("  {:<16} {:.2}", channel.label(), value);
    }
    println!();

    match config.layout {
        SensorLayout::SingleFlex => {
            if let Some(movement) = controller.current_movement() {
                println!("Latest movement: {movement}");
            }
            if let Some(summary) = controller.movement_summary() {
                println!("Averaged movement: {summary}");
            }
        }
        SensorLayout::FiveFinger => print_assessments(&controller),
    }

    Ok(())
}

fn print_assessments(controller: &DashboardController) {
    let assessments = controller.assessments();
    if assessments.is_empty() {
        println!("No finger readings in the latest sample");
        return;
    }
    println!("Clinical assessment (latest sample):");
    for a in assessments {
        println!(
            "  {:<7} flex {:>4}  {:<18} AROM {}  PROM {}  Grasp {}  Fine motor {}",
            a.finger.name(),
            a.flex,
            a.band.label(),
            yes_no(a.flags.arom),
            yes_no(a.flags.prom),
            yes_no(a.flags.grasp_adequate),
            yes_no(a.flags.fine_motor),
        );
    }
    println!();
    println!("  AROM: {AROM_DESCRIPTION}");
    println!("  PROM: {PROM_DESCRIPTION}");
    println!("  Grasp: {GRASP_DESCRIPTION}");
    println!("  Fine motor: {FINE_MOTOR_DESCRIPTION}");
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn cmd_classify(layout: Option<SensorLayout>, payload: &str) -> Result<()> {
    let config = load_config(layout);
    let mut controller =
        DashboardController::from_config(&config).context("invalid configuration")?;

    if !controller.on_sample(payload).is_accepted() {
        bail!("payload has no FlexSensor, ForceSensor or MPU6050 data");
    }

    match controller.classify_latest() {
        Some(Classification::Movement(movement)) => println!("{movement}"),
        Some(Classification::Clinical(_)) => print_assessments(&controller),
        None => println!("No data"),
    }
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config = load_config(None);

    println!("Hand Rehab Monitor Status");
    println!("=========================");
    println!();

    println!("Configuration:");
    println!("  Layout: {}", config.layout);
    println!("  Window: {} samples", config.buffer_capacity);
    println!("  Timezone: {}", config.display_timezone);
    println!("  Reports: {:?}", config.export_path);
    println!();

    let stats_path = config.data_path.join("audit.json");
    if stats_path.exists() {
        let content = std::fs::read_to_string(&stats_path)
            .with_context(|| format!("reading {}", stats_path.display()))?;
        let stats: serde_json::Value =
            serde_json::from_str(&content).context("parsing audit statistics")?;
        println!("Cumulative Statistics:");
        for (key, label) in [
            ("payloads_received", "Updates received"),
            ("samples_accepted", "Samples accepted"),
            ("payloads_skipped", "Updates skipped"),
            ("samples_evicted", "Samples evicted"),
            ("reports_exported", "Reports exported"),
        ] {
            if let Some(value) = stats.get(key) {
                println!("  {label}: {value}");
            }
        }
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_config(reset: bool) -> Result<()> {
    let config = if reset {
        let config = Config::default();
        config.save().context("writing default configuration")?;
        println!("Configuration reset to defaults");
        println!();
        config
    } else {
        load_config(None)
    };

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serializing configuration")?
    );
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
