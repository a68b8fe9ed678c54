//! Leverage Sentinel - Main Entry Point
//!
//! Polls Binance Futures leverage brackets and alerts when contracts newly
//! drop below the configured max-leverage threshold.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use leverage_sentinel::config::Config;
use leverage_sentinel::exchange::BinanceClient;
use leverage_sentinel::monitor::{report, CycleReport, KnownCoins, Monitor, RiskScanner};
use leverage_sentinel::notify::{Alert, Notifier, WebhookNotifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Leverage Sentinel CLI
#[derive(Parser)]
#[command(name = "leverage-sentinel")]
#[command(version, about = "Alerts when Binance Futures contracts lose max leverage")]
struct Cli {
    /// Config file name without extension (e.g. `sentinel` for sentinel.toml)
    #[arg(short, long, global = true, default_value = "sentinel")]
    config: String,

    /// Emit stdout logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan continuously and alert on newly high-risk contracts (default)
    Watch,

    /// Scan once and print the high-risk contracts
    Scan {
        /// Print the cycle report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Send a test message through the configured webhook
    TestWebhook,
}

/// Where console log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleTarget {
    Stdout,
    Stderr,
}

impl Commands {
    /// `scan --json` owns stdout for its report, so logs move to stderr.
    fn console_target(&self) -> ConsoleTarget {
        match self {
            Commands::Scan { json: true } => ConsoleTarget::Stderr,
            _ => ConsoleTarget::Stdout,
        }
    }
}

/// Counters logged at shutdown.
#[derive(Debug)]
struct WatchStats {
    start_time: DateTime<Utc>,
    cycles: u64,
    degraded_cycles: u64,
    failed_cycles: u64,
    alerts_raised: u64,
}

impl Default for WatchStats {
    fn default() -> Self {
        Self {
            start_time: Utc::now(),
            cycles: 0,
            degraded_cycles: 0,
            failed_cycles: 0,
            alerts_raised: 0,
        }
    }
}

impl WatchStats {
    fn record(&mut self, report: &CycleReport) {
        use leverage_sentinel::monitor::ScanStatus;

        self.cycles += 1;
        match report.status {
            ScanStatus::Complete => {}
            ScanStatus::Degraded(_) => self.degraded_cycles += 1,
            ScanStatus::Failed(_) => self.failed_cycles += 1,
        }
        if !report.newly_risky.is_empty() {
            self.alerts_raised += 1;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Watch);

    init_logging(cli.json_logs, command.console_target())?;

    let config = Config::load(&cli.config)?;
    config.validate()?;

    match command {
        Commands::Watch => run_watch(&config).await,
        Commands::Scan { json } => run_scan(&config, json).await,
        Commands::TestWebhook => run_test_webhook(&config).await,
    }
}

/// Initialize logging to the console and an hourly rolling file.
fn init_logging(json: bool, console: ConsoleTarget) -> Result<()> {
    use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "leverage-sentinel.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration
    Box::leak(Box::new(guard));

    let filter = EnvFilter::from_default_env()
        .add_directive("leverage_sentinel=debug".parse()?)
        .add_directive(Level::INFO.into());

    let writer = match console {
        ConsoleTarget::Stdout => BoxMakeWriter::new(std::io::stdout.and(file_writer)),
        ConsoleTarget::Stderr => BoxMakeWriter::new(std::io::stderr.and(file_writer)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE);

    if json {
        builder.json().init();
    } else {
        builder.with_ansi(true).init();
    }

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!(
        "   Risk Threshold: < {}x max leverage",
        config.monitor.risk_threshold
    );
    info!("   Quote Asset: {}", config.monitor.quote_asset);
    info!("   Poll Interval: {}s", config.monitor.poll_interval_secs);
    info!(
        "   Timeouts: whitelist {}s, brackets {}s",
        config.monitor.universe_timeout_secs, config.monitor.bracket_timeout_secs
    );
    info!("   Reset Policy: {:?}", config.monitor.reset_policy);
    info!(
        "   Webhook: {}",
        if config.notify.webhook_url.is_some() {
            "configured"
        } else {
            "disabled"
        }
    );
}

fn build_client(config: &Config) -> Result<BinanceClient> {
    anyhow::ensure!(
        config.binance.has_credentials(),
        "Binance API key and secret are required (set BINANCE_API_KEY and BINANCE_SECRET_KEY)"
    );

    Ok(BinanceClient::new(&config.binance)?.with_timeouts(
        Duration::from_secs(config.monitor.universe_timeout_secs),
        Duration::from_secs(config.monitor.bracket_timeout_secs),
    ))
}

fn build_notifier(config: &Config) -> Result<Option<WebhookNotifier>> {
    config
        .notify
        .webhook_url
        .as_ref()
        .map(|url| {
            WebhookNotifier::new(
                url.clone(),
                config.notify.title.clone(),
                Duration::from_secs(config.notify.timeout_secs),
            )
        })
        .transpose()
}

fn build_monitor(config: &Config) -> Result<Monitor> {
    let scanner = RiskScanner::new(
        config.monitor.quote_asset.clone(),
        config.monitor.risk_threshold,
    );
    let mut monitor = Monitor::new(scanner, config.monitor.reset_policy);
    if let Some(notifier) = build_notifier(config)? {
        monitor = monitor.with_notifier(Arc::new(notifier));
    }
    Ok(monitor)
}

/// Continuous monitoring until Ctrl-C.
async fn run_watch(config: &Config) -> Result<()> {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!(
        "║            Leverage Sentinel v{} - Watching              ║",
        env!("CARGO_PKG_VERSION")
    );
    info!("╚════════════════════════════════════════════════════════════╝");
    log_config(config);

    let client = build_client(config)?;
    let monitor = build_monitor(config)?;
    let interval = Duration::from_secs(config.monitor.poll_interval_secs);

    // Shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let wake = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        let wake = wake.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("🛑 Shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
            wake.notify_one();
        });
    }

    let mut stats = WatchStats::default();
    let mut known = KnownCoins::uninitialized();

    while !shutdown.load(Ordering::SeqCst) {
        let cycle_start = Utc::now();
        info!(
            "🔄 [SCAN] Cycle #{} at {}",
            stats.cycles + 1,
            Local::now().format("%H:%M:%S")
        );

        let (cycle, next) = monitor.run_cycle(&client, known).await;
        known = next;
        stats.record(&cycle);
        log_cycle(&cycle);

        debug!(
            "⏱️  Cycle completed in {}ms",
            (Utc::now() - cycle_start).num_milliseconds()
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = wake.notified() => {}
        }
    }

    let uptime = Utc::now() - stats.start_time;
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        cycles = stats.cycles,
        degraded = stats.degraded_cycles,
        failed = stats.failed_cycles,
        alerts = stats.alerts_raised,
        uptime_mins = uptime.num_minutes(),
        "🏁 Final statistics"
    );
    info!("👋 Leverage Sentinel shutdown complete");
    Ok(())
}

fn log_cycle(cycle: &CycleReport) {
    if let Some(problem) = cycle.problem() {
        warn!("⚠️  [SCAN] {}", problem);
    }

    if !cycle.newly_risky.is_empty() {
        warn!(
            "🔥 [ALERT] New high-risk contracts: {}",
            cycle.newly_risky.join(", ")
        );
    }

    if cycle.risky.is_empty() {
        info!("✅ [SCAN] No high-risk contracts");
        return;
    }

    info!("📊 [SCAN] {}", report::summary_line(cycle));
    for line in report::render_table(&cycle.risky).lines() {
        info!("   {}", line);
    }
}

/// One-shot manual scan.
async fn run_scan(config: &Config, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let monitor = build_monitor(config)?;

    let cycle = monitor.scan_once(&client).await;

    if json {
        let out = report::to_json(&cycle).context("Failed to serialize report")?;
        println!("{}", out);
        return Ok(());
    }

    if let Some(problem) = cycle.problem() {
        println!("⚠️  {}", problem);
    }

    if cycle.risky.is_empty() {
        println!("✅ Safe: no contract below {}x", monitor.scanner().risk_threshold());
    } else {
        println!(
            "\n📊 High-risk contracts (max leverage < {}x)\n",
            monitor.scanner().risk_threshold()
        );
        print!("{}", report::render_table(&cycle.risky));
    }

    Ok(())
}

/// Send a test message through the webhook.
async fn run_test_webhook(config: &Config) -> Result<()> {
    let Some(notifier) = build_notifier(config)? else {
        anyhow::bail!("No webhook configured (set DINGTALK_WEBHOOK_URL or notify.webhook_url)");
    };

    deliver_test_message(&notifier).await
}

/// Send the test message, failing the command when delivery fails.
async fn deliver_test_message(notifier: &dyn Notifier) -> Result<()> {
    match notifier.send(&Alert::test_message(Local::now())).await {
        Ok(()) => {
            println!("✅ Test message delivered");
            Ok(())
        }
        Err(e) => {
            error!("Webhook test failed: {}", e);
            println!("❌ Delivery failed: {} (check the robot's keyword settings)", e);
            Err(e).context("Webhook test delivery failed")
        }
    }
}
