//! 移动性同步桥
//!
//! 读取场景文件，用交通仿真（轨迹回放或 SUMO/TraCI）驱动网络仿真中的节点移动。

use clap::Parser;
use mobility_bridge::bridge::{self, ScenarioConfig, TrafficSource};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "mobility-bridge",
    about = "Keep network-simulator node mobility in sync with a traffic simulation"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Override simulation duration (seconds)
    #[arg(long)]
    duration_s: Option<f64>,

    /// Override synchronization period (seconds)
    #[arg(long)]
    period_s: Option<f64>,

    /// Replay this trace file instead of the scenario's traffic source
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Override the road network used for waypoint lookahead
    #[arg(long)]
    road_net: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut cfg = ScenarioConfig::from_path(&args.scenario)?;
    if let Some(d) = args.duration_s {
        cfg.duration_s = d;
    }
    if let Some(p) = args.period_s {
        cfg.period_s = p;
    }
    if let Some(path) = args.trace {
        cfg.traffic = TrafficSource::Trace { path };
    }
    if let Some(path) = args.road_net {
        cfg.road_net = Some(path);
    }

    let summary = bridge::run(&cfg)?;

    println!(
        "done @ {:.3}s, entities={} (vehicles={}, persons={}), synced={}, sync_ticks={}, zone_departures={}",
        summary.final_time_s,
        summary.discovered,
        summary.vehicles,
        summary.persons,
        summary.synced,
        summary.sync_ticks,
        summary
            .zone_departures
            .map_or_else(|| "-".to_string(), |d| d.to_string()),
    );

    if let Some(path) = args.summary_json {
        fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
    }
    Ok(())
}
