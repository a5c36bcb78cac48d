//! 帧捕获回放分析工具
//!
//! 用法：`replay_capture <events.json> [--config <toml>] [--output <analysis.json>]`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use truvis_capture::event::EventLog;
use truvis_capture_replay::{CaptureAnalysis, ReplayConfig};
use truvis_crate_tools::init_log::init_log;
use truvis_crate_tools::resource::TruvisPath;

const USAGE: &str = "usage: replay_capture <events.json> [--config <toml>] [--output <analysis.json>]";

struct Args {
    events: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut events = None;
    let mut config = None;
    let mut output = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().context("--config 缺少路径")?)),
            "--output" => output = Some(PathBuf::from(args.next().context("--output 缺少路径")?)),
            "-h" | "--help" => bail!(USAGE),
            _ if events.is_none() => events = Some(PathBuf::from(arg)),
            _ => bail!("无法识别的参数: {arg}\n{USAGE}"),
        }
    }

    Ok(Args {
        events: events.context(USAGE)?,
        config,
        output,
    })
}

fn load_config(path: Option<PathBuf>) -> Result<ReplayConfig> {
    match path {
        Some(path) => ReplayConfig::from_file(path),
        None => {
            let default_path = TruvisPath::config_path();
            if default_path.exists() {
                log::info!("Using config: {:?}", default_path);
                ReplayConfig::from_file(default_path)
            } else {
                Ok(ReplayConfig::default())
            }
        }
    }
}

fn main() -> Result<()> {
    init_log(log::LevelFilter::Info);

    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config)?;

    let log = EventLog::from_json_file(&args.events)?;
    log::info!("Loaded {} events from {:?}", log.len(), args.events);

    let analysis = CaptureAnalysis::from_event_log(&log, &config);
    if config.print_analysis_plan {
        analysis.print_analysis_plan();
    }

    let summary = analysis.summary();
    log::info!(
        "Replay completed: {} draws, {} dispatches, {} passes, {} dependencies",
        summary.total_draws,
        summary.total_dispatches,
        summary.total_passes,
        summary.total_dependencies
    );

    if let Some(output) = args.output {
        let json = analysis.to_json()?;
        std::fs::write(&output, json).with_context(|| format!("写入分析结果失败: {:?}", output))?;
        log::info!("Analysis written to {:?}", output);
    }

    Ok(())
}
