//! Motion Sense - command line entry point
//!
//! ```bash
//! motion-sense train --data walk.csv --model model.json
//! motion-sense evaluate --model model.json --data query.csv --summary-csv summary.csv
//! motion-sense replay --model model.json --data query.csv --family b --alert-mode deferred
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};

use motion_sense::constants::{APP_NAME, APP_VERSION};
use motion_sense::logic::config::PipelineConfig;
use motion_sense::logic::dataset::{export_summary, export_windows, read_recording_path};
use motion_sense::logic::evaluate::{evaluate, format_mm_ss};
use motion_sense::logic::model::{train_from_recording, TrainedModel};
use motion_sense::logic::sample::{ChannelMap, DeviceFamily, RawReading, CHANNELS};
use motion_sense::logic::stream::{
    AlertMode, ChannelSource, MemoryNotifier, SessionConfig, StopHandle, StreamingPredictor,
};
use motion_sense::PipelineResult;

#[derive(Parser, Debug)]
#[command(name = "motion-sense", version, about = "Sliding-window activity classification for 6-axis IMU data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model on a labelled recording
    Train {
        #[arg(long, value_name = "CSV")]
        data: PathBuf,
        /// Output path for the model blob
        #[arg(long, value_name = "FILE")]
        model: PathBuf,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        stride: Option<usize>,
        #[arg(long)]
        trees: Option<usize>,
        #[arg(long)]
        max_depth: Option<usize>,
        /// Share of each class used for fitting (rest is held out)
        #[arg(long)]
        fit_fraction: Option<f64>,
    },
    /// Re-score a timed recording and summarize time per label
    Evaluate {
        #[arg(long, value_name = "FILE")]
        model: PathBuf,
        #[arg(long, value_name = "CSV")]
        data: PathBuf,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        stride: Option<usize>,
        #[arg(long, value_name = "FILE")]
        windows_csv: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        summary_csv: Option<PathBuf>,
    },
    /// Stream a recording through a live session
    Replay {
        #[arg(long, value_name = "FILE")]
        model: PathBuf,
        #[arg(long, value_name = "CSV")]
        data: PathBuf,
        #[arg(long, value_enum, default_value_t = FamilyArg::A)]
        family: FamilyArg,
        #[arg(long, value_enum)]
        alert_mode: Option<AlertModeArg>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FamilyArg {
    A,
    B,
}

impl From<FamilyArg> for DeviceFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::A => DeviceFamily::FamilyA,
            FamilyArg::B => DeviceFamily::FamilyB,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlertModeArg {
    Immediate,
    Deferred,
}

impl From<AlertModeArg> for AlertMode {
    fn from(arg: AlertModeArg) -> Self {
        match arg {
            AlertModeArg::Immediate => AlertMode::Immediate,
            AlertModeArg::Deferred => AlertMode::Deferred,
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("{} v{}", APP_NAME, APP_VERSION);

    if let Err(e) = run(cli.command) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> PipelineResult<()> {
    let mut config = PipelineConfig::from_env()?;

    match command {
        Command::Train {
            data,
            model,
            window,
            stride,
            trees,
            max_depth,
            fit_fraction,
        } => {
            config.window_size = window.unwrap_or(config.window_size);
            config.stride = stride.unwrap_or(config.stride);
            config.tree_count = trees.unwrap_or(config.tree_count);
            config.max_depth = max_depth.unwrap_or(config.max_depth);
            config.fit_fraction = fit_fraction.unwrap_or(config.fit_fraction);
            config.validate()?;
            train(&config, &data, &model)
        }
        Command::Evaluate {
            model,
            data,
            window,
            stride,
            windows_csv,
            summary_csv,
        } => {
            config.window_size = window.unwrap_or(config.window_size);
            config.stride = stride.unwrap_or(config.stride);
            config.validate()?;
            score(&config, &model, &data, windows_csv, summary_csv)
        }
        Command::Replay {
            model,
            data,
            family,
            alert_mode,
        } => {
            if let Some(mode) = alert_mode {
                config.alert_mode = mode.into();
            }
            config.validate()?;
            replay(&config, &model, &data, family.into())
        }
    }
}

fn train(config: &PipelineConfig, data: &Path, model_path: &Path) -> PipelineResult<()> {
    let recording = read_recording_path(data)?;
    let report = train_from_recording(&recording, config.window_size, config.stride, &config.train_params())?;
    report.model.save(model_path)?;

    println!("Windows : {} fit / {} held out", report.fit_windows, report.eval_windows);
    println!("Accuracy: {:.2}%", report.accuracy * 100.0);
    println!("Confusion matrix (rows = actual, columns = predicted):");
    let width = report.confusion.labels.iter().map(|l| l.len()).max().unwrap_or(0);
    for (label, row) in report.confusion.labels.iter().zip(&report.confusion.counts) {
        let cells: Vec<String> = row.iter().map(|c| format!("{:>6}", c)).collect();
        println!("  {:<width$} {}", label, cells.join(""), width = width);
    }
    Ok(())
}

fn score(
    config: &PipelineConfig,
    model_path: &Path,
    data: &Path,
    windows_csv: Option<PathBuf>,
    summary_csv: Option<PathBuf>,
) -> PipelineResult<()> {
    let model = TrainedModel::load(model_path)?;
    let recording = read_recording_path(data)?;
    let evaluation = evaluate(&recording, config.window_size, config.stride, &model)?;

    if let Some(path) = windows_csv {
        export_windows(&evaluation.windows, &path)?;
    }
    if let Some(path) = summary_csv {
        export_summary(&evaluation.summary, &path)?;
    }

    println!("{:<24} {:>10} {:>7} {:>7}", "Label", "Seconds", "MM:SS", "%");
    for entry in evaluation.summary.entries() {
        println!(
            "{:<24} {:>10.2} {:>7} {:>6.1}%",
            entry.label,
            entry.duration_s,
            format_mm_ss(entry.duration_s),
            entry.share_pct
        );
    }
    Ok(())
}

fn replay(config: &PipelineConfig, model_path: &Path, data: &Path, family: DeviceFamily) -> PipelineResult<()> {
    let model = TrainedModel::load(model_path)?;
    let recording = read_recording_path(data)?;

    let map = ChannelMap::new(family);
    let (tx, mut source) = ChannelSource::channel(map);
    let feeder = thread::spawn(move || {
        for sample in recording.samples() {
            let reading: RawReading = CHANNELS
                .iter()
                .map(|&channel| (map.device_name(channel).to_string(), sample.get(channel)))
                .collect();
            if tx.send(reading).is_err() {
                break;
            }
        }
    });

    let notifier = Arc::new(MemoryNotifier::new());
    let mut predictor = StreamingPredictor::new(&model, SessionConfig::from_pipeline(config))?
        .with_notifier(notifier.clone());
    let report = predictor.run(&mut source, &StopHandle::new());
    if feeder.join().is_err() {
        log::warn!("Replay feeder thread panicked");
    }

    println!("Windows scored: {} ({} dropped)", report.windows_scored, report.dropped_windows);
    for (label, count) in &report.tally {
        println!("  {:<24} {}", label.to_string(), count);
    }
    for event in notifier.events() {
        match event.duration_s {
            Some(seconds) => println!(
                "Alert ({}): {} for ~{} ({:.2} min)",
                event.mode,
                event.label,
                format_mm_ss(seconds),
                seconds / 60.0
            ),
            None => println!("Alert ({}): {}", event.mode, event.label),
        }
    }
    Ok(())
}
