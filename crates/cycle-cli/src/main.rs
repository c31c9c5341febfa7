//! cycle-features: cycle-by-cycle shape features and burst detection from the command line

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use cycle_core::{CenterExtrema, FrequencyRange, Signal};
use cycle_processing::{compute_features, BurstDetectionMethod, FeatureConfig, FeatureOutput};
use cycle_simulation::{NoiseConfig, OscillationConfig, OscillationSimulator, SignalPattern};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cycle-features",
    about = "Cycle-by-cycle oscillation features and burst detection"
)]
struct Cli {
    /// Sampling rate in Hz
    #[arg(long, default_value_t = 1000.0)]
    fs: f64,
    /// Lower edge of the oscillation band in Hz
    #[arg(long, default_value_t = 8.0)]
    f_lo: f64,
    /// Upper edge of the oscillation band in Hz
    #[arg(long, default_value_t = 12.0)]
    f_hi: f64,
    /// Extremum at the center of each cycle (peak or trough)
    #[arg(long, default_value = "peak")]
    center: CenterExtrema,
    /// Burst detection method (cycles or amplitude)
    #[arg(long, default_value = "cycles")]
    method: BurstDetectionMethod,
    /// JSON feature configuration; replaces --fs, --f-lo, --f-hi, --center and --method
    #[arg(long)]
    config: Option<PathBuf>,
    /// Text file with one sample per line
    #[arg(long, conflicts_with = "simulate")]
    input: Option<PathBuf>,
    /// Analyse a simulated burst train instead of a file
    #[arg(long)]
    simulate: bool,
    /// Length of the simulated signal in seconds
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Seed for the simulated noise
    #[arg(long)]
    seed: Option<u64>,
    /// Print the feature table as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let signal = match (&cli.input, cli.simulate) {
        (Some(path), _) => Signal::new(read_samples(path)?, config.sampling_rate)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, true) => simulate(&config, cli.seconds, cli.seed)?,
        (None, false) => bail!("either --input <file> or --simulate is required"),
    };
    info!(samples = signal.len(), fs = signal.sampling_rate(), "signal loaded");

    let output = compute_features(signal.samples(), &config).context("computing cycle features")?;

    if cli.json {
        println!("{}", output.features().to_json()?);
    } else {
        print_table(&output);
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FeatureConfig> {
    if let Some(path) = &cli.config {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        return FeatureConfig::from_json(&json)
            .with_context(|| format!("parsing config {}", path.display()));
    }

    let config = FeatureConfig::builder(cli.fs, FrequencyRange::new(cli.f_lo, cli.f_hi))
        .center_extrema(cli.center)
        .burst_detection_method(cli.method.as_str())
        .build()?;
    Ok(config)
}

fn read_samples(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading samples from {}", path.display()))?;

    text.lines()
        .enumerate()
        .map(|(n, line)| (n, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| {
            line.parse::<f64>()
                .with_context(|| format!("{}:{}: invalid sample '{}'", path.display(), n + 1, line))
        })
        .collect()
}

fn simulate(config: &FeatureConfig, seconds: f64, seed: Option<u64>) -> Result<Signal> {
    let pattern = SignalPattern::BurstTrain {
        background_amplitude: 0.1,
        burst_amplitude: 1.0,
        on_cycles: 6,
        off_cycles: 8,
    };
    info!(pattern = pattern.description(), seconds, "simulating signal");

    let simulation = OscillationConfig {
        sampling_rate: config.sampling_rate,
        frequency: config.frequency_range.center(),
        pattern,
        noise: NoiseConfig { gaussian_std: 0.05 },
        seed: seed.or(Some(0)),
    };

    let signal = OscillationSimulator::new(simulation)?.generate(seconds)?;
    Ok(signal)
}

fn print_table(output: &FeatureOutput) {
    let features = output.features();
    let metric_columns = features.burst_metrics().column_names();

    let mut header = format!("{:>6} {:>8} {:>7} {:>9} {:>7} {:>7}", "cycle", "center", "period", "volt_amp", "rdsym", "ptsym");
    for column in metric_columns {
        header.push_str(&format!(" {:>10}", abbreviate(column)));
    }
    header.push_str("  burst");
    println!("{}", header);

    let centers = output.cyclepoints().map(|points| points.centers());

    for row in features.rows() {
        let center = centers.as_ref()
            .and_then(|c| c.get(row.index))
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut line = format!(
            "{:>6} {:>8} {:>7} {:>9.4} {:>7.3} {:>7.3}",
            row.index, center, row.shape.period, row.shape.volt_amp,
            row.shape.time_rdsym, row.shape.time_ptsym
        );
        for column in metric_columns {
            match row.get(column) {
                Some(value) => line.push_str(&format!(" {:>10.3}", value)),
                None => line.push_str(&format!(" {:>10}", "-")),
            }
        }
        line.push_str(if row.is_burst { "  yes" } else { "  no" });
        println!("{}", line);
    }

    let segments = features.burst_segments();
    println!();
    println!(
        "{} cycles, {} bursting ({}), {} bursts",
        features.len(),
        features.burst_count(),
        features.method(),
        segments.len()
    );
    for (start, end) in segments {
        println!("  burst: cycles {}..={}", start, end);
    }
}

fn abbreviate(column: &str) -> &str {
    match column {
        "amplitude_fraction" => "amp_frac",
        "amplitude_consistency" => "amp_cons",
        "period_consistency" => "per_cons",
        "monotonicity" => "monotonic",
        "burst_fraction" => "burst_frac",
        other => other,
    }
}
