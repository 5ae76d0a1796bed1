use clap::Parser;
use log::{info, warn};

use rtlagc_core::{AgcConfig, GainMode, DEFAULT_BUF_LENGTH, DEFAULT_SAMPLE_RATE};
use rtlagc_host::{configure_gain, CaptureDriver, ExitFlag, GainControl, SimFrontEnd};
use rtlagc_host::sim::R820T_GAINS;

/// Drives the gain loop against a simulated RTL2832/R820T front end.
#[derive(Parser)]
struct Cli {
    /// Gain in dB: 0 for auto, >0 manual, <0 AGC target in dBFS.
    #[arg(short, long, default_value_t = -10.0, allow_negative_numbers = true)] gain: f32,
    #[arg(short = 's', long, default_value_t = DEFAULT_SAMPLE_RATE)] rate: u32,
    #[arg(short, long, default_value_t = DEFAULT_BUF_LENGTH)] block_size: usize,
    /// I/Q pairs to read, 0 for infinite.
    #[arg(short = 'n', long, default_value_t = 0)] samples: u64,
    /// Simulated signal level at 0 dB gain, dBFS.
    #[arg(long, default_value_t = -45.0, allow_negative_numbers = true)] input_level: f32,
    /// Uniform noise amplitude, raw counts.
    #[arg(long, default_value_t = 2.0)] noise: f32,
    /// Fail every Nth gain write (0 = never).
    #[arg(long, default_value_t = 0)] fail_every: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    info!(">>> RTLAGC SIM: v0.1.0 <<<");

    let exit = ExitFlag::new();
    let e = exit.clone();
    ctrlc::set_handler(move || {
        warn!("Signal caught, exiting!");
        e.raise();
    })?;

    let front = SimFrontEnd::new();
    let tuner = front.tuner(R820T_GAINS.to_vec(), cli.fail_every);
    let mut source = front.source((cli.input_level * 10.0) as i32, cli.noise, cli.rate, 0x5EED);

    // Tenths of a dB
    let mode = GainMode::from_tenths((cli.gain * 10.0) as i32);
    let config = AgcConfig { sample_rate: cli.rate, ..AgcConfig::default() };
    let mut control = configure_gain(mode, Box::new(tuner), config, &exit)?;

    let mut driver = CaptureDriver::new(cli.block_size, cli.samples, exit.clone());
    let result = driver.run(&mut source, |block| control.process_block(block));

    let windows = match &control {
        GainControl::Agc(rt) => rt.processor.windows(),
        _ => 0,
    };
    let cancelled = exit.is_raised();
    control.shutdown(&exit)?;

    let stats = result?;
    if cancelled {
        info!("User cancel, exiting...");
    }
    info!(
        "Read {} blocks ({} bytes), {} windows, final gain {:.1} dB after {} writes",
        stats.blocks,
        stats.bytes,
        windows,
        front.gain() as f32 / 10.0,
        front.writes()
    );
    Ok(())
}
