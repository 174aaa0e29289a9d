//! Writes a pitch table artifact.
//!
//! ```text
//! gen_table [sample_rate] [base_frequency] [max_display_pitch] [output_path]
//! ```
//!
//! Missing arguments take their default values. Without an output path the
//! artifact is written to stdout.

use std::error::Error;
use std::fs;

use log::info;
use pitch_trace::table::artifact::artifact_to_string;
use pitch_trace::{PitchTable, TrackerConfig};

fn init_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn parse_arg(args: &[String], index: usize, name: &str, default: f32) -> Result<f32, Box<dyn Error>> {
    match args.get(index) {
        Some(arg) => arg
            .parse()
            .map_err(|_| format!("invalid {} `{}`", name, arg).into()),
        None => Ok(default),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let defaults = TrackerConfig::default();
    let sample_rate = parse_arg(&args, 0, "sample rate", defaults.sample_rate)?;
    let base_frequency = parse_arg(&args, 1, "base frequency", defaults.base_frequency)?;
    let max_display_pitch = parse_arg(&args, 2, "max display pitch", defaults.max_display_pitch)?;

    let table = PitchTable::from_bounds(sample_rate, base_frequency, max_display_pitch)?;
    let artifact = artifact_to_string(&table);

    match args.get(3) {
        Some(path) => {
            fs::write(path, artifact)?;
            info!("Wrote {} entries to {}", table.len(), path);
        }
        None => print!("{}", artifact),
    }
    Ok(())
}
