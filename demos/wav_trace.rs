//! Traces the pitch of a WAV file, or of a synthesized glide if no path is
//! given, in real time.
//!
//! A capture thread feeds the file to a pipeline in chunks of varying size
//! at the rate they would arrive from an audio device. The main thread
//! polls the result channel and prints the most recent pitch.
//!
//! ```text
//! cargo run --example wav_trace [path/to/mono.wav]
//! ```

use std::thread;
use std::time::Duration;

use log::info;
use pitch_trace::common::{freq_to_midi_note, note_number_to_string};
use pitch_trace::{Pipeline, Pitch, TrackerConfig};

const CHUNK_SIZES: [usize; 4] = [128, 441, 64, 1024];

fn init_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}][{}] {}", record.target(), record.level(), message))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

/// Reads the first channel of a 16 bit WAV file.
fn read_wav(path: &str) -> Result<(f32, Vec<f32>), hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let scale = 1. / (i16::MAX as f32);
    let samples = reader
        .samples::<i16>()
        .step_by(spec.channels as usize)
        .map(|sample| sample.map(|s| s as f32 * scale))
        .collect::<Result<Vec<f32>, _>>()?;
    Ok((spec.sample_rate as f32, samples))
}

/// An exponential glide from 110 Hz to 440 Hz and back, with pauses.
fn synthesize_glide(sample_rate: f32) -> Vec<f32> {
    let segment = sample_rate as usize;
    let mut samples = vec![0.0; segment / 2];
    let mut phase = 0.0f32;
    for i in 0..2 * segment {
        let t = i as f32 / segment as f32;
        let octaves = if t < 1.0 { 2.0 * t } else { 2.0 * (2.0 - t) };
        let frequency = 110.0 * 2f32.powf(octaves);
        phase += 2.0 * std::f32::consts::PI * frequency / sample_rate;
        if phase > 2.0 * std::f32::consts::PI {
            phase -= 2.0 * std::f32::consts::PI;
        }
        samples.push(0.3 * phase.sin());
    }
    samples.extend(vec![0.0; segment / 2]);
    samples
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger()?;

    let (sample_rate, samples) = match std::env::args().nth(1) {
        Some(path) => {
            info!("Reading {}", path);
            read_wav(&path)?
        }
        None => {
            info!("No input file given, synthesizing a glide");
            (48000.0, synthesize_glide(48000.0))
        }
    };

    let config = TrackerConfig {
        sample_rate,
        ..TrackerConfig::default()
    };
    let (mut pipeline, outputs) = Pipeline::new(config)?;
    let mut reader = outputs.pitch.subscribe();
    let duration = samples.len() as f32 / sample_rate;

    let capture = thread::spawn(move || {
        let mut offset = 0;
        let mut chunk_index = 0;
        while offset < samples.len() {
            let chunk_size = CHUNK_SIZES[chunk_index % CHUNK_SIZES.len()].min(samples.len() - offset);
            pipeline.process(&samples[offset..offset + chunk_size]);
            offset += chunk_size;
            chunk_index += 1;
            thread::sleep(Duration::from_secs_f32(chunk_size as f32 / sample_rate));
        }
        pipeline.tracker().processed_sample_count()
    });

    let poll_interval_ms = 30;
    let mut entries = Vec::new();
    let mut elapsed = 0.0;
    while elapsed < duration + 0.1 {
        thread::sleep(Duration::from_millis(poll_interval_ms));
        elapsed += poll_interval_ms as f32 / 1000.0;

        entries.clear();
        reader.try_read_into(&mut entries);
        match entries.iter().rev().find(|pitch| pitch.is_voiced()) {
            Some(Pitch::Voiced(coordinate)) => {
                let frequency = outputs.table.coordinate_to_frequency(*coordinate);
                println!(
                    "{:5.2} s | {} | {:.2} Hz",
                    elapsed,
                    note_number_to_string(freq_to_midi_note(frequency)),
                    frequency
                );
            }
            _ => println!("{:5.2} s | -", elapsed),
        }
    }

    let processed = capture.join().map_err(|_| "capture thread panicked")?;
    info!(
        "Processed {} samples, reader dropped {} entries",
        processed,
        reader.dropped_count()
    );
    Ok(())
}
