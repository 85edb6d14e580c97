//! # Chordscope - live chord detection
//!
//! Headless front-end for `chordscope-core`.
//!
//! ## Architecture
//! - **Main Thread**: config, logging, printing chord changes
//! - **Audio Thread**: capture, FFT and the detection pipeline
//! - **Communication**: crossbeam channels, one for chord changes and one
//!   for the upstream error

mod cli;
mod config;
mod worker;

use anyhow::{Result, anyhow};
use chordscope_core::{ChordMatch, DetectorError, color::pitch_class_color};
use clap::Parser;
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use cli::Cli;
use worker::DetectorWorker;

/// One line of `--json` output.
#[derive(Serialize)]
struct ChordEvent<'a> {
    elapsed_ms: u128,
    #[serde(flatten)]
    chord: &'a ChordMatch,
    notes: Vec<&'static str>,
    color: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    let detector_config = config::resolve(&cli)?;
    if cli.hop_size == 0 || cli.hop_size > detector_config.fft_size {
        return Err(anyhow!(
            "hop size must be between 1 and the FFT size ({})",
            detector_config.fft_size
        ));
    }
    let deadline = deadline_after(cli.duration)?;

    let (chord_tx, chord_rx) = crossbeam_channel::unbounded();
    let (error_tx, error_rx) = crossbeam_channel::bounded(1);
    let worker = DetectorWorker::spawn(detector_config, cli.hop_size, chord_tx, error_tx);

    let outcome = drive(
        &chord_rx,
        &error_rx,
        &deadline,
        Instant::now(),
        cli.json,
        &mut io::stdout().lock(),
    );

    worker.shutdown();
    outcome
}

/// Timer channel for `--duration`; never fires when no duration is given.
fn deadline_after(duration: Option<f32>) -> Result<Receiver<Instant>> {
    match duration {
        None => Ok(crossbeam_channel::never()),
        Some(secs) if secs > 0.0 => {
            let timeout = Duration::try_from_secs_f32(secs)
                .map_err(|e| anyhow!("invalid duration {}: {}", secs, e))?;
            Ok(crossbeam_channel::after(timeout))
        }
        Some(secs) => Err(anyhow!("duration must be positive, got {}", secs)),
    }
}

/// Prints chord changes until the worker stops or the deadline fires.
///
/// A worker that fails sends its error and then drops both senders, so a
/// disconnected chord channel still checks for a pending error.
fn drive<W: Write>(
    chord_rx: &Receiver<ChordMatch>,
    error_rx: &Receiver<DetectorError>,
    deadline: &Receiver<Instant>,
    started: Instant,
    json: bool,
    out: &mut W,
) -> Result<()> {
    loop {
        crossbeam_channel::select! {
            recv(chord_rx) -> msg => match msg {
                Ok(chord) => print_chord(out, &chord, started.elapsed(), json)?,
                Err(_) => return pending_error(error_rx),
            },
            recv(error_rx) -> msg => match msg {
                Ok(e) => return Err(upstream_failure(e)),
                Err(_) => return Ok(()),
            },
            recv(deadline) -> _ => {
                log::info!("[MAIN] Duration reached, stopping");
                return Ok(());
            },
        }
    }
}

fn pending_error(error_rx: &Receiver<DetectorError>) -> Result<()> {
    match error_rx.try_recv() {
        Ok(e) => Err(upstream_failure(e)),
        Err(_) => Ok(()),
    }
}

fn upstream_failure(e: DetectorError) -> anyhow::Error {
    log::error!("[MAIN] {}", e);
    anyhow::Error::new(e)
}

fn print_chord<W: Write>(out: &mut W, chord: &ChordMatch, elapsed: Duration, json: bool) -> Result<()> {
    let notes: Vec<&'static str> = chord
        .pitch_classes()
        .iter()
        .map(chordscope_core::music::pitch_class_name)
        .collect();

    if json {
        let event = ChordEvent {
            elapsed_ms: elapsed.as_millis(),
            chord,
            notes,
            color: pitch_class_color(chord.root_pitch_class).to_css(),
        };
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    } else {
        writeln!(
            out,
            "{:>8.2}s  {:<8} {} ({})",
            elapsed.as_secs_f32(),
            chord.full,
            chord.display_name,
            notes.join(" ")
        )?;
    }
    out.flush()?;
    Ok(())
}
