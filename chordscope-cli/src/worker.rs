//! Dedicated detection thread: capture → analyser → detector.
//!
//! Chord changes and the (single) upstream error travel on separate
//! channels so the caller can tell "no chord yet" from "no audio at all".

use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use chordscope_core::{
    ChordDetector, ChordMatch, DetectorConfig, DetectorError, audio,
    fft::SpectrumAnalyser,
    music::{cents_offset, midi_to_note_name},
    sieve::Fundamental,
};

/// Handle to the running detection thread.
#[derive(Debug)]
pub struct DetectorWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl DetectorWorker {
    /// Spawns the thread. Chord changes go to `chord_tx`; if the input cannot
    /// be opened, one error goes to `error_tx` and the thread exits.
    pub fn spawn(
        config: DetectorConfig,
        hop_size: usize,
        chord_tx: Sender<ChordMatch>,
        error_tx: Sender<DetectorError>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let thread_handle = thread::spawn(move || {
            log::debug!("[AUDIO-THREAD] Starting audio thread...");
            if let Err(e) = run(config, hop_size, &chord_tx, shutdown_rx) {
                let _ = error_tx.send(e);
            }
            log::debug!("[AUDIO-THREAD] Audio thread finished");
        });

        Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        }
    }

    /// Signals the thread to stop and waits for it.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("[MAIN] Audio thread panicked during shutdown");
            }
        }
    }
}

fn run(
    config: DetectorConfig,
    hop_size: usize,
    chord_tx: &Sender<ChordMatch>,
    shutdown_rx: Receiver<()>,
) -> Result<(), DetectorError> {
    let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::bounded::<Vec<f32>>(32);
    let (stream, sample_rate) = audio::start_audio_capture(hop_size, raw_audio_tx)?;

    let mut analyser = SpectrumAnalyser::new(&config);
    let mut detector = ChordDetector::for_sample_rate(config, sample_rate)?;
    log::info!(
        "[AUDIO-THREAD] Listening: {} Hz, {:.2} Hz per bin",
        sample_rate,
        detector.hz_per_bin()
    );

    loop {
        crossbeam_channel::select! {
            recv(raw_audio_rx) -> msg => match msg {
                Ok(hop) => {
                    analyser.push_samples(&hop);
                    let analysis = detector.process_frame(analyser.analyse())?;
                    if log::log_enabled!(log::Level::Debug) {
                        log::debug!(
                            "[AUDIO-THREAD] {} peaks, notes [{}], threshold {:.1}, window {}/{}",
                            analysis.peaks.len(),
                            describe_fundamentals(analysis.fundamentals),
                            analysis.active_threshold,
                            analysis.window_len,
                            analysis.window_capacity
                        );
                    }
                    if let Some(chord) = analysis.chord_change() {
                        if chord_tx.send(chord.clone()).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => {
                    log::warn!("[AUDIO-THREAD] Audio channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                log::debug!("[AUDIO-THREAD] Received shutdown signal");
                break;
            },
        }
    }

    if let Err(e) = stream.pause() {
        log::warn!("[AUDIO-THREAD] Error pausing stream: {}", e);
    }
    drop(stream);
    Ok(())
}

/// "A3 +4c, E4 -12c" for the verbose frame log.
fn describe_fundamentals(fundamentals: &[Fundamental]) -> String {
    fundamentals
        .iter()
        .map(|f| format!("{} {:+.0}c", midi_to_note_name(f.midi, true), cents_offset(f.midi)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fundamentals_are_described_with_cents() {
        let fundamentals = [Fundamental { midi: 57.04 }, Fundamental { midi: 63.88 }];
        assert_eq!(describe_fundamentals(&fundamentals), "A3 +4c, E4 -12c");
        assert_eq!(describe_fundamentals(&[]), "");
    }
}
