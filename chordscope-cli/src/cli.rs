use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chordscope", about = "Live chord detection from the default audio input")]
pub struct Cli {
    /// TOML config file (defaults to ./chordscope.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FFT length in samples (power of two)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Identical frames required before a chord is reported
    #[arg(long)]
    pub stability_frames: Option<usize>,

    /// Maximum number of simultaneous notes
    #[arg(long)]
    pub max_fundamentals: Option<usize>,

    /// Samples between successive analysis frames
    #[arg(long, default_value_t = 2048)]
    pub hop_size: usize,

    /// Print chord changes as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f32>,

    /// Log per-frame detail
    #[arg(short, long)]
    pub verbose: bool,
}
