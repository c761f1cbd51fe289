use std::path::PathBuf;

use clap::{Args, ValueHint};

use super::timestamp::parse_timestamp;

#[derive(Args, Debug, Clone)]
pub struct StallArgs {
    /// Input media file
    #[arg(short = 'i', long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output media file
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Buffering events as [[position, duration], ...] in seconds
    #[arg(short = 'b', long, allow_hyphen_values = true)]
    pub buflist: String,

    /// Video encoder for the intermediate passes
    #[arg(short = 'v', long)]
    pub vcodec: Option<String>,

    /// Audio encoder for the intermediate passes
    #[arg(short = 'a', long)]
    pub acodec: Option<String>,

    /// Pixel format of the stalled video
    #[arg(short = 'x', long)]
    pub pixfmt: Option<String>,

    /// Spinner image or video shown during stalls
    #[arg(short = 's', long, value_hint = ValueHint::FilePath)]
    pub spinner: Option<PathBuf>,

    /// Freeze without blur or spinner
    #[arg(short = 'e', long)]
    pub disable_spinner: bool,

    /// Spinner rotation speed
    #[arg(short = 'p', long)]
    pub speed: Option<u32>,

    /// Cap the output length (seconds or HH:MM:SS.mmm)
    #[arg(short = 't', long, value_parser = parse_timestamp)]
    pub trim: Option<f64>,

    /// Brightness shift during stalls (-1.0 to 1.0)
    #[arg(short = 'r', long, allow_hyphen_values = true, value_parser = parse_brightness)]
    pub brightness: Option<f64>,

    /// Blur kernel size during stalls
    #[arg(short = 'l', long)]
    pub blur: Option<u32>,

    /// Show a black frame for a stall at the very start
    #[arg(short = 'c', long)]
    pub black_frame: bool,

    /// Drop the audio stream even if the input has one
    #[arg(long)]
    pub audio_disable: bool,

    /// Re-stamp the output to the input frame rate
    #[arg(long)]
    pub force_framerate: bool,

    /// Skip the content after each freeze instead of delaying it
    #[arg(long)]
    pub skipping: bool,

    /// Overwrite the output file
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Print the ffmpeg commands without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Alternate config file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

fn parse_brightness(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(brightness) if (-1.0..=1.0).contains(&brightness) => Ok(brightness),
        _ => Err(format!("'{value}' is not a brightness between -1.0 and 1.0")),
    }
}
