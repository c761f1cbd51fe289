use std::io::Read;
use std::time::Duration;

use duct::cmd;
use indicatif::{ProgressBar, ProgressStyle};

use super::error::{StallError, StallResult};
use super::graph::InvocationSpec;
use super::timestamp::parse_timestamp;

pub trait FfmpegRunner {
    /// Run one pass to completion and return its combined output.
    fn run(&self, spec: &InvocationSpec, options: RunOptions) -> StallResult<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Expected length of the pass output, drives the progress bar.
    pub expected_duration: Option<f64>,
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpegRunner;

impl FfmpegRunner for SystemFfmpegRunner {
    fn run(&self, spec: &InvocationSpec, options: RunOptions) -> StallResult<String> {
        let mut reader = cmd(&spec.program, &spec.args)
            .stderr_to_stdout()
            .unchecked()
            .reader()
            .map_err(|err| StallError::io(format!("Failed to spawn {}", spec.program), err))?;

        let pb = match options.expected_duration {
            Some(duration) if !options.verbose => Some(progress_bar(duration, spec)),
            _ => None,
        };

        let output = read_ffmpeg_output(&mut reader, options.verbose, pb.as_ref())?;

        let status = reader
            .try_wait()
            .map_err(|err| StallError::io(format!("Failed to wait for {}", spec.program), err))?
            .map(|finished| finished.status);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        match status {
            Some(status) if status.success() => Ok(output),
            status => Err(StallError::ProcessFailure {
                pass: spec.pass,
                program: spec.program.clone(),
                code: status.and_then(|status| status.code()),
                output: output.trim().to_string(),
            }),
        }
    }
}

fn progress_bar(duration: f64, spec: &InvocationSpec) -> ProgressBar {
    let pb = ProgressBar::new((duration * 1000.0) as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(spec.pass.describe());
    pb
}

/// Collect everything ffmpeg prints. Progress lines end in `\r`, so both line
/// terminators split.
fn read_ffmpeg_output<R: Read>(
    mut source: R,
    verbose: bool,
    pb: Option<&ProgressBar>,
) -> StallResult<String> {
    let mut buffer = [0u8; 4096];
    let mut pending = String::new();
    let mut output = String::new();

    loop {
        let bytes_read = source
            .read(&mut buffer)
            .map_err(|err| StallError::io("Failed to read ffmpeg output", err))?;
        if bytes_read == 0 {
            break;
        }

        pending.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));

        while let Some(pos) = pending.find(['\r', '\n']) {
            let line: String = pending.drain(..=pos).collect();
            handle_line(line.trim_end(), verbose, pb, &mut output);
        }
    }

    if !pending.is_empty() {
        handle_line(pending.trim_end(), verbose, pb, &mut output);
    }

    Ok(output)
}

fn handle_line(line: &str, verbose: bool, pb: Option<&ProgressBar>, output: &mut String) {
    if line.is_empty() {
        return;
    }

    output.push_str(line);
    output.push('\n');

    if verbose {
        eprintln!("{line}");
    }

    if let Some(pb) = pb {
        if let Some(progress) = parse_ffmpeg_progress(line) {
            pb.set_position((progress * 1000.0) as u64);
        }
        if let Some(speed) = parse_ffmpeg_speed(line) {
            pb.set_message(speed);
        }
    }
}

fn parse_ffmpeg_progress(line: &str) -> Option<f64> {
    let time_start = line.find("time=")?;
    let time_str = &line[time_start + 5..];
    let time_val = time_str.split_whitespace().next()?;
    parse_timestamp(time_val).ok()
}

fn parse_ffmpeg_speed(line: &str) -> Option<String> {
    let speed_start = line.find("speed=")?;
    let speed_str = line[speed_start + 6..].trim_start();
    let speed_end = speed_str.find('x')?;
    Some(speed_str[..=speed_end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_read_from_time_field() {
        let line = "frame=  120 fps= 60 q=-0.0 size=N/A time=00:00:04.00 bitrate=N/A speed=2.01x";
        assert_eq!(parse_ffmpeg_progress(line), Some(4.0));
        assert_eq!(parse_ffmpeg_speed(line).as_deref(), Some("2.01x"));
    }

    #[test]
    fn unknown_progress_is_ignored() {
        assert_eq!(parse_ffmpeg_progress("time=N/A bitrate=N/A"), None);
        assert_eq!(parse_ffmpeg_progress("Stream mapping:"), None);
    }

    #[test]
    fn output_is_split_on_carriage_returns() {
        let raw = b"Input #0, matroska\nframe=1 time=00:00:00.04\rframe=2 time=00:00:00.08\rdone";
        let output = read_ffmpeg_output(&raw[..], false, None).unwrap();
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec![
                "Input #0, matroska",
                "frame=1 time=00:00:00.04",
                "frame=2 time=00:00:00.08",
                "done"
            ]
        );
    }
}
