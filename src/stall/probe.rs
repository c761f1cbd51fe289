use std::fmt;
use std::path::Path;

use duct::cmd;
use serde::Deserialize;

use super::error::{StallError, StallResult, StreamField};

/// Video dimensions (width x height in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Stream metadata of the input file, as far as the stall passes need it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamProfile {
    pub fps: Option<f64>,
    pub sample_rate: Option<f64>,
    pub resolution: Option<Resolution>,
    /// Total input duration in seconds.
    pub duration: Option<f64>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl StreamProfile {
    /// Drop the audio stream from the profile (`--audio-disable`).
    pub fn without_audio(mut self) -> Self {
        self.has_audio = false;
        self.sample_rate = None;
        self
    }

    /// Fail fast when a present stream lacks the attributes the passes need.
    pub fn validate(&self) -> StallResult<()> {
        if !self.has_video && !self.has_audio {
            return Err(StallError::MissingStreamInfo(StreamField::AnyStream));
        }
        if self.has_video {
            if self.fps.is_none() {
                return Err(StallError::MissingStreamInfo(StreamField::FrameRate));
            }
            if self.resolution.is_none() {
                return Err(StallError::MissingStreamInfo(StreamField::Resolution));
            }
        }
        if self.has_audio && self.sample_rate.is_none() {
            return Err(StallError::MissingStreamInfo(StreamField::SampleRate));
        }
        Ok(())
    }
}

pub trait MediaProber {
    fn probe(&self, input: &Path) -> StallResult<StreamProfile>;
}

/// Prober backed by `ffprobe -show_streams -show_format -of json`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: String,
}

impl FfprobeProber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, input: &Path) -> StallResult<StreamProfile> {
        let output = cmd!(
            &self.program,
            "-v",
            "error",
            "-show_streams",
            "-show_format",
            "-of",
            "json",
            input
        )
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|err| StallError::io(format!("Failed to run {}", self.program), err))?;

        if !output.status.success() {
            return Err(StallError::Probe(format!(
                "{} exited with status {:?} for {}: {}",
                self.program,
                output.status.code(),
                input.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    sample_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Map ffprobe JSON onto a [`StreamProfile`], using the first video and audio stream.
pub fn parse_ffprobe_json(json: &str) -> StallResult<StreamProfile> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|err| StallError::Probe(format!("invalid ffprobe output: {err}")))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let fps = video.and_then(|v| {
        v.r_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| v.avg_frame_rate.as_deref().and_then(parse_frame_rate))
    });
    let resolution = video.and_then(|v| match (v.width, v.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(Resolution::new(w, h)),
        _ => None,
    });
    let sample_rate = audio
        .and_then(|a| a.sample_rate.as_deref())
        .and_then(|rate| rate.parse::<f64>().ok())
        .filter(|rate| *rate > 0.0);

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or_else(|| video.and_then(|v| v.duration.as_deref()))
        .or_else(|| audio.and_then(|a| a.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    Ok(StreamProfile {
        fps,
        sample_rate,
        resolution,
        duration,
        has_video: video.is_some(),
        has_audio: audio.is_some(),
    })
}

fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 640, "height": 480, "r_frame_rate": "30000/1001", "avg_frame_rate": "30000/1001"},
            {"codec_type": "audio", "sample_rate": "48000", "duration": "10.005"}
        ],
        "format": {"duration": "10.010000"}
    }"#;

    #[test]
    fn parses_video_and_audio_streams() {
        let profile = parse_ffprobe_json(SAMPLE).unwrap();
        assert!(profile.has_video);
        assert!(profile.has_audio);
        assert!((profile.fps.unwrap() - 29.97).abs() < 0.001);
        assert_eq!(profile.sample_rate, Some(48000.0));
        assert_eq!(profile.resolution, Some(Resolution::new(640, 480)));
        assert_eq!(profile.duration, Some(10.01));
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn zero_denominator_frame_rate_falls_back_to_average() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 2, "height": 2, "r_frame_rate": "0/0", "avg_frame_rate": "25/1"}]}"#;
        let profile = parse_ffprobe_json(json).unwrap();
        assert_eq!(profile.fps, Some(25.0));
        assert_eq!(profile.duration, None);
    }

    #[test]
    fn missing_fields_fail_validation() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 2, "height": 2}]}"#;
        let profile = parse_ffprobe_json(json).unwrap();
        assert!(matches!(
            profile.validate(),
            Err(StallError::MissingStreamInfo(StreamField::FrameRate))
        ));

        let empty = parse_ffprobe_json(r#"{"streams": []}"#).unwrap();
        assert!(matches!(
            empty.validate(),
            Err(StallError::MissingStreamInfo(StreamField::AnyStream))
        ));
    }

    #[test]
    fn without_audio_clears_audio_fields() {
        let profile = parse_ffprobe_json(SAMPLE).unwrap().without_audio();
        assert!(!profile.has_audio);
        assert_eq!(profile.sample_rate, None);
        assert_eq!(Resolution::new(640, 480).to_string(), "640x480");
    }
}
