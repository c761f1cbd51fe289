use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::passes::PassKind;

/// Stream attribute the requested mode needs but the prober could not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamField {
    FrameRate,
    SampleRate,
    Resolution,
    Duration,
    VideoStream,
    AnyStream,
}

impl fmt::Display for StreamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamField::FrameRate => "video frame rate",
            StreamField::SampleRate => "audio sample rate",
            StreamField::Resolution => "video resolution",
            StreamField::Duration => "input duration",
            StreamField::VideoStream => "video stream",
            StreamField::AnyStream => "video or audio stream",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StallError {
    #[error(
        "Buffering list not properly formatted: {raw:?} ({reason}). Use a list like [[0, 1], [5, 10]] where each pair is [position, duration] in seconds"
    )]
    MalformedEventList { raw: String, reason: String },

    #[error(
        "Buffering event {index} at {position}s starts before the previous event at {previous}s; events must be in chronological order"
    )]
    UnorderedEvents {
        index: usize,
        position: f64,
        previous: f64,
    },

    #[error(
        "Buffering event {index} starts inside content already skipped by the previous event or keeps no content before it"
    )]
    OverlappingSkip { index: usize },

    #[error(
        "Buffering event {index} lasts {duration}s, too short to fit an enable window of more than {epsilon}s"
    )]
    EventTooShort {
        index: usize,
        duration: f64,
        epsilon: f64,
    },

    #[error("Skipping leaves no video to keep")]
    NothingToKeep,

    #[error("Could not detect {0} from input file")]
    MissingStreamInfo(StreamField),

    #[error("{program} failed during {pass} pass (exit code {code:?}): {output}")]
    ProcessFailure {
        pass: PassKind,
        program: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Invalid temporary artifact kind: {0}")]
    InvalidTempKind(String),

    #[error("Output {} is already being processed by another run", .0.display())]
    OutputInUse(PathBuf),

    #[error("Failed to probe input: {0}")]
    Probe(String),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StallError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StallError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn malformed(raw: &str, reason: impl Into<String>) -> Self {
        StallError::MalformedEventList {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

pub type StallResult<T> = Result<T, StallError>;
