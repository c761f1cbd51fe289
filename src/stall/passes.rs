//! Which ffmpeg passes a run needs, and in what order.

use std::fmt;
use std::str::FromStr;

use super::error::StallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    VideoStall,
    SkipTrim,
    AudioStall,
    Merge,
}

impl PassKind {
    pub fn code(&self) -> &'static str {
        match self {
            PassKind::VideoStall => "video",
            PassKind::SkipTrim => "trim",
            PassKind::AudioStall => "audio",
            PassKind::Merge => "merge",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PassKind::VideoStall => "processing video",
            PassKind::SkipTrim => "trimming video",
            PassKind::AudioStall => "processing audio",
            PassKind::Merge => "merging video/audio",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Intermediate artifact produced by one pass and consumed by a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempKind {
    Video,
    Audio,
    Skipping,
}

impl TempKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            TempKind::Video => "video",
            TempKind::Audio => "audio",
            TempKind::Skipping => "skipping",
        }
    }
}

impl FromStr for TempKind {
    type Err = StallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(TempKind::Video),
            "audio" => Ok(TempKind::Audio),
            "skipping" => Ok(TempKind::Skipping),
            other => Err(StallError::InvalidTempKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRef {
    /// The user's input file.
    Source,
    Temp(TempKind),
    /// The user's output file.
    Final,
}

/// Which stream a pass reads from an input artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassInput {
    pub role: StreamRole,
    pub artifact: ArtifactRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDescriptor {
    pub kind: PassKind,
    pub inputs: Vec<PassInput>,
    pub output: ArtifactRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassFlags {
    pub has_video: bool,
    pub has_audio: bool,
    pub skipping: bool,
    pub audio_disable: bool,
}

impl PassFlags {
    fn audio_enabled(&self) -> bool {
        self.has_audio && !self.audio_disable
    }
}

/// Ordered passes for a run: video, then trim, then audio, then merge.
///
/// Skip mode never runs an audio pass; the merge reads the untouched audio
/// from the source instead.
pub fn plan_passes(flags: PassFlags) -> Vec<PassDescriptor> {
    let mut passes = Vec::with_capacity(4);

    if flags.has_video {
        passes.push(PassDescriptor {
            kind: PassKind::VideoStall,
            inputs: vec![PassInput {
                role: StreamRole::Video,
                artifact: ArtifactRef::Source,
            }],
            output: ArtifactRef::Temp(TempKind::Video),
        });
    }

    if flags.skipping {
        passes.push(PassDescriptor {
            kind: PassKind::SkipTrim,
            inputs: vec![PassInput {
                role: StreamRole::Video,
                artifact: ArtifactRef::Temp(TempKind::Video),
            }],
            output: ArtifactRef::Temp(TempKind::Skipping),
        });
    } else if flags.audio_enabled() {
        passes.push(PassDescriptor {
            kind: PassKind::AudioStall,
            inputs: vec![PassInput {
                role: StreamRole::Audio,
                artifact: ArtifactRef::Source,
            }],
            output: ArtifactRef::Temp(TempKind::Audio),
        });
    }

    let mut merge_inputs = Vec::with_capacity(2);
    if flags.has_video {
        merge_inputs.push(PassInput {
            role: StreamRole::Video,
            artifact: if flags.skipping {
                ArtifactRef::Temp(TempKind::Skipping)
            } else {
                ArtifactRef::Temp(TempKind::Video)
            },
        });
    }
    if flags.audio_enabled() {
        merge_inputs.push(PassInput {
            role: StreamRole::Audio,
            artifact: if flags.skipping {
                ArtifactRef::Source
            } else {
                ArtifactRef::Temp(TempKind::Audio)
            },
        });
    }
    passes.push(PassDescriptor {
        kind: PassKind::Merge,
        inputs: merge_inputs,
        output: ArtifactRef::Final,
    });

    passes
}
