mod audio;
mod merge;
mod trim;
mod util;
mod video;


use std::path::{Path, PathBuf};

use super::error::{StallError, StallResult, StreamField};
use super::passes::{PassKind, StreamRole};
use super::planner::SegmentPlan;
use super::probe::StreamProfile;

/// One fully rendered ffmpeg invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationSpec {
    pub pass: PassKind,
    pub program: String,
    pub args: Vec<String>,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

impl InvocationSpec {
    /// Shell-quoted command line, as printed by dry runs.
    pub fn command_line(&self) -> String {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: String) {
        self.filters.push(filter);
    }

    pub fn join(&self) -> String {
        self.filters.join(";")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinnerStyle {
    pub path: PathBuf,
    pub speed: u32,
    pub blur: u32,
    pub brightness: f64,
}

/// How a stall is shown on top of the frozen picture.
#[derive(Debug, Clone, PartialEq)]
pub enum Indicator {
    /// Plain freeze.
    None,
    Spinner(SpinnerStyle),
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub program: String,
    pub vcodec: String,
    pub acodec: String,
    pub pixfmt: String,
    pub threads: u32,
    /// Passed as `-y` (true) or `-n` to the pass writing the final output.
    pub overwrite: bool,
    pub force_framerate: bool,
    /// User cap on the output length, in seconds.
    pub trim: Option<f64>,
    pub indicator: Indicator,
    pub black_frame: bool,
}

/// Input of a pass after its artifact reference has been resolved to a path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    pub role: StreamRole,
    pub path: PathBuf,
}

pub struct StallCompiler<'a> {
    plan: &'a SegmentPlan,
    profile: &'a StreamProfile,
    options: &'a CompileOptions,
}

impl<'a> StallCompiler<'a> {
    pub fn new(
        plan: &'a SegmentPlan,
        profile: &'a StreamProfile,
        options: &'a CompileOptions,
    ) -> Self {
        Self {
            plan,
            profile,
            options,
        }
    }

    pub fn compile(
        &self,
        pass: PassKind,
        inputs: &[ResolvedInput],
        output: &Path,
    ) -> StallResult<InvocationSpec> {
        let args = match pass {
            PassKind::VideoStall => self.video_stall_args(single_input(pass, inputs)?, output)?,
            PassKind::AudioStall => self.audio_stall_args(single_input(pass, inputs)?, output),
            PassKind::SkipTrim => self.skip_trim_args(single_input(pass, inputs)?, output)?,
            PassKind::Merge => self.merge_args(inputs, output)?,
        };

        Ok(InvocationSpec {
            pass,
            program: self.options.program.clone(),
            args,
            inputs: inputs.iter().map(|input| input.path.clone()).collect(),
            output: output.to_path_buf(),
        })
    }

    /// Leading options shared by every pass. Intermediate passes always
    /// overwrite since their files belong to this run.
    fn base_args(&self, overwrite: bool) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-threads".to_string(),
            self.options.threads.to_string(),
            if overwrite { "-y" } else { "-n" }.to_string(),
        ]
    }

    fn fps(&self) -> StallResult<f64> {
        self.plan
            .fps
            .ok_or(StallError::MissingStreamInfo(StreamField::FrameRate))
    }
}

fn single_input(pass: PassKind, inputs: &[ResolvedInput]) -> StallResult<&Path> {
    match inputs {
        [input] => Ok(&input.path),
        _ => Err(StallError::InvalidTempKind(format!(
            "{pass} pass expects exactly one input, got {}",
            inputs.len()
        ))),
    }
}
