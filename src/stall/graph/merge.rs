use std::path::Path;

use super::util::format_number;
use super::{ResolvedInput, StallCompiler};
use crate::stall::error::{StallError, StallResult, StreamField};
use crate::stall::passes::StreamRole;

impl StallCompiler<'_> {
    pub(super) fn merge_args(
        &self,
        inputs: &[ResolvedInput],
        output: &Path,
    ) -> StallResult<Vec<String>> {
        let mut args = self.base_args(self.options.overwrite);
        for input in inputs {
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().into_owned());
        }

        if let Some(duration) = self.output_duration()? {
            args.push("-t".to_string());
            args.push(format_number(duration));
        }

        let has_video = inputs.iter().any(|input| input.role == StreamRole::Video);
        let has_audio = inputs.iter().any(|input| input.role == StreamRole::Audio);

        if has_video && has_audio {
            for (index, input) in inputs.iter().enumerate() {
                let stream = match input.role {
                    StreamRole::Video => "v",
                    StreamRole::Audio => "a",
                };
                args.push("-map".to_string());
                args.push(format!("{index}:{stream}"));
            }
        }

        if self.options.force_framerate && has_video {
            args.push("-c:v".to_string());
            args.push(self.options.vcodec.clone());
            args.push("-filter:v".to_string());
            args.push(format!("fps=fps={}", format_number(self.fps()?)));
            if has_audio {
                args.push("-c:a".to_string());
                args.push("copy".to_string());
            }
        } else {
            args.push("-c".to_string());
            args.push("copy".to_string());
        }

        args.push(output.to_string_lossy().into_owned());
        Ok(args)
    }

    /// The user trim wins; skip mode otherwise caps the output at the input
    /// length.
    fn output_duration(&self) -> StallResult<Option<f64>> {
        if let Some(trim) = self.options.trim {
            return Ok(Some(trim));
        }
        if self.plan.is_skipping() {
            let duration = self
                .profile
                .duration
                .ok_or(StallError::MissingStreamInfo(StreamField::Duration))?;
            return Ok(Some(duration));
        }
        Ok(None)
    }
}
