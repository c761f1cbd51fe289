use std::path::Path;

use super::{FilterChain, StallCompiler};
use crate::stall::error::{StallError, StallResult};

impl StallCompiler<'_> {
    pub(super) fn skip_trim_args(&self, input: &Path, output: &Path) -> StallResult<Vec<String>> {
        let mut args = self.base_args(true);
        args.push("-i".to_string());
        args.push(input.to_string_lossy().into_owned());
        args.push("-filter_complex".to_string());
        args.push(self.build_trim_filter_complex()?);
        args.extend(
            [
                "-map",
                "[outv]",
                "-c:v",
                self.options.vcodec.as_str(),
                "-fps_mode",
                "cfr",
            ]
            .map(String::from),
        );
        args.push(output.to_string_lossy().into_owned());
        Ok(args)
    }

    /// Keep every planned range of the stalled video and butt them together.
    pub(super) fn build_trim_filter_complex(&self) -> StallResult<String> {
        let ranges: Vec<_> = self
            .plan
            .trim_ranges()
            .into_iter()
            .filter(|range| !range.is_empty())
            .collect();
        if ranges.is_empty() {
            return Err(StallError::NothingToKeep);
        }

        let mut filters = FilterChain::new();
        let mut concat_inputs = String::new();

        for (index, range) in ranges.iter().enumerate() {
            let label = format!("i{index}v");
            filters.push(format!(
                "[0:v]trim=start_frame={}:end_frame={},setpts=PTS-STARTPTS[{label}]",
                range.start_frame, range.end_frame
            ));
            concat_inputs.push_str(&format!("[{label}]"));
        }

        filters.push(format!(
            "{concat_inputs}concat=n={count}:v=1[outv]",
            count = ranges.len()
        ));
        Ok(filters.join())
    }
}
