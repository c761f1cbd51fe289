use std::path::Path;

use super::util::enable_expression;
use super::StallCompiler;

impl StallCompiler<'_> {
    pub(super) fn audio_stall_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = self.base_args(true);
        args.push("-i".to_string());
        args.push(input.to_string_lossy().into_owned());
        args.push("-filter_complex".to_string());
        args.push(self.build_audio_filter());
        args.extend(["-map", "[outa]", "-c:a", self.options.acodec.as_str()].map(String::from));
        args.push(output.to_string_lossy().into_owned());
        args
    }

    /// Looping freezes the samples; the volume gate mutes them.
    pub(super) fn build_audio_filter(&self) -> String {
        let loops = self
            .plan
            .audio_loops()
            .map(|audio_loop| {
                format!(
                    "aloop=loop={}:size=1:start={},asetpts=N/SAMPLE_RATE/TB",
                    audio_loop.len_samples, audio_loop.start_sample
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "[0:a]{loops},volume=0:enable='{gate}'[outa]",
            gate = enable_expression(self.plan.audio_windows())
        )
    }
}
