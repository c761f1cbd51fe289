use std::path::Path;

use super::util::{enable_expression, escape_ffmpeg_path, format_number};
use super::{FilterChain, Indicator, SpinnerStyle, StallCompiler};
use crate::stall::error::{StallError, StallResult, StreamField};
use crate::stall::planner::Window;

const CENTERED: &str = "(main_w-overlay_w)/2:(main_h-overlay_h)/2";

impl StallCompiler<'_> {
    pub(super) fn video_stall_args(&self, input: &Path, output: &Path) -> StallResult<Vec<String>> {
        let mut args = self.base_args(true);
        args.push("-i".to_string());
        args.push(input.to_string_lossy().into_owned());
        args.push("-filter_complex".to_string());
        args.push(self.build_video_filter_complex()?);
        args.extend(
            [
                "-map",
                "[outv]",
                "-c:v",
                self.options.vcodec.as_str(),
                "-pix_fmt",
                self.options.pixfmt.as_str(),
                "-fps_mode",
                "cfr",
            ]
            .map(String::from),
        );
        args.push(output.to_string_lossy().into_owned());
        Ok(args)
    }

    pub(super) fn build_video_filter_complex(&self) -> StallResult<String> {
        let mut filters = FilterChain::new();
        let mut current = "stall".to_string();

        filters.push(format!("[0:v]{}[{current}]", self.video_loop_chain()));

        if let Some(window) = self.black_window() {
            current = self.apply_black_frame(&mut filters, &current, window)?;
        }

        if let Indicator::Spinner(style) = &self.options.indicator {
            current = self.apply_spinner(&mut filters, &current, style)?;
        }

        filters.push(format!("[{current}]copy[outv]"));
        Ok(filters.join())
    }

    fn video_loop_chain(&self) -> String {
        self.plan
            .video_loops()
            .map(|video_loop| {
                format!(
                    "loop=loop={}:size=1:start={},setpts=N/FRAME_RATE/TB",
                    video_loop.len_frames, video_loop.start_frame
                )
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn black_window(&self) -> Option<Window> {
        if self.options.black_frame {
            self.plan.black_window
        } else {
            None
        }
    }

    fn apply_black_frame(
        &self,
        filters: &mut FilterChain,
        input_label: &str,
        window: Window,
    ) -> StallResult<String> {
        let resolution = self
            .profile
            .resolution
            .ok_or(StallError::MissingStreamInfo(StreamField::Resolution))?;
        let fps = format_number(self.fps()?);

        filters.push(format!("color=c=black:s={resolution}:r={fps}[black]"));
        let output_label = "blacked";
        filters.push(format!(
            "[{input_label}][black]overlay={CENTERED}:shortest=1:enable='{gate}'[{output_label}]",
            gate = enable_expression([window]),
        ));
        Ok(output_label.to_string())
    }

    fn apply_spinner(
        &self,
        filters: &mut FilterChain,
        input_label: &str,
        style: &SpinnerStyle,
    ) -> StallResult<String> {
        let gate = enable_expression(self.plan.video_windows());
        let fps = format_number(self.fps()?);

        filters.push(format!(
            "[{input_label}]avgblur={blur}:enable='{gate}',eq=brightness={brightness}:enable='{gate}'[blurred]",
            blur = style.blur,
            brightness = format_number(style.brightness),
        ));
        filters.push(format!(
            "movie=filename='{path}':loop=0,setpts=N/(FRAME_RATE*TB)*{speed},fps=fps={fps}[spinner]",
            path = escape_ffmpeg_path(&style.path),
            speed = style.speed,
        ));
        let output_label = "spun";
        filters.push(format!(
            "[blurred][spinner]overlay={CENTERED}:shortest=1:enable='{gate}'[{output_label}]"
        ));
        Ok(output_label.to_string())
    }
}
