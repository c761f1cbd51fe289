use anyhow::{Context, Result, bail};

use super::cli::StallArgs;
use super::config::BuffererConfig;
use super::events::EventList;
use super::graph::{CompileOptions, Indicator, SpinnerStyle};
use super::logging::log_event;
use super::output::{check_output_destination, prepare_output_destination};
use super::pipeline::{StallPipeline, StallPipelineParams};
use super::planner::PlanOptions;
use super::probe::{FfprobeProber, MediaProber};
use super::runner::SystemFfmpegRunner;
use crate::ui::prelude::Level;

pub fn handle_stall(args: StallArgs, verbose: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => BuffererConfig::load_from_path(path)?,
        None => BuffererConfig::load()?,
    };

    let events = EventList::parse(&args.buflist)?;
    log_event(
        Level::Debug,
        "stall.events",
        format!(
            "{} event(s), {}s of stalls",
            events.events().len(),
            events.total_duration()
        ),
    );

    if !args.input.is_file() {
        bail!("Input file {} does not exist", args.input.display());
    }
    if !args.dry_run {
        check_output_destination(&args.input, &args.output, args.force)?;
    }

    let indicator = resolve_indicator(&args, &config)?;

    require_tool(&config.ffprobe)?;
    if !args.dry_run {
        require_tool(&config.ffmpeg)?;
    }

    let prober = FfprobeProber::new(config.ffprobe.clone());
    let mut profile = prober.probe(&args.input)?;
    if args.audio_disable {
        profile = profile.without_audio();
    }
    profile.validate()?;

    log_event(
        Level::Debug,
        "stall.probe",
        format!(
            "Input: video={} audio={} fps={:?} sample_rate={:?} resolution={} duration={:?}",
            profile.has_video,
            profile.has_audio,
            profile.fps,
            profile.sample_rate,
            profile
                .resolution
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            profile.duration
        ),
    );

    let compile_options = CompileOptions {
        program: config.ffmpeg.clone(),
        vcodec: args.vcodec.clone().unwrap_or_else(|| config.vcodec.clone()),
        acodec: args.acodec.clone().unwrap_or_else(|| config.acodec.clone()),
        pixfmt: args.pixfmt.clone().unwrap_or_else(|| config.pixfmt.clone()),
        threads: config.threads,
        overwrite: args.force,
        force_framerate: args.force_framerate,
        trim: args.trim,
        indicator,
        black_frame: args.black_frame,
    };

    let plan_options = PlanOptions {
        video_enable_epsilon: config.video_enable_epsilon,
        skipping: args.skipping,
    };

    let runner = SystemFfmpegRunner;
    let pipeline = StallPipeline::new(StallPipelineParams {
        input: args.input.clone(),
        output: args.output.clone(),
        events,
        profile,
        plan_options,
        compile_options,
        temp_extension: config.temp_extension.clone(),
        verbose,
        runner: &runner,
    });

    if args.dry_run {
        pipeline.print_commands()?;
        return Ok(());
    }

    prepare_output_destination(&args.output)?;
    pipeline.execute()?;
    Ok(())
}

/// Skip mode and `--disable-spinner` freeze without an indicator; otherwise
/// the spinner file has to exist.
fn resolve_indicator(args: &StallArgs, config: &BuffererConfig) -> Result<Indicator> {
    if args.disable_spinner || args.skipping {
        return Ok(Indicator::None);
    }

    let path = args.spinner.clone().unwrap_or_else(|| config.spinner.clone());
    if !path.exists() {
        bail!(
            "Spinner file {} does not exist. Pass --spinner or --disable-spinner.",
            path.display()
        );
    }

    Ok(Indicator::Spinner(SpinnerStyle {
        path,
        speed: args.speed.unwrap_or(config.speed),
        blur: args.blur.unwrap_or(config.blur),
        brightness: args.brightness.unwrap_or(config.brightness),
    }))
}

fn require_tool(program: &str) -> Result<()> {
    which::which(program).map(|_| ()).with_context(|| {
        format!("{program} not found. Please install ffmpeg and make sure it is in your PATH")
    })
}
