use std::path::PathBuf;

use serde_json::json;

use super::artifacts::TempArtifacts;
use super::error::{StallError, StallResult};
use super::events::EventList;
use super::graph::{CompileOptions, InvocationSpec, ResolvedInput, StallCompiler};
use super::logging::{log_event, log_event_with};
use super::passes::{ArtifactRef, PassFlags, PassKind, TempKind, plan_passes};
use super::planner::{PlanOptions, SegmentPlan, plan_segments};
use super::probe::StreamProfile;
use super::runner::{FfmpegRunner, RunOptions};
use crate::ui::prelude::Level;

/// A rendered pass and the temp artifact it writes, if any.
#[derive(Debug, Clone)]
pub struct PlannedPass {
    pub spec: InvocationSpec,
    pub produces: Option<TempKind>,
}

pub struct StallPipeline<'a> {
    input: PathBuf,
    output: PathBuf,
    events: EventList,
    profile: StreamProfile,
    plan_options: PlanOptions,
    compile_options: CompileOptions,
    temp_extension: String,
    verbose: bool,
    runner: &'a dyn FfmpegRunner,
}

pub struct StallPipelineParams<'a> {
    pub input: PathBuf,
    pub output: PathBuf,
    pub events: EventList,
    pub profile: StreamProfile,
    pub plan_options: PlanOptions,
    pub compile_options: CompileOptions,
    pub temp_extension: String,
    pub verbose: bool,
    pub runner: &'a dyn FfmpegRunner,
}

impl<'a> StallPipeline<'a> {
    pub fn new(params: StallPipelineParams<'a>) -> Self {
        Self {
            input: params.input,
            output: params.output,
            events: params.events,
            profile: params.profile,
            plan_options: params.plan_options,
            compile_options: params.compile_options,
            temp_extension: params.temp_extension,
            verbose: params.verbose,
            runner: params.runner,
        }
    }

    fn flags(&self) -> PassFlags {
        PassFlags {
            has_video: self.profile.has_video,
            has_audio: self.profile.has_audio,
            skipping: self.plan_options.skipping,
            // the profile has already dropped audio when it was disabled
            audio_disable: false,
        }
    }

    /// Plan and render every pass without touching the filesystem.
    pub fn prepare(&self) -> StallResult<(SegmentPlan, Vec<PlannedPass>)> {
        let plan = plan_segments(&self.events, &self.profile, self.plan_options)?;
        let compiler = StallCompiler::new(&plan, &self.profile, &self.compile_options);
        let mut names = TempArtifacts::planned(&self.output, &self.temp_extension);

        let mut passes = Vec::new();
        for descriptor in plan_passes(self.flags()) {
            let inputs = descriptor
                .inputs
                .iter()
                .map(|input| {
                    let path = match input.artifact {
                        ArtifactRef::Source => self.input.clone(),
                        ArtifactRef::Temp(kind) => names.resolve(kind)?,
                        ArtifactRef::Final => self.output.clone(),
                    };
                    Ok(ResolvedInput {
                        role: input.role,
                        path,
                    })
                })
                .collect::<StallResult<Vec<_>>>()?;

            let (output, produces) = match descriptor.output {
                ArtifactRef::Temp(kind) => (names.register(kind), Some(kind)),
                ArtifactRef::Final => (self.output.clone(), None),
                ArtifactRef::Source => {
                    return Err(StallError::InvalidTempKind(format!(
                        "{} pass would write its own input",
                        descriptor.kind
                    )));
                }
            };

            let spec = compiler.compile(descriptor.kind, &inputs, &output)?;
            passes.push(PlannedPass { spec, produces });
        }

        Ok((plan, passes))
    }

    /// Dry run: print every command a real run would execute.
    pub fn print_commands(&self) -> StallResult<()> {
        let (plan, passes) = self.prepare()?;
        self.log_plan(&plan);
        for pass in &passes {
            println!("{}", pass.spec.command_line());
        }
        Ok(())
    }

    pub fn execute(&self) -> StallResult<()> {
        let (plan, passes) = self.prepare()?;
        self.log_plan(&plan);

        let mut artifacts = TempArtifacts::acquire(&self.output, &self.temp_extension)?;
        for pass in &passes {
            if let Some(kind) = pass.produces {
                artifacts.register(kind);
            }

            let kind = pass.spec.pass;
            log_event_with(
                Level::Info,
                &format!("stall.pass.{}", kind.code()),
                format!("Pass: {} -> {}", kind.describe(), pass.spec.output.display()),
                json!({
                    "inputs": pass
                        .spec
                        .inputs
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>(),
                    "output": pass.spec.output.display().to_string(),
                }),
            );
            log_event(Level::Debug, "stall.command", pass.spec.command_line());

            let options = RunOptions {
                expected_duration: self.expected_duration(&plan, kind),
                verbose: self.verbose,
            };
            self.runner.run(&pass.spec, options)?;
        }
        drop(artifacts);

        log_event_with(
            Level::Success,
            "stall.done",
            format!("Wrote {}", self.output.display()),
            json!({
                "output": self.output.display().to_string(),
                "events": plan.segments.len(),
                "inserted_seconds": plan.state.cumulative_inserted_seconds,
            }),
        );
        Ok(())
    }

    fn log_plan(&self, plan: &SegmentPlan) {
        for (index, segment) in plan.segments.iter().enumerate() {
            log_event_with(
                Level::Debug,
                "stall.plan.event",
                format!(
                    "Event {index}: {}s stall at {}s, shown from {}s",
                    segment.event.duration, segment.event.position, segment.audio_window.start
                ),
                json!({
                    "video_loop": segment.video_loop.map(|l| [l.start_frame, l.len_frames]),
                    "audio_loop": segment.audio_loop.map(|l| [l.start_sample, l.len_samples]),
                    "trim": segment.trim_range.map(|r| [r.start_frame, r.end_frame]),
                }),
            );
        }
        log_event(
            Level::Info,
            "stall.plan",
            format!(
                "{} stall(s) adding {}s",
                plan.segments.len(),
                plan.state.cumulative_inserted_seconds
            ),
        );
    }

    fn expected_duration(&self, plan: &SegmentPlan, kind: PassKind) -> Option<f64> {
        let stalled = self
            .profile
            .duration
            .map(|duration| duration + plan.state.cumulative_inserted_seconds);
        match kind {
            PassKind::VideoStall | PassKind::AudioStall => stalled,
            PassKind::SkipTrim => self.profile.duration,
            PassKind::Merge => self.compile_options.trim.or(if plan.is_skipping() {
                self.profile.duration
            } else {
                stalled
            }),
        }
    }
}
