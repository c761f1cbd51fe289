//! Segment planning: one pass over the events that turns seconds into loop
//! parameters, enable windows and skip-mode trim ranges.
//!
//! Every event after the first is shifted by the frames/samples/seconds that
//! earlier events inserted. The accumulator is threaded through a fold rather
//! than kept on a long-lived object.

use super::error::{StallError, StallResult, StreamField};
use super::events::{Event, EventList};
use super::probe::StreamProfile;

/// Amount shaved off the end of each video enable window so the treatment
/// does not bleed into the first real frame after the loop.
pub const DEFAULT_VIDEO_ENABLE_EPSILON: f64 = 0.001;

/// Time interval in seconds during which a treatment is gated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoLoop {
    pub start_frame: u64,
    pub len_frames: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioLoop {
    pub start_sample: u64,
    pub len_samples: u64,
}

/// Half-open frame range `[start_frame, end_frame)` kept by the skip-trim pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start_frame: u64,
    pub end_frame: u64,
}

impl FrameRange {
    pub fn is_empty(&self) -> bool {
        self.end_frame <= self.start_frame
    }
}

/// Planned treatment of a single buffering event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSegment {
    pub event: Event,
    pub video_loop: Option<VideoLoop>,
    pub audio_loop: Option<AudioLoop>,
    pub video_window: Window,
    pub audio_window: Window,
    pub is_leading_black: bool,
    pub trim_range: Option<FrameRange>,
}

/// Running totals carried across events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlanState {
    pub cumulative_looped_frames: u64,
    pub cumulative_looped_samples: u64,
    pub cumulative_inserted_seconds: f64,
    pub last_trim_end_frame: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanOptions {
    pub video_enable_epsilon: f64,
    pub skipping: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            video_enable_epsilon: DEFAULT_VIDEO_ENABLE_EPSILON,
            skipping: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub segments: Vec<EventSegment>,
    pub state: PlanState,
    /// Window for the leading black frame, if a stall starts at time zero.
    pub black_window: Option<Window>,
    /// Skip mode only: remainder of the file after the last event.
    pub tail_trim: Option<FrameRange>,
    /// Frame rate used for the frame-domain arithmetic, if video is present.
    pub fps: Option<f64>,
}

impl SegmentPlan {
    pub fn video_windows(&self) -> impl Iterator<Item = Window> + '_ {
        self.segments.iter().map(|s| s.video_window)
    }

    pub fn audio_windows(&self) -> impl Iterator<Item = Window> + '_ {
        self.segments.iter().map(|s| s.audio_window)
    }

    pub fn video_loops(&self) -> impl Iterator<Item = VideoLoop> + '_ {
        self.segments.iter().filter_map(|s| s.video_loop)
    }

    pub fn audio_loops(&self) -> impl Iterator<Item = AudioLoop> + '_ {
        self.segments.iter().filter_map(|s| s.audio_loop)
    }

    pub fn is_skipping(&self) -> bool {
        self.tail_trim.is_some()
    }

    /// All skip-mode trim ranges in concatenation order, tail included.
    pub fn trim_ranges(&self) -> Vec<FrameRange> {
        self.segments
            .iter()
            .filter_map(|s| s.trim_range)
            .chain(self.tail_trim)
            .collect()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn units(rate: f64, seconds: f64) -> u64 {
    (rate * seconds).floor() as u64
}

struct Rates {
    fps: Option<f64>,
    sample_rate: Option<f64>,
}

pub fn plan_segments(
    events: &EventList,
    profile: &StreamProfile,
    options: PlanOptions,
) -> StallResult<SegmentPlan> {
    let rates = resolve_rates(profile, options)?;

    let (segments, state, black_window) = events.events().iter().enumerate().try_fold(
        (Vec::new(), PlanState::default(), None),
        |(mut segments, state, black_window), (index, event)| {
            let (segment, state) = plan_event(index, event, state, &rates, options)?;
            let black_window = if segment.is_leading_black {
                Some(Window::new(0.0, segment.video_window.end))
            } else {
                black_window
            };
            segments.push(segment);
            Ok::<_, StallError>((segments, state, black_window))
        },
    )?;

    let tail_trim = if options.skipping {
        let fps = rates
            .fps
            .ok_or(StallError::MissingStreamInfo(StreamField::FrameRate))?;
        let duration = profile
            .duration
            .ok_or(StallError::MissingStreamInfo(StreamField::Duration))?;
        let end_frame = units(fps, duration) + state.cumulative_looped_frames;
        // a skip running past the end of the input leaves an empty tail
        Some(FrameRange {
            start_frame: state.last_trim_end_frame.min(end_frame),
            end_frame,
        })
    } else {
        None
    };

    Ok(SegmentPlan {
        segments,
        state,
        black_window,
        tail_trim,
        fps: rates.fps,
    })
}

fn resolve_rates(profile: &StreamProfile, options: PlanOptions) -> StallResult<Rates> {
    let fps = if profile.has_video {
        Some(
            profile
                .fps
                .ok_or(StallError::MissingStreamInfo(StreamField::FrameRate))?,
        )
    } else {
        None
    };
    let sample_rate = if profile.has_audio {
        Some(
            profile
                .sample_rate
                .ok_or(StallError::MissingStreamInfo(StreamField::SampleRate))?,
        )
    } else {
        None
    };

    if options.skipping {
        if !profile.has_video {
            return Err(StallError::MissingStreamInfo(StreamField::VideoStream));
        }
        if profile.duration.is_none() {
            return Err(StallError::MissingStreamInfo(StreamField::Duration));
        }
    }

    Ok(Rates { fps, sample_rate })
}

fn plan_event(
    index: usize,
    event: &Event,
    mut state: PlanState,
    rates: &Rates,
    options: PlanOptions,
) -> StallResult<(EventSegment, PlanState)> {
    let enable_start = round3(state.cumulative_inserted_seconds + event.position);
    let enable_end = round3(enable_start + event.duration);
    if enable_end - enable_start <= options.video_enable_epsilon {
        return Err(StallError::EventTooShort {
            index,
            duration: event.duration,
            epsilon: options.video_enable_epsilon,
        });
    }
    let audio_window = Window::new(enable_start, enable_end);
    let video_window = Window::new(enable_start, enable_end - options.video_enable_epsilon);

    let video_loop = rates.fps.map(|fps| {
        let video_loop = VideoLoop {
            start_frame: units(fps, event.position) + state.cumulative_looped_frames,
            len_frames: units(fps, event.duration),
        };
        state.cumulative_looped_frames += video_loop.len_frames;
        video_loop
    });

    let audio_loop = rates.sample_rate.map(|rate| {
        let audio_loop = AudioLoop {
            start_sample: units(rate, event.position) + state.cumulative_looped_samples,
            len_samples: units(rate, event.duration),
        };
        state.cumulative_looped_samples += audio_loop.len_samples;
        audio_loop
    });

    let is_leading_black = index == 0 && enable_start.trunc() == 0.0;

    let trim_range = match (options.skipping, video_loop) {
        (true, Some(video_loop)) => {
            let end_frame = video_loop.start_frame + video_loop.len_frames;
            if end_frame <= state.last_trim_end_frame {
                return Err(StallError::OverlappingSkip { index });
            }
            let range = FrameRange {
                start_frame: state.last_trim_end_frame,
                end_frame,
            };
            // the looped frames are kept, the same amount of real content after them is dropped
            state.last_trim_end_frame = video_loop.start_frame + 2 * video_loop.len_frames;
            Some(range)
        }
        _ => None,
    };

    state.cumulative_inserted_seconds += event.duration;

    Ok((
        EventSegment {
            event: *event,
            video_loop,
            audio_loop,
            video_window,
            audio_window,
            is_leading_black,
            trim_range,
        },
        state,
    ))
}
