// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `lectern-slides`: a plain-text slide deck viewer for Wayland.
//!
//! Opens a deck file, connects to the compositor and runs the lectern loop
//! until the window is closed. `RUST_LOG` controls log output; `--trace`
//! prints one line per loop decision and `--record` saves a binary trace on
//! exit.

mod deck;
mod font;
mod slides;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lectern_backend_wayland::{BackendError, WaylandDisplay};
use lectern_core::config::LoopConfig;
use lectern_core::run_loop::{LoopError, RunLoop};
use lectern_core::time::Duration;
use lectern_core::trace::{
    DeferEvent, FrameAckEvent, ResizeEvent, SubmitEvent, TimerFiredEvent, TraceSink, Tracer,
    WaitEvent, WakeEvent,
};
use lectern_debug::pretty::PrettyPrintSink;
use lectern_debug::recorder::RecorderSink;

use crate::deck::DeckError;
use crate::slides::{Options, SlideDeck};

const MIN_RESOLUTION: u32 = 36;
const MAX_RESOLUTION: u32 = 1200;
const DEFAULT_RESOLUTION: u32 = 96;

#[derive(Debug, Parser)]
#[command(name = "lectern-slides")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Deck file: slides separated by `---` lines
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Page to open, starting at 1
    #[arg(value_name = "PAGE")]
    page: Option<usize>,

    /// Password for a protected deck
    #[arg(short, long)]
    password: Option<String>,

    /// Screen resolution in dots per inch (clamped to 36..=1200)
    #[arg(short, long, value_name = "DPI")]
    resolution: Option<u32>,

    /// Run as a slideshow, advancing every SECONDS
    #[arg(short, long, value_name = "SECONDS")]
    advance: Option<f32>,

    /// How long warnings stay in the status bar
    #[arg(long, value_name = "SECONDS")]
    message_seconds: Option<f32>,

    /// Print run-loop trace events to stderr
    #[arg(long)]
    trace: bool,

    /// Write a binary run-loop trace to PATH on exit
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("cannot open deck")]
    Deck(#[from] DeckError),
    #[error("cannot set up the window")]
    Backend(#[from] BackendError),
    #[error("viewer stopped")]
    Loop(#[from] LoopError<WaylandDisplay, SlideDeck>),
    #[error("cannot write trace to {}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fans trace events out to the optional pretty printer and recorder.
#[derive(Debug, Default)]
struct Sinks {
    pretty: Option<PrettyPrintSink>,
    recorder: Option<RecorderSink>,
}

impl Sinks {
    fn each(&mut self, mut f: impl FnMut(&mut dyn TraceSink)) {
        if let Some(pretty) = &mut self.pretty {
            f(pretty);
        }
        if let Some(recorder) = &mut self.recorder {
            f(recorder);
        }
    }
}

impl TraceSink for Sinks {
    fn on_wait(&mut self, e: &WaitEvent) {
        self.each(|s| s.on_wait(e));
    }

    fn on_wake(&mut self, e: &WakeEvent) {
        self.each(|s| s.on_wake(e));
    }

    fn on_timer_fired(&mut self, e: &TimerFiredEvent) {
        self.each(|s| s.on_timer_fired(e));
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        self.each(|s| s.on_submit(e));
    }

    fn on_defer(&mut self, e: &DeferEvent) {
        self.each(|s| s.on_defer(e));
    }

    fn on_frame_ack(&mut self, e: &FrameAckEvent) {
        self.each(|s| s.on_frame_ack(e));
    }

    fn on_resize(&mut self, e: &ResizeEvent) {
        self.each(|s| s.on_resize(e));
    }
}

/// Font dot size for a resolution: one dot per 48 dpi, rounded.
fn font_scale(resolution: u32) -> u32 {
    ((resolution + 24) / 48).max(1)
}

fn seconds(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0))
}

fn run(cli: Cli) -> Result<(), AppError> {
    let options = Options {
        password: cli.password,
        page: cli.page,
        advance: cli.advance.map(seconds),
        scale: 1,
    };
    // Open the deck first so a bad file or password fails before a window
    // appears.
    let mut viewer = SlideDeck::open(cli.file.clone(), options)?;

    let title = format!("lectern-slides: {}", cli.file.display());
    let display = WaylandDisplay::connect(&title)?;
    let resolution = cli
        .resolution
        .or_else(|| display.resolution())
        .unwrap_or(DEFAULT_RESOLUTION)
        .clamp(MIN_RESOLUTION, MAX_RESOLUTION);
    let scale = font_scale(resolution);
    log::debug!("resolution {resolution} dpi, font scale {scale}");
    viewer.set_scale(scale);

    let mut config = LoopConfig::new();
    if let Some(secs) = cli.message_seconds {
        config = config.with_warning_duration(seconds(secs));
    }

    let mut run_loop = RunLoop::new(display, viewer, config);
    let (viewer, cx) = run_loop.viewer_and_context_mut();
    viewer.start(cx);

    let mut sinks = Sinks {
        pretty: cli.trace.then(PrettyPrintSink::stderr),
        recorder: cli.record.is_some().then(RecorderSink::new),
    };
    let traced = sinks.pretty.is_some() || sinks.recorder.is_some();
    let mut tracer = if traced {
        Tracer::new(&mut sinks)
    } else {
        Tracer::none()
    };
    let result = run_loop.run(&mut tracer);
    drop(tracer);

    if let (Some(path), Some(recorder)) = (cli.record, sinks.recorder) {
        std::fs::write(&path, recorder.into_bytes())
            .map_err(|source| AppError::Record { path, source })?;
    }
    Ok(result?)
}

/// Formats an error with its chain of causes.
fn report(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", report(&err));
            ExitCode::FAILURE
        }
    }
}
