//! Synchronous frame loop
//!
//! One frame at a time: acquire, detect vehicles, detect ambulances, analyse,
//! record telemetry, write the overlay. A stalled source or detector blocks
//! the loop; slow frames are only reported.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use detection::{build_detector, Detection, Detector};
use frame_source::{FrameSource, ImageSequenceSource, StreamPolicy, StreamStats, VideoFrame};
use overlay::OverlayWriter;
use serde::Serialize;
use signal_control::{FrameAnalyzer, FrameResult};
use telemetry::{CsvTelemetrySink, TelemetryCadence, TelemetryRecorder, TelemetrySink, TickOutcome};
use tracing::{debug, info, warn, Level};

use crate::settings::Settings;

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_with_ambulance: u64,
    pub detector_failures: u64,
    pub slow_frames: u64,
    pub telemetry_rows: u64,
    pub telemetry_failures: u64,
    pub overlay_frames: u64,
    pub overlay_failures: u64,
    pub acquisition_errors: u64,
    pub rewinds: u64,
    pub stopped_by_signal: bool,
}

impl RunSummary {
    fn absorb_stream(&mut self, stats: StreamStats) {
        self.acquisition_errors = stats.acquisition_errors;
        self.rewinds = stats.rewinds;
    }
}

/// The per-frame pipeline and everything it owns
pub struct Pipeline<S> {
    source: StreamPolicy<S>,
    vehicle_detector: Box<dyn Detector>,
    ambulance_detector: Option<Box<dyn Detector>>,
    analyzer: FrameAnalyzer,
    telemetry: Option<TelemetryRecorder<Box<dyn TelemetrySink>>>,
    overlay: Option<OverlayWriter>,
    slow_frame: Duration,
    last_result: Option<FrameResult>,
    summary: RunSummary,
}

impl<S: FrameSource> Pipeline<S> {
    pub fn new(source: StreamPolicy<S>, vehicle_detector: Box<dyn Detector>, analyzer: FrameAnalyzer) -> Self {
        Self {
            source,
            vehicle_detector,
            ambulance_detector: None,
            analyzer,
            telemetry: None,
            overlay: None,
            slow_frame: Duration::from_millis(500),
            last_result: None,
            summary: RunSummary::default(),
        }
    }

    pub fn with_ambulance_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.ambulance_detector = Some(detector);
        self
    }

    pub fn with_telemetry(mut self, recorder: TelemetryRecorder<Box<dyn TelemetrySink>>) -> Self {
        self.telemetry = Some(recorder);
        self
    }

    pub fn with_overlay(mut self, writer: OverlayWriter) -> Self {
        self.overlay = Some(writer);
        self
    }

    pub fn with_slow_frame(mut self, threshold: Duration) -> Self {
        self.slow_frame = threshold;
        self
    }

    /// Result of the most recent frame
    pub fn last_result(&self) -> Option<&FrameResult> {
        self.last_result.as_ref()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Process one frame; `None` once the stream has ended
    pub fn step(&mut self) -> Option<&FrameResult> {
        let frame = self.source.next_frame()?;
        let started = Instant::now();

        let vehicles = detect_or_empty(self.vehicle_detector.as_mut(), &frame, &mut self.summary);
        let ambulances = match self.ambulance_detector.as_mut() {
            Some(detector) => detect_or_empty(detector.as_mut(), &frame, &mut self.summary),
            None => Vec::new(),
        };

        let analysis = self.analyzer.analyze(&vehicles, &ambulances);
        if tracing::enabled!(Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&analysis.result) {
                debug!("Frame {}: {}", frame.sequence, json);
            }
        }

        if let Some(recorder) = self.telemetry.as_mut() {
            match recorder.tick(Instant::now(), &analysis.result) {
                TickOutcome::Written => self.summary.telemetry_rows += 1,
                TickOutcome::Failed => self.summary.telemetry_failures += 1,
                TickOutcome::Skipped => {}
            }
        }

        if let Some(writer) = self.overlay.as_mut() {
            let max_secs = self.analyzer.timing().max_secs();
            match writer.maybe_write(&frame, self.analyzer.zones(), &analysis, max_secs) {
                Ok(Some(_)) => self.summary.overlay_frames += 1,
                Ok(None) => {}
                Err(e) => {
                    self.summary.overlay_failures += 1;
                    warn!("Overlay skipped for frame {}: {}", frame.sequence, e);
                }
            }
        }

        let elapsed = started.elapsed();
        if elapsed > self.slow_frame {
            self.summary.slow_frames += 1;
            warn!(
                "Frame {} took {} ms (threshold {} ms)",
                frame.sequence,
                elapsed.as_millis(),
                self.slow_frame.as_millis()
            );
        }

        self.summary.frames_processed += 1;
        if analysis.result.ambulance_active {
            self.summary.frames_with_ambulance += 1;
        }
        self.last_result = Some(analysis.result);
        self.last_result.as_ref()
    }

    /// Run until the stream ends, `stop` is raised, or `max_frames` frames
    /// have been processed. `stop` is checked once per frame.
    pub fn run(&mut self, stop: &AtomicBool, max_frames: Option<u64>) -> RunSummary {
        loop {
            if stop.load(Ordering::SeqCst) {
                info!("Stop requested, leaving frame loop");
                self.summary.stopped_by_signal = true;
                break;
            }
            if max_frames.is_some_and(|max| self.summary.frames_processed >= max) {
                info!("Frame limit reached");
                break;
            }
            if self.step().is_none() {
                info!("Frame source exhausted");
                break;
            }
        }

        self.summary.absorb_stream(self.source.stats());
        self.summary.clone()
    }
}

fn detect_or_empty(detector: &mut dyn Detector, frame: &VideoFrame, summary: &mut RunSummary) -> Vec<Detection> {
    match detector.detect(frame) {
        Ok(detections) => detections,
        Err(e) => {
            summary.detector_failures += 1;
            warn!(
                "Detector '{}' failed on frame {}, using no detections: {}",
                detector.name(),
                frame.sequence,
                e
            );
            Vec::new()
        }
    }
}

/// Open every configured component
pub fn build_pipeline(settings: &Settings) -> Result<Pipeline<ImageSequenceSource>> {
    let source = ImageSequenceSource::open(&settings.source.sequence()).context("Failed to open frame source")?;
    let source = StreamPolicy::new(source, settings.source.end_of_stream);

    let vehicle_detector =
        build_detector("vehicles", &settings.vehicle_detector).context("Failed to build vehicle detector")?;
    let analyzer = FrameAnalyzer::new(&settings.control()).context("Invalid signal control settings")?;

    let mut pipeline =
        Pipeline::new(source, vehicle_detector, analyzer).with_slow_frame(settings.runtime.slow_frame());

    if let Some(config) = &settings.ambulance_detector {
        let detector = build_detector("ambulance", config).context("Failed to build ambulance detector")?;
        pipeline = pipeline.with_ambulance_detector(detector);
    }

    if settings.telemetry.enabled {
        let sink = CsvTelemetrySink::open(&settings.telemetry.path, &settings.control().zone_ids())
            .context("Failed to open telemetry log")?;
        let cadence = TelemetryCadence::new(settings.telemetry.interval(), Instant::now());
        let sink: Box<dyn TelemetrySink> = Box::new(sink);
        pipeline = pipeline.with_telemetry(TelemetryRecorder::new(cadence, sink));
    }

    if settings.overlay.enabled {
        let writer = OverlayWriter::new(&settings.overlay).context("Failed to prepare overlay output")?;
        pipeline = pipeline.with_overlay(writer);
    }

    Ok(pipeline)
}
