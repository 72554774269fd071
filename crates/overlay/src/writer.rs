//! Periodic overlay snapshots

use std::path::PathBuf;

use frame_source::VideoFrame;
use signal_control::{FrameAnalysis, Zone};
use tracing::{debug, info};

use crate::{OverlayConfig, OverlayError, OverlayRenderer};

/// Saves every Nth annotated frame as a PNG
pub struct OverlayWriter {
    renderer: OverlayRenderer,
    output_dir: PathBuf,
    every_n_frames: u64,
    frames_seen: u64,
    written: u64,
}

impl OverlayWriter {
    pub fn new(config: &OverlayConfig) -> Result<Self, OverlayError> {
        config.validate()?;
        std::fs::create_dir_all(&config.output_dir).map_err(|e| OverlayError::Write {
            path: config.output_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Overlay frames will be written to {}", config.output_dir.display());

        Ok(Self {
            renderer: OverlayRenderer::default(),
            output_dir: config.output_dir.clone(),
            every_n_frames: u64::from(config.every_n_frames),
            frames_seen: 0,
            written: 0,
        })
    }

    pub fn with_renderer(mut self, renderer: OverlayRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Counts the frame and writes it if it falls on the configured stride.
    /// The first frame is always written, and files are named by the
    /// writer's running frame index.
    pub fn maybe_write(
        &mut self,
        frame: &VideoFrame,
        zones: &[Zone],
        analysis: &FrameAnalysis,
        max_secs: u32,
    ) -> Result<Option<PathBuf>, OverlayError> {
        let index = self.frames_seen;
        self.frames_seen += 1;
        if index % self.every_n_frames != 0 {
            return Ok(None);
        }

        let image = self.renderer.render(frame, zones, analysis, max_secs)?;
        // Sequence numbers restart on rewind; the writer's own index does not
        let path = self.output_dir.join(format!("frame_{:06}.png", index));
        image.save(&path).map_err(|e| OverlayError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.written += 1;
        debug!("Overlay written: {}", path.display());
        Ok(Some(path))
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_control::{ControlConfig, FrameAnalyzer};

    fn config(dir: &std::path::Path, every: u32) -> OverlayConfig {
        OverlayConfig {
            enabled: true,
            output_dir: dir.join("overlay"),
            every_n_frames: every,
        }
    }

    #[test]
    fn test_writes_every_nth_frame() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let analysis = analyzer.analyze(&[], &[]);
        let mut writer = OverlayWriter::new(&config(dir.path(), 3)).unwrap();

        let written: Vec<Option<PathBuf>> = (0..7)
            .map(|seq| {
                let frame = VideoFrame::filled(64, 48, [0, 0, 0], seq);
                writer.maybe_write(&frame, analyzer.zones(), &analysis, 60).unwrap()
            })
            .collect();

        assert_eq!(written.iter().filter(|p| p.is_some()).count(), 3);
        assert_eq!(writer.frames_written(), 3);
        let first = written[0].as_ref().unwrap();
        assert!(first.ends_with("frame_000000.png"));
        assert!(first.exists());
        assert!(written[3].as_ref().unwrap().ends_with("frame_000003.png"));
    }

    #[test]
    fn test_repeated_sequence_numbers_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let analysis = analyzer.analyze(&[], &[]);
        let mut writer = OverlayWriter::new(&config(dir.path(), 1)).unwrap();

        // two passes over a looping two-frame stream
        for seq in [0, 1, 0, 1] {
            let frame = VideoFrame::filled(16, 16, [0, 0, 0], seq);
            writer.maybe_write(&frame, analyzer.zones(), &analysis, 60).unwrap();
        }

        assert_eq!(writer.frames_written(), 4);
        assert_eq!(std::fs::read_dir(dir.path().join("overlay")).unwrap().count(), 4);
    }

    #[test]
    fn test_written_png_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let analysis = analyzer.analyze(&[], &[]);
        let mut writer = OverlayWriter::new(&config(dir.path(), 1)).unwrap();

        let frame = VideoFrame::filled(32, 24, [10, 20, 30], 5);
        let path = writer
            .maybe_write(&frame, analyzer.zones(), &analysis, 60)
            .unwrap()
            .unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 24));
    }

    #[test]
    fn test_zero_stride_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            OverlayWriter::new(&config(dir.path(), 0)),
            Err(OverlayError::Config(_))
        ));
    }
}
