//! Frame annotation

use detection::BoundingBox;
use frame_source::VideoFrame;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use signal_control::{FrameAnalysis, SignalBand, Zone};

use crate::OverlayError;

/// Overlay colours
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub zone: Rgb<u8>,
    pub counted: Rgb<u8>,
    pub unzoned: Rgb<u8>,
    pub emergency: Rgb<u8>,
    pub header: Rgb<u8>,
    pub short_wait: Rgb<u8>,
    pub medium_wait: Rgb<u8>,
    pub long_wait: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            zone: Rgb([0, 0, 255]),
            counted: Rgb([0, 255, 0]),
            unzoned: Rgb([128, 128, 128]),
            emergency: Rgb([255, 0, 0]),
            header: Rgb([0, 0, 0]),
            short_wait: Rgb([0, 255, 0]),
            medium_wait: Rgb([255, 255, 0]),
            long_wait: Rgb([255, 0, 0]),
        }
    }
}

impl Palette {
    pub fn band(&self, band: SignalBand) -> Rgb<u8> {
        match band {
            SignalBand::Short => self.short_wait,
            SignalBand::Medium => self.medium_wait,
            SignalBand::Long => self.long_wait,
        }
    }
}

/// Draws zones, detections, and the signal header onto a frame copy
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    palette: Palette,
    header_height: u32,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            header_height: 100,
        }
    }
}

impl OverlayRenderer {
    pub fn new(palette: Palette, header_height: u32) -> Self {
        Self {
            palette,
            header_height,
        }
    }

    pub fn header_height(&self) -> u32 {
        self.header_height
    }

    pub fn render(
        &self,
        frame: &VideoFrame,
        zones: &[Zone],
        analysis: &FrameAnalysis,
        max_secs: u32,
    ) -> Result<RgbImage, OverlayError> {
        let mut image = frame
            .to_rgb_image()
            .map_err(|e| OverlayError::Frame(e.to_string()))?;

        for zone in zones {
            draw_box(&mut image, &zone.bbox, self.palette.zone, 2);
        }
        for assignment in &analysis.occupancy.zones {
            for det in &assignment.detections {
                draw_box(&mut image, &det.bbox, self.palette.counted, 2);
            }
        }
        for det in &analysis.occupancy.unzoned {
            draw_box(&mut image, &det.bbox, self.palette.unzoned, 1);
        }
        for det in &analysis.emergency_detections {
            draw_box(&mut image, &det.bbox, self.palette.emergency, 4);
        }

        self.draw_header(&mut image, analysis, max_secs);
        Ok(image)
    }

    fn draw_header(&self, image: &mut RgbImage, analysis: &FrameAnalysis, max_secs: u32) {
        let (width, height) = image.dimensions();
        let header_h = self.header_height.min(height);
        if width == 0 || header_h == 0 {
            return;
        }

        let result = &analysis.result;
        let background = if result.ambulance_active {
            self.palette.emergency
        } else {
            self.palette.header
        };
        draw_filled_rect_mut(image, Rect::at(0, 0).of_size(width, header_h), background);

        if result.ambulance_active {
            return;
        }

        // One tick per counted vehicle in the top half, per zone left to right
        let tick = (header_h / 5).max(2);
        let zone_count = result.zone_counts.len().max(1) as u32;
        let lane_w = width / zone_count;
        for (i, zc) in result.zone_counts.iter().enumerate() {
            let x0 = i as u32 * lane_w + tick;
            for n in 0..zc.count {
                let x = x0 + n * (tick + 2);
                if x + tick >= (i as u32 + 1) * lane_w {
                    break;
                }
                draw_filled_rect_mut(
                    image,
                    Rect::at(x as i32, tick as i32).of_size(tick, tick),
                    self.palette.counted,
                );
            }
        }

        // Timer bar in the bottom half, scaled to the longest zone green time
        if let Some(longest) = result.longest_signal() {
            let span = width.saturating_sub(2 * tick);
            let bar_w = if max_secs == 0 {
                0
            } else {
                (span as u64 * longest.green_secs.min(max_secs) as u64 / max_secs as u64) as u32
            };
            if bar_w > 0 {
                draw_filled_rect_mut(
                    image,
                    Rect::at(tick as i32, header_h.saturating_sub(2 * tick) as i32).of_size(bar_w, tick),
                    self.palette.band(longest.band),
                );
            }
        }
    }
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    for t in 0..thickness {
        let inset = t as f32;
        let x = (bbox.x1 + inset).round() as i32;
        let y = (bbox.y1 + inset).round() as i32;
        let w = (bbox.width() - 2.0 * inset).round();
        let h = (bbox.height() - 2.0 * inset).round();
        if w < 1.0 || h < 1.0 {
            break;
        }
        draw_hollow_rect_mut(image, Rect::at(x, y).of_size(w as u32, h as u32), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::Detection;
    use signal_control::{ControlConfig, FrameAnalyzer};

    fn setup() -> (FrameAnalyzer, VideoFrame) {
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        (analyzer, VideoFrame::filled(640, 480, [50, 50, 50], 0))
    }

    #[test]
    fn test_zone_outline_drawn() {
        let (analyzer, frame) = setup();
        let analysis = analyzer.analyze(&[], &[]);
        let image = OverlayRenderer::default()
            .render(&frame, analyzer.zones(), &analysis, 60)
            .unwrap();

        // left edge of the default zone, below the header
        assert_eq!(image.get_pixel(100, 300), &Rgb([0, 0, 255]));
        // zone interior untouched
        assert_eq!(image.get_pixel(300, 300), &Rgb([50, 50, 50]));
    }

    #[test]
    fn test_header_black_with_short_timer() {
        let (analyzer, frame) = setup();
        let analysis = analyzer.analyze(
            &[Detection::new("car", 0.9, [200.0, 200.0, 300.0, 300.0].into())],
            &[],
        );
        let renderer = OverlayRenderer::default();
        let image = renderer.render(&frame, analyzer.zones(), &analysis, 60).unwrap();

        assert_eq!(image.get_pixel(639, 0), &Rgb([0, 0, 0]));
        // tick = 20: bar starts at x=20, y=60; 7 s out of 60 s is green
        assert_eq!(image.get_pixel(25, 65), &Rgb([0, 255, 0]));
        // counted car outline
        assert_eq!(image.get_pixel(200, 250), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_emergency_header_red() {
        let (analyzer, frame) = setup();
        let ambulance = Detection::new("Ambulance", 0.9, [300.0, 300.0, 400.0, 380.0].into());
        let analysis = analyzer.analyze(&[], &[ambulance]);
        let image = OverlayRenderer::default()
            .render(&frame, analyzer.zones(), &analysis, 60)
            .unwrap();

        assert_eq!(image.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(300, 340), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_box_outside_frame_is_clipped() {
        let mut image = RgbImage::new(50, 50);
        let bbox = BoundingBox { x1: -20.0, y1: -20.0, x2: 200.0, y2: 30.0 };
        draw_box(&mut image, &bbox, Rgb([255, 255, 255]), 2);
        assert_eq!(image.get_pixel(10, 29), &Rgb([255, 255, 255]));
    }
}
