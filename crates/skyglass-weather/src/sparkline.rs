//! Precipitation sparkline: maps the minutely intensity series onto a
//! fillable area under a fixed-aspect graph.

use std::fmt::Write as _;

use crate::types::MinuteSample;

/// Graph height as a fraction of its width
const HEIGHT_RATIO: f64 = 0.25;
const TICK_COUNT: u32 = 6;
const TICK_LENGTH: f64 = 10.0;
const GUIDE_LINE_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A closed polygon whose first and last points sit on the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Sparkline {
    pub width: u32,
    pub height: u32,
    pub points: Vec<Point>,
}

/// Compute the precipitation area for `samples` in a graph `width` pixels wide.
///
/// Samples below `probability_threshold` are drawn at zero. The vertical scale
/// tops out at the larger of the strongest sample and `intensity_scale_top`,
/// so light drizzle is not stretched to fill the graph.
pub fn render_precipitation(
    samples: &[MinuteSample],
    width: u32,
    probability_threshold: f64,
    intensity_scale_top: f64,
) -> Sparkline {
    let w = f64::from(width);
    let height = (w * HEIGHT_RATIO).round() as u32;
    let h = f64::from(height);

    let mut points = Vec::with_capacity(samples.len() + 2);
    points.push(Point { x: 0.0, y: h });

    if !samples.is_empty() {
        let max_intensity = samples
            .iter()
            .map(|s| sanitized_intensity(s.precip_intensity))
            .fold(0.0, f64::max)
            .max(intensity_scale_top);
        let step = w / samples.len() as f64;

        for (i, sample) in samples.iter().enumerate() {
            let intensity = if sample.precip_probability < probability_threshold {
                0.0
            } else {
                sanitized_intensity(sample.precip_intensity)
            };
            let y = if max_intensity > 0.0 {
                h - h * intensity / max_intensity
            } else {
                h
            };
            points.push(Point {
                x: i as f64 * step,
                y,
            });
        }
    }

    points.push(Point { x: w, y: h });

    Sparkline {
        width,
        height,
        points,
    }
}

fn sanitized_intensity(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Cosmetic guide positions: tick x-offsets along the bottom edge and the
/// y-offsets of the dashed horizontal lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Guides {
    pub ticks: Vec<f64>,
    pub lines: Vec<f64>,
}

impl Sparkline {
    /// True when every point lies on the baseline.
    pub fn is_flat(&self) -> bool {
        let h = f64::from(self.height);
        self.points.iter().all(|p| p.y == h)
    }

    pub fn guides(&self) -> Guides {
        let sixth = (f64::from(self.width) / f64::from(TICK_COUNT)).round();
        let third = (f64::from(self.height) / f64::from(GUIDE_LINE_COUNT)).round();
        Guides {
            ticks: (1..TICK_COUNT).map(|i| f64::from(i) * sixth).collect(),
            lines: (1..GUIDE_LINE_COUNT).map(|i| f64::from(i) * third).collect(),
        }
    }

    /// SVG path data for the filled area.
    pub fn path_data(&self) -> String {
        let mut d = String::new();
        for (i, p) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                d.push(' ');
            }
            let _ = write!(d, "{cmd}{},{}", coord(p.x), coord(p.y));
        }
        if !self.points.is_empty() {
            d.push_str(" Z");
        }
        d
    }

    /// Complete SVG element: guides in gray, area filled with `fill_color`.
    pub fn to_svg(&self, fill_color: &str) -> String {
        let h = f64::from(self.height);
        let w = f64::from(self.width);
        let guides = self.guides();

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="precipitation-graph" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.width, self.height
        );
        for x in &guides.ticks {
            let _ = write!(
                svg,
                r#"<line x1="{x}" y1="{}" x2="{x}" y2="{}" stroke="gray" stroke-width="2"/>"#,
                coord(h),
                coord(h - TICK_LENGTH),
                x = coord(*x),
            );
        }
        for y in &guides.lines {
            let _ = write!(
                svg,
                r#"<line x1="0" y1="{y}" x2="{}" y2="{y}" stroke="gray" stroke-width="1" stroke-dasharray="5,15"/>"#,
                coord(w),
                y = coord(*y),
            );
        }
        let _ = write!(
            svg,
            r#"<path d="{}" fill="{}" stroke="white"/></svg>"#,
            self.path_data(),
            escape_attr(fill_color)
        );
        svg
    }
}

/// Two decimals at most, without trailing zeros.
fn coord(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn sample(precip_probability: f64, precip_intensity: f64) -> MinuteSample {
        MinuteSample {
            time: None,
            precip_probability,
            precip_intensity,
        }
    }

    fn ramp() -> Vec<MinuteSample> {
        (0..60)
            .map(|i| sample(0.8, f64::from(i) * 0.01))
            .collect()
    }

    #[test]
    fn test_height_is_quarter_width() {
        assert_eq!(render_precipitation(&[], 400, 0.1, 0.2).height, 100);
        assert_eq!(render_precipitation(&[], 90, 0.1, 0.2).height, 23);
    }

    #[test]
    fn test_empty_series_is_flat_baseline() {
        let graph = render_precipitation(&[], 400, 0.1, 0.2);
        assert_eq!(
            graph.points,
            vec![Point { x: 0.0, y: 100.0 }, Point { x: 400.0, y: 100.0 }]
        );
        assert!(graph.is_flat());
        assert_eq!(graph.path_data(), "M0,100 L400,100 Z");
    }

    #[test]
    fn test_all_zero_intensity_is_flat() {
        let samples = vec![sample(0.9, 0.0); 60];
        let graph = render_precipitation(&samples, 400, 0.1, 0.2);
        assert_eq!(graph.points.len(), 62);
        assert!(graph.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert!(graph.is_flat());
    }

    #[test]
    fn test_zero_scale_top_does_not_divide_by_zero() {
        let samples = vec![sample(0.9, 0.0); 10];
        let graph = render_precipitation(&samples, 200, 0.1, 0.0);
        assert!(graph.points.iter().all(|p| !p.y.is_nan()));
        assert!(graph.is_flat());
    }

    #[test]
    fn test_scale_top_limits_amplification() {
        // A quarter of the scale top reaches a quarter of the height
        let graph = render_precipitation(&[sample(0.5, 0.125)], 400, 0.1, 0.5);
        assert_eq!(graph.points[1], Point { x: 0.0, y: 75.0 });
    }

    #[test]
    fn test_strongest_sample_sets_scale_above_top() {
        let samples = vec![sample(0.5, 1.0), sample(0.5, 0.5)];
        let graph = render_precipitation(&samples, 400, 0.1, 0.2);
        assert_eq!(graph.points[1], Point { x: 0.0, y: 0.0 });
        assert_eq!(graph.points[2], Point { x: 200.0, y: 50.0 });
        assert_eq!(graph.points[3], Point { x: 400.0, y: 100.0 });
    }

    #[test]
    fn test_unlikely_samples_drawn_at_zero() {
        let samples = vec![sample(0.05, 1.0), sample(0.5, 1.0)];
        let graph = render_precipitation(&samples, 400, 0.1, 0.2);
        assert_eq!(graph.points[1].y, 100.0);
        assert_eq!(graph.points[2].y, 0.0);
    }

    #[test]
    fn test_doubling_width_doubles_geometry() {
        let samples = ramp();
        let small = render_precipitation(&samples, 400, 0.1, 0.2);
        let large = render_precipitation(&samples, 800, 0.1, 0.2);
        assert_eq!(large.height, small.height * 2);
        for (a, b) in small.points.iter().zip(&large.points) {
            assert!((b.x - a.x * 2.0).abs() < 1e-9);
            assert!((b.y - a.y * 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_guides_and_svg() {
        let graph = render_precipitation(&ramp(), 400, 0.1, 0.2);
        let guides = graph.guides();
        assert_eq!(guides.ticks, vec![67.0, 134.0, 201.0, 268.0, 335.0]);
        assert_eq!(guides.lines, vec![33.0, 66.0]);

        let svg = graph.to_svg("dodger\"blue");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<line").count(), 7);
        assert!(svg.contains("stroke-dasharray=\"5,15\""));
        assert!(svg.contains("fill=\"dodger&quot;blue\""));
    }

    #[test]
    fn test_coord_formatting() {
        assert_eq!(coord(6.666_666), "6.67");
        assert_eq!(coord(100.0), "100");
        assert_eq!(coord(12.5), "12.5");
        assert_eq!(coord(-0.001), "0");
    }
}
