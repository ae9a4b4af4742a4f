use std::f64::consts::TAU;

use glam::DVec2;

use crate::config::ChartConfig;
use crate::radial_layout::ArcSpan;

/// Angular resolution used when tessellating arc edges.
const SEGMENTS_PER_RADIAN: f64 = 24.0;

/// Converts partition spans into annular sectors in the logical
/// coordinate space (square, origin at the center, y down, angle 0 at
/// twelve o'clock running clockwise).
#[derive(Debug, Clone, Copy)]
pub struct ArcGeometry {
    pub radius: f64,
    pub arc_height: f64,
    pub pad_angle: f64,
    pub pad_radius: f64,
}

/// Outline of one annular sector, both edges sampled from start to end angle.
#[derive(Debug, Clone, Default)]
pub struct Sector {
    pub inner: Vec<DVec2>,
    pub outer: Vec<DVec2>,
}

impl ArcGeometry {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            radius: config.center_radius,
            arc_height: config.arc_height(),
            pad_angle: config.pad_angle,
            pad_radius: config.center_radius,
        }
    }

    pub fn inner_radius(&self, span: &ArcSpan) -> f64 {
        (self.radius + (span.y0 - 1.0) * self.arc_height).max(0.0)
    }

    pub fn outer_radius(&self, span: &ArcSpan) -> f64 {
        // One unit of breathing room between rings
        (self.radius + (span.y1 - 1.0) * self.arc_height - 1.0).max(self.inner_radius(span))
    }

    /// Point at `angle` on a circle of radius `r`.
    pub fn polar(angle: f64, r: f64) -> DVec2 {
        DVec2::new(r * angle.sin(), -r * angle.cos())
    }

    /// Angle of `point` in `[0, 2π)`, measured like [`ArcGeometry::polar`].
    pub fn angle_of(point: DVec2) -> f64 {
        point.x.atan2(-point.y).rem_euclid(TAU)
    }

    /// Start/end angles at radius `r` after removing the pad gap. The gap
    /// has constant linear width, so it is angularly wider near the center.
    pub fn padded_angles(&self, span: &ArcSpan, r: f64) -> (f64, f64) {
        if r <= 0.0 || self.pad_angle <= 0.0 {
            return (span.x0, span.x1);
        }
        let ratio = (self.pad_radius / r * (self.pad_angle / 2.0).sin()).clamp(-1.0, 1.0);
        let pad = ratio.asin();
        if span.width() > 2.0 * pad {
            (span.x0 + pad, span.x1 - pad)
        } else {
            let mid = (span.x0 + span.x1) / 2.0;
            (mid, mid)
        }
    }

    pub fn sector(&self, span: &ArcSpan) -> Sector {
        let r0 = self.inner_radius(span);
        let r1 = self.outer_radius(span);
        let (a0, a1) = self.padded_angles(span, r0);
        let (b0, b1) = self.padded_angles(span, r1);

        let sweep = (a1 - a0).max(b1 - b0).max(0.0);
        let steps = ((sweep * SEGMENTS_PER_RADIAN).ceil() as usize).max(1);

        let edge = |start: f64, end: f64, r: f64| -> Vec<DVec2> {
            (0..=steps)
                .map(|i| {
                    let t = i as f64 / steps as f64;
                    Self::polar(start + (end - start) * t, r)
                })
                .collect()
        };

        Sector {
            inner: edge(a0, a1, r0),
            outer: edge(b0, b1, r1),
        }
    }

    pub fn in_center(&self, point: DVec2) -> bool {
        point.length() <= self.radius
    }

    /// Whether `point` lies inside the (unpadded) sector of `span`.
    pub fn contains(&self, span: &ArcSpan, point: DVec2) -> bool {
        if span.is_degenerate() {
            return false;
        }
        let r = point.length();
        if r < self.inner_radius(span) || r > self.outer_radius(span) {
            return false;
        }
        let angle = Self::angle_of(point);
        angle >= span.x0 && angle <= span.x1
    }
}

/// Maps the logical chart space onto a screen rectangle, keeping it square
/// and centered.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub center: DVec2,
    pub scale: f64,
}

impl Viewport {
    pub fn fit(logical_width: f64, screen_min: DVec2, screen_size: DVec2) -> Self {
        let side = screen_size.x.min(screen_size.y).max(1.0);
        Self {
            center: screen_min + screen_size * 0.5,
            scale: side / logical_width,
        }
    }

    pub fn to_screen(&self, logical: DVec2) -> DVec2 {
        self.center + logical * self.scale
    }

    pub fn to_logical(&self, screen: DVec2) -> DVec2 {
        (screen - self.center) / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn geometry() -> ArcGeometry {
        ArcGeometry::from_config(&ChartConfig::default())
    }

    #[test]
    fn test_ring_radii() {
        let g = geometry();
        let first = ArcSpan::new(0.0, 1.0, 1.0, 2.0);
        assert_eq!(g.inner_radius(&first), 65.0);
        assert_eq!(g.outer_radius(&first), 65.0 + 37.0 - 1.0);

        let fifth = ArcSpan::new(0.0, 1.0, 5.0, 6.0);
        assert_eq!(g.outer_radius(&fifth), 65.0 + 5.0 * 37.0 - 1.0);
        assert!(g.outer_radius(&fifth) < 250.0);

        // Collapsed band (outside the focus) has no thickness
        let collapsed = ArcSpan::new(0.0, 1.0, 0.0, 0.0);
        assert_eq!(g.outer_radius(&collapsed), g.inner_radius(&collapsed));
    }

    #[test]
    fn test_polar_orientation() {
        let top = ArcGeometry::polar(0.0, 10.0);
        assert!(top.x.abs() < 1e-9 && (top.y + 10.0).abs() < 1e-9);
        let right = ArcGeometry::polar(FRAC_PI_2, 10.0);
        assert!((right.x - 10.0).abs() < 1e-9 && right.y.abs() < 1e-9);

        assert!((ArcGeometry::angle_of(right) - FRAC_PI_2).abs() < 1e-9);
        assert!((ArcGeometry::angle_of(DVec2::new(-10.0, 0.0)) - 3.0 * FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_padding_shrinks_or_collapses() {
        let g = geometry();
        let wide = ArcSpan::new(0.0, 1.0, 1.0, 2.0);
        let (a0, a1) = g.padded_angles(&wide, 65.0);
        assert!((a0 - 0.005).abs() < 1e-6 && (a1 - 0.995).abs() < 1e-6);

        let thin = ArcSpan::new(1.0, 1.001, 1.0, 2.0);
        let (b0, b1) = g.padded_angles(&thin, 65.0);
        assert_eq!(b0, b1);
    }

    #[test]
    fn test_sector_edges_lie_on_radii() {
        let g = geometry();
        let span = ArcSpan::new(0.0, PI, 2.0, 3.0);
        let sector = g.sector(&span);
        assert_eq!(sector.inner.len(), sector.outer.len());
        assert!(sector.inner.len() > 2);
        for p in &sector.inner {
            assert!((p.length() - g.inner_radius(&span)).abs() < 1e-9);
        }
        for p in &sector.outer {
            assert!((p.length() - g.outer_radius(&span)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hit_detection() {
        let g = geometry();
        let span = ArcSpan::new(0.0, FRAC_PI_2, 1.0, 2.0);
        assert!(g.contains(&span, ArcGeometry::polar(0.5, 80.0)));
        assert!(!g.contains(&span, ArcGeometry::polar(2.0, 80.0)));
        assert!(!g.contains(&span, ArcGeometry::polar(0.5, 120.0)));
        assert!(g.in_center(DVec2::new(10.0, 10.0)));
        assert!(!g.in_center(ArcGeometry::polar(0.5, 80.0)));
    }

    #[test]
    fn test_viewport_roundtrip() {
        let vp = Viewport::fit(500.0, DVec2::new(0.0, 0.0), DVec2::new(1000.0, 800.0));
        assert_eq!(vp.scale, 800.0 / 500.0);
        let screen = vp.to_screen(DVec2::ZERO);
        assert_eq!(screen, DVec2::new(500.0, 400.0));

        let p = DVec2::new(123.0, -45.0);
        let back = vp.to_logical(vp.to_screen(p));
        assert!((back - p).length() < 1e-9);
    }
}
