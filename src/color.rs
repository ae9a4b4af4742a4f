use std::collections::HashMap;

use crate::error::{Result, SunburstError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(SunburstError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| SunburstError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Per-channel linear blend in RGB space.
    pub fn lerp(self, to: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, to.r), mix(self.g, to.g), mix(self.b, to.b))
    }
}

/// Arc fill colors: top-level branches get a hue from the wheel, deeper
/// interior arcs fade toward white.
#[derive(Debug, Clone)]
pub struct Palette {
    wheel: Vec<Rgb>,
    assigned: HashMap<String, usize>,
    pub leaf: Rgb,
    pub squashed: Rgb,
    visible_depth: usize,
}

impl Palette {
    pub fn new(wheel: Vec<Rgb>, leaf: Rgb, squashed: Rgb, visible_depth: usize) -> Self {
        Self {
            wheel,
            assigned: HashMap::new(),
            leaf,
            squashed,
            visible_depth,
        }
    }

    /// Ordinal hue for a top-level branch. Names are given colors in the
    /// order they are first asked for, cycling through the wheel.
    pub fn branch_color(&mut self, name: &str) -> Rgb {
        if self.wheel.is_empty() {
            return self.leaf;
        }
        let next = self.assigned.len();
        let slot = *self.assigned.entry(name.to_string()).or_insert(next);
        self.wheel[slot % self.wheel.len()]
    }

    /// Fill for an interior arc at `depth` under the branch `branch_name`.
    pub fn interior_color(&mut self, branch_name: &str, depth: usize) -> Rgb {
        let base = self.branch_color(branch_name);
        self.lighten(base, depth)
    }

    /// Blend `base` toward white by depth, saturating at the visible depth.
    pub fn lighten(&self, base: Rgb, depth: usize) -> Rgb {
        let lightness = depth.clamp(1, self.visible_depth.max(1)) as f64;
        // Domain [1, visible_depth + 2] mapped onto [base, white]
        let span = (self.visible_depth + 1) as f64;
        base.lerp(Rgb::WHITE, (lightness - 1.0) / span)
    }
}
