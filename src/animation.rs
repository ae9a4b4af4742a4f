use std::time::Duration;

use indextree::NodeId;

use crate::radial_layout::ArcSpan;

/// Timing curve applied to linear progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Slow start and end, used for zoom transitions
    CubicInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
        }
    }
}

/// Elapsed time against a fixed duration.
#[derive(Debug, Clone, Copy)]
struct Clock {
    elapsed: Duration,
    duration: Duration,
}

impl Clock {
    fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    fn tick(&mut self, dt: Duration) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
    }

    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
        }
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn finish(&mut self) {
        self.elapsed = self.duration;
    }
}

/// One arc moving between two spans.
#[derive(Debug, Clone, Copy)]
pub struct SpanTween {
    pub node: NodeId,
    pub from: ArcSpan,
    pub to: ArcSpan,
}

impl SpanTween {
    pub fn sample(&self, t: f64) -> ArcSpan {
        // Land exactly on the target rather than on a rounded blend
        if t >= 1.0 {
            self.to
        } else {
            self.from.lerp(&self.to, t)
        }
    }
}

/// A zoom transition: every tween shares one clock and easing.
///
/// Starting a new transition replaces the old one; since tweens are
/// seeded from the live `current` spans, transitions compose.
#[derive(Debug, Clone)]
pub struct Transition {
    tweens: Vec<SpanTween>,
    clock: Clock,
    easing: Easing,
}

impl Transition {
    pub fn start(tweens: Vec<SpanTween>, duration: Duration, easing: Easing) -> Self {
        Self {
            tweens,
            clock: Clock::new(duration),
            easing,
        }
    }

    /// Advance the clock and return the eased progress.
    pub fn advance(&mut self, dt: Duration) -> f64 {
        self.clock.tick(dt);
        self.eased()
    }

    pub fn eased(&self) -> f64 {
        self.easing.apply(self.clock.progress())
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn finish(&mut self) {
        self.clock.finish();
    }

    pub fn tweens(&self) -> &[SpanTween] {
        &self.tweens
    }

    /// Intermediate spans at the current progress.
    pub fn frame(&self) -> impl Iterator<Item = (NodeId, ArcSpan)> + '_ {
        let t = self.eased();
        self.tweens.iter().map(move |tw| (tw.node, tw.sample(t)))
    }
}

/// Linear opacity ramp.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    from: f32,
    to: f32,
    clock: Clock,
}

impl Fade {
    pub fn fade_in(duration: Duration) -> Self {
        Self {
            from: 0.0,
            to: 1.0,
            clock: Clock::new(duration),
        }
    }

    /// Opacity held at zero until replaced.
    pub fn hidden() -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            clock: Clock::new(Duration::ZERO),
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.clock.tick(dt);
    }

    pub fn opacity(&self) -> f32 {
        let t = Easing::Linear.apply(self.clock.progress()) as f32;
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn finish(&mut self) {
        self.clock.finish();
    }
}
