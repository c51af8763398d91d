//! Pulse tokens travelling along network edges
//!
//! Signals hold indices into the immutable edge table; they never own edges.
//! When a token runs past the end of its edge it restarts at progress 0 on a
//! freshly drawn edge (drawn with replacement, so repeats are allowed).

use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{Palette, SignalConfig};
use crate::graph::ProximityGraph;
use crate::math::{Color, Point3};

/// One token on one edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub from: usize,
    pub to: usize,
    /// Position along the edge in [0, 1]
    pub progress: f32,
    pub speed: f32,
    pub color: Color,
}

impl Signal {
    /// Move forward by `speed * amount`; returns true when the token wrapped
    pub fn advance(&mut self, amount: f32) -> bool {
        self.progress += self.speed * amount;
        // NaN lands here too
        if !(self.progress <= 1.0) {
            self.progress = 0.0;
            return true;
        }
        self.progress = self.progress.max(0.0);
        false
    }

    /// Interpolated position between the two endpoint positions
    pub fn position_between(&self, from: Point3, to: Point3) -> Point3 {
        from.lerp(&to, self.progress)
    }

    /// Fade in and out over the traversal, zero at both ends
    pub fn opacity(&self, peak: f32) -> f32 {
        (self.progress * PI).sin().max(0.0) * peak
    }
}

/// Per-frame visual state of a token
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalVisual {
    /// Position in network-local space
    pub position: Point3,
    pub opacity: f32,
    pub color: Color,
}

/// Fixed pool of tokens and the rate they move at
#[derive(Debug, Clone)]
pub struct SignalAnimator {
    pub signals: Vec<Signal>,
    pub radius: f32,
    rate: f32,
    peak_opacity: f32,
    reference_fps: f32,
}

impl SignalAnimator {
    /// Create the token pool, each on a random edge with random progress.
    ///
    /// A graph without edges gets an empty pool.
    pub fn spawn<R: Rng>(
        graph: &ProximityGraph,
        config: &SignalConfig,
        palette: &Palette,
        rng: &mut R,
    ) -> Self {
        let mut signals = Vec::with_capacity(config.count);
        if !graph.is_empty() {
            for _ in 0..config.count {
                let Some(edge) = graph.random_edge(rng) else {
                    break;
                };
                let color = if rng.gen_bool(0.5) {
                    palette.secondary
                } else {
                    palette.pulse
                };
                signals.push(Signal {
                    from: edge.from,
                    to: edge.to,
                    progress: rng.gen_range(0.0..1.0),
                    speed: config.speed.sample(rng),
                    color,
                });
            }
        }

        Self {
            signals,
            radius: config.radius,
            rate: config.rate,
            peak_opacity: config.peak_opacity,
            reference_fps: config.reference_fps,
        }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Advance every token by `delta` seconds.
    ///
    /// The configured rate is per reference frame, so one frame at the
    /// reference rate moves a speed-1 token by exactly `rate`.
    pub fn advance<R: Rng>(&mut self, graph: &ProximityGraph, delta: f32, rng: &mut R) {
        let frames = delta.max(0.0) * self.reference_fps;
        let amount = self.rate * frames;

        for signal in &mut self.signals {
            if signal.advance(amount) {
                if let Some(edge) = graph.random_edge(rng) {
                    signal.from = edge.from;
                    signal.to = edge.to;
                }
            }
        }
    }

    /// Write positions and opacities for the current progress values
    pub fn write_visuals(&self, nodes: &[Point3], out: &mut Vec<SignalVisual>) {
        out.clear();
        out.extend(self.signals.iter().map(|s| SignalVisual {
            position: s.position_between(nodes[s.from], nodes[s.to]),
            opacity: s.opacity(self.peak_opacity),
            color: s.color,
        }));
    }
}
