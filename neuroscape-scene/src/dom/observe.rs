//! Visibility-triggered effects: scroll reveals, skill rings, stat counters

use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use super::{DomCommand, Effects, ElementKey, PageEvent, PageState, Target, TimerAction};

/// Radius of the skill ring's SVG circle
pub const RING_RADIUS: f64 = 26.0;
pub const COUNTER_INTERVAL_MS: f64 = 40.0;
/// A counter reaches its target in this many ticks
pub const COUNTER_STEPS: f64 = 40.0;

/// Stroke length of a full skill ring
pub fn ring_circumference() -> f64 {
    2.0 * PI * RING_RADIUS
}

/// `stroke-dashoffset` that leaves `percent` of the ring drawn
pub fn ring_offset(percent: f64) -> f64 {
    let c = ring_circumference();
    c - percent / 100.0 * c
}

/// An element watched for visibility, and what to do when it shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Observed {
    Reveal { delay_ms: f64, scheduled: bool },
    Ring { percent: f64, done: bool },
    Counter { target: f64, started: bool },
}

impl Observed {
    pub fn reveal(delay_ms: f64) -> Self {
        Observed::Reveal {
            delay_ms: delay_ms.max(0.0),
            scheduled: false,
        }
    }

    pub fn ring(percent: f64) -> Self {
        Observed::Ring {
            percent,
            done: false,
        }
    }

    pub fn counter(target: f64) -> Self {
        Observed::Counter {
            target,
            started: false,
        }
    }

    /// How the host should configure the observer for this element
    pub fn options(&self) -> ObserverOptions {
        match self {
            Observed::Reveal { .. } => ObserverOptions {
                threshold: 0.15,
                root_margin: "0px 0px -50px 0px",
            },
            Observed::Ring { .. } | Observed::Counter { .. } => ObserverOptions {
                threshold: 0.5,
                root_margin: "0px",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: &'static str,
}

/// Count-up animation for one stat number
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatCounter {
    pub current: f64,
    pub target: f64,
    pub increment: f64,
}

impl StatCounter {
    pub fn new(target: f64) -> Self {
        Self {
            current: 0.0,
            target,
            increment: target / COUNTER_STEPS,
        }
    }

    /// Advance one tick; returns the text to show
    pub fn tick(&mut self) -> String {
        self.current += self.increment;
        if self.current >= self.target {
            self.current = self.target;
        }
        format!("{}", self.current.ceil() as i64)
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.target
    }
}

pub fn on_visible(state: &mut PageState, event: &PageEvent, fx: &mut Effects<'_>) {
    let PageEvent::Visible(key) = *event else {
        return;
    };
    let Some(observed) = state.observed.get_mut(key.0) else {
        debug!(key = key.0, "visibility for unregistered element");
        return;
    };
    let target = Target::Element(key);

    match observed {
        Observed::Reveal {
            delay_ms,
            scheduled,
        } => {
            if *scheduled {
                return;
            }
            *scheduled = true;
            if *delay_ms <= 0.0 {
                fx.set_class(target, "visible", true);
            } else {
                fx.after(
                    *delay_ms,
                    TimerAction::AddClass {
                        target,
                        class: "visible",
                    },
                );
            }
        }
        Observed::Ring { percent, done } => {
            if *done {
                return;
            }
            *done = true;
            fx.emit(DomCommand::SetStyle {
                target,
                property: "stroke-dashoffset",
                value: ring_offset(*percent).to_string(),
            });
            fx.emit(DomCommand::Unobserve(key));
        }
        Observed::Counter {
            target: count,
            started,
        } => {
            if *started {
                return;
            }
            *started = true;
            state.counters.insert(key, StatCounter::new(*count));
            fx.after(COUNTER_INTERVAL_MS, TimerAction::CounterTick(key));
            fx.emit(DomCommand::Unobserve(key));
        }
    }
}

pub(super) fn counter_tick(state: &mut PageState, key: ElementKey, fx: &mut Effects<'_>) {
    let Some(counter) = state.counters.get_mut(&key) else {
        return;
    };
    let text = counter.tick();
    fx.emit(DomCommand::SetText {
        target: Target::Element(key),
        text,
    });
    if !counter.is_done() {
        fx.after(COUNTER_INTERVAL_MS, TimerAction::CounterTick(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomEffectsController, PageLayout};

    fn texts(commands: &[DomCommand]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|c| match c {
                DomCommand::SetText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ring_offset_matches_percent() {
        let c = ring_circumference();
        assert!((c - 163.362_817_986_669_2).abs() < 1e-9);
        assert!((ring_offset(0.0) - c).abs() < 1e-9);
        assert!(ring_offset(100.0).abs() < 1e-9);
        assert!((ring_offset(75.0) - c * 0.25).abs() < 1e-9);
    }

    #[test]
    fn ring_sets_offset_once_and_unobserves() {
        let mut page = DomEffectsController::new(PageLayout::default());
        let key = page.observe(Observed::ring(90.0));

        let commands = page.dispatch(0.0, &PageEvent::Visible(key));
        assert_eq!(commands.len(), 2);
        assert!(matches!(
            &commands[0],
            DomCommand::SetStyle { property: "stroke-dashoffset", value, .. }
                if (value.parse::<f64>().unwrap() - ring_offset(90.0)).abs() < 1e-9
        ));
        assert_eq!(commands[1], DomCommand::Unobserve(key));
        assert!(page.dispatch(5.0, &PageEvent::Visible(key)).is_empty());
    }

    #[test]
    fn reveal_waits_for_delay() {
        let mut page = DomEffectsController::new(PageLayout::default());
        let key = page.observe(Observed::reveal(300.0));

        assert!(page.dispatch(1000.0, &PageEvent::Visible(key)).is_empty());
        assert!(page.advance(1299.0).is_empty());
        assert_eq!(
            page.advance(1300.0),
            vec![DomCommand::SetClass {
                target: Target::Element(key),
                class: "visible",
                enabled: true
            }]
        );
        // reveals stay observed but only schedule once
        assert!(page.dispatch(2000.0, &PageEvent::Visible(key)).is_empty());
        assert_eq!(page.pending_timers(), 0);
    }

    #[test]
    fn reveal_without_delay_is_immediate() {
        let mut page = DomEffectsController::new(PageLayout::default());
        let key = page.observe(Observed::reveal(0.0));
        assert_eq!(page.dispatch(0.0, &PageEvent::Visible(key)).len(), 1);
        assert_eq!(Observed::reveal(0.0).options().threshold, 0.15);
    }

    #[test]
    fn counter_counts_up_in_forty_ticks() {
        let mut page = DomEffectsController::new(PageLayout::default());
        let key = page.observe(Observed::counter(15.0));
        let start = page.dispatch(0.0, &PageEvent::Visible(key));
        assert_eq!(start, vec![DomCommand::Unobserve(key)]);

        let first = page.advance(40.0);
        assert_eq!(texts(&first), vec!["1"]);

        let rest = page.advance(10_000.0);
        let rest = texts(&rest);
        assert_eq!(rest.len(), 39);
        assert_eq!(rest.last(), Some(&"15"));
        assert!(page.state().counter(key).unwrap().is_done());
        assert_eq!(page.pending_timers(), 0);
    }

    #[test]
    fn zero_target_finishes_on_first_tick() {
        let mut counter = StatCounter::new(0.0);
        assert_eq!(counter.tick(), "0");
        assert!(counter.is_done());
    }
}
