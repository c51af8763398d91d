//! Looping type-and-delete headline

use serde::Serialize;

use super::{DomCommand, Effects, PageEvent, PageState, Target, TimerAction};

pub const TYPE_MS: f64 = 80.0;
pub const DELETE_MS: f64 = 40.0;
/// Pause with the full phrase shown
pub const HOLD_MS: f64 = 2000.0;
/// Pause on the empty line before the next phrase
pub const NEXT_PHRASE_MS: f64 = 400.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Typewriter {
    phrases: Vec<Vec<char>>,
    phrase: usize,
    chars: usize,
    deleting: bool,
    running: bool,
}

impl Typewriter {
    /// Empty phrases are skipped; with no phrases left there is nothing to type
    pub fn new(phrases: &[String]) -> Option<Self> {
        let phrases: Vec<Vec<char>> = phrases
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.chars().collect())
            .collect();
        if phrases.is_empty() {
            return None;
        }
        Some(Self {
            phrases,
            phrase: 0,
            chars: 0,
            deleting: false,
            running: false,
        })
    }

    /// Type or delete one character; returns the visible text and the delay
    /// until the next step
    pub fn step(&mut self) -> (String, f64) {
        let phrase = &self.phrases[self.phrase];
        let mut delay = if self.deleting {
            self.chars = self.chars.saturating_sub(1);
            DELETE_MS
        } else {
            self.chars = (self.chars + 1).min(phrase.len());
            TYPE_MS
        };
        let text: String = phrase[..self.chars].iter().collect();

        if !self.deleting && self.chars == phrase.len() {
            self.deleting = true;
            delay = HOLD_MS;
        } else if self.deleting && self.chars == 0 {
            self.deleting = false;
            self.phrase = (self.phrase + 1) % self.phrases.len();
            delay = NEXT_PHRASE_MS;
        }
        (text, delay)
    }

    pub fn phrase_index(&self) -> usize {
        self.phrase
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }
}

pub fn on_ready(state: &mut PageState, _event: &PageEvent, fx: &mut Effects<'_>) {
    let Some(typing) = state.typing.as_mut() else {
        return;
    };
    if typing.running {
        return;
    }
    typing.running = true;
    step(state, fx);
}

pub(super) fn step(state: &mut PageState, fx: &mut Effects<'_>) {
    let Some(typing) = state.typing.as_mut() else {
        return;
    };
    let (text, delay) = typing.step();
    fx.emit(DomCommand::SetText {
        target: Target::TypingText,
        text,
    });
    fx.after(delay, TimerAction::TypingStep);
}
