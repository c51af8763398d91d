//! Deferred page actions
//!
//! Every `setTimeout`-style delay in the page effects is an entry in one
//! queue, ordered by due time and then by insertion order. The host advances
//! the queue with its own clock; nothing here sleeps.

use super::{ElementKey, Target};

/// Work to run when a timer comes due
#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    AddClass { target: Target, class: &'static str },
    TypingStep,
    CounterTick(ElementKey),
    HidePreloader,
    FinishSubmission,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub due_ms: f64,
    seq: u64,
    pub action: TimerAction,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<Timer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, due_ms: f64, action: TimerAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Timer {
            due_ms,
            seq,
            action,
        });
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<Timer> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)))?;
        Some(self.pending.swap_remove(index))
    }

    /// Due time of the next pending timer
    pub fn next_due(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|t| t.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut q = TimerQueue::default();
        q.schedule(300.0, TimerAction::ClearStatus);
        q.schedule(100.0, TimerAction::TypingStep);
        q.schedule(200.0, TimerAction::HidePreloader);

        assert_eq!(q.next_due(), Some(100.0));
        assert_eq!(q.pop_due(1000.0).unwrap().action, TimerAction::TypingStep);
        assert_eq!(q.pop_due(1000.0).unwrap().action, TimerAction::HidePreloader);
        assert_eq!(q.pop_due(1000.0).unwrap().action, TimerAction::ClearStatus);
        assert!(q.is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut q = TimerQueue::default();
        q.schedule(50.0, TimerAction::FinishSubmission);
        q.schedule(50.0, TimerAction::ClearStatus);
        assert_eq!(q.pop_due(50.0).unwrap().action, TimerAction::FinishSubmission);
        assert_eq!(q.pop_due(50.0).unwrap().action, TimerAction::ClearStatus);
    }

    #[test]
    fn future_timers_stay_queued() {
        let mut q = TimerQueue::default();
        q.schedule(500.0, TimerAction::TypingStep);
        assert!(q.pop_due(499.9).is_none());
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(500.0).unwrap().action, TimerAction::TypingStep);
    }
}
