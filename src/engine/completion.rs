use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    pub total: usize,
    pub quota: usize,
    /// Targets must be completed in index order (seal before flaps).
    pub ordered: bool,
}

impl TargetSpec {
    pub fn unordered(total: usize, quota: usize) -> Self {
        Self {
            total,
            quota,
            ordered: false,
        }
    }

    pub fn ordered(total: usize) -> Self {
        Self {
            total,
            quota: total,
            ordered: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkOutcome {
    Accepted,
    Duplicate,
    OutOfRange,
    OutOfOrder,
    /// The active stage has no targets to complete.
    Inactive,
}

impl MarkOutcome {
    pub fn accepted(self) -> bool {
        self == MarkOutcome::Accepted
    }
}

/// Tracks which sub-targets of a stage the user has completed.
///
/// Flags only move false -> true; every rejected mark is a silent no-op.
#[derive(Debug, Clone)]
pub struct CompletionCounter {
    spec: TargetSpec,
    done: Vec<bool>,
    completed: usize,
}

impl CompletionCounter {
    pub fn new(spec: TargetSpec) -> Self {
        Self {
            spec,
            done: vec![false; spec.total],
            completed: 0,
        }
    }

    pub fn mark_complete(&mut self, target: usize) -> MarkOutcome {
        match self.done.get(target) {
            None => MarkOutcome::OutOfRange,
            Some(true) => MarkOutcome::Duplicate,
            Some(false) if self.spec.ordered && self.next_pending() != Some(target) => {
                MarkOutcome::OutOfOrder
            }
            Some(false) => {
                self.done[target] = true;
                self.completed += 1;
                MarkOutcome::Accepted
            }
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn quota_reached(&self) -> bool {
        self.completed >= self.spec.quota
    }

    pub fn is_complete(&self, target: usize) -> bool {
        self.done.get(target).copied().unwrap_or(false)
    }

    /// Lowest index still waiting to be completed.
    pub fn next_pending(&self) -> Option<usize> {
        self.done.iter().position(|done| !done)
    }

    pub fn spec(&self) -> TargetSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_marks_are_idempotent() {
        let mut counter = CompletionCounter::new(TargetSpec::unordered(8, 5));
        assert_eq!(counter.mark_complete(3), MarkOutcome::Accepted);
        assert_eq!(counter.mark_complete(3), MarkOutcome::Duplicate);
        assert_eq!(counter.completed_count(), 1);
        assert!(counter.is_complete(3));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut counter = CompletionCounter::new(TargetSpec::unordered(2, 2));
        assert_eq!(counter.mark_complete(2), MarkOutcome::OutOfRange);
        assert_eq!(counter.mark_complete(usize::MAX), MarkOutcome::OutOfRange);
        assert_eq!(counter.completed_count(), 0);
        assert!(!counter.is_complete(2));
    }

    #[test]
    fn quota_is_independent_of_total_and_sticky() {
        let mut counter = CompletionCounter::new(TargetSpec::unordered(8, 5));
        for (n, target) in [0, 2, 4, 6].into_iter().enumerate() {
            counter.mark_complete(target);
            assert_eq!(counter.completed_count(), n + 1);
            assert!(!counter.quota_reached());
        }
        counter.mark_complete(1);
        assert!(counter.quota_reached());

        counter.mark_complete(7);
        counter.mark_complete(0);
        assert!(counter.quota_reached());
        assert_eq!(counter.completed_count(), 6);
    }

    #[test]
    fn ordered_targets_reject_skips() {
        let mut counter = CompletionCounter::new(TargetSpec::ordered(3));
        assert_eq!(counter.mark_complete(1), MarkOutcome::OutOfOrder);
        assert_eq!(counter.mark_complete(0), MarkOutcome::Accepted);
        assert_eq!(counter.mark_complete(2), MarkOutcome::OutOfOrder);
        assert_eq!(counter.next_pending(), Some(1));
        assert_eq!(counter.mark_complete(1), MarkOutcome::Accepted);
        assert_eq!(counter.mark_complete(2), MarkOutcome::Accepted);
        assert!(counter.quota_reached());
        assert_eq!(counter.next_pending(), None);
    }
}
