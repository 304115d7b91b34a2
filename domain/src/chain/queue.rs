//! FIFO queue of steps awaiting execution.

use std::collections::VecDeque;

use crate::tool::entities::PlanStep;

/// A plan step waiting in the [`PendingQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedStep {
    /// 1-based position in the original plan, stable across requeues
    pub ordinal: usize,
    /// The step with its original, unresolved arguments
    pub step: PlanStep,
    /// Failed attempts so far
    pub attempts: u32,
}

impl QueuedStep {
    pub fn new(ordinal: usize, step: PlanStep) -> Self {
        Self {
            ordinal,
            step,
            attempts: 0,
        }
    }

    /// Count a failed attempt and return the new total.
    pub fn record_failure(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }
}

/// Steps awaiting execution, processed strictly front to back.
///
/// Failed steps go back to the tail via [`PendingQueue::requeue`].
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    steps: VecDeque<QueuedStep>,
}

impl PendingQueue {
    pub fn from_plan(plan: Vec<PlanStep>) -> Self {
        Self {
            steps: plan
                .into_iter()
                .enumerate()
                .map(|(i, step)| QueuedStep::new(i + 1, step))
                .collect(),
        }
    }

    pub fn next(&mut self) -> Option<QueuedStep> {
        self.steps.pop_front()
    }

    /// Append a failed step to the tail.
    pub fn requeue(&mut self, step: QueuedStep) {
        self.steps.push_back(step);
    }

    /// Remove and return everything still queued.
    pub fn drain(&mut self) -> Vec<QueuedStep> {
        self.steps.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedStep> {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_with_requeue_to_tail() {
        let mut queue = PendingQueue::from_plan(vec![
            PlanStep::new("a"),
            PlanStep::new("b"),
            PlanStep::new("c"),
        ]);

        let mut first = queue.next().unwrap();
        assert_eq!(first.ordinal, 1);
        assert_eq!(first.record_failure(), 1);
        queue.requeue(first);

        let order: Vec<_> = queue.iter().map(|s| s.step.name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(queue.iter().last().unwrap().attempts, 1);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = PendingQueue::from_plan(vec![PlanStep::new("a")]);
        assert_eq!(queue.drain().len(), 1);
        assert!(queue.is_empty());
    }
}
