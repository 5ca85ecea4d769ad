//! FIFO buffer between the step compiler and the playback driver

use super::step::AnimationStep;
use std::collections::VecDeque;

/// Strictly ordered queue of pending steps.
///
/// The only mutations are appending at the tail and popping the head, so
/// steps always run in the order their trace events were decoded.
#[derive(Debug, Default)]
pub struct AnimationQueue {
    steps: VecDeque<AnimationStep>,
    total_enqueued: usize,
}

impl AnimationQueue {
    pub fn new() -> Self {
        AnimationQueue::default()
    }

    /// Append the full step sequence of one compiled event
    pub fn extend(&mut self, steps: impl IntoIterator<Item = AnimationStep>) {
        let before = self.steps.len();
        self.steps.extend(steps);
        self.total_enqueued += self.steps.len() - before;
    }

    pub fn push(&mut self, step: AnimationStep) {
        self.steps.push_back(step);
        self.total_enqueued += 1;
    }

    pub fn pop(&mut self) -> Option<AnimationStep> {
        self.steps.pop_front()
    }

    /// The step that the next [`pop`](Self::pop) will return
    pub fn peek(&self) -> Option<&AnimationStep> {
        self.steps.front()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps ever appended
    pub fn total_enqueued(&self) -> usize {
        self.total_enqueued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::step::notify;

    #[test]
    fn test_fifo_across_appends() {
        let mut queue = AnimationQueue::new();
        queue.extend(vec![notify("A"), notify("B")]);
        assert_eq!(queue.pop(), Some(notify("A")));
        queue.push(notify("C"));
        assert_eq!(queue.peek(), Some(&notify("B")));
        assert_eq!(queue.pop(), Some(notify("B")));
        assert_eq!(queue.pop(), Some(notify("C")));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.total_enqueued(), 3);
    }
}
