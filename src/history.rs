use std::collections::VecDeque;

/// Undo/redo stack of snapshots.
///
/// `past` holds older snapshots with the most recent at the back, `future`
/// holds undone snapshots with the next one to redo at the back.
#[derive(Clone, Debug)]
pub struct History<T> {
    past: VecDeque<T>,
    present: T,
    future: Vec<T>,
    capacity: Option<usize>,
}

impl<T> History<T> {
    pub fn new(present: T) -> Self {
        History {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
            capacity: None,
        }
    }

    /// Keep at most `capacity` snapshots behind the present, dropping the oldest first.
    pub fn with_capacity(present: T, capacity: usize) -> Self {
        History {
            capacity: Some(capacity),
            ..Self::new(present)
        }
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    /// Make `next` the present. Anything that could be redone is forgotten.
    pub fn push(&mut self, next: T) {
        let prev = std::mem::replace(&mut self.present, next);
        self.past.push_back(prev);
        self.future.clear();
        if let Some(capacity) = self.capacity {
            while self.past.len() > capacity {
                self.past.pop_front();
            }
        }
    }

    /// Step back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, prev);
        self.future.push(current);
        true
    }

    /// Step forward one snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

impl<T: Default> Default for History<T> {
    fn default() -> Self {
        History::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_and_redo() {
        let mut history = History::new("a");
        history.push("b");
        history.push("c");
        assert!(history.undo());
        assert_eq!(*history.present(), "b");
        assert!(history.undo());
        assert_eq!(*history.present(), "a");
        assert!(!history.undo());
        assert_eq!(*history.present(), "a");
        assert!(history.redo());
        assert!(history.redo());
        assert_eq!(*history.present(), "c");
        assert!(!history.redo());
    }

    #[test]
    fn push_clears_future() {
        let mut history = History::new(1);
        history.push(2);
        history.undo();
        assert!(history.can_redo());
        history.push(3);
        assert!(!history.can_redo());
        history.undo();
        assert_eq!(*history.present(), 1);
    }

    #[test]
    fn empty_history() {
        let mut history: History<String> = History::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.redo());
        assert_eq!(history.present(), "");
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = History::with_capacity(0, 2);
        for i in 1..=4 {
            history.push(i);
        }
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(*history.present(), 2);
    }
}
