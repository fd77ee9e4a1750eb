//! Undo/redo snapshot stacks.

use std::collections::VecDeque;

use crate::decode::RasterImage;

/// Full-image snapshots for undo and redo.
///
/// The undo side is optionally capped; once full, the oldest snapshot is
/// dropped to make room.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<RasterImage>,
    redo: Vec<RasterImage>,
    limit: Option<usize>,
}

impl History {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record `previous` as undoable and start a new branch.
    pub fn commit(&mut self, previous: RasterImage) {
        self.redo.clear();
        self.push_undo(previous);
    }

    /// Swap `current` with the newest undo snapshot.
    ///
    /// Returns false (and leaves everything untouched) when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: &mut RasterImage) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, previous));
        true
    }

    /// Swap `current` with the newest redo snapshot.
    pub fn redo(&mut self, current: &mut RasterImage) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let previous = std::mem::replace(current, next);
        self.push_undo(previous);
        true
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn peek_redo(&self) -> Option<&RasterImage> {
        self.redo.last()
    }

    /// Whether `image` shares its buffer with any snapshot.
    pub fn contains(&self, image: &RasterImage) -> bool {
        self.undo.iter().chain(self.redo.iter()).any(|s| s.ptr_eq(image))
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_undo(&mut self, image: RasterImage) {
        if self.limit == Some(0) {
            return;
        }
        self.undo.push_back(image);
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(v: u8) -> RasterImage {
        RasterImage::filled(1, 1, [v, v, v, 255])
    }

    #[test]
    fn test_undo_redo_swap() {
        let mut history = History::new(None);
        let a = img(1);
        let b = img(2);
        let mut current = b.clone();

        history.commit(a.clone());
        assert!(history.undo(&mut current));
        assert!(current.ptr_eq(&a));
        assert!(history.peek_redo().unwrap().ptr_eq(&b));

        assert!(history.redo(&mut current));
        assert!(current.ptr_eq(&b));
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = History::new(None);
        let a = img(1);
        let mut current = a.clone();

        assert!(!history.undo(&mut current));
        assert!(!history.redo(&mut current));
        assert!(current.ptr_eq(&a));
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut history = History::new(None);
        let mut current = img(2);
        history.commit(img(1));
        history.undo(&mut current);
        assert_eq!(history.redo_len(), 1);

        history.commit(img(3));
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = History::new(Some(2));
        let first = img(1);
        history.commit(first.clone());
        history.commit(img(2));
        history.commit(img(3));

        assert_eq!(history.undo_len(), 2);
        assert!(!history.contains(&first));
    }

    #[test]
    fn test_zero_limit_keeps_nothing() {
        let mut history = History::new(Some(0));
        history.commit(img(1));
        assert_eq!(history.undo_len(), 0);
    }
}
