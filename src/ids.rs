// Active id registry with smallest-free-id reuse

use std::ops::Index;

/// Ordered set of active ids. Id `0` is a permanent sentinel meaning
/// "create a new one" and is never allocated or freed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveIds {
    ids: Vec<usize>,
}

impl Default for ActiveIds {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for ActiveIds {
    type Output = usize;
    fn index(&self, position: usize) -> &Self::Output {
        &self.ids[position]
    }
}

impl ActiveIds {
    pub fn new() -> Self {
        Self { ids: vec![0] }
    }

    /// Activates and returns the smallest id not currently active.
    pub fn allocate(&mut self) -> usize {
        // ids are sorted and distinct, so the first position holding a
        // larger id marks the first gap.
        let id = self
            .ids
            .iter()
            .enumerate()
            .find(|&(position, &id)| position != id)
            .map_or(self.ids.len(), |(position, _)| position);
        self.ids.insert(id, id);
        id
    }

    /// Reactivates a specific id. Returns false if it was already active.
    pub fn insert(&mut self, id: usize) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(position) => {
                self.ids.insert(position, id);
                true
            }
        }
    }

    pub fn free(&mut self, id: usize) -> bool {
        if id == 0 {
            return false;
        }
        match self.ids.binary_search(&id) {
            Ok(position) => {
                self.ids.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: usize) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.len() == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ids.iter().copied()
    }

    pub fn allocated(&self) -> impl Iterator<Item = usize> + '_ {
        self.ids[1..].iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.ids
    }

    pub fn max_id(&self) -> usize {
        self.ids[self.ids.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::{Debug, Write};

    fn check_output<T: Debug>(x: &T, expected_output: &str) {
        let mut output = String::new();
        write!(&mut output, "{:?}", x).expect("Oops");
        assert_eq!(output, expected_output);
    }

    #[test]
    fn test_allocate_dense() {
        let mut ids = ActiveIds::new();
        assert!(ids.is_empty());
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 2);
        assert_eq!(ids.allocate(), 3);
        check_output(&ids, "ActiveIds { ids: [0, 1, 2, 3] }");
        assert_eq!(ids.max_id(), 3);
    }

    #[test]
    fn test_reuse_smallest_gap() {
        let mut ids = ActiveIds::new();
        for _ in 0..5 {
            ids.allocate();
        }
        assert!(ids.free(4));
        assert!(ids.free(2));
        check_output(&ids, "ActiveIds { ids: [0, 1, 3, 5] }");
        assert_eq!(ids.allocate(), 2);
        assert_eq!(ids.allocate(), 4);
        assert_eq!(ids.allocate(), 6);
        check_output(&ids.allocated().collect::<Vec<_>>(), "[1, 2, 3, 4, 5, 6]");
    }

    #[test]
    fn test_sentinel_is_permanent() {
        let mut ids = ActiveIds::new();
        assert!(!ids.free(0));
        assert!(!ids.free(7));
        assert!(ids.contains(0));
        assert_eq!(ids[0], 0);
    }

    #[test]
    fn test_insert() {
        let mut ids = ActiveIds::new();
        assert!(ids.insert(3));
        assert!(!ids.insert(3));
        check_output(&ids, "ActiveIds { ids: [0, 3] }");
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 2);
        assert_eq!(ids.allocate(), 4);
    }
}
