use thiserror::Error;

use super::Snapshot;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Cannot pop snapshot when snapshot stack is empty")]
    StackUnderflow,
}

/// The current memory snapshot plus the snapshots saved before it.
///
/// The bottom entry is the base snapshot tagged with an empty name. It is
/// never popped.
#[derive(Debug)]
pub struct SnapshotStack {
    current: Snapshot,
    saved: Vec<(Snapshot, String)>,
}

impl SnapshotStack {
    pub fn new(base: Snapshot) -> Self {
        Self {
            saved: vec![(base.clone(), String::new())],
            current: base,
        }
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Snapshot {
        &mut self.current
    }

    /// Save a copy of the current snapshot. Later pokes only touch the
    /// current snapshot, never the saved copy.
    #[tracing::instrument(skip(self))]
    pub fn push(&mut self, name: &str) {
        self.saved.push((self.current.clone(), name.to_owned()));
    }

    /// Discard the current snapshot and restore the most recently pushed one.
    #[tracing::instrument(skip(self))]
    pub fn pop(&mut self) -> Result<(), SnapshotError> {
        if self.saved.len() <= 1 {
            return Err(SnapshotError::StackUnderflow);
        }
        if let Some((snapshot, _)) = self.saved.pop() {
            self.current = snapshot;
        }
        Ok(())
    }

    /// Name of the top-of-stack entry (empty for the base snapshot).
    pub fn current_name(&self) -> &str {
        self.saved
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_poke_pop_restores() {
        let mut stack = SnapshotStack::new(Snapshot::from_bytes(30000, &[5]));
        stack.push("a");
        stack.current_mut().poke(30000, 99);
        assert_eq!(stack.current().peek(30000), 99);
        assert_eq!(stack.current_name(), "a");

        stack.pop().unwrap();
        assert_eq!(stack.current().peek(30000), 5);
        assert_eq!(stack.current_name(), "");
    }

    #[test]
    fn test_pop_base_is_underflow() {
        let mut stack = SnapshotStack::new(Snapshot::new());
        assert_eq!(stack.pop(), Err(SnapshotError::StackUnderflow));
        assert_eq!(stack.depth(), 1);

        stack.push("");
        assert_eq!(stack.pop(), Ok(()));
        assert_eq!(stack.pop(), Err(SnapshotError::StackUnderflow));
    }

    #[test]
    fn test_nested_names() {
        let mut stack = SnapshotStack::new(Snapshot::new());
        stack.push("outer");
        stack.current_mut().poke(1, 1);
        stack.push("inner");
        stack.current_mut().poke(1, 2);
        assert_eq!(stack.current_name(), "inner");

        stack.pop().unwrap();
        assert_eq!(stack.current_name(), "outer");
        assert_eq!(stack.current().peek(1), 1);
        stack.pop().unwrap();
        assert_eq!(stack.current().peek(1), 0);
    }
}
