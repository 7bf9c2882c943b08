//! Sink that keeps every message in memory.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Level, Sink};

/// Records `(level, message)` pairs regardless of verbosity.
///
/// Clones share the same buffer, so a caller can hand one clone to a run
/// and read the messages back through another.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    messages: Rc<RefCell<Vec<(Level, String)>>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    /// Messages emitted at `level`.
    #[must_use]
    pub fn at(&self, level: Level) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}
