use std::collections::HashMap;

use uuid::Uuid;

use crate::entity::{Prompt, Revision};

/// Per-prompt revision history, kept in memory for the life of a session.
#[derive(Debug)]
pub struct RevisionLog {
    max_per_prompt: usize,
    entries: HashMap<Uuid, Vec<Revision>>,
}

impl RevisionLog {
    pub fn new(max_per_prompt: usize) -> Self {
        Self {
            max_per_prompt: max_per_prompt.max(1),
            entries: HashMap::new(),
        }
    }

    /// Snapshot `prompt` as its next revision. Returns the revision number.
    pub fn record(&mut self, prompt: &Prompt) -> u32 {
        let revisions = self.entries.entry(prompt.id).or_default();
        let number = revisions.last().map(|r| r.number + 1).unwrap_or(1);
        revisions.push(Revision::of(prompt, number));

        if revisions.len() > self.max_per_prompt {
            let excess = revisions.len() - self.max_per_prompt;
            revisions.drain(..excess);
        }
        number
    }

    /// Oldest first.
    pub fn list(&self, id: &Uuid) -> &[Revision] {
        self.entries.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: &Uuid, number: u32) -> Option<&Revision> {
        self.list(id).iter().find(|r| r.number == number)
    }

    pub fn forget(&mut self, id: &Uuid) {
        self.entries.remove(id);
    }
}
