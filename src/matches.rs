//! Render-ordered index of search matches with cyclic navigation.

use std::collections::HashSet;

use crate::filter::FilteredResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLocation {
    pub step_index: usize,
    /// Position within the step's filtered entries.
    pub entry_index: usize,
    /// 0-based line in the flattened render.
    pub line_number: usize,
}

/// One location per matching entry in an expanded step, in ascending line order.
/// Always rebuilt from scratch; never patched.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    locations: Vec<MatchLocation>,
    current: Option<usize>,
}

impl MatchIndex {
    pub fn build(result: &FilteredResult, collapsed: &HashSet<usize>) -> Self {
        let mut locations = Vec::new();
        let mut line_number = 0;
        for step in &result.steps {
            line_number += 1;
            if !collapsed.contains(&step.index) {
                for (entry_index, entry) in step.entries.iter().enumerate() {
                    if !entry.matches.is_empty() {
                        locations.push(MatchLocation {
                            step_index: step.index,
                            entry_index,
                            line_number,
                        });
                    }
                    line_number += 1;
                }
            }
            line_number += 1;
        }
        Self {
            locations,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn locations(&self) -> &[MatchLocation] {
        &self.locations
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&MatchLocation> {
        self.locations.get(self.current?)
    }

    /// 1-based position for the status line.
    pub fn current_position(&self) -> Option<usize> {
        self.current.map(|i| i + 1)
    }

    pub fn is_current(&self, step_index: usize, entry_index: usize) -> bool {
        self.current()
            .is_some_and(|m| m.step_index == step_index && m.entry_index == entry_index)
    }

    pub fn next(&mut self) -> Option<&MatchLocation> {
        if self.locations.is_empty() {
            return None;
        }
        let next = match self.current {
            Some(i) => (i + 1) % self.locations.len(),
            None => 0,
        };
        self.current = Some(next);
        self.locations.get(next)
    }

    pub fn previous(&mut self) -> Option<&MatchLocation> {
        if self.locations.is_empty() {
            return None;
        }
        let last = self.locations.len() - 1;
        let prev = match self.current {
            Some(0) | None => last,
            Some(i) => i - 1,
        };
        self.current = Some(prev);
        self.locations.get(prev)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Re-selects the match at the same step/entry, if it survived a rebuild.
    pub fn restore(&mut self, previous: Option<MatchLocation>) {
        self.current = previous.and_then(|p| {
            self.locations
                .iter()
                .position(|m| m.step_index == p.step_index && m.entry_index == p.entry_index)
        });
    }
}
