//! Flattened, collapse-aware line layout of a [`FilteredResult`].
//!
//! Each step renders as one header line, then its entries unless collapsed, then one
//! blank separator line. Line numbers produced here are the ones the log view draws and
//! the ones the match index points at.

use std::collections::HashSet;

use crate::filter::FilteredResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderLine {
    Header { step: usize },
    /// `entry` indexes the step's filtered entries.
    Entry { step: usize, entry: usize },
    Separator { step: usize },
}

impl RenderLine {
    pub fn step(self) -> usize {
        match self {
            Self::Header { step } | Self::Entry { step, .. } | Self::Separator { step } => step,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    lines: Vec<RenderLine>,
}

impl Layout {
    pub fn build(result: &FilteredResult, collapsed: &HashSet<usize>) -> Self {
        let mut lines = Vec::with_capacity(result.total_entries() + result.steps.len() * 2);
        for step in &result.steps {
            lines.push(RenderLine::Header { step: step.index });
            if !collapsed.contains(&step.index) {
                lines.extend((0..step.entries.len()).map(|entry| RenderLine::Entry {
                    step: step.index,
                    entry,
                }));
            }
            lines.push(RenderLine::Separator { step: step.index });
        }
        Self { lines }
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, line: usize) -> Option<RenderLine> {
        self.lines.get(line).copied()
    }

    pub fn lines(&self) -> &[RenderLine] {
        &self.lines
    }

    /// Step owning `line`, i.e. the nearest header at or above it. Past-the-end lines
    /// resolve to the last step.
    pub fn step_at(&self, line: usize) -> Option<usize> {
        let line = line.min(self.lines.len().checked_sub(1)?);
        Some(self.lines[line].step())
    }

    pub fn header_line(&self, step: usize) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| *l == RenderLine::Header { step })
    }
}
