//! Shared identifiers and source locations
//!
//! Every token and AST node carries a [`SourceTrace`]; the [`SourceMap`]
//! turns character indices into 1-based row/column pairs using a
//! precomputed line-feed offset table.

use miette::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle into the AST node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle into the scope arena built by the context pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Location of a token or statement in the original source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceTrace {
    /// Character index into the source
    pub index: usize,
    /// 1-based row
    pub row: usize,
    /// 1-based column
    pub column: usize,
}

impl SourceTrace {
    pub fn at(index: usize) -> Self {
        Self {
            index,
            row: 0,
            column: 0,
        }
    }

    /// One-character span for diagnostic labels
    pub fn span(&self) -> SourceSpan {
        (self.index, 1).into()
    }
}

impl fmt::Display for SourceTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// Precomputed line-feed offsets for a source file
#[derive(Debug, Clone)]
pub struct SourceMap {
    feeds: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut feeds = vec![0];
        for (i, ch) in source.chars().enumerate() {
            if ch == '\n' {
                feeds.push(i);
            }
        }
        Self { feeds }
    }

    /// Map a character index to a 1-based (row, column) pair
    pub fn locate(&self, index: usize) -> (usize, usize) {
        let len = self.feeds.len();
        for i in 0..len {
            let lf = self.feeds[i];

            // A line feed belongs to the row it terminates, keeping every
            // column 1-based
            if lf <= index && (i == len - 1 || self.feeds[i + 1] >= index) {
                // The first row has no leading line feed to subtract
                let mut col = index - lf;
                if i == 0 {
                    col += 1;
                }
                return (i + 1, col);
            }
        }
        (1, 1)
    }

    /// Fill the row/column of a trace from its index
    pub fn resolve(&self, trace: &mut SourceTrace) {
        let (row, column) = self.locate(trace.index);
        trace.row = row;
        trace.column = column;
    }
}
