// SPDX-License-Identifier: Unlicense
//! Error types for the optimizer and validation.

use std::fmt;

use thiserror::Error;

use crate::{ast::Kind, optimizer::Phase};

/// Child-index path from the root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Why validation rejected a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnreducedReason {
    #[strum(serialize = "provisional grouping was never promoted")]
    Provisional,
    #[strum(serialize = "stray punctuation")]
    Punctuation,
    #[strum(serialize = "keyword outside any construct")]
    Keyword,
    #[strum(serialize = "operator outside any expression")]
    Operator,
    #[strum(serialize = "literal payload was never coerced")]
    RawLiteral,
}

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum OptimizeError {
    /// The optimizer was handed a root that is not a program.
    #[error("not a Program (found {found})")]
    NotAProgram { found: Kind },

    /// A construct survived both phases without being reduced.
    #[error("unreduced construct {kind} at {path}: {reason}")]
    Unreduced {
        kind: Kind,
        path: NodePath,
        reason: UnreducedReason,
    },

    /// A configured pass cap was hit before the phase settled.
    #[error("{phase} phase did not settle within {passes} passes")]
    PassLimitExceeded { phase: Phase, passes: usize },
}
