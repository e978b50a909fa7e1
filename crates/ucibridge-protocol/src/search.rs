//! Search limits

use serde::{Deserialize, Serialize};

/// Limits attached to a search command
///
/// Each present limit is rendered as `<name> <value>` after the search
/// keyword, depth first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum search depth in plies
    pub depth: Option<u32>,

    /// Time budget in milliseconds
    pub movetime_ms: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: Some(2),
            movetime_ms: Some(50),
        }
    }
}

impl SearchParams {
    /// Search with no limits at all
    pub fn unbounded() -> Self {
        Self {
            depth: None,
            movetime_ms: None,
        }
    }

    /// Search to a fixed depth only
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            movetime_ms: None,
        }
    }

    /// Set the depth limit
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Set the time limit
    pub fn with_movetime_ms(mut self, movetime_ms: u64) -> Self {
        self.movetime_ms = Some(movetime_ms);
        self
    }

    pub(crate) fn arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(2);
        if let Some(depth) = self.depth {
            args.push(format!("depth {}", depth));
        }
        if let Some(movetime) = self.movetime_ms {
            args.push(format!("movetime {}", movetime));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SearchParams::unbounded(), vec![])]
    #[case(SearchParams::depth(8), vec!["depth 8"])]
    #[case(SearchParams::unbounded().with_movetime_ms(250), vec!["movetime 250"])]
    #[case(SearchParams::depth(3).with_movetime_ms(100), vec!["depth 3", "movetime 100"])]
    fn test_arguments(#[case] params: SearchParams, #[case] expected: Vec<&str>) {
        assert_eq!(params.arguments(), expected);
    }
}
