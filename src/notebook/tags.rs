#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Recognised cell tags.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the labelled parts every problem must contain, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subproblem {
    /// Restate the problem in the student's own words.
    Summarize,
    /// Outline the approach before coding.
    Plan,
    /// The code answer.
    Script,
    /// Look back on the result.
    Reflect,
}

impl Subproblem {
    /// All subproblems in canonical order.
    pub const ALL: [Subproblem; 4] = [
        Subproblem::Summarize,
        Subproblem::Plan,
        Subproblem::Script,
        Subproblem::Reflect,
    ];

    /// The tag string carried in cell metadata.
    pub fn tag(self) -> &'static str {
        match self {
            Subproblem::Summarize => "summarize",
            Subproblem::Plan => "plan",
            Subproblem::Script => "script",
            Subproblem::Reflect => "reflect",
        }
    }
}

impl Display for Subproblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Subproblem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subproblem::ALL
            .into_iter()
            .find(|sp| sp.tag() == s)
            .ok_or_else(|| anyhow::anyhow!("`{s}` is not a subproblem tag"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for sp in Subproblem::ALL {
            assert_eq!(sp.tag().parse::<Subproblem>().unwrap(), sp);
        }
        assert!("problem".parse::<Subproblem>().is_err());
    }

    #[test]
    fn canonical_order_matches_declaration() {
        let mut sorted = Subproblem::ALL;
        sorted.sort();
        assert_eq!(sorted, Subproblem::ALL);
    }
}
