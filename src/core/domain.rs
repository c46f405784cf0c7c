// the topical categories a question can be routed to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Legal,
    Financial,
    General,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Legal, Domain::Financial, Domain::General];

    /// keyword the classifier is asked to answer with
    pub fn keyword(&self) -> &'static str {
        match self {
            Domain::Legal => "legal",
            Domain::Financial => "financial",
            Domain::General => "general",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Domain {
    type Err = String;

    // exact keyword match only, callers lower-case first
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.keyword() == s)
            .ok_or_else(|| format!("unknown domain: {s}"))
    }
}
