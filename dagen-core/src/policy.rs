//! Shape policies: how a routine's results are surfaced.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Strategy that decides a routine's generated return contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapePolicy {
    /// Every row, as a list of result holders.
    List,
    /// Exactly one row.
    Single,
    /// Zero or one row.
    SingleOrDefault,
    /// The single column of the single row.
    Scalar,
    /// A result holder built from the output parameters.
    Output,
    /// No payload.
    None,
}

impl ShapePolicy {
    pub const ALL: [ShapePolicy; 6] = [
        ShapePolicy::List,
        ShapePolicy::Single,
        ShapePolicy::SingleOrDefault,
        ShapePolicy::Scalar,
        ShapePolicy::Output,
        ShapePolicy::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapePolicy::List => "List",
            ShapePolicy::Single => "Single",
            ShapePolicy::SingleOrDefault => "SingleOrDefault",
            ShapePolicy::Scalar => "Scalar",
            ShapePolicy::Output => "Output",
            ShapePolicy::None => "None",
        }
    }
}

impl fmt::Display for ShapePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let expected: Vec<_> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown shape policy '{}', expected one of: {}", s, expected.join(", "))
            })
    }
}
