use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Metadata;
use crate::error::Error;

/// Headcount tier of an employer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployerSize {
    Small,
    Medium,
    Large,
}

impl EmployerSize {
    pub const ALL: [EmployerSize; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for EmployerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployerSize {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(Error::InvalidFormat(format!("unknown employer size '{other}'"))),
        }
    }
}

/// A synthetic employer.
///
/// Records are immutable once generated and persisted verbatim as one JSON
/// object per corpus line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Employer {
    /// 11-digit account key, unique per corpus.
    #[serde(rename = "accountKey")]
    pub account_key: String,
    /// Federal employer id, `NN-NNNNNNN`.
    pub fein: String,
    pub name: String,
    pub dba: String,
    pub street: String,
    pub city: String,
    pub state: String,
    /// `NNNNN-NNNN`.
    pub zip: String,
    pub size: EmployerSize,
    pub family_exemption: bool,
    pub medical_exemption: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exemption_commence_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exemption_cease_date: Option<NaiveDate>,
    /// Four quarterly withholding amounts, oldest first.
    pub withholdings: Vec<f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Employer {
    /// An employer is exempt when every recorded quarter withheld nothing.
    pub fn is_exempt(&self) -> bool {
        self.withholdings.iter().all(|amount| *amount == 0.0)
    }
}

/// Quarterly withholding baseline derived from a FEIN: the first six digits
/// read as an integer amount of cents.
pub fn fein_withholding_baseline(fein: &str) -> Option<f64> {
    let digits: String = fein.chars().filter(|ch| ch.is_ascii_digit()).take(6).collect();
    if digits.len() < 6 {
        return None;
    }
    digits.parse::<u64>().ok().map(|cents| cents as f64 / 100.0)
}
