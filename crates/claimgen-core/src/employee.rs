use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Metadata;

/// Employment of an employee at one employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Occupation {
    /// FEIN of the employer.
    pub fein: String,
    /// Annual wages earned at this employer.
    pub wages: f64,
}

/// A synthetic employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Employee {
    pub first_name: String,
    pub last_name: String,
    /// `NNN-NN-NNNN`, unique within a pool.
    pub ssn: String,
    pub date_of_birth: NaiveDate,
    pub occupations: Vec<Occupation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Employee {
    /// Sum of wages across every occupation.
    pub fn total_wages(&self) -> f64 {
        self.occupations.iter().map(|occupation| occupation.wages).sum()
    }

    pub fn primary_fein(&self) -> Option<&str> {
        self.occupations
            .first()
            .map(|occupation| occupation.fein.as_str())
    }

    pub fn works_for(&self, fein: &str) -> bool {
        self.occupations
            .iter()
            .any(|occupation| occupation.fein == fein)
    }
}
