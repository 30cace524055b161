//! Core record types for claimgen.
//!
//! This crate defines the employer, employee and claim-application records
//! persisted in fixture corpora, plus identifier-format and consistency
//! validation shared by the generator and the CLI.

pub mod claim;
pub mod employee;
pub mod employer;
pub mod error;
pub mod formats;
pub mod validation;
pub mod work_pattern;

pub use claim::{
    Address, CaringLeaveMetadata, ClaimApplication, ContinuousLeavePeriod, EmployerResponse,
    FamilyRelationship, IntermittentLeavePeriod, LeaveDetails, LeaveReason, PaymentMethod,
    PaymentPreference, Phone, ReasonQualifier, ReducedScheduleLeavePeriod,
};
pub use employee::{Employee, Occupation};
pub use employer::{Employer, EmployerSize, fein_withholding_baseline};
pub use error::{Error, Result};
pub use validation::{validate_claim_application, validate_employee, validate_employer};
pub use work_pattern::{DayOfWeek, WorkPattern, WorkPatternDay, WorkPatternType};

/// Open key/value bag attached to records for pool matching.
pub type Metadata = std::collections::BTreeMap<String, serde_json::Value>;
