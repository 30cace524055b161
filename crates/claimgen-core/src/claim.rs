use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::work_pattern::WorkPattern;

/// Reason a claimant is taking leave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LeaveReason {
    #[default]
    #[serde(rename = "Serious Health Condition - Employee")]
    SeriousHealthCondition,
    #[serde(rename = "Child Bonding")]
    ChildBonding,
    #[serde(rename = "Pregnancy/Maternity")]
    PregnancyMaternity,
    #[serde(rename = "Care for a Family Member")]
    CareForFamilyMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ReasonQualifier {
    Newborn,
    Adoption,
    #[serde(rename = "Foster Care")]
    FosterCare,
    #[serde(rename = "Serious Health Condition")]
    SeriousHealthCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Address {
    pub line_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Phone {
    pub int_code: String,
    pub phone_number: String,
    pub phone_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PaymentMethod {
    #[serde(rename = "Elec")]
    Electronic,
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PaymentPreference {
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_type: Option<String>,
}

/// Employer's review of a claim, supplied verbatim by scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmployerResponse {
    pub hours_worked_per_week: f64,
    pub employer_decision: String,
    pub fraud: String,
    #[serde(default)]
    pub has_amendments: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContinuousLeavePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntermittentLeavePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: u32,
    pub duration_basis: String,
    pub frequency: u32,
    pub frequency_basis: String,
    pub frequency_interval: u32,
    pub frequency_interval_basis: String,
}

/// Reduced schedule span; each `*_off_minutes` is the time off on that weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReducedScheduleLeavePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_estimated: bool,
    pub sunday_off_minutes: u32,
    pub monday_off_minutes: u32,
    pub tuesday_off_minutes: u32,
    pub wednesday_off_minutes: u32,
    pub thursday_off_minutes: u32,
    pub friday_off_minutes: u32,
    pub saturday_off_minutes: u32,
}

impl ReducedScheduleLeavePeriod {
    /// Build a period from Sunday-first off minutes.
    pub fn from_week(start_date: NaiveDate, end_date: NaiveDate, off: [u32; 7]) -> Self {
        Self {
            start_date,
            end_date,
            is_estimated: true,
            sunday_off_minutes: off[0],
            monday_off_minutes: off[1],
            tuesday_off_minutes: off[2],
            wednesday_off_minutes: off[3],
            thursday_off_minutes: off[4],
            friday_off_minutes: off[5],
            saturday_off_minutes: off[6],
        }
    }

    /// Off minutes in Sunday-first order.
    pub fn off_minutes(&self) -> [u32; 7] {
        [
            self.sunday_off_minutes,
            self.monday_off_minutes,
            self.tuesday_off_minutes,
            self.wednesday_off_minutes,
            self.thursday_off_minutes,
            self.friday_off_minutes,
            self.saturday_off_minutes,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FamilyRelationship {
    Child,
    Parent,
    Spouse,
    Sibling,
    Grandparent,
    Grandchild,
}

impl FamilyRelationship {
    pub const ALL: [FamilyRelationship; 6] = [
        Self::Child,
        Self::Parent,
        Self::Spouse,
        Self::Sibling,
        Self::Grandparent,
        Self::Grandchild,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "Child",
            Self::Parent => "Parent",
            Self::Spouse => "Spouse",
            Self::Sibling => "Sibling",
            Self::Grandparent => "Grandparent",
            Self::Grandchild => "Grandchild",
        }
    }
}

/// Family member being cared for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaringLeaveMetadata {
    pub family_member_first_name: String,
    pub family_member_last_name: String,
    pub family_member_date_of_birth: NaiveDate,
    pub relationship_to_caregiver: FamilyRelationship,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaveDetails {
    pub reason: LeaveReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_qualifier: Option<ReasonQualifier>,
    pub pregnant_or_recent_birth: bool,
    pub employer_notified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_notification_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_notification_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_placement_date: Option<NaiveDate>,
    #[serde(default)]
    pub has_future_child_date: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caring_leave_metadata: Option<CaringLeaveMetadata>,
    #[serde(default)]
    pub continuous_leave_periods: Vec<ContinuousLeavePeriod>,
    #[serde(default)]
    pub intermittent_leave_periods: Vec<IntermittentLeavePeriod>,
    #[serde(default)]
    pub reduced_schedule_leave_periods: Vec<ReducedScheduleLeavePeriod>,
}

impl LeaveDetails {
    /// Earliest start date across every leave period.
    pub fn leave_start(&self) -> Option<NaiveDate> {
        self.period_ranges().map(|(start, _)| start).min()
    }

    /// Latest end date across every leave period.
    pub fn leave_end(&self) -> Option<NaiveDate> {
        self.period_ranges().map(|(_, end)| end).max()
    }

    pub fn period_ranges(&self) -> impl Iterator<Item = (NaiveDate, NaiveDate)> + '_ {
        let continuous = self
            .continuous_leave_periods
            .iter()
            .map(|period| (period.start_date, period.end_date));
        let intermittent = self
            .intermittent_leave_periods
            .iter()
            .map(|period| (period.start_date, period.end_date));
        let reduced = self
            .reduced_schedule_leave_periods
            .iter()
            .map(|period| (period.start_date, period.end_date));
        continuous.chain(intermittent).chain(reduced)
    }
}

/// The leave application payload submitted on behalf of a claimant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClaimApplication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_nickname: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub tax_identifier: String,
    pub employer_fein: String,
    pub date_of_birth: NaiveDate,
    pub employment_status: String,
    pub occupation: String,
    pub hours_worked_per_week: f64,
    pub has_state_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_id: Option<String>,
    pub residential_address: Address,
    pub has_mailing_address: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailing_address: Option<Address>,
    pub email: String,
    pub phone: Phone,
    pub has_continuous_leave_periods: bool,
    pub has_intermittent_leave_periods: bool,
    pub has_reduced_schedule_leave_periods: bool,
    pub leave_details: LeaveDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_pattern: Option<WorkPattern>,
}

impl ClaimApplication {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Number of leave-period type flags set.
    pub fn period_type_count(&self) -> usize {
        [
            self.has_continuous_leave_periods,
            self.has_intermittent_leave_periods,
            self.has_reduced_schedule_leave_periods,
        ]
        .iter()
        .filter(|flag| **flag)
        .count()
    }
}
