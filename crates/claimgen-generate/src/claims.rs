//! Claim composition: employee pick, schedule, leave periods, contact data and
//! documents.

use std::fmt;
use std::time::Instant;

use chrono::{Duration, NaiveDate, Utc};
use claimgen_core::{
    Address, CaringLeaveMetadata, ClaimApplication, Employee, EmployerResponse,
    FamilyRelationship, LeaveDetails, LeaveReason, Metadata, PaymentMethod, PaymentPreference,
    Phone, ReasonQualifier, WorkPattern,
};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::name::en::{FirstName, LastName};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::documents::{DocsSpec, DocumentGenerator, GeneratedDocument};
use crate::employees::{EmployeePickSpec, EmployeeSource, date_of_birth};
use crate::errors::GenerationError;
use crate::formats;
use crate::leave_dates::{
    LeaveDateOptions, LeaveDateRange, SHORT_NOTICE_DAYS, check_range, continuous_period,
    generate_leave_dates, intermittent_period, minimum_leave_start, reduced_schedule_periods,
    split_window,
};
use crate::work_pattern::{STANDARD, generate_work_pattern, parse_weeks};

/// Routing number of the test bank used for direct deposit.
const TEST_ROUTING_NUMBER: &str = "011401533";
const NOTIFICATION_METHOD: &str = "In Writing";
const EMPLOYMENT_STATUS: &str = "Employed";
const OCCUPATION: &str = "Administrative";

/// Child date relative to the leave start, for bonding leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BondingDate {
    /// More than a year before leave starts.
    FarPast,
    Past,
    Future,
}

impl BondingDate {
    fn draw(self, leave_start: NaiveDate, rng: &mut impl Rng) -> NaiveDate {
        match self {
            BondingDate::FarPast => leave_start - Duration::days(rng.random_range(366..=400)),
            BondingDate::Past => leave_start - Duration::days(rng.random_range(1..=60)),
            BondingDate::Future => leave_start + Duration::days(rng.random_range(1..=30)),
        }
    }
}

/// Declarative description of one claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimSpecification {
    pub reason: LeaveReason,
    pub reason_qualifier: Option<ReasonQualifier>,
    #[serde(alias = "bondingDate")]
    pub bonding_date: Option<BondingDate>,
    /// Explicit leave window; replaces the generated one.
    pub leave_dates: Option<LeaveDateRange>,
    pub work_pattern_spec: Option<String>,
    pub reduced_leave_spec: Option<String>,
    pub has_intermittent_leave_periods: bool,
    /// Set to combine continuous leave with other period types.
    pub has_continuous_leave_periods: Option<bool>,
    pub docs: DocsSpec,
    #[serde(alias = "employerResponse")]
    pub employer_response: Option<EmployerResponse>,
    pub pregnant_or_recent_birth: bool,
    #[serde(alias = "shortClaim")]
    pub short_claim: bool,
    pub address: Option<Address>,
    pub payment: Option<PaymentPreference>,
    pub metadata: Metadata,
}

/// A named claim recipe: who claims, and what.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpecification {
    pub name: String,
    pub employee: EmployeePickSpec,
    pub claim: ClaimSpecification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimGeneratorOptions {
    /// Reference date for leave windows and ages.
    pub today: NaiveDate,
    pub min_leave_start: NaiveDate,
}

impl ClaimGeneratorOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            min_leave_start: minimum_leave_start(),
        }
    }
}

impl Default for ClaimGeneratorOptions {
    fn default() -> Self {
        Self::new(Utc::now().date_naive())
    }
}

/// A fully composed synthetic claim.
#[derive(Debug, Clone)]
pub struct GeneratedClaim {
    pub id: String,
    pub scenario: String,
    pub claim: ClaimApplication,
    pub metadata: Metadata,
    pub employer_response: Option<EmployerResponse>,
    pub payment_preference: PaymentPreference,
    pub documents: Vec<GeneratedDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodType {
    Continuous,
    Reduced,
    Intermittent,
}

/// Period types requested by a spec, in window order.
fn period_types(spec: &ClaimSpecification) -> Result<Vec<PeriodType>, GenerationError> {
    let reduced = spec.reduced_leave_spec.is_some();
    let intermittent = spec.has_intermittent_leave_periods;
    let continuous = spec
        .has_continuous_leave_periods
        .unwrap_or(!reduced && !intermittent);

    let types: Vec<PeriodType> = [
        (continuous, PeriodType::Continuous),
        (reduced, PeriodType::Reduced),
        (intermittent, PeriodType::Intermittent),
    ]
    .into_iter()
    .filter_map(|(wanted, kind)| wanted.then_some(kind))
    .collect();

    if types.is_empty() {
        return Err(GenerationError::InvalidSpec(
            "claim requests no leave period type".to_string(),
        ));
    }
    Ok(types)
}

/// Builds claims from scenarios, picking claimants from an employee source.
#[derive(Debug, Clone)]
pub struct ClaimGenerator<D> {
    documents: D,
    options: ClaimGeneratorOptions,
}

impl<D: DocumentGenerator> ClaimGenerator<D> {
    pub fn new(documents: D, options: ClaimGeneratorOptions) -> Self {
        Self { documents, options }
    }

    pub fn options(&self) -> &ClaimGeneratorOptions {
        &self.options
    }

    /// Generate a claim for `scenario`, recording its name on the result.
    pub fn generate_scenario<E, R>(
        &self,
        employees: &mut E,
        scenario: &ScenarioSpecification,
        rng: &mut R,
    ) -> Result<GeneratedClaim, GenerationError>
    where
        E: EmployeeSource + ?Sized,
        R: Rng,
    {
        let mut claim = self.generate(employees, &scenario.employee, &scenario.claim, rng)?;
        claim.scenario = scenario.name.clone();
        if claim.claim.application_nickname.is_none() && !scenario.name.is_empty() {
            claim.claim.application_nickname = Some(scenario.name.clone());
        }
        Ok(claim)
    }

    /// Generate `count` claims for `scenario`.
    pub fn generate_many<E, R>(
        &self,
        employees: &mut E,
        scenario: &ScenarioSpecification,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<GeneratedClaim>, GenerationError>
    where
        E: EmployeeSource + ?Sized,
        R: Rng,
    {
        let start = Instant::now();
        let claims = (0..count)
            .map(|_| self.generate_scenario(employees, scenario, rng))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            scenario = scenario.name.as_str(),
            count,
            duration_ms = start.elapsed().as_millis() as u64,
            "claims generated"
        );
        Ok(claims)
    }

    pub fn generate<E, R>(
        &self,
        employees: &mut E,
        employee_spec: &EmployeePickSpec,
        claim_spec: &ClaimSpecification,
        rng: &mut R,
    ) -> Result<GeneratedClaim, GenerationError>
    where
        E: EmployeeSource + ?Sized,
        R: Rng,
    {
        let types = period_types(claim_spec)?;

        let pattern_spec = claim_spec.work_pattern_spec.as_deref().unwrap_or(STANDARD);
        let pattern = generate_work_pattern(pattern_spec)?;
        let reduced_weeks = match &claim_spec.reduced_leave_spec {
            Some(reduction) => parse_weeks(reduction)?.len() as i64,
            None => 0,
        };
        let part_days = (reduced_weeks * 7).max(2);
        let options = LeaveDateOptions {
            today: self.options.today,
            min_start: self.options.min_leave_start,
            short_claim: claim_spec.short_claim,
            min_days: part_days * types.len() as i64 - 1,
        };
        let mut dates = generate_leave_dates(&pattern, &options, rng)?;
        if let Some(range) = &claim_spec.leave_dates {
            check_range(range)?;
            dates.start = range.start_date;
            dates.end = range.end_date;
            dates.employer_notification_date =
                range.start_date - Duration::days(rng.random_range(1..=SHORT_NOTICE_DAYS));
        }

        let mut leave_details = self.leave_details(claim_spec, dates.start, rng);
        leave_details.employer_notification_date = Some(dates.employer_notification_date);
        let windows = split_window(dates.start, dates.end, types.len())?;
        for (kind, (start, end)) in types.iter().zip(windows) {
            match kind {
                PeriodType::Continuous => leave_details
                    .continuous_leave_periods
                    .push(continuous_period(start, end)),
                PeriodType::Intermittent => leave_details
                    .intermittent_leave_periods
                    .push(intermittent_period(start, end, rng)),
                PeriodType::Reduced => {
                    let reduction = claim_spec.reduced_leave_spec.as_deref().unwrap_or_default();
                    leave_details.reduced_schedule_leave_periods =
                        reduced_schedule_periods(&pattern, reduction, start, end)?;
                }
            }
        }

        let employee = employees.pick_employee(employee_spec, rng)?;
        let employer_fein = employee
            .primary_fein()
            .ok_or_else(|| {
                GenerationError::InvalidSpec(format!("employee {} has no occupation", employee.ssn))
            })?
            .to_string();

        let wants_pattern = claim_spec.work_pattern_spec.is_some()
            || claim_spec.reduced_leave_spec.is_some();
        let claim = self.application(
            &employee,
            employer_fein,
            &pattern,
            wants_pattern,
            claim_spec,
            leave_details,
            &types,
            rng,
        )?;

        let payment_preference = match &claim_spec.payment {
            Some(payment) => payment.clone(),
            None => default_payment(rng)?,
        };
        let documents = self.documents.generate_documents(&claim, &claim_spec.docs)?;
        let id = Uuid::new_v4().to_string();
        debug!(
            claim_id = id.as_str(),
            reason = ?claim.leave_details.reason,
            documents = documents.len(),
            "claim generated"
        );

        Ok(GeneratedClaim {
            id,
            scenario: String::new(),
            claim,
            metadata: claim_spec.metadata.clone(),
            employer_response: claim_spec.employer_response.clone(),
            payment_preference,
            documents,
        })
    }

    fn leave_details(
        &self,
        spec: &ClaimSpecification,
        leave_start: NaiveDate,
        rng: &mut impl Rng,
    ) -> LeaveDetails {
        let reason_qualifier = match (spec.reason, spec.reason_qualifier) {
            (_, Some(qualifier)) => Some(qualifier),
            (LeaveReason::ChildBonding, None) => Some(ReasonQualifier::Newborn),
            _ => None,
        };

        let mut details = LeaveDetails {
            reason: spec.reason,
            reason_qualifier,
            pregnant_or_recent_birth: spec.pregnant_or_recent_birth,
            employer_notified: true,
            employer_notification_date: None,
            employer_notification_method: Some(NOTIFICATION_METHOD.to_string()),
            child_birth_date: None,
            child_placement_date: None,
            has_future_child_date: false,
            caring_leave_metadata: None,
            continuous_leave_periods: Vec::new(),
            intermittent_leave_periods: Vec::new(),
            reduced_schedule_leave_periods: Vec::new(),
        };

        match spec.reason {
            LeaveReason::ChildBonding => {
                let bonding = spec.bonding_date.unwrap_or(BondingDate::Past);
                let child_date = bonding.draw(leave_start, rng);
                details.has_future_child_date = bonding == BondingDate::Future;
                match reason_qualifier {
                    Some(ReasonQualifier::Adoption | ReasonQualifier::FosterCare) => {
                        details.child_placement_date = Some(child_date);
                    }
                    _ => details.child_birth_date = Some(child_date),
                }
            }
            LeaveReason::CareForFamilyMember => {
                details.caring_leave_metadata = Some(CaringLeaveMetadata {
                    family_member_first_name: FirstName().fake_with_rng(rng),
                    family_member_last_name: LastName().fake_with_rng(rng),
                    family_member_date_of_birth: date_of_birth(self.options.today, rng),
                    relationship_to_caregiver: *FamilyRelationship::ALL
                        .choose(rng)
                        .unwrap_or(&FamilyRelationship::Parent),
                });
            }
            LeaveReason::SeriousHealthCondition | LeaveReason::PregnancyMaternity => {}
        }
        details
    }

    #[allow(clippy::too_many_arguments)]
    fn application(
        &self,
        employee: &Employee,
        employer_fein: String,
        pattern: &WorkPattern,
        wants_pattern: bool,
        spec: &ClaimSpecification,
        leave_details: LeaveDetails,
        types: &[PeriodType],
        rng: &mut impl Rng,
    ) -> Result<ClaimApplication, GenerationError> {
        let residential_address = match &spec.address {
            Some(address) => address.clone(),
            None => generated_address(rng)?,
        };

        Ok(ClaimApplication {
            application_nickname: None,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            tax_identifier: employee.ssn.clone(),
            employer_fein,
            date_of_birth: employee.date_of_birth,
            employment_status: EMPLOYMENT_STATUS.to_string(),
            occupation: OCCUPATION.to_string(),
            hours_worked_per_week: pattern.hours_per_week(),
            has_state_id: employee.mass_id.is_some(),
            mass_id: employee.mass_id.clone(),
            residential_address,
            has_mailing_address: false,
            mailing_address: None,
            email: email_for(employee, rng),
            phone: Phone {
                int_code: "1".to_string(),
                phone_number: formats::phone_number(rng)?,
                phone_type: "Cell".to_string(),
            },
            has_continuous_leave_periods: types.contains(&PeriodType::Continuous),
            has_intermittent_leave_periods: types.contains(&PeriodType::Intermittent),
            has_reduced_schedule_leave_periods: types.contains(&PeriodType::Reduced),
            leave_details,
            work_pattern: wants_pattern.then(|| pattern.clone()),
        })
    }
}

/// Single-pass sequence of claims. Iterating consumes it; a second pass needs
/// a fresh [`ClaimPool::load`].
pub struct ClaimPool {
    claims: Box<dyn Iterator<Item = Result<GeneratedClaim, GenerationError>>>,
}

impl fmt::Debug for ClaimPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimPool").finish_non_exhaustive()
    }
}

impl ClaimPool {
    pub fn from_claims(claims: Vec<GeneratedClaim>) -> Self {
        Self::from_results(claims.into_iter().map(Ok))
    }

    pub fn from_results<I>(claims: I) -> Self
    where
        I: Iterator<Item = Result<GeneratedClaim, GenerationError>> + 'static,
    {
        Self {
            claims: Box::new(claims),
        }
    }

    /// Generate `count` claims for `scenario`. Documents stay unrendered until
    /// read or saved.
    pub fn generate<D, E, R>(
        generator: &ClaimGenerator<D>,
        employees: &mut E,
        scenario: &ScenarioSpecification,
        count: usize,
        rng: &mut R,
    ) -> Result<Self, GenerationError>
    where
        D: DocumentGenerator,
        E: EmployeeSource + ?Sized,
        R: Rng,
    {
        let claims = generator.generate_many(employees, scenario, count, rng)?;
        Ok(Self::from_claims(claims))
    }

    /// Drain the pool, stopping at the first failed record.
    pub fn collect_claims(self) -> Result<Vec<GeneratedClaim>, GenerationError> {
        self.collect()
    }
}

impl Iterator for ClaimPool {
    type Item = Result<GeneratedClaim, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.claims.next()
    }
}

fn generated_address(rng: &mut impl Rng) -> Result<Address, GenerationError> {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    Ok(Address {
        line_1: format!("{number} {street}"),
        line_2: None,
        city: CityName().fake_with_rng(rng),
        state: "MA".to_string(),
        zip: formats::zip(rng)?,
    })
}

fn email_for(employee: &Employee, rng: &mut impl Rng) -> String {
    let local: String = format!("{}.{}", employee.first_name, employee.last_name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect::<String>()
        .to_ascii_lowercase();
    format!("{local}{}@example.com", rng.random_range(100..1000))
}

fn default_payment(rng: &mut impl Rng) -> Result<PaymentPreference, GenerationError> {
    Ok(PaymentPreference {
        payment_method: PaymentMethod::Electronic,
        account_number: Some(formats::account_number(rng)?),
        routing_number: Some(TEST_ROUTING_NUMBER.to_string()),
        bank_account_type: Some("Checking".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_is_continuous_only() {
        let types = period_types(&ClaimSpecification::default()).unwrap();
        assert_eq!(types, vec![PeriodType::Continuous]);
    }

    #[test]
    fn reduced_spec_wins_over_the_continuous_default() {
        let spec = ClaimSpecification {
            reduced_leave_spec: Some("0,240,240,240,240,240,0".to_string()),
            ..ClaimSpecification::default()
        };
        assert_eq!(period_types(&spec).unwrap(), vec![PeriodType::Reduced]);
    }

    #[test]
    fn combined_types_follow_window_order() {
        let spec = ClaimSpecification {
            reduced_leave_spec: Some("0,240".to_string()),
            has_intermittent_leave_periods: true,
            has_continuous_leave_periods: Some(true),
            ..ClaimSpecification::default()
        };
        assert_eq!(
            period_types(&spec).unwrap(),
            vec![
                PeriodType::Continuous,
                PeriodType::Reduced,
                PeriodType::Intermittent
            ]
        );
    }

    #[test]
    fn disabling_every_type_is_rejected() {
        let spec = ClaimSpecification {
            has_continuous_leave_periods: Some(false),
            ..ClaimSpecification::default()
        };
        assert!(matches!(
            period_types(&spec),
            Err(GenerationError::InvalidSpec(_))
        ));
    }

    #[test]
    fn claim_spec_accepts_camel_case_aliases() {
        let spec: ClaimSpecification = serde_json::from_str(
            r#"{"reason": "Child Bonding", "bondingDate": "far-past", "shortClaim": true}"#,
        )
        .unwrap();
        assert_eq!(spec.reason, LeaveReason::ChildBonding);
        assert_eq!(spec.bonding_date, Some(BondingDate::FarPast));
        assert!(spec.short_claim);
    }
}
