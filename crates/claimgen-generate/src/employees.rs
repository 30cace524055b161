//! Employee generation, wage tiers and the consumable employee pool.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{Duration, Months, NaiveDate, Utc};
use claimgen_core::{Employee, Metadata, Occupation};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::employers::{EmployerPickSpec, EmployerPool};
use crate::errors::GenerationError;
use crate::formats;
use crate::pool::{EntityPool, Matcher, PoolEntity, UsedSet, metadata_matches};

const MAX_UNIQUE_ATTEMPTS: u32 = 1000;
const MIN_AGE_YEARS: u32 = 18;
const MAX_AGE_YEARS: u32 = 65;

impl PoolEntity for Employee {
    const ENTITY: &'static str = "employee";

    fn identity(&self) -> &str {
        &self.ssn
    }
}

/// Named annual wage band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WageTier {
    Ineligible,
    Eligible,
    High,
    Medium,
    Low,
}

impl WageTier {
    /// Inclusive wage bounds.
    pub fn band(self) -> (f64, f64) {
        match self {
            Self::Ineligible => (0.0, 5399.0),
            Self::Eligible => (5400.0, 100_000.0),
            Self::High => (90_000.0, 100_000.0),
            Self::Medium => (30_000.0, 90_000.0),
            Self::Low => (5400.0, 30_000.0),
        }
    }
}

/// Wage requirement: a named tier or an exact amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WageSpec {
    Tier(WageTier),
    Exact(f64),
}

impl Default for WageSpec {
    fn default() -> Self {
        Self::Tier(WageTier::Eligible)
    }
}

impl WageSpec {
    pub fn band(self) -> (f64, f64) {
        match self {
            Self::Tier(tier) => tier.band(),
            Self::Exact(amount) => (amount, amount),
        }
    }

    pub fn contains(self, wages: f64) -> bool {
        let (min, max) = self.band();
        wages >= min && wages <= max
    }

    /// Whole-dollar amount inside the band; exact amounts are returned as-is.
    pub fn draw(self, rng: &mut impl Rng) -> f64 {
        match self {
            Self::Exact(amount) => amount,
            Self::Tier(tier) => {
                let (min, max) = tier.band();
                rng.random_range(min as u64..=max as u64) as f64
            }
        }
    }
}

/// Constraints for generating employees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeSpec {
    pub wages: WageSpec,
    pub mass_id: bool,
    /// Which employer the employee works for.
    pub employer: EmployerPickSpec,
    pub metadata: Metadata,
}

/// Predicate for picking an employee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeePickSpec {
    pub wages: Option<WageSpec>,
    pub mass_id: Option<bool>,
    pub employer_fein: Option<String>,
    pub not_ssn: Vec<String>,
    pub metadata: Metadata,
}

impl Matcher<Employee> for EmployeePickSpec {
    fn matches(&self, employee: &Employee) -> bool {
        if let Some(wages) = self.wages
            && !wages.contains(employee.total_wages())
        {
            return false;
        }
        if let Some(mass_id) = self.mass_id
            && employee.mass_id.is_some() != mass_id
        {
            return false;
        }
        if let Some(fein) = &self.employer_fein
            && !employee.works_for(fein)
        {
            return false;
        }
        if self.not_ssn.iter().any(|ssn| ssn == &employee.ssn) {
            return false;
        }
        metadata_matches(&employee.metadata, &self.metadata)
    }
}

/// Something employees can be picked from.
pub trait EmployeeSource {
    fn pick_employee(
        &mut self,
        spec: &EmployeePickSpec,
        rng: &mut dyn RngCore,
    ) -> Result<Employee, GenerationError>;
}

/// Generate one employee employed by an employer picked from `employers`.
pub fn generate_employee(
    employers: &mut EmployerPool,
    spec: &EmployeeSpec,
    today: NaiveDate,
    taken_ssns: &HashSet<String>,
    rng: &mut impl Rng,
) -> Result<Employee, GenerationError> {
    let employer = employers.pick(&spec.employer, rng)?;
    let ssn = unique_ssn(taken_ssns, rng)?;
    let first_name: String = FirstName().fake_with_rng(rng);
    let last_name: String = LastName().fake_with_rng(rng);
    let mass_id = if spec.mass_id {
        Some(formats::mass_id(rng)?)
    } else {
        None
    };

    Ok(Employee {
        first_name,
        last_name,
        ssn,
        date_of_birth: date_of_birth(today, rng),
        occupations: vec![Occupation {
            fein: employer.fein,
            wages: spec.wages.draw(rng),
        }],
        mass_id,
        metadata: spec.metadata.clone(),
    })
}

/// Uniform date between 65 and 18 years before `today`.
pub fn date_of_birth(today: NaiveDate, rng: &mut impl Rng) -> NaiveDate {
    let earliest = today
        .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN);
    let latest = today
        .checked_sub_months(Months::new(MIN_AGE_YEARS * 12))
        .unwrap_or(today);
    let span = (latest - earliest).num_days().max(0);
    earliest + Duration::days(rng.random_range(0..=span))
}

fn unique_ssn(taken: &HashSet<String>, rng: &mut impl Rng) -> Result<String, GenerationError> {
    for _ in 0..MAX_UNIQUE_ATTEMPTS {
        let ssn = formats::ssn(rng)?;
        if !taken.contains(&ssn) {
            return Ok(ssn);
        }
    }
    Err(GenerationError::InvalidSpec(format!(
        "unable to draw a unique ssn after {MAX_UNIQUE_ATTEMPTS} attempts"
    )))
}

/// Consumable pool of employees. Picked employees are recorded in the used
/// set and never picked again, including after a save and reload.
#[derive(Debug, Clone)]
pub struct EmployeePool {
    pool: EntityPool<Employee>,
}

impl EmployeePool {
    pub fn from_employees(employees: Vec<Employee>) -> Self {
        Self {
            pool: EntityPool::consumable(employees),
        }
    }

    pub fn with_used(mut self, used: UsedSet) -> Self {
        self.pool = self.pool.with_used(used);
        self
    }

    pub fn generate(
        count: usize,
        employers: &mut EmployerPool,
        spec: &EmployeeSpec,
        rng: &mut impl Rng,
    ) -> Result<Self, GenerationError> {
        let mut pool = Self::from_employees(Vec::with_capacity(count));
        pool.generate_more(count, employers, spec, rng)?;
        Ok(pool)
    }

    /// Append `count` employees whose SSNs differ from every SSN this pool
    /// has held, used ones included.
    pub fn generate_more(
        &mut self,
        count: usize,
        employers: &mut EmployerPool,
        spec: &EmployeeSpec,
        rng: &mut impl Rng,
    ) -> Result<(), GenerationError> {
        let start = Instant::now();
        let today = Utc::now().date_naive();
        let mut taken: HashSet<String> = self
            .pool
            .iter()
            .map(|employee| employee.ssn.clone())
            .chain(self.pool.used().iter().map(str::to_string))
            .collect();
        let mut employees = Vec::with_capacity(count);
        for _ in 0..count {
            let employee = generate_employee(employers, spec, today, &taken, rng)?;
            taken.insert(employee.ssn.clone());
            employees.push(employee);
        }
        self.pool.extend(employees);
        info!(
            entity = Employee::ENTITY,
            count,
            total = self.pool.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "employees generated"
        );
        Ok(())
    }

    pub fn pick(
        &mut self,
        spec: &EmployeePickSpec,
        rng: &mut impl Rng,
    ) -> Result<Employee, GenerationError> {
        self.pool.pick(spec, rng)
    }

    pub fn used(&self) -> &UsedSet {
        self.pool.used()
    }

    pub fn is_used(&self, employee: &Employee) -> bool {
        self.pool.is_used(employee)
    }

    /// Number of employees still available for picking.
    pub fn available(&self) -> usize {
        self.pool.live().count()
    }

    pub fn employees(&self) -> &[Employee] {
        self.pool.records()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Employee> {
        self.pool.iter()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Combine two pools; used sets are unioned.
    pub fn merge(mut self, other: EmployeePool) -> Self {
        self.pool.absorb(other.pool);
        self
    }
}

impl EmployeeSource for EmployeePool {
    fn pick_employee(
        &mut self,
        spec: &EmployeePickSpec,
        mut rng: &mut dyn RngCore,
    ) -> Result<Employee, GenerationError> {
        self.pick(spec, &mut rng)
    }
}
