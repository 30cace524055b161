//! Employer generation and the size-weighted employer pool.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{Duration, NaiveDate, Utc};
use claimgen_core::{Employer, EmployerSize, Metadata, fein_withholding_baseline};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::company::en::CompanyName;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::GenerationError;
use crate::formats;
use crate::pool::{EntityPool, Matcher, PoolEntity, metadata_matches};

const MAX_UNIQUE_ATTEMPTS: u32 = 100;
const QUARTERS: usize = 4;

impl PoolEntity for Employer {
    const ENTITY: &'static str = "employer";

    fn identity(&self) -> &str {
        &self.fein
    }
}

/// Relative weight of each size tier when size is not pinned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeWeights {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl Default for SizeWeights {
    fn default() -> Self {
        Self {
            small: 10.0,
            medium: 4.0,
            large: 1.0,
        }
    }
}

impl SizeWeights {
    pub fn weight(&self, size: EmployerSize) -> f64 {
        match size {
            EmployerSize::Small => self.small,
            EmployerSize::Medium => self.medium,
            EmployerSize::Large => self.large,
        }
    }

    fn draw(&self, rng: &mut impl Rng) -> Result<EmployerSize, GenerationError> {
        use rand::seq::IndexedRandom;
        EmployerSize::ALL
            .choose_weighted(rng, |size| self.weight(*size))
            .copied()
            .map_err(|err| GenerationError::InvalidSpec(format!("size weights: {err}")))
    }
}

/// Constraints for generating employers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployerSpec {
    pub size: Option<EmployerSize>,
    /// Four quarters; `None` entries fall back to the FEIN baseline.
    pub withholdings: Option<Vec<Option<f64>>>,
    pub family_exemption: bool,
    pub medical_exemption: bool,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WithholdingCategory {
    /// Every quarter is zero.
    Exempt,
    NonExempt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WithholdingMatch {
    Category(WithholdingCategory),
    Exact(Vec<f64>),
}

/// Predicate for picking an employer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployerPickSpec {
    pub fein: Option<String>,
    /// FEINs that must not be picked.
    pub not_fein: Vec<String>,
    pub size: Option<EmployerSize>,
    pub withholdings: Option<WithholdingMatch>,
    pub metadata: Metadata,
}

impl Matcher<Employer> for EmployerPickSpec {
    fn matches(&self, employer: &Employer) -> bool {
        if let Some(fein) = &self.fein
            && &employer.fein != fein
        {
            return false;
        }
        if self.not_fein.iter().any(|fein| fein == &employer.fein) {
            return false;
        }
        if let Some(size) = self.size
            && employer.size != size
        {
            return false;
        }
        let withholdings_match = match &self.withholdings {
            None => true,
            Some(WithholdingMatch::Category(WithholdingCategory::Exempt)) => employer.is_exempt(),
            Some(WithholdingMatch::Category(WithholdingCategory::NonExempt)) => {
                !employer.is_exempt()
            }
            Some(WithholdingMatch::Exact(amounts)) => &employer.withholdings == amounts,
        };
        withholdings_match && metadata_matches(&employer.metadata, &self.metadata)
    }
}

/// Generate a single employer whose identifiers avoid `taken_feins` and
/// `taken_keys`.
pub fn generate_employer(
    spec: &EmployerSpec,
    weights: &SizeWeights,
    today: NaiveDate,
    taken_feins: &HashSet<String>,
    taken_keys: &HashSet<String>,
    rng: &mut impl Rng,
) -> Result<Employer, GenerationError> {
    let fein = unique(taken_feins, "fein", || formats::fein(rng))?;
    let account_key = unique(taken_keys, "account key", || formats::account_key(rng))?;
    let withholdings = resolve_withholdings(&fein, spec.withholdings.as_deref())?;
    let size = match spec.size {
        Some(size) => size,
        None => weights.draw(rng)?,
    };

    let name: String = CompanyName().fake_with_rng(rng);
    let dba = if rng.random_bool(0.5) {
        name.clone()
    } else {
        CompanyName().fake_with_rng(rng)
    };
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    let city: String = CityName().fake_with_rng(rng);

    let exempt = spec.family_exemption || spec.medical_exemption;
    let (exemption_commence_date, exemption_cease_date) = if exempt {
        let commence = today - Duration::days(rng.random_range(1..=365));
        (Some(commence), Some(commence + Duration::days(365 * 3)))
    } else {
        (None, None)
    };

    Ok(Employer {
        account_key,
        fein,
        name,
        dba,
        street: format!("{number} {street}"),
        city,
        state: "MA".to_string(),
        zip: formats::zip(rng)?,
        size,
        family_exemption: spec.family_exemption,
        medical_exemption: spec.medical_exemption,
        exemption_commence_date,
        exemption_cease_date,
        withholdings,
        metadata: spec.metadata.clone(),
    })
}

fn resolve_withholdings(
    fein: &str,
    spec: Option<&[Option<f64>]>,
) -> Result<Vec<f64>, GenerationError> {
    let baseline = fein_withholding_baseline(fein)
        .ok_or_else(|| GenerationError::InvalidSpec(format!("fein '{fein}' has no baseline")))?;
    match spec {
        None => Ok(vec![baseline; QUARTERS]),
        Some(quarters) if quarters.len() == QUARTERS => Ok(quarters
            .iter()
            .map(|amount| amount.unwrap_or(baseline))
            .collect()),
        Some(quarters) => Err(GenerationError::InvalidSpec(format!(
            "withholdings must list {QUARTERS} quarters, got {}",
            quarters.len()
        ))),
    }
}

fn unique<F>(taken: &HashSet<String>, label: &str, mut draw: F) -> Result<String, GenerationError>
where
    F: FnMut() -> Result<String, GenerationError>,
{
    for _ in 0..MAX_UNIQUE_ATTEMPTS {
        let value = draw()?;
        if !taken.contains(&value) {
            return Ok(value);
        }
    }
    Err(GenerationError::InvalidSpec(format!(
        "unable to draw a unique {label} after {MAX_UNIQUE_ATTEMPTS} attempts"
    )))
}

/// Pool of employers; picks favor small over medium over large employers
/// unless the size is pinned.
#[derive(Debug, Clone)]
pub struct EmployerPool {
    pool: EntityPool<Employer>,
    weights: SizeWeights,
}

impl EmployerPool {
    pub fn from_employers(employers: Vec<Employer>) -> Self {
        Self {
            pool: EntityPool::new(employers),
            weights: SizeWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: SizeWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Generate `count` employers with distinct FEINs and account keys.
    pub fn generate(
        count: usize,
        spec: &EmployerSpec,
        rng: &mut impl Rng,
    ) -> Result<Self, GenerationError> {
        let mut pool = Self::from_employers(Vec::with_capacity(count));
        pool.generate_more(count, spec, rng)?;
        Ok(pool)
    }

    /// Append `count` freshly generated employers.
    pub fn generate_more(
        &mut self,
        count: usize,
        spec: &EmployerSpec,
        rng: &mut impl Rng,
    ) -> Result<(), GenerationError> {
        let start = Instant::now();
        let today = Utc::now().date_naive();
        let mut feins: HashSet<String> = self.pool.iter().map(|e| e.fein.clone()).collect();
        let mut keys: HashSet<String> = self.pool.iter().map(|e| e.account_key.clone()).collect();
        let mut employers = Vec::with_capacity(count);
        for _ in 0..count {
            let employer = generate_employer(spec, &self.weights, today, &feins, &keys, rng)?;
            feins.insert(employer.fein.clone());
            keys.insert(employer.account_key.clone());
            employers.push(employer);
        }
        self.pool.extend(employers);
        info!(
            entity = Employer::ENTITY,
            count,
            total = self.pool.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "employers generated"
        );
        Ok(())
    }

    /// Pick an employer matching `spec`, size-weighted when size is free.
    pub fn pick(
        &mut self,
        spec: &EmployerPickSpec,
        rng: &mut impl Rng,
    ) -> Result<Employer, GenerationError> {
        if spec.size.is_some() {
            return self.pool.pick(spec, rng);
        }
        let weights = self.weights;
        self.pool
            .pick_weighted(spec, |employer| weights.weight(employer.size), rng)
    }

    pub fn find(&self, fein: &str) -> Option<&Employer> {
        self.pool.iter().find(|employer| employer.fein == fein)
    }

    pub fn employers(&self) -> &[Employer] {
        self.pool.records()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Employer> {
        self.pool.iter()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Combine two pools, keeping this pool's weights. Employers whose FEIN
    /// is already present are dropped.
    pub fn merge(mut self, other: EmployerPool) -> Self {
        self.pool.absorb(other.pool);
        self
    }
}
