//! Generic entity pool with filtered, weighted `pick`.

use std::collections::BTreeSet;

use claimgen_core::Metadata;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::GenerationError;

/// A record type that can live in an [`EntityPool`].
pub trait PoolEntity: Clone + Serialize + DeserializeOwned {
    /// Human name of the entity, used in pick errors.
    const ENTITY: &'static str;

    /// Stable identity used by the used set.
    fn identity(&self) -> &str;
}

/// Predicate implied by a pick specification.
pub trait Matcher<T> {
    fn matches(&self, record: &T) -> bool;
}

/// Identities consumed by picks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedSet {
    ids: BTreeSet<String>,
}

impl UsedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false when the identity was already used.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn merge(&mut self, other: UsedSet) {
        self.ids.extend(other.ids);
    }
}

impl FromIterator<String> for UsedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// In-memory collection of one entity type.
///
/// Consumable pools move every picked record into the used set; used records
/// stay in `records` (so they persist) but are never picked again.
#[derive(Debug, Clone)]
pub struct EntityPool<T> {
    records: Vec<T>,
    used: UsedSet,
    consumable: bool,
}

impl<T: PoolEntity> EntityPool<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            used: UsedSet::new(),
            consumable: false,
        }
    }

    pub fn consumable(records: Vec<T>) -> Self {
        Self {
            records,
            used: UsedSet::new(),
            consumable: true,
        }
    }

    pub fn with_used(mut self, used: UsedSet) -> Self {
        self.used.merge(used);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn used(&self) -> &UsedSet {
        &self.used
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = T>) {
        self.records.extend(records);
    }

    /// Append `other`'s records whose identity is not already present and
    /// carry over its used set. Returns the number of records skipped.
    pub fn absorb(&mut self, other: EntityPool<T>) -> usize {
        let mut seen: BTreeSet<String> = self
            .records
            .iter()
            .map(|record| record.identity().to_string())
            .collect();
        let before = self.records.len();
        let incoming = other.records.len();
        for record in other.records {
            if seen.insert(record.identity().to_string()) {
                self.records.push(record);
            }
        }
        self.used.merge(other.used);
        let skipped = incoming - (self.records.len() - before);
        if skipped > 0 {
            debug!(entity = T::ENTITY, skipped, "duplicate identities dropped on merge");
        }
        skipped
    }

    pub fn is_used(&self, record: &T) -> bool {
        self.used.contains(record.identity())
    }

    fn is_live(&self, record: &T) -> bool {
        !self.consumable || !self.is_used(record)
    }

    /// Records still eligible for picking.
    pub fn live(&self) -> impl Iterator<Item = &T> {
        self.records.iter().filter(|record| self.is_live(record))
    }

    pub fn matching<'a, M: Matcher<T>>(&'a self, spec: &'a M) -> impl Iterator<Item = &'a T> {
        self.live().filter(move |record| spec.matches(record))
    }

    /// Pick one matching record uniformly at random.
    pub fn pick<M: Matcher<T>>(
        &mut self,
        spec: &M,
        rng: &mut impl Rng,
    ) -> Result<T, GenerationError> {
        self.pick_weighted(spec, |_| 1.0, rng)
    }

    /// Pick one matching record with probability proportional to `weight`.
    pub fn pick_weighted<M, W>(
        &mut self,
        spec: &M,
        weight: W,
        rng: &mut impl Rng,
    ) -> Result<T, GenerationError>
    where
        M: Matcher<T>,
        W: Fn(&T) -> f64,
    {
        let candidates: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.is_live(record) && spec.matches(record))
            .map(|(idx, _)| idx)
            .collect();

        if candidates.is_empty() {
            debug!(
                entity = T::ENTITY,
                records = self.records.len(),
                used = self.used.len(),
                "pool exhausted for specification"
            );
            return Err(GenerationError::no_match(T::ENTITY));
        }

        let idx = *candidates
            .choose_weighted(rng, |idx| weight(&self.records[*idx]))
            .map_err(|err| {
                GenerationError::InvalidSpec(format!("{} pick weights: {err}", T::ENTITY))
            })?;
        let record = self.records[idx].clone();
        if self.consumable {
            self.used.insert(record.identity());
        }
        Ok(record)
    }
}

/// Whether `record` contains every key of `wanted`, comparing nested objects
/// as subsets and everything else by equality.
pub fn metadata_matches(record: &Metadata, wanted: &Metadata) -> bool {
    wanted.iter().all(|(key, expected)| {
        record
            .get(key)
            .is_some_and(|actual| value_contains(actual, expected))
    })
}

fn value_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => expected.iter().all(|(key, value)| {
            actual
                .get(key)
                .is_some_and(|inner| value_contains(inner, value))
        }),
        _ => actual == expected,
    }
}
