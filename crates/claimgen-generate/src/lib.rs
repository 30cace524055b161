//! Synthetic employer, employee and claim fixture engine.
//!
//! Pools are generated in memory (`generate`) or loaded from NDJSON corpora
//! (`load`); `load(..).or_generate_and_save(..)` generates and persists a
//! corpus only when none exists yet. Claims are composed from an employee
//! pick, a work pattern, leave windows and lazily rendered PDF documents.

pub mod claims;
pub mod corpus;
pub mod data_dir;
pub mod documents;
pub mod employees;
pub mod employers;
pub mod errors;
pub mod formats;
pub mod leave_dates;
pub mod pool;
pub mod work_pattern;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use claims::{
    BondingDate, ClaimGenerator, ClaimGeneratorOptions, ClaimPool, ClaimSpecification,
    GeneratedClaim, ScenarioSpecification,
};
pub use corpus::{ClaimRecord, CorpusLoad, DocumentRecord, NdjsonReader, read_ndjson};
pub use data_dir::DataDirectory;
pub use documents::{
    DocsSpec, DocumentConfig, DocumentGenerator, DocumentOptions, DocumentStream, DocumentType,
    FormDocumentGenerator, GeneratedDocument,
};
pub use employees::{
    EmployeePickSpec, EmployeePool, EmployeeSource, EmployeeSpec, WageSpec, WageTier,
};
pub use employers::{
    EmployerPickSpec, EmployerPool, EmployerSpec, SizeWeights, WithholdingCategory,
    WithholdingMatch,
};
pub use errors::GenerationError;
pub use leave_dates::{LeaveDateOptions, LeaveDateRange, LeaveDates, generate_leave_dates};
pub use pool::{EntityPool, Matcher, PoolEntity, UsedSet};
pub use work_pattern::generate_work_pattern;

/// Deterministic RNG when `seed` is set, OS-seeded otherwise.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}
