//! Format-constrained identifier generation.

use rand::Rng;
use rand_regex::Regex as RandRegex;

use crate::errors::GenerationError;

pub const SSN_PATTERN: &str = r"[0-8][0-9]{2}-[0-9]{2}-[0-9]{4}";
pub const FEIN_PATTERN: &str = r"[0-9]{2}-[0-9]{7}";
pub const ZIP_PATTERN: &str = r"0[1-2][0-9]{3}-[0-9]{4}";
pub const ACCOUNT_KEY_PATTERN: &str = r"[0-9]{11}";
pub const MASS_ID_PATTERN: &str = r"S[0-9]{8}";
pub const PHONE_PATTERN: &str = r"[2-9][0-9]{2}-[2-9][0-9]{2}-[0-9]{4}";
pub const ACCOUNT_NUMBER_PATTERN: &str = r"[0-9]{9,12}";

const MAX_REPEAT: u32 = 16;

/// Draw a string matching `pattern`.
pub fn formatted(pattern: &str, rng: &mut impl Rng) -> Result<String, GenerationError> {
    let regex = RandRegex::compile(pattern, MAX_REPEAT).map_err(|err| {
        GenerationError::InvalidSpec(format!("invalid format pattern '{pattern}': {err}"))
    })?;
    Ok(rng.sample(&regex))
}

pub fn ssn(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(SSN_PATTERN, rng)
}

pub fn fein(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(FEIN_PATTERN, rng)
}

pub fn zip(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(ZIP_PATTERN, rng)
}

pub fn account_key(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(ACCOUNT_KEY_PATTERN, rng)
}

pub fn mass_id(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(MASS_ID_PATTERN, rng)
}

pub fn phone_number(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(PHONE_PATTERN, rng)
}

pub fn account_number(rng: &mut impl Rng) -> Result<String, GenerationError> {
    formatted(ACCOUNT_NUMBER_PATTERN, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimgen_core::formats as check;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_identifiers_match_their_formats() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(check::is_ssn(&ssn(&mut rng).unwrap()));
            assert!(check::is_fein(&fein(&mut rng).unwrap()));
            assert!(check::is_zip(&zip(&mut rng).unwrap()));
            assert!(check::is_account_key(&account_key(&mut rng).unwrap()));
            assert!(check::is_mass_id(&mass_id(&mut rng).unwrap()));
            assert!(check::is_phone_number(&phone_number(&mut rng).unwrap()));
        }
    }
}
