//! Identifier format checks for persisted records.

/// `NNN-NN-NNNN`.
pub fn is_ssn(value: &str) -> bool {
    digit_groups(value, &[3, 2, 4])
}

/// `NN-NNNNNNN`.
pub fn is_fein(value: &str) -> bool {
    digit_groups(value, &[2, 7])
}

/// `NNNNN-NNNN`.
pub fn is_zip(value: &str) -> bool {
    digit_groups(value, &[5, 4])
}

/// Eleven digits, no separators.
pub fn is_account_key(value: &str) -> bool {
    digit_groups(value, &[11])
}

/// Massachusetts ID: `S` followed by eight digits.
pub fn is_mass_id(value: &str) -> bool {
    value
        .strip_prefix('S')
        .is_some_and(|rest| digit_groups(rest, &[8]))
}

/// `NNN-NNN-NNNN`.
pub fn is_phone_number(value: &str) -> bool {
    digit_groups(value, &[3, 3, 4])
}

fn digit_groups(value: &str, groups: &[usize]) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == groups.len()
        && parts
            .iter()
            .zip(groups)
            .all(|(part, len)| part.len() == *len && part.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_expected_shapes() {
        assert!(is_ssn("123-45-6789"));
        assert!(is_fein("12-3456789"));
        assert!(is_zip("02110-1234"));
        assert!(is_account_key("01234567890"));
        assert!(is_mass_id("S12345678"));
        assert!(is_phone_number("617-555-0100"));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(!is_ssn("123456789"));
        assert!(!is_ssn("12a-45-6789"));
        assert!(!is_fein("123-456789"));
        assert!(!is_zip("02110"));
        assert!(!is_account_key("0123456789"));
        assert!(!is_mass_id("X12345678"));
    }
}
