//! Per-document form field tables and claim-to-field bindings.

use chrono::NaiveDate;
use claimgen_core::{ClaimApplication, FamilyRelationship};

use super::DocumentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    CheckBox,
    Choice(&'static [&'static str]),
}

impl FieldKind {
    /// PDF `/FT` name for the kind.
    pub fn pdf_name(self) -> &'static str {
        match self {
            FieldKind::Text => "Tx",
            FieldKind::CheckBox => "Btn",
            FieldKind::Choice(_) => "Ch",
        }
    }
}

/// What invalid mode does to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    Keep,
    /// Leave the field blank.
    Omit,
    /// Bind a value that no longer matches the claim.
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub invalid: Corruption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
    Choice(String),
}

const fn text(name: &'static str, invalid: Corruption) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
        invalid,
    }
}

const fn check(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::CheckBox,
        invalid: Corruption::Keep,
    }
}

const RELATIONSHIPS: &[&str] = &[
    "Child",
    "Parent",
    "Spouse",
    "Sibling",
    "Grandparent",
    "Grandchild",
];
const CONDITIONS: &[&str] = &["Serious Health Condition", "Pregnancy/Maternity"];

const HCP: &[FieldSpec] = &[
    text("Employee first name", Corruption::Keep),
    text("Employee last name", Corruption::Mismatch),
    text("Employee SSN", Corruption::Omit),
    text("Employee date of birth", Corruption::Omit),
    text("Leave start date", Corruption::Keep),
    text("Leave end date", Corruption::Keep),
    check("Continuous leave"),
    check("Intermittent leave"),
    check("Reduced schedule"),
    FieldSpec {
        name: "Condition",
        kind: FieldKind::Choice(CONDITIONS),
        invalid: Corruption::Keep,
    },
];

const STATE_ID: &[FieldSpec] = &[
    text("First name", Corruption::Keep),
    text("Last name", Corruption::Mismatch),
    text("License number", Corruption::Omit),
    text("Date of birth", Corruption::Omit),
    text("Address", Corruption::Keep),
    text("State", Corruption::Keep),
];

const PREGNANCY: &[FieldSpec] = &[
    text("Employee first name", Corruption::Keep),
    text("Employee last name", Corruption::Mismatch),
    text("Employee date of birth", Corruption::Omit),
    text("Leave start date", Corruption::Keep),
    text("Leave end date", Corruption::Keep),
    check("Pregnant or recent birth"),
];

const BIRTH_CERTIFICATE: &[FieldSpec] = &[
    text("Parent first name", Corruption::Keep),
    text("Parent last name", Corruption::Mismatch),
    text("Parent date of birth", Corruption::Omit),
    text("Child date of birth", Corruption::Omit),
];

const PLACEMENT: &[FieldSpec] = &[
    text("Parent first name", Corruption::Keep),
    text("Parent last name", Corruption::Mismatch),
    text("Parent SSN", Corruption::Omit),
    text("Placement date", Corruption::Omit),
];

const CARING: &[FieldSpec] = &[
    text("Employee first name", Corruption::Keep),
    text("Employee last name", Corruption::Mismatch),
    text("Employee SSN", Corruption::Omit),
    text("Family member first name", Corruption::Keep),
    text("Family member last name", Corruption::Keep),
    text("Family member date of birth", Corruption::Omit),
    FieldSpec {
        name: "Relationship",
        kind: FieldKind::Choice(RELATIONSHIPS),
        invalid: Corruption::Keep,
    },
    text("Leave start date", Corruption::Keep),
    text("Leave end date", Corruption::Keep),
];

pub fn field_table(document_type: DocumentType) -> &'static [FieldSpec] {
    match document_type {
        DocumentType::HealthCareProvider => HCP,
        DocumentType::MassId | DocumentType::OutOfStateId => STATE_ID,
        DocumentType::PregnancyMaternityForm => PREGNANCY,
        DocumentType::BirthCertificate => BIRTH_CERTIFICATE,
        DocumentType::AdoptionCertificate | DocumentType::FosterPlacement => PLACEMENT,
        DocumentType::Caring => CARING,
    }
}

fn form_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%m/%d/%Y").to_string())
        .unwrap_or_default()
}

/// Value the claim supplies for a named field, before corruption.
fn claim_value(
    document_type: DocumentType,
    spec: &FieldSpec,
    claim: &ClaimApplication,
) -> FieldValue {
    let details = &claim.leave_details;
    let caring = details.caring_leave_metadata.as_ref();
    let value = match spec.name {
        "Employee first name" | "First name" | "Parent first name" => claim.first_name.clone(),
        "Employee last name" | "Last name" | "Parent last name" => claim.last_name.clone(),
        "Employee SSN" | "Parent SSN" => claim.tax_identifier.clone(),
        "Employee date of birth" | "Date of birth" | "Parent date of birth" => {
            form_date(Some(claim.date_of_birth))
        }
        "License number" => match document_type {
            DocumentType::MassId => claim.mass_id.clone().unwrap_or_default(),
            _ => claim.tax_identifier.replace('-', ""),
        },
        "Address" => claim.residential_address.line_1.clone(),
        "State" => match document_type {
            DocumentType::MassId => "MA".to_string(),
            _ => claim.residential_address.state.clone(),
        },
        "Leave start date" => form_date(details.leave_start()),
        "Leave end date" => form_date(details.leave_end()),
        "Child date of birth" => form_date(details.child_birth_date),
        "Placement date" => form_date(details.child_placement_date),
        "Family member first name" => caring
            .map(|meta| meta.family_member_first_name.clone())
            .unwrap_or_default(),
        "Family member last name" => caring
            .map(|meta| meta.family_member_last_name.clone())
            .unwrap_or_default(),
        "Family member date of birth" => {
            form_date(caring.map(|meta| meta.family_member_date_of_birth))
        }
        "Continuous leave" => return FieldValue::Checked(claim.has_continuous_leave_periods),
        "Intermittent leave" => return FieldValue::Checked(claim.has_intermittent_leave_periods),
        "Reduced schedule" => {
            return FieldValue::Checked(claim.has_reduced_schedule_leave_periods);
        }
        "Pregnant or recent birth" => return FieldValue::Checked(details.pregnant_or_recent_birth),
        "Condition" => {
            let condition = if details.pregnant_or_recent_birth {
                CONDITIONS[1]
            } else {
                CONDITIONS[0]
            };
            return FieldValue::Choice(condition.to_string());
        }
        "Relationship" => {
            let relationship = caring
                .map(|meta| meta.relationship_to_caregiver)
                .unwrap_or(FamilyRelationship::Parent);
            return FieldValue::Choice(relationship.as_str().to_string());
        }
        _ => String::new(),
    };
    FieldValue::Text(value)
}

/// Bind a claim to the field table of `document_type`. Invalid mode omits or
/// mismatches the fields the table marks for corruption.
pub fn bind(
    document_type: DocumentType,
    claim: &ClaimApplication,
    invalid: bool,
) -> Vec<(&'static str, FieldValue)> {
    field_table(document_type)
        .iter()
        .filter_map(|spec| {
            let value = claim_value(document_type, spec, claim);
            if !invalid {
                return Some((spec.name, value));
            }
            match (spec.invalid, value) {
                (Corruption::Omit, _) => None,
                (Corruption::Mismatch, FieldValue::Text(value)) => {
                    Some((spec.name, FieldValue::Text(mismatch(&value))))
                }
                (_, value) => Some((spec.name, value)),
            }
        })
        .collect()
}

fn mismatch(value: &str) -> String {
    let reversed: String = value.chars().rev().collect();
    if reversed.eq_ignore_ascii_case(value) {
        format!("{value}x")
    } else {
        reversed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_has_unique_field_names() {
        for document_type in DocumentType::ALL {
            let table = field_table(document_type);
            let mut names: Vec<&str> = table.iter().map(|spec| spec.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), table.len(), "{document_type:?}");
        }
    }

    #[test]
    fn mismatch_never_returns_the_original() {
        assert_eq!(mismatch("Smith"), "htimS");
        assert_eq!(mismatch("Otto"), "Ottox");
    }
}
