use chrono::NaiveDate;
use claimgen_core::{
    Employee, Employer, EmployerSize, LeaveReason, Metadata, Occupation, validate_employee,
    validate_employer,
};
use schemars::schema_for;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn employer() -> Employer {
    Employer {
        account_key: "01234567890".to_string(),
        fein: "12-3456789".to_string(),
        name: "Acme Widgets".to_string(),
        dba: "Acme".to_string(),
        street: "1 Main St".to_string(),
        city: "Boston".to_string(),
        state: "MA".to_string(),
        zip: "02110-1234".to_string(),
        size: EmployerSize::Small,
        family_exemption: false,
        medical_exemption: false,
        exemption_commence_date: None,
        exemption_cease_date: None,
        withholdings: vec![1234.56; 4],
        metadata: Metadata::new(),
    }
}

#[test]
fn employer_uses_persisted_field_names() {
    let value = serde_json::to_value(employer()).expect("serialize employer");
    assert_eq!(value["accountKey"], "01234567890");
    assert_eq!(value["size"], "small");
    assert!(value.get("exemption_commence_date").is_none());

    let parsed: Employer = serde_json::from_value(value).expect("parse employer");
    assert_eq!(parsed, employer());
    validate_employer(&parsed).expect("valid employer");
}

#[test]
fn employer_with_short_withholdings_is_rejected() {
    let mut employer = employer();
    employer.withholdings.pop();
    assert!(validate_employer(&employer).is_err());
}

#[test]
fn employee_without_metadata_defaults_to_empty() {
    let json = serde_json::json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "ssn": "123-45-6789",
        "date_of_birth": "1990-02-03",
        "occupations": [{"fein": "12-3456789", "wages": 50000.0}]
    });
    let employee: Employee = serde_json::from_value(json).expect("parse employee");
    assert!(employee.metadata.is_empty());
    assert_eq!(employee.date_of_birth, date(1990, 2, 3));
    assert_eq!(employee.total_wages(), 50000.0);
    validate_employee(&employee).expect("valid employee");

    let broken = Employee {
        occupations: vec![Occupation {
            fein: "bad".to_string(),
            wages: 1.0,
        }],
        ..employee
    };
    assert!(validate_employee(&broken).is_err());
}

#[test]
fn leave_reason_uses_display_labels() {
    let json = serde_json::to_string(&LeaveReason::ChildBonding).expect("serialize reason");
    assert_eq!(json, "\"Child Bonding\"");
    let parsed: LeaveReason =
        serde_json::from_str("\"Care for a Family Member\"").expect("parse reason");
    assert_eq!(parsed, LeaveReason::CareForFamilyMember);
}

#[test]
fn json_schema_exposes_employer_properties() {
    let schema = serde_json::to_value(schema_for!(Employer)).expect("serialize schema");
    let properties = schema["properties"]
        .as_object()
        .expect("employer schema properties");
    for key in ["accountKey", "fein", "size", "withholdings", "metadata"] {
        assert!(properties.contains_key(key), "missing property {key}");
    }
}
