use chrono::NaiveDate;
use claimgen_core::{
    Address, ClaimApplication, ContinuousLeavePeriod, Error, LeaveDetails, LeaveReason, Phone,
    validate_claim_application,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn claim() -> ClaimApplication {
    ClaimApplication {
        application_nickname: None,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        tax_identifier: "123-45-6789".to_string(),
        employer_fein: "12-3456789".to_string(),
        date_of_birth: date(1980, 12, 10),
        employment_status: "Employed".to_string(),
        occupation: "Administrative".to_string(),
        hours_worked_per_week: 40.0,
        has_state_id: false,
        mass_id: None,
        residential_address: Address {
            line_1: "1 Main St".to_string(),
            line_2: None,
            city: "Boston".to_string(),
            state: "MA".to_string(),
            zip: "02110-1234".to_string(),
        },
        has_mailing_address: false,
        mailing_address: None,
        email: "ada.lovelace123@example.com".to_string(),
        phone: Phone {
            int_code: "1".to_string(),
            phone_number: "555-555-1234".to_string(),
            phone_type: "Cell".to_string(),
        },
        has_continuous_leave_periods: true,
        has_intermittent_leave_periods: false,
        has_reduced_schedule_leave_periods: false,
        leave_details: LeaveDetails {
            reason: LeaveReason::SeriousHealthCondition,
            reason_qualifier: None,
            pregnant_or_recent_birth: false,
            employer_notified: true,
            employer_notification_date: Some(date(2024, 6, 20)),
            employer_notification_method: Some("In Writing".to_string()),
            child_birth_date: None,
            child_placement_date: None,
            has_future_child_date: false,
            caring_leave_metadata: None,
            continuous_leave_periods: vec![ContinuousLeavePeriod {
                start_date: date(2024, 7, 1),
                end_date: date(2024, 8, 1),
                is_estimated: true,
            }],
            intermittent_leave_periods: Vec::new(),
            reduced_schedule_leave_periods: Vec::new(),
        },
        work_pattern: None,
    }
}

fn rejection(claim: &ClaimApplication) -> String {
    match validate_claim_application(claim) {
        Err(Error::InvalidRecord(message)) => message,
        other => panic!("expected an invalid record, got {other:?}"),
    }
}

#[test]
fn consistent_claim_is_accepted() {
    validate_claim_application(&claim()).expect("valid claim");
}

#[test]
fn claim_without_period_types_is_rejected() {
    let mut claim = claim();
    claim.has_continuous_leave_periods = false;
    claim.leave_details.continuous_leave_periods.clear();
    assert!(rejection(&claim).contains("no leave period type"));
}

#[test]
fn flag_without_periods_is_rejected() {
    let mut claim = claim();
    claim.has_intermittent_leave_periods = true;
    assert!(rejection(&claim).contains("intermittent"));

    let mut claim = self::claim();
    claim.leave_details.continuous_leave_periods.clear();
    claim.has_reduced_schedule_leave_periods = true;
    assert!(rejection(&claim).contains("continuous"));
}

#[test]
fn period_ending_on_its_start_is_rejected() {
    let mut claim = claim();
    let period = &mut claim.leave_details.continuous_leave_periods[0];
    period.end_date = period.start_date;
    assert!(rejection(&claim).contains("ends"));
}

#[test]
fn late_employer_notification_is_rejected() {
    let mut claim = claim();
    claim.leave_details.employer_notification_date = Some(date(2024, 7, 1));
    assert!(rejection(&claim).contains("employer notified"));

    claim.leave_details.employer_notification_date = None;
    validate_claim_application(&claim).expect("notification date is optional");
}

#[test]
fn state_id_flag_must_match_mass_id() {
    let mut claim = claim();
    claim.has_state_id = true;
    assert!(rejection(&claim).contains("has_state_id"));

    claim.mass_id = Some("S12345678".to_string());
    validate_claim_application(&claim).expect("state id present");

    claim.has_state_id = false;
    assert!(rejection(&claim).contains("has_state_id"));
}
