use crate::claim::ClaimApplication;
use crate::employee::Employee;
use crate::employer::Employer;
use crate::error::{Error, Result};
use crate::formats;

/// Check identifier formats and withholding shape of an employer.
pub fn validate_employer(employer: &Employer) -> Result<()> {
    if !formats::is_account_key(&employer.account_key) {
        return Err(Error::InvalidRecord(format!(
            "employer {}: malformed account key '{}'",
            employer.fein, employer.account_key
        )));
    }
    if !formats::is_fein(&employer.fein) {
        return Err(Error::InvalidRecord(format!(
            "employer {}: malformed fein",
            employer.fein
        )));
    }
    if !formats::is_zip(&employer.zip) {
        return Err(Error::InvalidRecord(format!(
            "employer {}: malformed zip '{}'",
            employer.fein, employer.zip
        )));
    }
    if employer.withholdings.len() != 4 {
        return Err(Error::InvalidRecord(format!(
            "employer {}: expected 4 quarterly withholdings, found {}",
            employer.fein,
            employer.withholdings.len()
        )));
    }
    Ok(())
}

/// Check identifier formats and occupations of an employee.
pub fn validate_employee(employee: &Employee) -> Result<()> {
    if !formats::is_ssn(&employee.ssn) {
        return Err(Error::InvalidRecord(format!(
            "employee {} {}: malformed ssn",
            employee.first_name, employee.last_name
        )));
    }
    if employee.occupations.is_empty() {
        return Err(Error::InvalidRecord(format!(
            "employee {}: no occupations",
            employee.ssn
        )));
    }
    if let Some(occupation) = employee
        .occupations
        .iter()
        .find(|occupation| !formats::is_fein(&occupation.fein) || occupation.wages < 0.0)
    {
        return Err(Error::InvalidRecord(format!(
            "employee {}: invalid occupation at {}",
            employee.ssn, occupation.fein
        )));
    }
    if let Some(mass_id) = &employee.mass_id
        && !formats::is_mass_id(mass_id)
    {
        return Err(Error::InvalidRecord(format!(
            "employee {}: malformed mass id",
            employee.ssn
        )));
    }
    Ok(())
}

/// Check the leave invariants of a claim application.
///
/// This checks:
/// - at least one leave-period type flag is set, and each set flag has periods
/// - every period ends strictly after it starts
/// - the employer notification precedes the leave start
/// - `has_state_id` agrees with the presence of `mass_id`
pub fn validate_claim_application(claim: &ClaimApplication) -> Result<()> {
    let details = &claim.leave_details;
    if claim.period_type_count() == 0 {
        return Err(Error::InvalidRecord(
            "claim has no leave period type".to_string(),
        ));
    }

    let flagged = [
        (
            claim.has_continuous_leave_periods,
            details.continuous_leave_periods.is_empty(),
            "continuous",
        ),
        (
            claim.has_intermittent_leave_periods,
            details.intermittent_leave_periods.is_empty(),
            "intermittent",
        ),
        (
            claim.has_reduced_schedule_leave_periods,
            details.reduced_schedule_leave_periods.is_empty(),
            "reduced schedule",
        ),
    ];
    for (flag, empty, label) in flagged {
        if flag == empty {
            return Err(Error::InvalidRecord(format!(
                "{label} flag does not match its leave periods"
            )));
        }
    }

    for (start, end) in details.period_ranges() {
        if end <= start {
            return Err(Error::InvalidRecord(format!(
                "leave period ends ({end}) on or before it starts ({start})"
            )));
        }
    }

    if let (Some(notified), Some(start)) =
        (details.employer_notification_date, details.leave_start())
        && notified >= start
    {
        return Err(Error::InvalidRecord(format!(
            "employer notified on {notified}, not before leave start {start}"
        )));
    }

    if claim.has_state_id != claim.mass_id.is_some() {
        return Err(Error::InvalidRecord(
            "has_state_id disagrees with mass_id".to_string(),
        ));
    }

    Ok(())
}
