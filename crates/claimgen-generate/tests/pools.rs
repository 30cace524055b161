use std::collections::HashSet;

use claimgen_core::{EmployerSize, Metadata, formats};
use claimgen_generate::{
    EmployeePickSpec, EmployeePool, EmployeeSpec, EmployerPickSpec, EmployerPool, EmployerSpec,
    GenerationError, WageSpec, WageTier, WithholdingCategory, WithholdingMatch,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn metadata(value: serde_json::Value) -> Metadata {
    serde_json::from_value(value).expect("metadata object")
}

fn sized(size: EmployerSize, count: usize, seed: u64) -> EmployerPool {
    let spec = EmployerSpec {
        size: Some(size),
        ..EmployerSpec::default()
    };
    EmployerPool::generate(count, &spec, &mut rng(seed)).expect("generate employers")
}

#[test]
fn unconstrained_sizes_favor_small_employers() {
    let pool = EmployerPool::generate(1000, &EmployerSpec::default(), &mut rng(7))
        .expect("generate employers");
    let count = |size| pool.iter().filter(|e| e.size == size).count();
    let (small, medium, large) = (
        count(EmployerSize::Small),
        count(EmployerSize::Medium),
        count(EmployerSize::Large),
    );
    assert!(small > medium, "small {small} <= medium {medium}");
    assert!(medium > large, "medium {medium} <= large {large}");
    assert!(large > 0);
}

#[test]
fn employers_carry_formatted_unique_identifiers() {
    let pool = EmployerPool::generate(200, &EmployerSpec::default(), &mut rng(11))
        .expect("generate employers");

    let mut feins = HashSet::new();
    let mut keys = HashSet::new();
    for employer in pool.iter() {
        assert!(formats::is_fein(&employer.fein), "{}", employer.fein);
        assert!(formats::is_account_key(&employer.account_key), "{}", employer.account_key);
        assert!(formats::is_zip(&employer.zip), "{}", employer.zip);
        assert_eq!(employer.state, "MA");
        assert!(feins.insert(employer.fein.clone()));
        assert!(keys.insert(employer.account_key.clone()));

        let baseline = claimgen_core::fein_withholding_baseline(&employer.fein).expect("baseline");
        assert_eq!(employer.withholdings, vec![baseline; 4]);
        assert!(claimgen_core::validate_employer(employer).is_ok());
    }
}

#[test]
fn exemptions_set_commence_and_cease_dates() {
    let spec = EmployerSpec {
        family_exemption: true,
        ..EmployerSpec::default()
    };
    let pool = EmployerPool::generate(5, &spec, &mut rng(2)).expect("generate employers");
    for employer in pool.iter() {
        let commence = employer.exemption_commence_date.expect("commence date");
        let cease = employer.exemption_cease_date.expect("cease date");
        assert!(commence < cease);
    }
}

#[test]
fn pick_matches_withholding_categories() {
    let exempt_spec = EmployerSpec {
        withholdings: Some(vec![Some(0.0); 4]),
        ..EmployerSpec::default()
    };
    let exempt = EmployerPool::generate(5, &exempt_spec, &mut rng(3)).expect("exempt employers");
    let regular = EmployerPool::generate(5, &EmployerSpec::default(), &mut rng(4))
        .expect("regular employers");
    let mut pool = exempt.merge(regular);
    let mut rng = rng(5);

    for _ in 0..20 {
        let spec = EmployerPickSpec {
            withholdings: Some(WithholdingMatch::Category(WithholdingCategory::Exempt)),
            ..EmployerPickSpec::default()
        };
        assert!(pool.pick(&spec, &mut rng).expect("exempt pick").is_exempt());

        let spec = EmployerPickSpec {
            withholdings: Some(WithholdingMatch::Category(WithholdingCategory::NonExempt)),
            ..EmployerPickSpec::default()
        };
        assert!(!pool.pick(&spec, &mut rng).expect("non-exempt pick").is_exempt());
    }

    let spec = EmployerPickSpec {
        withholdings: Some(WithholdingMatch::Exact(vec![0.0; 4])),
        ..EmployerPickSpec::default()
    };
    assert!(pool.pick(&spec, &mut rng).expect("exact pick").is_exempt());
}

#[test]
fn merging_overlapping_pools_keeps_identities_unique() {
    let pool = EmployerPool::generate(6, &EmployerSpec::default(), &mut rng(21))
        .expect("generate employers");
    let merged = pool.clone().merge(pool.clone()).merge(pool);
    assert_eq!(merged.len(), 6);
    let feins: HashSet<&str> = merged.iter().map(|e| e.fein.as_str()).collect();
    assert_eq!(feins.len(), 6);
}

#[test]
fn partial_withholdings_fall_back_to_the_baseline() {
    let spec = EmployerSpec {
        withholdings: Some(vec![Some(0.0), None, Some(0.0), None]),
        ..EmployerSpec::default()
    };
    let pool = EmployerPool::generate(3, &spec, &mut rng(8)).expect("generate employers");
    for employer in pool.iter() {
        let baseline = claimgen_core::fein_withholding_baseline(&employer.fein).expect("baseline");
        assert_eq!(employer.withholdings, vec![0.0, baseline, 0.0, baseline]);
    }
}

#[test]
fn pick_excludes_listed_feins() {
    let mut pool =
        EmployerPool::generate(2, &EmployerSpec::default(), &mut rng(9)).expect("employers");
    let excluded = pool.employers()[0].fein.clone();
    let spec = EmployerPickSpec {
        not_fein: vec![excluded.clone()],
        ..EmployerPickSpec::default()
    };
    let mut rng = rng(10);
    for _ in 0..20 {
        let picked = pool.pick(&spec, &mut rng).expect("pick");
        assert_ne!(picked.fein, excluded);
    }
}

#[test]
fn weighted_pick_favors_small_employers() {
    let mut pool = sized(EmployerSize::Small, 10, 1)
        .merge(sized(EmployerSize::Medium, 10, 2))
        .merge(sized(EmployerSize::Large, 10, 3));
    let mut rng = rng(12);
    let mut counts = [0usize; 3];
    for _ in 0..3000 {
        let employer = pool
            .pick(&EmployerPickSpec::default(), &mut rng)
            .expect("pick");
        let slot = match employer.size {
            EmployerSize::Small => 0,
            EmployerSize::Medium => 1,
            EmployerSize::Large => 2,
        };
        counts[slot] += 1;
    }
    assert!(counts[0] > counts[1] && counts[1] > counts[2] && counts[2] > 0);
    assert_eq!(pool.len(), 30);
}

#[test]
fn employer_pick_reports_exhaustion() {
    let mut pool =
        EmployerPool::generate(3, &EmployerSpec::default(), &mut rng(13)).expect("employers");
    let spec = EmployerPickSpec {
        metadata: metadata(json!({"missing": true})),
        ..EmployerPickSpec::default()
    };
    let err = pool.pick(&spec, &mut rng(14)).unwrap_err();
    assert!(matches!(err, GenerationError::NoMatch { entity: "employer" }));
    assert_eq!(
        err.to_string(),
        "No employer is left matching the specification"
    );
}

fn employers() -> EmployerPool {
    EmployerPool::generate(5, &EmployerSpec::default(), &mut rng(20)).expect("employers")
}

#[test]
fn wages_fall_inside_the_requested_tier() {
    let mut employers = employers();
    let mut rng = rng(21);
    for tier in [
        WageTier::Ineligible,
        WageTier::Eligible,
        WageTier::High,
        WageTier::Medium,
        WageTier::Low,
    ] {
        let spec = EmployeeSpec {
            wages: WageSpec::Tier(tier),
            ..EmployeeSpec::default()
        };
        let pool =
            EmployeePool::generate(100, &mut employers, &spec, &mut rng).expect("employees");
        let (min, max) = tier.band();
        for employee in pool.iter() {
            let wages = employee.total_wages();
            assert!(wages >= min && wages <= max, "{tier:?}: {wages}");
        }
    }
}

#[test]
fn numeric_wages_are_used_verbatim() {
    let mut employers = employers();
    let spec = EmployeeSpec {
        wages: WageSpec::Exact(12_345.0),
        ..EmployeeSpec::default()
    };
    let pool = EmployeePool::generate(10, &mut employers, &spec, &mut rng(22)).expect("employees");
    assert!(pool.iter().all(|employee| employee.total_wages() == 12_345.0));
}

#[test]
fn employees_work_for_pool_employers() {
    let mut employers = employers();
    let feins: HashSet<String> = employers.iter().map(|e| e.fein.clone()).collect();
    let pool = EmployeePool::generate(50, &mut employers, &EmployeeSpec::default(), &mut rng(23))
        .expect("employees");
    for employee in pool.iter() {
        assert!(formats::is_ssn(&employee.ssn), "{}", employee.ssn);
        let fein = employee.primary_fein().expect("occupation");
        assert!(feins.contains(fein));
        assert!(claimgen_core::validate_employee(employee).is_ok());
    }
}

#[test]
fn ssns_stay_unique_across_used_identities() {
    let mut employers = employers();
    let mut rng = rng(24);
    let mut pool = EmployeePool::generate(200, &mut employers, &EmployeeSpec::default(), &mut rng)
        .expect("employees");
    for _ in 0..10 {
        pool.pick(&EmployeePickSpec::default(), &mut rng)
            .expect("pick");
    }
    pool.generate_more(200, &mut employers, &EmployeeSpec::default(), &mut rng)
        .expect("more employees");

    let ssns: HashSet<&str> = pool.iter().map(|e| e.ssn.as_str()).collect();
    assert_eq!(ssns.len(), 400);
    assert_eq!(pool.available(), 390);
}

#[test]
fn picked_employees_are_consumed() {
    let mut employers = employers();
    let mut rng = rng(25);
    let mut pool = EmployeePool::generate(3, &mut employers, &EmployeeSpec::default(), &mut rng)
        .expect("employees");

    let mut picked = HashSet::new();
    for _ in 0..3 {
        let employee = pool
            .pick(&EmployeePickSpec::default(), &mut rng)
            .expect("pick");
        assert!(pool.is_used(&employee));
        assert!(picked.insert(employee.ssn));
    }

    let err = pool
        .pick(&EmployeePickSpec::default(), &mut rng)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No employee is left matching the specification"
    );
}

#[test]
fn pick_filters_on_mass_id_and_metadata() {
    let mut employers = employers();
    let mut rng = rng(26);
    let with_id = EmployeeSpec {
        mass_id: true,
        metadata: metadata(json!({"prenoted": true})),
        ..EmployeeSpec::default()
    };
    let mut pool = EmployeePool::generate(5, &mut employers, &with_id, &mut rng)
        .expect("employees")
        .merge(
            EmployeePool::generate(5, &mut employers, &EmployeeSpec::default(), &mut rng)
                .expect("employees"),
        );

    let spec = EmployeePickSpec {
        mass_id: Some(true),
        ..EmployeePickSpec::default()
    };
    let employee = pool.pick(&spec, &mut rng).expect("mass id pick");
    assert!(formats::is_mass_id(employee.mass_id.as_deref().expect("mass id")));

    let spec = EmployeePickSpec {
        metadata: metadata(json!({"prenoted": true})),
        ..EmployeePickSpec::default()
    };
    let employee = pool.pick(&spec, &mut rng).expect("prenoted pick");
    assert_eq!(employee.metadata.get("prenoted"), Some(&json!(true)));

    let spec = EmployeePickSpec {
        mass_id: Some(false),
        wages: Some(WageSpec::Tier(WageTier::Eligible)),
        ..EmployeePickSpec::default()
    };
    let employee = pool.pick(&spec, &mut rng).expect("no mass id pick");
    assert!(employee.mass_id.is_none());
}

#[test]
fn merged_employee_pools_skip_known_ssns_and_keep_used_ones() {
    let mut employers = employers();
    let mut rng = rng(27);
    let mut pool = EmployeePool::generate(4, &mut employers, &EmployeeSpec::default(), &mut rng)
        .expect("employees");
    let picked = pool
        .pick(&EmployeePickSpec::default(), &mut rng)
        .expect("pick");

    let merged = EmployeePool::from_employees(Vec::new()).merge(pool.clone()).merge(pool);
    assert_eq!(merged.len(), 4);
    assert_eq!(merged.available(), 3);
    assert!(merged.is_used(&picked));
}
