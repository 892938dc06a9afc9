use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use avgint::prelude::*;

fn iota_table() -> BilinearRate {
    BilinearRate::from_rows(
        vec![0.0, 100.0],
        vec![2000.0, 2020.0],
        vec![vec![0.01, 0.03], vec![0.02, 0.04]],
    )
    .unwrap()
}

fn full_rates() -> RateSet {
    RateSet::builder()
        .rate(RateKind::Pini, Constant(0.02))
        .rate(RateKind::Iota, iota_table())
        .rate(RateKind::Rho, Constant(0.05))
        .rate(RateKind::Chi, |age: f64, _t: f64| 0.02 + 0.001 * age)
        .rate(RateKind::Omega, |age: f64, _t: f64| 0.002 * (0.04 * age).exp())
        .build()
}

#[test]
fn bilinear_incidence_average_is_center_value() {
    let rates = RateSet::builder().rate(RateKind::Iota, iota_table()).build();
    let grid = Grid::uniform(10.0, 90.0, 2000.0, 2020.0, 1.0).unwrap();
    let avg = average_integrand(&rates, IntegrandKind::SIncidence, &grid, 1e-6).unwrap();
    // trapezoidal averages of a bilinear function are exact
    assert_abs_diff_eq!(avg, iota_table().eval(50.0, 2010.0), epsilon = 1e-12);
    assert_abs_diff_eq!(avg, 0.025, epsilon = 1e-12);
}

#[test]
fn point_grid_is_exact_for_every_kind() {
    let rates = full_rates();
    for &(age, time) in &[(0.0, 2000.0), (0.3, 2001.0), (45.0, 2012.0), (95.0, 2019.0)] {
        let grid = Grid::point(age, time).unwrap();
        for kind in IntegrandKind::ALL {
            let avg = average_integrand(&rates, kind, &grid, 1e-8).unwrap();
            let point = integrand_value(age, time, &rates, kind, 1e-8).unwrap();
            assert_eq!(avg.to_bits(), point.to_bits(), "{} at ({}, {})", kind, age, time);
        }
    }
}

#[test]
fn direct_kinds_are_rate_pass_through() {
    let rates = full_rates();
    let (age, time) = (33.0, 2007.0);
    let grid = Grid::point(age, time).unwrap();
    let at = |kind: RateKind| rates.eval(kind, age, time);
    let avg = |kind| average_integrand(&rates, kind, &grid, 1e-8).unwrap();

    assert_eq!(avg(IntegrandKind::SIncidence), at(RateKind::Iota));
    assert_eq!(avg(IntegrandKind::Remission), at(RateKind::Rho));
    assert_eq!(avg(IntegrandKind::MtExcess), at(RateKind::Chi));
    assert_eq!(avg(IntegrandKind::MtOther), at(RateKind::Omega));
}

#[test]
fn repeated_calls_are_identical() {
    let rates = full_rates();
    let grid = Grid::uniform(20.0, 60.0, 2000.0, 2020.0, 5.0).unwrap();
    for kind in [IntegrandKind::Prevalence, IntegrandKind::MtStandard, IntegrandKind::RelRisk] {
        let first = average_integrand(&rates, kind, &grid, 1e-7).unwrap();
        let second = average_integrand(&rates, kind, &grid, 1e-7).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }
}

#[test]
fn refinement_converges_for_incidence() {
    let rates = RateSet::builder()
        .rate(RateKind::Iota, |age: f64, time: f64| {
            0.01 * (0.03 * age).exp() * (1.0 + 0.01 * (time - 2000.0))
        })
        .build();
    // separable: exact average of each factor
    let age_part = ((0.03_f64 * 50.0).exp() - (0.03_f64 * 10.0).exp()) / (0.03 * 40.0);
    let time_part = 1.0 + 0.01 * 10.0;
    let exact = 0.01 * age_part * time_part;

    let mut previous = f64::INFINITY;
    for max_step in [20.0, 10.0, 5.0, 2.5, 1.25] {
        let grid = Grid::uniform(10.0, 50.0, 2000.0, 2020.0, max_step).unwrap();
        let avg = average_integrand(&rates, IntegrandKind::SIncidence, &grid, 1e-6).unwrap();
        let err = (avg - exact).abs();
        assert!(err < previous, "max_step {}: {} >= {}", max_step, err, previous);
        previous = err;
    }
}

#[test]
fn refinement_converges_for_prevalence() {
    // P(a) = 1 - exp(-iota a); average over [0, 100] is 1 - (1 - exp(-100 iota)) / (100 iota)
    let iota = 0.05;
    let rates = RateSet::builder().rate(RateKind::Iota, Constant(iota)).build();
    let exact = 1.0 - (1.0 - (-100.0_f64 * iota).exp()) / (100.0 * iota);

    let mut previous = f64::INFINITY;
    for max_step in [50.0, 25.0, 12.5, 6.25, 3.125] {
        let grid = Grid::uniform(0.0, 100.0, 2000.0, 2000.0, max_step).unwrap();
        let avg = average_integrand(&rates, IntegrandKind::Prevalence, &grid, 1e-10).unwrap();
        let err = (avg - exact).abs();
        assert!(err < previous, "max_step {}: {} >= {}", max_step, err, previous);
        previous = err;
    }
    assert!(previous < 1e-3);
}

#[test]
fn mtstandard_is_finite_where_relrisk_is_not() {
    // omega = 0 everywhere, condition present from birth
    let rates = RateSet::builder()
        .rate(RateKind::Pini, Constant(0.5))
        .rate(RateKind::Chi, Constant(0.1))
        .build();
    let grid = Grid::point(20.0, 2000.0).unwrap();

    let relrisk = average_integrand(&rates, IntegrandKind::RelRisk, &grid, 1e-8).unwrap();
    assert!(relrisk.is_infinite());

    let state = compartment_state(20.0, 2000.0, &rates, 1e-8).unwrap();
    let mtstandard = average_integrand(&rates, IntegrandKind::MtStandard, &grid, 1e-8).unwrap();
    assert!(mtstandard.is_finite());
    assert_relative_eq!(mtstandard, 1.0 / state.prevalence(), max_relative = 1e-12);
}

#[test]
fn mortality_integrands_relate_to_each_other() {
    let rates = full_rates();
    let grid = Grid::uniform(30.0, 50.0, 2005.0, 2015.0, 2.0).unwrap();
    let avg = |kind| average_integrand(&rates, kind, &grid, 1e-9).unwrap();

    // mtall = mtother + mtspecific at every node, so also on average
    assert_relative_eq!(
        avg(IntegrandKind::MtAll),
        avg(IntegrandKind::MtOther) + avg(IntegrandKind::MtSpecific),
        max_relative = 1e-12
    );
    // Tincidence = Sincidence * (1 - P) with P in (0, 1)
    assert!(avg(IntegrandKind::TIncidence) < avg(IntegrandKind::SIncidence));
    assert!(avg(IntegrandKind::TIncidence) > 0.0);
}

#[test]
fn unknown_integrand_is_a_configuration_error() {
    let grid = Grid::point(50.0, 2000.0).unwrap();
    let rates: Vec<(&str, Arc<dyn Rate>)> = vec![("omega", Arc::new(Constant(0.01)))];
    match average_integrand_by_name(rates, "bogus", &grid, 1e-7) {
        Err(AvgIntError::UnsupportedIntegrand { name }) => assert_eq!(name, "bogus"),
        other => panic!("expected UnsupportedIntegrand, got {:?}", other),
    }
}

#[test]
fn string_keyed_rates_default_to_zero() {
    let grid = Grid::uniform(0.0, 40.0, 2000.0, 2010.0, 10.0).unwrap();
    let rates: Vec<(String, Arc<dyn Rate>)> =
        vec![("omega".to_string(), Arc::new(Constant(0.01)))];
    let withc = average_integrand_by_name(rates.clone(), "withC", &grid, 1e-8).unwrap();
    assert_eq!(withc, 0.0);
    let rr = average_integrand_by_name(rates, "relrisk", &grid, 1e-8).unwrap();
    assert_eq!(rr, 1.0);
}
