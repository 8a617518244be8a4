//! Integration tests for the preconditioned COCG driver.

use fdfd_core::{Axis, GridShape, VecField};
use fdfd_solver::linear::{assemble_dense, from_dvector, solve_complex, to_dvector};
use fdfd_solver::{
    BreakdownKind, CurlCurlOperator, Error, FieldOperator, NoopMonitor, PmlParams,
    PmlThicknesses, SolveMode, SolveParams, physical_residual, solve, solve_dense,
    solve_with_guess,
};
use num_complex::Complex64 as C64;

/// Deterministic, non-degenerate test field.
fn test_field(shape: GridShape, seed: f64) -> VecField {
    VecField::from_fn(shape, |axis, i, j, k| {
        let t = seed + (i * 13 + j * 7 + k * 3 + axis.index() * 5) as f64;
        C64::new((1.3 * t).sin(), (0.7 * t).cos())
    })
}

/// `x`-polarized point source at the grid centre.
fn dipole(shape: GridShape, omega: f64) -> VecField {
    let mut b = VecField::zeros(shape);
    b.set(
        Axis::X,
        shape.nx / 2,
        shape.ny / 2,
        shape.nz / 2,
        C64::new(0.0, -omega),
    );
    b
}

fn rel_diff(a: &VecField, b: &VecField) -> f64 {
    (a - b).norm() / b.norm()
}

/// Test the trivial system:
///
/// ```text
/// (curl curl - z) E = 0  =>  E = 0
/// ```
///
/// Expected: zero field, one recorded residual of exactly 0.
#[test]
fn test_zero_rhs() {
    let shape = GridShape::new(6, 6, 6);
    let omega = 0.6;
    let z = VecField::filled(shape, C64::new(omega * omega, 0.0));
    let b = VecField::zeros(shape);
    let params = SolveParams {
        thicknesses: PmlThicknesses::uniform(2),
        pml: PmlParams::with_omega(omega),
        ..Default::default()
    };

    let result = solve(&z, &b, &params, &mut NoopMonitor).unwrap();

    assert!(result.converged);
    assert_eq!(result.term_err, 0.0);
    assert_eq!(result.errs, vec![0.0]);
    assert_eq!(result.x.max_abs(), 0.0);
}

#[test]
fn test_dipole_in_vacuum_converges() {
    let shape = GridShape::new(8, 8, 8);
    let omega = 0.8;
    let z = VecField::filled(shape, C64::new(omega * omega, 0.0));
    let b = dipole(shape, omega);
    let params = SolveParams {
        thicknesses: PmlThicknesses::uniform(2),
        pml: PmlParams::with_omega(omega),
        eps: 1e-6,
        max_iters: 4000,
        ..Default::default()
    };

    let result = solve(&z, &b, &params, &mut NoopMonitor).unwrap();

    assert!(result.converged, "stalled at {:?}", result.final_err());
    assert!(result.iterations() < params.max_iters);
    assert!(result.final_err().unwrap() <= result.term_err);
    assert!(result.errs.iter().all(|e| e.is_finite() && *e >= 0.0));
    assert!(result.x.is_finite());

    // The source sits outside the layers, so |pre b| = |b| and the physical
    // residual is bounded by the preconditioned one.
    assert!((result.term_err - params.eps * b.norm()).abs() < 1e-15);
    let rel = physical_residual(&z, &b, &result.x, &params).unwrap();
    assert!(rel < 1e-5, "physical residual {}", rel);

    // The field is strongest at the source.
    let centre = result.x.get(Axis::X, 4, 4, 4).norm();
    let edge = result.x.get(Axis::X, 0, 0, 0).norm();
    assert!(centre > edge);
}

/// COCG residuals are not monotone step to step, but the best residual seen
/// so far only goes down and ends at the converged value.
#[test]
fn test_best_residual_decreases_to_tolerance() {
    let shape = GridShape::new(8, 8, 8);
    let omega = 0.8;
    let z = VecField::filled(shape, C64::new(omega * omega, 0.0));
    let b = dipole(shape, omega);
    let params = SolveParams {
        thicknesses: PmlThicknesses::uniform(2),
        pml: PmlParams::with_omega(omega),
        eps: 1e-6,
        max_iters: 4000,
        ..Default::default()
    };

    let result = solve(&z, &b, &params, &mut NoopMonitor).unwrap();
    assert!(result.converged);

    let best: Vec<f64> = result
        .errs
        .iter()
        .scan(f64::INFINITY, |min, &e| {
            *min = min.min(e);
            Some(*min)
        })
        .collect();

    assert!(best.windows(2).all(|w| w[1] <= w[0]));
    let last = *best.last().unwrap();
    assert!(last <= result.term_err);
    assert!(last < result.errs[0]);
    // Every earlier residual was above the tolerance, so the last is the best.
    assert_eq!(last, result.final_err().unwrap());
    assert!(result.errs[..result.errs.len() - 1]
        .iter()
        .all(|&e| e > result.term_err));
}

#[test]
fn test_matches_dense_lu_4x4x4() {
    let shape = GridShape::new(4, 4, 4);
    let omega = 1.0;
    let z = VecField::filled(shape, C64::new(2.0, 0.5) * (omega * omega));
    let b = test_field(shape, 0.0);
    let params = SolveParams {
        thicknesses: PmlThicknesses::uniform(1),
        pml: PmlParams::with_omega(omega),
        eps: 1e-10,
        max_iters: 2000,
        ..Default::default()
    };

    let result = solve(&z, &b, &params, &mut NoopMonitor).unwrap();
    assert!(result.converged);

    let op = CurlCurlOperator::from_pml(shape, &params.thicknesses, &params.pml).unwrap();
    let dense = solve_dense(&op.physical(), &z, &b).unwrap();

    let diff = rel_diff(&result.x, &dense);
    assert!(diff < 1e-6, "COCG and LU differ by {}", diff);
}

#[test]
fn test_dense_preconditioned_matrix_is_symmetric() {
    let shape = GridShape::new(3, 3, 4);
    let thicknesses = PmlThicknesses::new((1, 0), (0, 1), (1, 1));
    let op = CurlCurlOperator::from_pml(shape, &thicknesses, &PmlParams::with_omega(0.7)).unwrap();
    let z = test_field(shape, 2.0);

    let a = assemble_dense(&op, &z);
    let scale = a.iter().map(|v| v.norm()).fold(0.0, f64::max);
    let asym = (&a - a.transpose()).iter().map(|v| v.norm()).fold(0.0, f64::max);
    assert!(asym <= 1e-12 * scale, "asymmetry {} of {}", asym, scale);
}

/// Reciprocity with the bilinear product:
///
/// ```text
/// <A^-1 b, c> = <b, A^-T c>
/// ```
#[test]
fn test_adjoint_reciprocity() {
    let shape = GridShape::new(5, 6, 5);
    let omega = 0.9;
    let z = VecField::filled(shape, C64::new(1.5, 0.3) * (omega * omega));
    let b = test_field(shape, 0.5);
    let c = test_field(shape, 4.0);
    let forward = SolveParams {
        thicknesses: PmlThicknesses::new((1, 1), (2, 1), (1, 2)),
        pml: PmlParams::with_omega(omega),
        eps: 1e-10,
        max_iters: 3000,
        ..Default::default()
    };
    let adjoint = SolveParams {
        mode: SolveMode::Adjoint,
        ..forward.clone()
    };

    let e = solve(&z, &b, &forward, &mut NoopMonitor).unwrap();
    let f = solve(&z, &c, &adjoint, &mut NoopMonitor).unwrap();
    assert!(e.converged && f.converged);

    let lhs = e.x.dot(&c);
    let rhs = b.dot(&f.x);
    assert!(
        (lhs - rhs).norm() <= 1e-6 * lhs.norm(),
        "<E, c> = {} but <b, F> = {}",
        lhs,
        rhs
    );

    // The adjoint field solves the transposed physical system.
    let op = CurlCurlOperator::from_pml(shape, &forward.thicknesses, &forward.pml).unwrap();
    let a_t = assemble_dense(&op.physical(), &z).transpose();
    let dense = from_dvector(shape, &solve_complex(&a_t, &to_dvector(&c)).unwrap()).unwrap();
    assert!(rel_diff(&f.x, &dense) < 1e-6);
    assert!(physical_residual(&z, &c, &f.x, &adjoint).unwrap() < 1e-6);
}

#[test]
fn test_adjoint_equals_forward_without_pml() {
    let shape = GridShape::new(4, 5, 4);
    let z = VecField::filled(shape, C64::new(0.8, 0.2));
    let b = test_field(shape, 1.0);
    let forward = SolveParams {
        eps: 1e-10,
        max_iters: 2000,
        ..Default::default()
    };
    let adjoint = SolveParams {
        mode: SolveMode::Adjoint,
        ..forward.clone()
    };

    let e = solve(&z, &b, &forward, &mut NoopMonitor).unwrap();
    let f = solve(&z, &b, &adjoint, &mut NoopMonitor).unwrap();
    assert_eq!(e.errs, f.errs);
    assert!(rel_diff(&f.x, &e.x) < 1e-12);
}

#[test]
fn test_monitor_cadence() {
    let shape = GridShape::new(6, 6, 6);
    let omega = 0.7;
    let z = VecField::filled(shape, C64::new(1.2, 0.1) * (omega * omega));
    let b = test_field(shape, 3.0);

    for (max_iters, every, expected) in [
        (25, 10, vec![1, 11, 21, 25]),
        (30, 10, vec![1, 11, 21, 30]),
        (5, 1, vec![1, 2, 3, 4, 5, 5]),
        (3, 100, vec![1, 3]),
    ] {
        let params = SolveParams {
            thicknesses: PmlThicknesses::uniform(1),
            pml: PmlParams::with_omega(omega),
            eps: 0.0,
            max_iters,
            monitor_every_n: every,
            ..Default::default()
        };

        let mut lens = Vec::new();
        let mut last_x = None;
        let mut record = |x: &VecField, errs: &[f64]| {
            assert_eq!(x.shape(), shape);
            assert!(errs.iter().all(|e| e.is_finite() && *e > 0.0));
            lens.push(errs.len());
            last_x = Some(x.clone());
        };
        let result = solve(&z, &b, &params, &mut record).unwrap();

        assert_eq!(lens, expected);
        assert_eq!(lens.len(), max_iters.div_ceil(every) + 1);
        assert_eq!(result.iterations(), max_iters);
        assert!(!result.converged);
        // The monitor sees the unscaled field.
        assert_eq!(last_x.as_ref(), Some(&result.x));
    }
}

#[test]
fn test_monitor_stops_with_early_convergence() {
    let shape = GridShape::new(4, 4, 4);
    let z = VecField::filled(shape, C64::new(2.0, 0.5));
    let b = test_field(shape, 0.0);
    let params = SolveParams {
        eps: 1e-3,
        max_iters: 1000,
        monitor_every_n: 1,
        ..Default::default()
    };

    let mut calls = 0;
    let mut count = |_: &VecField, _: &[f64]| calls += 1;
    let result = solve(&z, &b, &params, &mut count).unwrap();

    assert!(result.converged);
    assert!(result.iterations() < 1000);
    assert_eq!(calls, result.iterations() + 1);
}

#[test]
fn test_guess_from_direct_solve() {
    let shape = GridShape::new(4, 4, 4);
    let omega = 0.9;
    let z = VecField::filled(shape, C64::new(1.0, 0.4) * (omega * omega));
    let b = test_field(shape, 7.0);
    let params = SolveParams {
        thicknesses: PmlThicknesses::uniform(1),
        pml: PmlParams::with_omega(omega),
        eps: 1e-8,
        ..Default::default()
    };

    let op = CurlCurlOperator::from_pml(shape, &params.thicknesses, &params.pml).unwrap();
    let x0 = solve_dense(&op.physical(), &z, &b).unwrap();

    let result = solve_with_guess(&z, &b, &x0, &params, &mut NoopMonitor).unwrap();
    assert!(result.converged);
    assert_eq!(result.iterations(), 1);
    assert!(rel_diff(&result.x, &x0) < 1e-8);
}

#[test]
fn test_isotropic_rhs_breaks_down() {
    // <b, b> = 1 + i^2 = 0 for a nonzero b.
    let shape = GridShape::new(3, 3, 3);
    let z = VecField::filled(shape, C64::new(0.5, 0.0));
    let mut b = VecField::zeros(shape);
    b.set(Axis::X, 1, 1, 1, C64::new(1.0, 0.0));
    b.set(Axis::Y, 1, 1, 1, C64::new(0.0, 1.0));

    match solve(&z, &b, &SolveParams::default(), &mut NoopMonitor) {
        Err(Error::Breakdown { iteration, kind }) => {
            assert_eq!(iteration, 0);
            assert_eq!(kind, BreakdownKind::QuasiNullResidual);
        }
        other => panic!("expected breakdown, got {:?}", other.map(|r| r.errs)),
    }
}

#[test]
fn test_invalid_pml_rejected() {
    let shape = GridShape::new(4, 4, 4);
    let z = VecField::zeros(shape);
    let b = test_field(shape, 0.0);

    let params = SolveParams {
        thicknesses: PmlThicknesses::new((0, 0), (0, 3), (0, 0)),
        ..Default::default()
    };
    match solve(&z, &b, &params, &mut NoopMonitor) {
        Err(Error::InvalidPml { axis, .. }) => assert_eq!(axis, Axis::Y),
        other => panic!("expected invalid PML, got {:?}", other.map(|r| r.errs)),
    }

    let params = SolveParams {
        pml: PmlParams {
            omega: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(
        solve(&z, &b, &params, &mut NoopMonitor),
        Err(Error::InvalidPmlParams(_))
    ));
}

#[test]
fn test_zero_thickness_is_hard_truncation() {
    let shape = GridShape::new(3, 4, 5);
    let op = CurlCurlOperator::from_pml(shape, &PmlThicknesses::NONE, &PmlParams::default()).unwrap();
    let z = test_field(shape, 1.5);
    let x = test_field(shape, 8.0);

    let mut pre = VecField::zeros(shape);
    let mut phys = VecField::zeros(shape);
    op.apply(&x, &z, &mut pre);
    op.physical().apply(&x, &z, &mut phys);
    assert!(rel_diff(&pre, &phys) < 1e-15);
}
