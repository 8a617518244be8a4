//! Solve summaries and field slices.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fdfd_core::{Axis, VecField};
use fdfd_solver::{SolveMode, SolveParams, SolveResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub grid: [usize; 3],
    pub omega: f64,
    pub mode: &'static str,
    pub converged: bool,
    pub iterations: usize,
    pub term_err: f64,
    pub final_err: Option<f64>,
    /// `|(curl curl - z) E - b| / |b|`.
    pub physical_residual: f64,
    /// `max |E_c|` per component.
    pub max_abs: [f64; 3],
    pub errs: Vec<f64>,
}

impl Report {
    pub fn new(result: &SolveResult, params: &SolveParams, physical_residual: f64) -> Self {
        let shape = result.x.shape();
        let max_abs = Axis::ALL.map(|a| {
            result
                .x
                .component(a)
                .iter()
                .map(|v| v.norm())
                .fold(0.0, f64::max)
        });
        Self {
            grid: [shape.nx, shape.ny, shape.nz],
            omega: params.pml.omega,
            mode: match params.mode {
                SolveMode::Forward => "forward",
                SolveMode::Adjoint => "adjoint",
            },
            converged: result.converged,
            iterations: result.iterations(),
            term_err: result.term_err,
            final_err: result.final_err(),
            physical_residual,
            max_abs,
            errs: result.errs.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

/// `|E|` on the `k = nz / 2` plane as CSV rows `i,j,ex,ey,ez,e`.
pub fn slice_csv(field: &VecField) -> String {
    let shape = field.shape();
    let k = shape.nz / 2;
    let mut out = String::from("i,j,abs_ex,abs_ey,abs_ez,abs_e\n");
    for i in 0..shape.nx {
        for j in 0..shape.ny {
            let [ex, ey, ez] = Axis::ALL.map(|a| field.get(a, i, j, k).norm());
            let e = (ex * ex + ey * ey + ez * ez).sqrt();
            // Writing to a String cannot fail.
            let _ = writeln!(out, "{},{},{:e},{:e},{:e},{:e}", i, j, ex, ey, ez, e);
        }
    }
    out
}

pub fn write_slice(field: &VecField, path: &Path) -> Result<()> {
    fs::write(path, slice_csv(field))
        .with_context(|| format!("Failed to write slice: {}", path.display()))
}
