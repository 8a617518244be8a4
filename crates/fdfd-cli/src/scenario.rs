//! JSON scenario: grid, materials, absorbing layers, source and solver
//! settings for one run.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use fdfd_core::{Axis, GridShape, VecField};
use fdfd_solver::{PmlParams, PmlThicknesses, SolveMode, SolveParams};
use num_complex::Complex64 as C64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
    Z,
}

impl From<AxisName> for Axis {
    fn from(name: AxisName) -> Self {
        match name {
            AxisName::X => Axis::X,
            AxisName::Y => Axis::Y,
            AxisName::Z => Axis::Z,
        }
    }
}

/// Dielectric ball. Cells whose index lies within `radius` of `center` get
/// permittivity `eps`; there is no sub-pixel smoothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sphere {
    pub radius: f64,
    /// In cell indices. Defaults to the grid centre.
    #[serde(default)]
    pub center: Option<[f64; 3]>,
    pub eps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PmlConfig {
    /// `[[-x, +x], [-y, +y], [-z, +z]]` in cells.
    pub thickness: [[usize; 2]; 3],
    pub m: f64,
    pub ln_r: f64,
}

impl Default for PmlConfig {
    fn default() -> Self {
        let params = PmlParams::default();
        Self {
            thickness: [[10, 10]; 3],
            m: params.m,
            ln_r: params.ln_r,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Source {
    /// Point current `J` on one Yee edge; `b = -i w J`.
    Dipole {
        polarization: AxisName,
        /// Defaults to the grid centre.
        #[serde(default)]
        position: Option<[usize; 3]>,
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
    },
    /// Scattered-field excitation by a plane wave travelling through the
    /// background: `b = -w^2 (eps - eps_bg) E_inc`.
    PlaneWave {
        direction: AxisName,
        polarization: AxisName,
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
    },
}

fn unit_amplitude() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub eps: f64,
    pub max_iters: usize,
    pub monitor_every_n: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let params = SolveParams::default();
        Self {
            eps: params.eps,
            max_iters: 10_000,
            monitor_every_n: params.monitor_every_n,
        }
    }
}

fn default_eps_bg() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Cells along x, y, z.
    pub grid: [usize; 3],
    /// Vacuum wavelength in cells.
    pub wavelength: f64,
    #[serde(default = "default_eps_bg")]
    pub eps_bg: f64,
    #[serde(default)]
    pub sphere: Option<Sphere>,
    #[serde(default)]
    pub pml: PmlConfig,
    pub source: Source,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        let shape = GridShape::try_new(self.grid[0], self.grid[1], self.grid[2])?;
        ensure!(
            self.wavelength.is_finite() && self.wavelength > 0.0,
            "wavelength must be positive, got {}",
            self.wavelength
        );
        ensure!(
            self.eps_bg.is_finite() && self.eps_bg > 0.0,
            "eps_bg must be positive, got {}",
            self.eps_bg
        );
        if let Some(sphere) = &self.sphere {
            ensure!(
                sphere.radius.is_finite() && sphere.radius >= 0.0,
                "sphere radius must be non-negative, got {}",
                sphere.radius
            );
            ensure!(sphere.eps.is_finite(), "sphere eps must be finite");
        }
        match &self.source {
            Source::Dipole { position: Some(p), .. } => ensure!(
                p[0] < shape.nx && p[1] < shape.ny && p[2] < shape.nz,
                "dipole position {:?} outside {} grid",
                p,
                shape
            ),
            Source::PlaneWave {
                direction,
                polarization,
                ..
            } => ensure!(
                direction != polarization,
                "plane wave polarization must be transverse to its direction"
            ),
            Source::Dipole { position: None, .. } => {}
        }
        self.thicknesses().validate(shape)?;
        self.pml_params().validate()?;
        Ok(())
    }

    pub fn shape(&self) -> GridShape {
        GridShape::new(self.grid[0], self.grid[1], self.grid[2])
    }

    /// Angular frequency in inverse cells.
    pub fn omega(&self) -> f64 {
        2.0 * PI / self.wavelength
    }

    /// Geometric centre in cell indices, `n / 2 - 0.5` per axis.
    pub fn center(&self) -> [f64; 3] {
        self.grid.map(|n| n as f64 / 2.0 - 0.5)
    }

    pub fn thicknesses(&self) -> PmlThicknesses {
        PmlThicknesses(self.pml.thickness.map(|[lo, hi]| (lo, hi)))
    }

    pub fn pml_params(&self) -> PmlParams {
        PmlParams {
            omega: self.omega(),
            m: self.pml.m,
            ln_r: self.pml.ln_r,
        }
    }

    pub fn solve_params(&self) -> SolveParams {
        SolveParams {
            thicknesses: self.thicknesses(),
            pml: self.pml_params(),
            eps: self.solver.eps,
            max_iters: self.solver.max_iters,
            mode: SolveMode::Forward,
            monitor_every_n: self.solver.monitor_every_n,
        }
    }

    /// Relative permittivity at cell `(i, j, k)`, shared by all three
    /// components.
    pub fn permittivity(&self, i: usize, j: usize, k: usize) -> f64 {
        match &self.sphere {
            Some(sphere) => {
                let c = sphere.center.unwrap_or_else(|| self.center());
                let d2 = [i, j, k]
                    .iter()
                    .zip(c)
                    .map(|(&p, c)| (p as f64 - c).powi(2))
                    .sum::<f64>();
                if d2.sqrt() <= sphere.radius {
                    sphere.eps
                } else {
                    self.eps_bg
                }
            }
            None => self.eps_bg,
        }
    }

    /// `z = w^2 eps`.
    pub fn coefficients(&self) -> VecField {
        let w2 = self.omega().powi(2);
        VecField::from_fn(self.shape(), |_, i, j, k| {
            C64::new(w2 * self.permittivity(i, j, k), 0.0)
        })
    }

    /// Right-hand side `b` of `(curl curl - z) E = b`.
    pub fn rhs(&self) -> VecField {
        let shape = self.shape();
        let omega = self.omega();
        match &self.source {
            Source::Dipole {
                polarization,
                position,
                amplitude,
            } => {
                let [i, j, k] = position.unwrap_or([shape.nx / 2, shape.ny / 2, shape.nz / 2]);
                let mut b = VecField::zeros(shape);
                b.set((*polarization).into(), i, j, k, C64::new(0.0, -omega * amplitude));
                b
            }
            Source::PlaneWave {
                direction,
                polarization,
                amplitude,
            } => {
                let pol = Axis::from(*polarization);
                let dir = Axis::from(*direction);
                let k_bg = omega * self.eps_bg.sqrt();
                let w2 = omega * omega;
                VecField::from_fn(shape, |comp, i, j, k| {
                    if comp != pol {
                        return C64::new(0.0, 0.0);
                    }
                    let contrast = self.permittivity(i, j, k) - self.eps_bg;
                    if contrast == 0.0 {
                        return C64::new(0.0, 0.0);
                    }
                    // The polarization component is on an integer sample
                    // along the (transverse) propagation axis.
                    let u = [i, j, k][dir.index()] as f64;
                    let e_inc = C64::from_polar(*amplitude, k_bg * u);
                    e_inc * (-w2 * contrast)
                })
            }
        }
    }
}
