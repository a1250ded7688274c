//! Lift/drag polars: tabulated airfoil data and an analytic thin airfoil.
//!
//! Tables are supplied from outside; this module only interpolates them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actuator_types::config::{AoaPolicy, PolarConfig, PolarSource};
use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::constants::DEG2RAD;
use tracing::warn;

/// Lift and drag coefficients as a function of angle of attack (deg).
pub trait Polar: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Returns `(cl, cd)`; never NaN for a finite `aoa_deg`.
    fn coefficients(&self, aoa_deg: f64) -> ActuatorResult<(f64, f64)>;
}

/// Looks up polars by identifier.
pub trait AeroDataProvider {
    fn polar(&self, identifier: &str) -> Option<Arc<dyn Polar>>;
}

/// Piecewise-linear airfoil table.
#[derive(Debug)]
pub struct AirfoilTable {
    name: String,
    aoa: Vec<f64>,
    cl: Vec<f64>,
    cd: Vec<f64>,
    policy: AoaPolicy,
    warned: AtomicBool,
}

impl AirfoilTable {
    pub fn new(
        name: &str,
        aoa: Vec<f64>,
        cl: Vec<f64>,
        cd: Vec<f64>,
        policy: AoaPolicy,
    ) -> ActuatorResult<Self> {
        let err = |message: String| ActuatorError::Polar {
            polar: name.to_string(),
            message,
        };
        if aoa.len() < 2 {
            return Err(err(format!("table needs >= 2 rows, got {}", aoa.len())));
        }
        if cl.len() != aoa.len() || cd.len() != aoa.len() {
            return Err(err(format!(
                "column length mismatch: aoa={}, cl={}, cd={}",
                aoa.len(),
                cl.len(),
                cd.len()
            )));
        }
        if aoa.iter().chain(&cl).chain(&cd).any(|v| !v.is_finite()) {
            return Err(err("table contains non-finite values".to_string()));
        }
        if aoa.windows(2).any(|w| w[1] <= w[0]) {
            return Err(err("aoa column must be strictly increasing".to_string()));
        }
        if let Some(bad) = cd.iter().find(|&&v| v < 0.0) {
            return Err(err(format!("cd column must be >= 0, got {bad}")));
        }
        Ok(AirfoilTable {
            name: name.to_string(),
            aoa,
            cl,
            cd,
            policy,
            warned: AtomicBool::new(false),
        })
    }

    /// Read a whitespace separated `aoa cl cd` file; `#` starts a comment.
    pub fn from_file(name: &str, path: &str, policy: AoaPolicy) -> ActuatorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(name, &contents, policy)
    }

    pub fn parse(name: &str, contents: &str, policy: AoaPolicy) -> ActuatorResult<Self> {
        let mut aoa = Vec::new();
        let mut cl = Vec::new();
        let mut cd = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let cols: Vec<f64> = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<_, _>>()
                .map_err(|e| ActuatorError::Polar {
                    polar: name.to_string(),
                    message: format!("line {}: {e}", lineno + 1),
                })?;
            if cols.len() < 3 {
                return Err(ActuatorError::Polar {
                    polar: name.to_string(),
                    message: format!("line {}: expected 3 columns, got {}", lineno + 1, cols.len()),
                });
            }
            aoa.push(cols[0]);
            cl.push(cols[1]);
            cd.push(cols[2]);
        }
        Self::new(name, aoa, cl, cd, policy)
    }

    pub fn aoa_range(&self) -> (f64, f64) {
        (self.aoa[0], self.aoa[self.aoa.len() - 1])
    }

    fn note_out_of_range(&self, aoa_deg: f64) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            let (lo, hi) = self.aoa_range();
            warn!(
                polar = %self.name,
                aoa = aoa_deg,
                lo,
                hi,
                policy = ?self.policy,
                "angle of attack outside tabulated range"
            );
        }
    }

    fn segment(&self, aoa_deg: f64) -> usize {
        // index i with aoa[i] <= x < aoa[i+1], clamped to valid segments
        let i = self.aoa.partition_point(|&a| a <= aoa_deg);
        i.saturating_sub(1).min(self.aoa.len() - 2)
    }
}

impl Polar for AirfoilTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn coefficients(&self, aoa_deg: f64) -> ActuatorResult<(f64, f64)> {
        if !aoa_deg.is_finite() {
            return Err(ActuatorError::NonFinite(format!(
                "angle of attack {aoa_deg} passed to polar '{}'",
                self.name
            )));
        }
        let (lo, hi) = self.aoa_range();
        let outside = aoa_deg < lo || aoa_deg > hi;
        let x = if outside {
            self.note_out_of_range(aoa_deg);
            match self.policy {
                AoaPolicy::Clamp => aoa_deg.clamp(lo, hi),
                AoaPolicy::Extrapolate => aoa_deg,
                AoaPolicy::Reject => {
                    return Err(ActuatorError::Polar {
                        polar: self.name.clone(),
                        message: format!("angle of attack {aoa_deg} outside [{lo}, {hi}]"),
                    })
                }
            }
        } else {
            aoa_deg
        };

        let i = self.segment(x);
        let t = (x - self.aoa[i]) / (self.aoa[i + 1] - self.aoa[i]);
        let cl = self.cl[i] + t * (self.cl[i + 1] - self.cl[i]);
        // a linear tail can dip below zero drag far outside the table
        let cd = (self.cd[i] + t * (self.cd[i + 1] - self.cd[i])).max(0.0);
        Ok((cl, cd))
    }
}

/// Thin-airfoil theory: cl = 2π sin(α), constant profile drag.
#[derive(Debug, Clone)]
pub struct ThinAirfoil {
    name: String,
    cd0: f64,
}

impl ThinAirfoil {
    pub fn new(name: &str, cd0: f64) -> ActuatorResult<Self> {
        if !cd0.is_finite() || cd0 < 0.0 {
            return Err(ActuatorError::Polar {
                polar: name.to_string(),
                message: format!("cd0 must be finite and >= 0, got {cd0}"),
            });
        }
        Ok(ThinAirfoil {
            name: name.to_string(),
            cd0,
        })
    }
}

impl Polar for ThinAirfoil {
    fn name(&self) -> &str {
        &self.name
    }

    fn coefficients(&self, aoa_deg: f64) -> ActuatorResult<(f64, f64)> {
        if !aoa_deg.is_finite() {
            return Err(ActuatorError::NonFinite(format!(
                "angle of attack {aoa_deg} passed to polar '{}'",
                self.name
            )));
        }
        let cl = 2.0 * std::f64::consts::PI * (aoa_deg * DEG2RAD).sin();
        Ok((cl, self.cd0))
    }
}

/// Named polars available to actuator constructors.
#[derive(Debug, Default, Clone)]
pub struct PolarLibrary {
    polars: HashMap<String, Arc<dyn Polar>>,
}

impl PolarLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[PolarConfig]) -> ActuatorResult<Self> {
        let mut lib = PolarLibrary::new();
        for cfg in configs {
            let polar: Arc<dyn Polar> = match &cfg.source {
                PolarSource::Table {
                    aoa,
                    cl,
                    cd,
                    extrapolation,
                } => Arc::new(AirfoilTable::new(
                    &cfg.name,
                    aoa.clone(),
                    cl.clone(),
                    cd.clone(),
                    *extrapolation,
                )?),
                PolarSource::File {
                    path,
                    extrapolation,
                } => Arc::new(AirfoilTable::from_file(&cfg.name, path, *extrapolation)?),
                PolarSource::ThinAirfoil { cd0 } => Arc::new(ThinAirfoil::new(&cfg.name, *cd0)?),
            };
            lib.insert(polar)?;
        }
        Ok(lib)
    }

    pub fn insert(&mut self, polar: Arc<dyn Polar>) -> ActuatorResult<()> {
        let name = polar.name().to_string();
        if self.polars.contains_key(&name) {
            return Err(ActuatorError::Polar {
                polar: name,
                message: "defined more than once".to_string(),
            });
        }
        self.polars.insert(name, polar);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.polars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polars.is_empty()
    }
}

impl AeroDataProvider for PolarLibrary {
    fn polar(&self, identifier: &str) -> Option<Arc<dyn Polar>> {
        self.polars.get(identifier).cloned()
    }
}
