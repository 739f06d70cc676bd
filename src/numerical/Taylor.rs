//! # Taylor-series method for `x' = f(t, x)`
//!
//! Fixed-step integrator driven by a [`DerivativeTable`]: at every step the table
//! entries `x', x'', ..., x^(N)` are evaluated at the current point and combined
//! into the truncated Taylor increment `sum_{k=1..N} h^k d_k / k!`.
//!
//! The increment is computed in nested (Horner) form,
//! `p = d_N*h/N`, then `p = (p + d_{k-1})*h/(k-1)` for `k = N..2`,
//! so neither factorials nor powers of `h` appear.
//!
//! A forward run adds the increment to `x` and `h` to `t`; a backward run subtracts
//! both. Results are always reported in ascending time.
//!
//!# Example
//! ```
//! use SymbTaylor::numerical::Taylor::{Direction, TaylorSolver};
//! use SymbTaylor::symbolic::symbolic_engine_derivatives::DerivativeTable;
//! // x' = x, x(0) = 1
//! let table = DerivativeTable::from_text("x", 4).unwrap();
//! let mut solver = TaylorSolver::new(&table);
//! solver.set_initial(0.0, 1.0, 0.1, 10, Direction::Forward).unwrap();
//! solver.solve().unwrap();
//! let solution = solver.get_result().unwrap();
//! let last = solution.records.last().unwrap();
//! assert!((last.x - 1f64.exp()).abs() < 1e-5);
//! ```
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_engine_derivatives::DerivativeTable;
use crate::symbolic::symbolic_errors::SymbolicError;
use csv::Writer;
use log::{info, warn};
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaylorError {
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
    #[error("derivative order must be at least 1, got {0}")]
    InvalidOrder(usize),
    #[error("step must be finite and non-zero, got {0}")]
    InvalidStep(f64),
    #[error("interval [{a}, {b}] is empty or not finite")]
    InvalidInterval { a: f64, b: f64 },
    #[error("right-hand side '{0}' must be a function of t and x only")]
    InvalidRhs(String),
    #[error("exact solution '{0}' must be a function of t only")]
    InvalidExact(String),
    #[error("initial value '{0}' must not depend on x")]
    InvalidInitial(String),
    #[error("task error: {0}")]
    Task(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// direction of integration; `1`/`2` are accepted as forward/backward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Direction {
    #[strum(to_string = "forward", serialize = "1")]
    Forward,
    #[strum(to_string = "backward", serialize = "2")]
    Backward,
}

/// one sample of the solution: `error = |exact - x|`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaylorRecord {
    pub t: f64,
    pub exact: Option<f64>,
    pub x: f64,
    pub error: Option<f64>,
}

impl TaylorRecord {
    pub fn is_finite(&self) -> bool {
        self.t.is_finite() && self.x.is_finite() && self.exact.is_none_or(f64::is_finite)
    }
}

/// time-ascending series of records
#[derive(Clone, Debug, PartialEq)]
pub struct TaylorSolution {
    pub records: Vec<TaylorRecord>,
    pub direction: Direction,
}

impl TaylorSolution {
    pub fn t_values(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.t).collect()
    }

    /// largest error over the series, `None` without an exact solution
    pub fn max_error(&self) -> Option<f64> {
        self.records
            .iter()
            .filter_map(|record| record.error)
            .reduce(f64::max)
    }

    /// the first record holding an infinite or NaN value
    pub fn first_non_finite(&self) -> Option<&TaylorRecord> {
        self.records.iter().find(|record| !record.is_finite())
    }

    /// writes `t, exact, taylor, error` columns; missing exact values are left empty
    pub fn save_result(&self, path: impl AsRef<Path>) -> Result<(), TaylorError> {
        let mut wtr = Writer::from_path(path.as_ref())?;
        wtr.write_record(["t", "exact", "taylor", "error"])?;
        let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        for record in &self.records {
            wtr.write_record([
                record.t.to_string(),
                optional(record.exact),
                record.x.to_string(),
                optional(record.error),
            ])?;
        }
        wtr.flush()?;
        info!("result saved to {}", path.as_ref().display());
        Ok(())
    }
}

pub struct TaylorSolver<'a> {
    table: &'a DerivativeTable,
    exact: Option<Expr>,
    t0: f64,
    x0: f64,
    h: f64,
    n_steps: usize,
    direction: Direction,
    pub t: f64,
    pub x: f64,
    status: String,
    result: Option<TaylorSolution>,
}

impl<'a> TaylorSolver<'a> {
    pub fn new(table: &'a DerivativeTable) -> TaylorSolver<'a> {
        TaylorSolver {
            table,
            exact: None,
            t0: 0.0,
            x0: 0.0,
            h: 1e-2,
            n_steps: 0,
            direction: Direction::Forward,
            t: 0.0,
            x: 0.0,
            status: "not started".to_string(),
            result: None,
        }
    }

    pub fn set_initial(
        &mut self,
        t0: f64,
        x0: f64,
        h: f64,
        n_steps: usize,
        direction: Direction,
    ) -> Result<(), TaylorError> {
        if !h.is_finite() || h == 0.0 {
            return Err(TaylorError::InvalidStep(h));
        }
        self.t0 = t0;
        self.x0 = x0;
        self.h = h;
        self.n_steps = n_steps;
        self.direction = direction;
        self.t = t0;
        self.x = x0;
        self.status = "running".to_string();
        self.result = None;
        Ok(())
    }

    /// exact solution as a function of `t`, used for the reference and error columns;
    /// it is evaluated with no state, so any `x` in it is rejected
    pub fn set_exact(&mut self, exact: Option<Expr>) -> Result<(), TaylorError> {
        if let Some(expr) = exact.as_ref().filter(|expr| expr.max_state_order().is_some()) {
            return Err(TaylorError::InvalidExact(expr.to_string()));
        }
        self.exact = exact;
        Ok(())
    }

    /// value of the exact solution at `t`
    fn exact_at(&self, t: f64) -> Result<Option<f64>, SymbolicError> {
        self.exact
            .as_ref()
            .map(|exact| exact.eval_expression(0.0, t))
            .transpose()
    }

    fn record(&self) -> Result<TaylorRecord, SymbolicError> {
        let exact = self.exact_at(self.t)?;
        Ok(TaylorRecord {
            t: self.t,
            exact,
            x: self.x,
            error: exact.map(|exact| (exact - self.x).abs()),
        })
    }

    /// truncated Taylor increment at the current point
    pub fn increment(&self) -> Result<f64, SymbolicError> {
        let d = self.table.evaluate_all(self.x, self.t)?;
        let n = d.len();
        let h = self.h;
        let mut p = d[n - 1] * h / n as f64;
        for k in (2..=n).rev() {
            p = (p + d[k - 2]) * h / (k - 1) as f64;
        }
        Ok(p)
    }

    pub fn step(&mut self) -> Result<(), SymbolicError> {
        let p = self.increment()?;
        match self.direction {
            Direction::Forward => {
                self.x += p;
                self.t += self.h;
            }
            Direction::Backward => {
                self.x -= p;
                self.t -= self.h;
            }
        }
        Ok(())
    }

    fn integrate(&mut self) -> Result<Vec<TaylorRecord>, SymbolicError> {
        let mut records = Vec::with_capacity(self.n_steps + 1);
        records.push(self.record()?);
        for _ in 0..self.n_steps {
            self.step()?;
            records.push(self.record()?);
        }
        Ok(records)
    }

    pub fn main_loop(&mut self) -> Result<(), TaylorError> {
        let mut records = match self.integrate() {
            Ok(records) => records,
            Err(err) => {
                self.status = "failed".to_string();
                return Err(err.into());
            }
        };
        if self.direction == Direction::Backward {
            records.reverse();
        }
        let solution = TaylorSolution {
            records,
            direction: self.direction,
        };
        if let Some(record) = solution.first_non_finite() {
            warn!(
                "non-finite value in the solution at t = {}: x = {}, exact = {:?}",
                record.t, record.x, record.exact
            );
        }
        self.status = "finished".to_string();
        self.result = Some(solution);
        Ok(())
    }

    pub fn solve(&mut self) -> Result<(), TaylorError> {
        info!(
            "Taylor method of order {}: {} steps of {} from t = {}, x = {} ({})",
            self.table.order(),
            self.n_steps,
            self.h,
            self.t0,
            self.x0,
            self.direction
        );
        self.t = self.t0;
        self.x = self.x0;
        self.main_loop()?;
        info!("Taylor method {}", self.status);
        Ok(())
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn get_result(&self) -> Option<&TaylorSolution> {
        self.result.as_ref()
    }

    pub fn save_result(&self, path: impl AsRef<Path>) -> Result<(), TaylorError> {
        match &self.result {
            Some(solution) => solution.save_result(path),
            None => Err(TaylorError::Task("nothing to save: the problem is not solved".to_string())),
        }
    }
}

/// One problem on `[a, b]`: the initial value is given at `a` for a forward run
/// and at `b` for a backward one.
#[derive(Clone, Debug, PartialEq)]
pub struct TaylorProblem {
    /// right-hand side `f(t, x)` of `x' = f`
    pub rhs: String,
    pub order: usize,
    pub a: f64,
    pub b: f64,
    pub h: f64,
    /// expression text evaluated at `t = 0, x = 0`
    pub initial: String,
    pub direction: Direction,
    /// exact solution as a function of `t`
    pub exact: Option<String>,
}

impl TaylorProblem {
    pub fn new(
        rhs: &str,
        order: usize,
        a: f64,
        b: f64,
        h: f64,
        initial: &str,
        direction: Direction,
    ) -> Self {
        TaylorProblem {
            rhs: rhs.to_string(),
            order,
            a,
            b,
            h,
            initial: initial.to_string(),
            direction,
            exact: None,
        }
    }

    pub fn with_exact(mut self, exact: &str) -> Self {
        self.exact = Some(exact.to_string());
        self
    }

    pub fn validate(&self) -> Result<(), TaylorError> {
        if self.order == 0 {
            return Err(TaylorError::InvalidOrder(self.order));
        }
        if !(self.a.is_finite() && self.b.is_finite() && self.a < self.b) {
            return Err(TaylorError::InvalidInterval {
                a: self.a,
                b: self.b,
            });
        }
        if !self.h.is_finite() || self.h <= 0.0 {
            return Err(TaylorError::InvalidStep(self.h));
        }
        Ok(())
    }

    /// `round((b - a)/h)`, so the series has `(b - a)/h + 1` samples
    pub fn steps(&self) -> Result<usize, TaylorError> {
        self.validate()?;
        Ok(((self.b - self.a) / self.h).round() as usize)
    }

    pub fn initial_value(&self) -> Result<f64, TaylorError> {
        let initial = Expr::parse_expression(&self.initial)?;
        if initial.max_state_order().is_some() {
            return Err(TaylorError::InvalidInitial(self.initial.clone()));
        }
        Ok(initial.eval_expression(0.0, 0.0)?)
    }

    /// `x'` and higher in the right-hand side are rejected before differentiating
    pub fn build_table(&self) -> Result<DerivativeTable, TaylorError> {
        self.validate()?;
        let rhs = Expr::parse_expression(&self.rhs)?;
        if rhs.max_state_order().is_some_and(|order| order >= 1) {
            return Err(TaylorError::InvalidRhs(self.rhs.clone()));
        }
        Ok(DerivativeTable::new(rhs, self.order)?)
    }

    /// builds the derivative table and integrates over the whole interval
    pub fn solve(&self) -> Result<(DerivativeTable, TaylorSolution), TaylorError> {
        let n_steps = self.steps()?;
        let x0 = self.initial_value()?;
        let exact = self
            .exact
            .as_deref()
            .map(Expr::parse_expression)
            .transpose()?;
        let table = self.build_table()?;
        let t0 = match self.direction {
            Direction::Forward => self.a,
            Direction::Backward => self.b,
        };
        let mut solver = TaylorSolver::new(&table);
        solver.set_initial(t0, x0, self.h, n_steps, self.direction)?;
        solver.set_exact(exact)?;
        solver.solve()?;
        let solution = solver
            .result
            .take()
            .ok_or_else(|| TaylorError::Task("solver finished without a result".to_string()))?;
        Ok((table, solution))
    }
}
