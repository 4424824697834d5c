//! The solve step.  A [`MilpSolver`] takes a [`Program`] and reports a status, the objective
//! and the variable assignment.  Infeasibility is a status, not an error.
use std::fmt;
use std::str::FromStr;
use anyhow::{anyhow, Result};

use crate::model::Program;

mod microlp;
pub use self::microlp::Microlp;

#[cfg(feature = "highs")]
mod highs;
#[cfg(feature = "highs")]
pub use self::highs::Highs;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped early; a feasible assignment may still be available.
    TimeLimit,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Optimal => "optimal",
            Status::Infeasible => "infeasible",
            Status::Unbounded => "unbounded",
            Status::TimeLimit => "time-limit",
            Status::Other(s) => s,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: Status,
    pub objective: Option<f64>,
    /// One value per variable of the program, indexed by [`Var::index`](crate::model::Var::index)
    pub values: Option<Vec<f64>>,
}

impl SolveOutcome {
    pub fn without_solution(status: Status) -> Self {
        SolveOutcome { status, objective: None, values: None }
    }
}

pub trait MilpSolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Solve `program`, blocking until the backend returns.  Only backend failures are `Err`.
    fn solve(&self, program: &Program) -> Result<SolveOutcome>;
}

/// Returns `Some(status)` if a constraint without terms can never hold.
fn trivially_infeasible(program: &Program) -> Option<Status> {
    program.constrs().iter()
        .find(|c| c.lhs.terms.is_empty() && !c.cmp.holds(0.0, c.rhs, 1e-9))
        .map(|_| Status::Infeasible)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Backend {
    Microlp,
    Highs,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "microlp" => Ok(Backend::Microlp),
            "highs" => Ok(Backend::Highs),
            _ => Err(anyhow!("unknown solver backend `{}`, expected one of: microlp, highs", s)),
        }
    }
}

/// Beyond this many cities `microlp` takes impractically long to prove optimality.
pub const MICROLP_MAX_CITIES: usize = 8;

impl Default for Backend {
    #[cfg(feature = "highs")]
    fn default() -> Self { Backend::Highs }

    #[cfg(not(feature = "highs"))]
    fn default() -> Self { Backend::Microlp }
}

impl Backend {
    /// Whether the backend can be expected to solve an instance with `n_cities` cities.
    pub fn is_practical(self, n_cities: usize) -> bool {
        match self {
            Backend::Microlp => n_cities <= MICROLP_MAX_CITIES,
            Backend::Highs => true,
        }
    }

    /// Instantiate the backend.  `time_limit` is in seconds.
    pub fn solver(self, time_limit: Option<f64>) -> Result<Box<dyn MilpSolver>> {
        match self {
            Backend::Microlp => {
                if time_limit.is_some() {
                    tracing::warn!("microlp does not support a time limit, ignoring it");
                }
                Ok(Box::new(Microlp))
            }
            #[cfg(feature = "highs")]
            Backend::Highs => Ok(Box::new(Highs { time_limit })),
            #[cfg(not(feature = "highs"))]
            Backend::Highs => Err(anyhow!("built without HiGHS support, rebuild with `--features highs`")),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cmp, LinExpr, Sense, VarKind};

    /// max x1 + 0.64 x2 s.t. 50 x1 + 31 x2 <= 250, 3 x1 - 2 x2 >= -4, x integer >= 0
    pub(super) fn milo1() -> Program {
        let mut p = Program::new("milo1");
        let x1 = p.add_var("x1".to_string(), VarKind::Integer, 0.0, f64::INFINITY);
        let x2 = p.add_var("x2".to_string(), VarKind::Integer, 0.0, f64::INFINITY);
        p.add_constr("c1", LinExpr::new().with_term(x1, 50.0).with_term(x2, 31.0), Cmp::Le, 250.0);
        p.add_constr("c2", LinExpr::new().with_term(x1, 3.0).with_term(x2, -2.0), Cmp::Ge, -4.0);
        p.set_objective(Sense::Maximize, LinExpr::new().with_term(x1, 1.0).with_term(x2, 0.64));
        p
    }

    pub(super) fn infeasible() -> Program {
        let mut p = Program::new("infeasible");
        let x = p.add_continuous("x".to_string(), 0.0, 10.0);
        let y = p.add_binary("y".to_string());
        p.add_constr("lo", LinExpr::new().with_term(x, 1.0).with_term(y, 1.0), Cmp::Ge, 12.0);
        p.set_objective(Sense::Minimize, LinExpr::from(x));
        p
    }

    pub(super) fn unbounded() -> Program {
        let mut p = Program::new("unbounded");
        let x = p.add_continuous("x".to_string(), 0.0, f64::INFINITY);
        let y = p.add_continuous("y".to_string(), 0.0, f64::INFINITY);
        p.add_constr("c", LinExpr::new().with_term(x, 1.0).with_term(y, -1.0), Cmp::Le, 1.0);
        p.set_objective(Sense::Maximize, LinExpr::new().with_term(x, 1.0).with_term(y, 1.0));
        p
    }

    #[test]
    fn parse_backend() {
        assert_eq!("microlp".parse::<Backend>().unwrap(), Backend::Microlp);
        assert_eq!("HiGHS".parse::<Backend>().unwrap(), Backend::Highs);
        assert!("gurobi".parse::<Backend>().is_err());
    }

    #[test]
    fn default_backend() {
        let expected = if cfg!(feature = "highs") { Backend::Highs } else { Backend::Microlp };
        assert_eq!(Backend::default(), expected);
    }

    #[test]
    fn microlp_size_limit() {
        assert!(Backend::Microlp.is_practical(MICROLP_MAX_CITIES));
        assert!(!Backend::Microlp.is_practical(41));
        assert!(Backend::Highs.is_practical(41));
    }

    #[test]
    fn empty_constraint() {
        let mut p = Program::new("empty");
        let x = p.add_binary("x".to_string());
        p.add_constr("never", LinExpr::new().with_term(x, 0.0), Cmp::Ge, 1.0);
        assert_eq!(trivially_infeasible(&p), Some(Status::Infeasible));
        let outcome = Microlp.solve(&p).unwrap();
        assert_eq!(outcome.status, Status::Infeasible);
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::TimeLimit.to_string(), "time-limit");
        assert_eq!(Status::Other("interrupted".into()).to_string(), "interrupted");
    }
}
