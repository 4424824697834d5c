use anyhow::{anyhow, Result};
use ::microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use tracing::*;

use super::*;
use crate::model::{Cmp, Sense, VarKind};

/// The pure-Rust `microlp` backend.  Fine for small instances; no time limit.
#[derive(Debug, Copy, Clone, Default)]
pub struct Microlp;

fn int_bound(x: f64) -> i32 {
    if x.is_finite() { x.round().max(i32::MIN as f64).min(i32::MAX as f64) as i32 }
    else if x > 0.0 { i32::MAX }
    else { i32::MIN }
}

impl MilpSolver for Microlp {
    fn name(&self) -> &'static str { "microlp" }

    #[instrument(level="debug", skip(self, program), fields(program=%program.name))]
    fn solve(&self, program: &Program) -> Result<SolveOutcome> {
        if let Some(status) = trivially_infeasible(program) {
            return Ok(SolveOutcome::without_solution(status));
        }

        let mut problem = Problem::new(match program.sense() {
            Sense::Minimize => OptimizationDirection::Minimize,
            Sense::Maximize => OptimizationDirection::Maximize,
        });

        let vars: Vec<Variable> = program.vars().iter()
            .map(|v| match v.kind {
                VarKind::Binary => problem.add_binary_var(v.obj),
                VarKind::Integer => problem.add_integer_var(v.obj, (int_bound(v.lb), int_bound(v.ub))),
                VarKind::Continuous => problem.add_var(v.obj, (v.lb, v.ub)),
            })
            .collect();

        for c in program.constrs().iter().filter(|c| !c.lhs.terms.is_empty()) {
            let cmp = match c.cmp {
                Cmp::Le => ComparisonOp::Le,
                Cmp::Ge => ComparisonOp::Ge,
                Cmp::Eq => ComparisonOp::Eq,
            };
            // terms are canonical, so each variable appears once
            let expr: LinearExpr = c.lhs.terms.iter().map(|&(v, coef)| (vars[v.index()], coef)).collect();
            problem.add_constraint(expr, cmp, c.rhs);
        }

        debug!(vars=vars.len(), constrs=program.num_constrs(), "solving");
        match problem.solve() {
            Ok(sol) => {
                // integral variables come back with simplex round-off
                let values: Vec<f64> = vars.iter().zip(program.vars())
                    .map(|(&v, info)| if info.kind.is_integral() { sol[v].round() } else { sol[v] })
                    .collect();
                trace!(raw_objective=sol.objective(), "rounded integral values");
                Ok(SolveOutcome {
                    status: Status::Optimal,
                    objective: Some(program.objective_value(&values)),
                    values: Some(values),
                })
            },
            Err(::microlp::Error::Infeasible) => Ok(SolveOutcome::without_solution(Status::Infeasible)),
            Err(::microlp::Error::Unbounded) => Ok(SolveOutcome::without_solution(Status::Unbounded)),
            Err(e) => Err(anyhow!("microlp failed: {}", e)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::tests::{milo1, infeasible, unbounded};

    #[test]
    fn solve_milo1() -> Result<()> {
        let p = milo1();
        let outcome = Microlp.solve(&p)?;
        assert_eq!(outcome.status, Status::Optimal);
        let obj = outcome.objective.unwrap();
        assert!((obj - 5.0).abs() < 1e-6, "objective {}", obj);
        let values = outcome.values.unwrap();
        assert!((values[0] - 5.0).abs() < 1e-6);
        assert!(values[1].abs() < 1e-6);
        assert!(p.violations(&values, 1e-6).is_empty());
        Ok(())
    }

    #[test]
    fn solve_infeasible() -> Result<()> {
        let outcome = Microlp.solve(&infeasible())?;
        assert_eq!(outcome.status, Status::Infeasible);
        assert!(outcome.values.is_none());
        Ok(())
    }

    #[test]
    fn solve_unbounded() -> Result<()> {
        let outcome = Microlp.solve(&unbounded())?;
        assert_eq!(outcome.status, Status::Unbounded);
        assert_eq!(outcome.objective, None);
        Ok(())
    }

    #[test]
    fn integral_values_are_exact() -> Result<()> {
        let p = milo1();
        let values = Microlp.solve(&p)?.values.unwrap();
        for (x, v) in values.iter().zip(p.vars()) {
            assert!(v.kind.is_integral());
            assert_eq!(*x, x.round());
        }
        assert_eq!(p.objective_value(&values), 5.0);
        Ok(())
    }

    #[test]
    fn integer_bounds_saturate() {
        assert_eq!(int_bound(f64::INFINITY), i32::MAX);
        assert_eq!(int_bound(-f64::INFINITY), i32::MIN);
        assert_eq!(int_bound(2.0), 2);
    }
}
