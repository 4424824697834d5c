use anyhow::Result;
use ::highs::{Col, HighsModelStatus, RowProblem};
use tracing::*;

use super::*;
use crate::model::{Cmp, Sense};

/// The HiGHS backend.
#[derive(Debug, Copy, Clone, Default)]
pub struct Highs {
    /// Seconds
    pub time_limit: Option<f64>,
}

impl MilpSolver for Highs {
    fn name(&self) -> &'static str { "highs" }

    #[instrument(level="debug", skip(self, program), fields(program=%program.name))]
    fn solve(&self, program: &Program) -> Result<SolveOutcome> {
        if let Some(status) = trivially_infeasible(program) {
            return Ok(SolveOutcome::without_solution(status));
        }

        let mut pb = RowProblem::new();
        let cols: Vec<Col> = program.vars().iter()
            .map(|v| pb.add_column_with_integrality(v.obj, v.lb..=v.ub, v.kind.is_integral()))
            .collect();

        for c in program.constrs().iter().filter(|c| !c.lhs.terms.is_empty()) {
            let terms: Vec<(Col, f64)> = c.lhs.terms.iter().map(|&(v, coef)| (cols[v.index()], coef)).collect();
            match c.cmp {
                Cmp::Le => pb.add_row(..=c.rhs, terms),
                Cmp::Ge => pb.add_row(c.rhs.., terms),
                Cmp::Eq => pb.add_row(c.rhs..=c.rhs, terms),
            }
        }

        let mut model = pb.optimise(match program.sense() {
            Sense::Minimize => ::highs::Sense::Minimise,
            Sense::Maximize => ::highs::Sense::Maximise,
        });
        model.set_option("output_flag", false);
        if let Some(t) = self.time_limit {
            model.set_option("time_limit", t);
        }

        debug!(vars=cols.len(), constrs=program.num_constrs(), "solving");
        let solved = model.solve();
        let status = match solved.status() {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => Status::Optimal,
            HighsModelStatus::Infeasible => Status::Infeasible,
            HighsModelStatus::Unbounded => Status::Unbounded,
            HighsModelStatus::ReachedTimeLimit => Status::TimeLimit,
            other => Status::Other(format!("{:?}", other)),
        };

        let outcome = match status {
            Status::Optimal | Status::TimeLimit => {
                let values = solved.get_solution().columns().to_vec();
                // a time-limited run may stop before the first incumbent
                if values.len() == cols.len() && values.iter().all(|x| x.is_finite()) {
                    SolveOutcome {
                        status,
                        objective: Some(solved.objective_value() + program.obj_constant()),
                        values: Some(values),
                    }
                } else {
                    SolveOutcome::without_solution(status)
                }
            },
            status => SolveOutcome::without_solution(status),
        };
        Ok(outcome)
    }
}
