use anyhow::{bail, Result};
use itertools::Itertools;
use tracing::*;

use crate::*;
use crate::solver::MilpSolver;
use crate::solution::SolvedModel;

pub mod program;
pub use program::{Program, Var, VarKind, LinExpr, Cmp, Sense, Constraint};

/// Index of a connectivity time step.
pub type Step = usize;

/// Fixed cost of any edge in use, and the per-distance factor of a core edge.
pub const EDGE_FIXED_COST: f64 = 10.0;
pub const CORE_COST_PER_DISTANCE: f64 = 10.0;

/// The weight `(0.1 * d)^1.5` charged per unit of flow along a sub edge of length `d`.
#[inline]
pub fn sub_flow_weight(distance: Distance) -> f64 {
    (0.1 * distance).powf(1.5)
}

/// The configuration scalars `Z` and `NC`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Config {
    /// `NC`: the number of core cities
    pub core_city_count: usize,
    /// `Z`: whether the core net is a cycle (`Z = 1`) or a path (`Z = 0`)
    pub core_net_is_cycle: bool,
}

impl Config {
    pub fn new(core_city_count: usize, core_net_is_cycle: bool) -> Self {
        Config { core_city_count, core_net_is_cycle }
    }

    pub fn from_z_nc(z: u32, nc: usize) -> Result<Self> {
        let cycle = match z {
            0 => false,
            1 => true,
            z => bail!("Z must be 0 (path) or 1 (cycle), got {}", z),
        };
        Ok(Config::new(nc, cycle))
    }

    #[inline]
    pub fn z(&self) -> u32 { self.core_net_is_cycle as u32 }

    /// The number of connectivity steps, `T = NC`.
    #[inline]
    pub fn steps(&self) -> usize { self.core_city_count }
}

/// A built, unsolved Autonomax model.
#[derive(Debug, Clone)]
pub struct AutonomaxModel<'a> {
    pub data: &'a AutonomaxInstance,
    pub config: Config,
    pub program: Program,
    pub edges: Vec<Edge>,
    pub is_control_center: Vec<Var>,
    pub is_core_edge: Map<Edge, Var>,
    pub is_core_city: Vec<Var>,
    pub is_connected_step: Map<(City, Step), Var>,
    pub is_connectable_step: Map<(Edge, Step), Var>,
    pub flow: Map<Edge, Var>,
    pub abs_flow: Map<Edge, Var>,
    pub is_sub_edge: Map<Edge, Var>,
    pub edge_cost: Map<Edge, Var>,
}

fn edge_vars(program: &mut Program, edges: &[Edge], name: &str, kind: VarKind, lb: f64, ub: f64) -> Map<Edge, Var> {
    edges.iter()
        .map(|&(i, j)| ((i, j), program.add_var(format!("{}[{},{}]", name, i, j), kind, lb, ub)))
        .collect()
}

fn city_vars(program: &mut Program, n: usize, name: &str) -> Vec<Var> {
    (0..n).map(|i| program.add_binary(format!("{}[{}]", name, i))).collect()
}

/// Build the model for `data` under `config`.  Construction is a pure function of its inputs;
/// feasibility is left for the solver to decide.
#[instrument(level="info", name="build_model", skip(data), fields(instance=%data.id, n=data.n_cities()))]
pub fn build<'a>(data: &'a AutonomaxInstance, config: Config) -> AutonomaxModel<'a> {
    let mut program = Program::new("autonomax");
    let cities = data.cities();
    let n = data.n_cities();
    let edges: Vec<Edge> = data.edges().collect();
    let total_demand = data.total_demand();
    let z = config.z() as f64;
    let t_max = config.steps();

    let is_control_center = city_vars(&mut program, n, "is_control_center");
    let is_core_edge = edge_vars(&mut program, &edges, "is_core_edge", VarKind::Binary, 0.0, 1.0);
    let is_core_city = city_vars(&mut program, n, "is_core_city");

    let is_connected_step: Map<_, _> = cities.clone()
        .cartesian_product(0..t_max)
        .map(|(i, t)| ((i, t), program.add_binary(format!("is_connected_step[{},{}]", i, t))))
        .collect();

    let is_connectable_step: Map<_, _> = edges.iter()
        .cartesian_product(1..t_max)
        .map(|(&(i, j), t)| (((i, j), t), program.add_binary(format!("is_connectable_step[{},{},{}]", i, j, t))))
        .collect();

    let flow = edge_vars(&mut program, &edges, "flow", VarKind::Continuous, -total_demand, total_demand);
    let abs_flow = edge_vars(&mut program, &edges, "abs_flow", VarKind::Continuous, 0.0, total_demand);
    let is_sub_edge = edge_vars(&mut program, &edges, "is_sub_edge", VarKind::Binary, 0.0, 1.0);
    let edge_cost = edge_vars(&mut program, &edges, "edge_cost", VarKind::Continuous, 0.0, f64::INFINITY);

    // core edges incident to city i
    let incident = |i: City| -> LinExpr {
        LinExpr::sum(cities.clone().filter(move |&j| j != i).map(|j| is_core_edge[&normalize(i, j)]))
    };

    program.add_constr(
        "one_control_center",
        LinExpr::sum(is_control_center.iter().copied()),
        Cmp::Eq, 1.0,
    );

    // The control center is one of the core cities
    program.add_constrs("control_center_directly_connected", cities.clone().map(|i|
        (i, LinExpr::from(is_core_city[i]).with_term(is_control_center[i], -1.0), Cmp::Ge, 0.0)
    ));

    // A city without adjacent core edges is not a core city
    program.add_constrs("core_city_ub", cities.clone().map(|i| {
        let mut lhs = LinExpr::from(is_core_city[i]);
        lhs.extend(incident(i).terms.into_iter().map(|(v, c)| (v, -c)));
        (i, lhs, Cmp::Le, 0.0)
    }));

    // A cycle has |V| = |E|, a path |V| = |E| + 1
    {
        let mut lhs = LinExpr::sum(is_core_city.iter().copied());
        lhs.extend(edges.iter().map(|e| (is_core_edge[e], -1.0)));
        program.add_constr("cycle_or_path", lhs, Cmp::Eq, 1.0 - z);
    }

    // Core cities have degree at most 2 in the core net
    program.add_constrs("disallow_core_tree", cities.clone().map(|i| {
        let mut lhs = LinExpr::new().with_term(is_core_city[i], 2.0);
        lhs.extend(incident(i).terms.into_iter().map(|(v, c)| (v, -c)));
        (i, lhs, Cmp::Ge, 0.0)
    }));

    program.add_constr(
        "exactly_nc_core_cities",
        LinExpr::sum(is_core_city.iter().copied()),
        Cmp::Eq, config.core_city_count as f64,
    );

    // Connectivity of the core net: at step 0 only the control center is connected; a city
    // becomes connected at step t through a core edge to a city connected at step t - 1.
    if t_max > 0 {
        program.add_constrs("control_center_is_connected", cities.clone().map(|i|
            (i, LinExpr::from(is_connected_step[&(i, 0)]).with_term(is_control_center[i], -1.0), Cmp::Eq, 0.0)
        ));
    }

    program.add_constrs("is_connectable", (1..t_max).cartesian_product(edges.iter()).map(|(t, &(i, j))| {
        let lhs = LinExpr::new()
            .with_term(is_connectable_step[&((i, j), t)], 2.0)
            .with_term(is_connected_step[&(i, t - 1)], -1.0)
            .with_term(is_connected_step[&(j, t - 1)], -1.0)
            .with_term(is_core_edge[&(i, j)], -1.0);
        (format!("{},{},{}", i, j, t), lhs, Cmp::Le, 0.0)
    }));

    program.add_constrs("is_connected_timestep", (1..t_max).cartesian_product(cities.clone()).map(|(t, i)| {
        let mut lhs = LinExpr::from(is_connected_step[&(i, t)]);
        lhs.extend(cities.clone()
            .filter(|&j| j != i)
            .map(|j| (is_connectable_step[&(normalize(i, j), t)], -1.0)));
        (format!("{},{}", i, t), lhs, Cmp::Le, 0.0)
    }));

    program.add_constrs("connected_graph", cities.clone().map(|i| {
        let mut lhs = LinExpr::sum((0..t_max).map(|t| is_connected_step[&(i, t)]));
        lhs.add_term(is_core_city[i], -1.0);
        (i, lhs, Cmp::Eq, 0.0)
    }));

    // All demand is routed to the control center.  Flow on (i, j) with i < j is positive
    // when it travels from i to j.
    program.add_constrs("conservation_of_flow", cities.clone().map(|i| {
        let mut lhs = LinExpr::new().with_term(is_control_center[i], total_demand);
        lhs.extend(cities.clone()
            .filter(|&j| j != i)
            .map(|j| (flow[&normalize(i, j)], if i > j { -1.0 } else { 1.0 })));
        (i, lhs, Cmp::Eq, data.demand(i))
    }));

    program.add_constrs("abs_flow_is_abs", edges.iter().flat_map(|&e| {
        let ge_pos = LinExpr::from(abs_flow[&e]).with_term(flow[&e], -1.0);
        let ge_neg = LinExpr::from(abs_flow[&e]).with_term(flow[&e], 1.0);
        vec![
            (format!("{},{},+", e.0, e.1), ge_pos, Cmp::Ge, 0.0),
            (format!("{},{},-", e.0, e.1), ge_neg, Cmp::Ge, 0.0),
        ]
    }));

    // Flow may only use sub or core edges
    program.add_constrs("force_edge_if_flow", edges.iter().map(|&e| {
        let lhs = LinExpr::new()
            .with_term(is_sub_edge[&e], total_demand)
            .with_term(is_core_edge[&e], total_demand)
            .with_term(abs_flow[&e], -1.0);
        (format!("{},{}", e.0, e.1), lhs, Cmp::Ge, 0.0)
    }));

    // Sub edges pay a fixed cost plus a distance-weighted flow cost; core edges are
    // released from this bound by the big-M term.
    program.add_constrs("edge_cost_lb", edges.iter().map(|&e| {
        let w = sub_flow_weight(data.distance(e.0, e.1));
        let big_m = EDGE_FIXED_COST + w * total_demand;
        let lhs = LinExpr::new()
            .with_term(edge_cost[&e], 1.0)
            .with_term(is_core_edge[&e], big_m)
            .with_term(is_sub_edge[&e], -EDGE_FIXED_COST)
            .with_term(abs_flow[&e], -w);
        (format!("{},{}", e.0, e.1), lhs, Cmp::Ge, 0.0)
    }));

    let objective: LinExpr = edges.iter()
        .flat_map(|e| vec![
            (edge_cost[e], 1.0),
            (is_core_edge[e], CORE_COST_PER_DISTANCE * data.distance(e.0, e.1)),
        ])
        .collect();
    program.set_objective(Sense::Minimize, objective);

    info!(vars=program.num_vars(), int_vars=program.num_int_vars(), constrs=program.num_constrs(), "model built");

    AutonomaxModel {
        data,
        config,
        program,
        edges,
        is_control_center,
        is_core_edge,
        is_core_city,
        is_connected_step,
        is_connectable_step,
        flow,
        abs_flow,
        is_sub_edge,
        edge_cost,
    }
}

impl<'a> AutonomaxModel<'a> {
    /// Hand the program to `solver` and wrap its outcome.
    #[instrument(level="info", skip(self, solver), fields(solver=solver.name()))]
    pub fn solve(self, solver: &dyn MilpSolver) -> Result<SolvedModel<'a>> {
        let outcome = solver.solve(&self.program)?;
        info!(status=?outcome.status, objective=?outcome.objective, "solve finished");
        if let Some(values) = outcome.values.as_ref() {
            let violated = self.program.violations(values, 1e-6);
            if !violated.is_empty() {
                warn!(count=violated.len(), first=violated[0], "solution violates the model");
            }
        }
        Ok(SolvedModel::new(self, outcome))
    }

    /// Write the program in LP format.
    pub fn write_lp(&self, w: impl std::io::Write) -> Result<()> {
        self.program.write_lp(w)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_test_logging;
    use proptest::prelude::*;

    fn expected_vars(c: usize, t: usize) -> usize {
        let e = c * (c - 1) / 2;
        c + e + c + c * t + e * t.saturating_sub(1) + 4 * e
    }

    fn expected_constrs(c: usize, t: usize) -> usize {
        let e = c * (c - 1) / 2;
        let t1 = t.saturating_sub(1);
        1 + c + c + 1 + c + 1
            + if t > 0 { c } else { 0 }
            + e * t1 + c * t1
            + c + c + 2 * e + e + e
    }

    #[test]
    fn config_fields() {
        let config = Config::new(5, false);
        assert_eq!(config.core_city_count, 5);
        assert_eq!(config.z(), 0);
        assert_eq!(config.steps(), 5);
        assert!(Config::new(3, true).core_net_is_cycle);
    }

    #[test]
    fn z_must_be_binary() {
        assert_eq!(Config::from_z_nc(1, 4).unwrap(), Config::new(4, true));
        assert_eq!(Config::from_z_nc(0, 4).unwrap().z(), 0);
        assert!(Config::from_z_nc(2, 4).is_err());
    }

    #[test]
    fn constraint_groups() {
        let _g = init_test_logging(None::<&str>);
        let data = small_instance(4);
        let model = build(&data, Config::new(3, false));
        let groups: Vec<_> = model.program.group_names().collect();
        assert_eq!(groups, vec![
            "one_control_center",
            "control_center_directly_connected",
            "core_city_ub",
            "cycle_or_path",
            "disallow_core_tree",
            "exactly_nc_core_cities",
            "control_center_is_connected",
            "is_connectable",
            "is_connected_timestep",
            "connected_graph",
            "conservation_of_flow",
            "abs_flow_is_abs",
            "force_edge_if_flow",
            "edge_cost_lb",
        ]);
        assert_eq!(model.program.constr_group("conservation_of_flow").unwrap().len(), 4);
        assert_eq!(model.program.constr_group("is_connectable").unwrap().len(), 6 * 2);
    }

    #[test]
    fn objective_coefficients() {
        let data = small_instance(3);
        let model = build(&data, Config::new(2, false));
        for &e in &model.edges {
            let d = data.distance(e.0, e.1);
            assert_eq!(model.program.var(model.is_core_edge[&e]).obj, 10.0 * d);
            assert_eq!(model.program.var(model.edge_cost[&e]).obj, 1.0);
            assert_eq!(model.program.var(model.flow[&e]).obj, 0.0);
        }
        assert_eq!(model.program.sense(), Sense::Minimize);
    }

    #[test]
    fn flow_bounds_follow_total_demand() {
        let data = small_instance(3);
        let model = build(&data, Config::new(2, true));
        let f = model.program.var(model.flow[&(0, 2)]);
        assert_eq!((f.lb, f.ub), (-3.0, 3.0));
        let cycle = &model.program.constr_group("cycle_or_path").unwrap()[0];
        assert_eq!(cycle.rhs, 0.0);
    }

    #[test]
    fn conservation_of_flow_signs() {
        let data = small_instance(3);
        let model = build(&data, Config::new(2, false));
        let c = &model.program.constr_group("conservation_of_flow").unwrap()[1];
        // city 1: B * cc[1] - flow[0,1] + flow[1,2] = d[1]
        let coef = |v: Var| c.lhs.terms.iter().find(|(u, _)| *u == v).map(|&(_, x)| x);
        assert_eq!(coef(model.is_control_center[1]), Some(3.0));
        assert_eq!(coef(model.flow[&(0, 1)]), Some(-1.0));
        assert_eq!(coef(model.flow[&(1, 2)]), Some(1.0));
        assert_eq!(coef(model.flow[&(0, 2)]), None);
        assert_eq!(c.rhs, 1.0);
    }

    #[test]
    fn build_is_deterministic() {
        let data = small_instance(5);
        let config = Config::new(3, true);
        let (a, b) = (build(&data, config), build(&data, config));
        let mut lp_a = Vec::new();
        let mut lp_b = Vec::new();
        a.write_lp(&mut lp_a).unwrap();
        b.write_lp(&mut lp_b).unwrap();
        assert_eq!(a.program.num_vars(), b.program.num_vars());
        assert_eq!(a.program.num_constrs(), b.program.num_constrs());
        assert_eq!(lp_a, lp_b);
    }

    #[test]
    fn zero_core_cities_has_no_steps() {
        let data = small_instance(3);
        let model = build(&data, Config::new(0, false));
        assert!(model.is_connected_step.is_empty());
        assert!(model.program.constr_group("control_center_is_connected").is_none());
        assert_eq!(model.program.num_vars(), expected_vars(3, 0));
        assert_eq!(model.program.num_constrs(), expected_constrs(3, 0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]
        #[test]
        fn model_size(n in 2..9usize, nc in 0..6usize, cycle in any::<bool>()) {
            let data = small_instance(n);
            let model = build(&data, Config::new(nc, cycle));
            prop_assert_eq!(model.program.num_vars(), expected_vars(n, nc));
            prop_assert_eq!(model.program.num_constrs(), expected_constrs(n, nc));
            let e = n * (n - 1) / 2;
            prop_assert_eq!(model.program.num_int_vars(), n + e + n + n * nc + e * nc.saturating_sub(1) + e);
        }
    }
}

#[cfg(test)]
pub(crate) fn small_instance(n: usize) -> AutonomaxInstance {
    use instances::dataset::Dataset;
    instances::dataset::autonomax::SWEDEN
        .load_instance(0)
        .expect("built-in uniform scenario")
        .truncate(n)
}
