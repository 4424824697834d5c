use anyhow::{bail, Result};
use itertools::Itertools;

use crate::*;
use crate::model::{AutonomaxModel, Var};
use crate::solver::{SolveOutcome, Status};

/// Values closer to zero than this are treated as zero.
pub const ZERO_TOL: f64 = 1e-6;

/// A model together with what the solver made of it.
#[derive(Debug, Clone)]
pub struct SolvedModel<'a> {
    pub model: AutonomaxModel<'a>,
    pub outcome: SolveOutcome,
}

impl<'a> SolvedModel<'a> {
    pub fn new(model: AutonomaxModel<'a>, outcome: SolveOutcome) -> Self {
        SolvedModel { model, outcome }
    }

    pub fn status(&self) -> &Status { &self.outcome.status }

    pub fn objective(&self) -> Option<f64> { self.outcome.objective }

    pub fn is_optimal(&self) -> bool { self.outcome.status == Status::Optimal }

    /// The assignment, if the solver produced one.
    pub fn solution(&self) -> Option<Solution<'_>> {
        self.outcome.values.as_deref().map(|values| Solution { model: &self.model, values })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EdgeKind {
    Core,
    Sub,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Core => "CORE",
            EdgeKind::Sub => "SUB",
        }
    }
}

/// An edge in use.  `from` and `to` follow the direction of the flow, so `flow >= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    pub from: City,
    pub to: City,
    pub kind: EdgeKind,
    pub flow: f64,
    pub cost: f64,
    pub distance: Distance,
    /// Fraction of the total demand carried by this edge
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityInfo {
    pub index: City,
    pub name: String,
    pub is_core_city: bool,
    pub is_control_center: bool,
    pub demand: Demand,
    pub ingoing_flow: f64,
    pub outgoing_flow: f64,
}

/// Read-only view of a variable assignment.
#[derive(Debug, Copy, Clone)]
pub struct Solution<'s> {
    pub model: &'s AutonomaxModel<'s>,
    pub values: &'s [f64],
}

impl<'s> Solution<'s> {
    #[inline]
    pub fn value(&self, v: Var) -> f64 { self.values[v.index()] }

    #[inline]
    fn is_set(&self, v: Var) -> bool { self.value(v) > 0.5 }

    pub fn objective(&self) -> f64 { self.model.program.objective_value(self.values) }

    pub fn core_edges(&self) -> Vec<Edge> {
        self.model.edges.iter().copied().filter(|e| self.is_set(self.model.is_core_edge[e])).collect()
    }

    pub fn core_cities(&self) -> Vec<City> {
        self.model.data.cities().filter(|&i| self.is_set(self.model.is_core_city[i])).collect()
    }

    pub fn control_center(&self) -> Option<City> {
        self.model.data.cities().find(|&i| self.is_set(self.model.is_control_center[i]))
    }

    /// Flow along `(i, j)`, positive from `i` to `j`, in either orientation.
    pub fn flow(&self, i: City, j: City) -> f64 {
        let f = self.value(self.model.flow[&normalize(i, j)]);
        if i < j { f } else { -f }
    }

    /// Every core edge and every edge carrying flow, sorted by `(from, to)`.
    pub fn edge_info(&self) -> Vec<EdgeInfo> {
        let m = self.model;
        let total_demand = m.data.total_demand();
        m.edges.iter()
            .filter_map(|&(i, j)| {
                let e = (i, j);
                let core = self.is_set(m.is_core_edge[&e]);
                let flow = self.value(m.flow[&e]);
                if !core && flow.abs() <= ZERO_TOL {
                    return None;
                }
                let (from, to) = if flow < 0.0 { (j, i) } else { (i, j) };
                let distance = m.data.distance(i, j);
                let core_cost = if core { model::CORE_COST_PER_DISTANCE * distance } else { 0.0 };
                Some(EdgeInfo {
                    from,
                    to,
                    kind: if core { EdgeKind::Core } else { EdgeKind::Sub },
                    flow: flow.abs(),
                    cost: core_cost + self.value(m.edge_cost[&e]),
                    distance,
                    utilization: if total_demand > 0.0 { flow.abs() / total_demand } else { 0.0 },
                })
            })
            .sorted_by_key(|e| (e.from, e.to))
            .collect()
    }

    pub fn city_info(&self) -> Vec<CityInfo> {
        let m = self.model;
        m.data.cities()
            .map(|i| {
                let (mut ingoing_flow, mut outgoing_flow) = (0.0, 0.0);
                for j in m.data.cities().filter(|&j| j != i) {
                    let f = self.flow(j, i);
                    if f > 0.0 { ingoing_flow += f } else { outgoing_flow -= f }
                }
                CityInfo {
                    index: i,
                    name: m.data.names[i].clone(),
                    is_core_city: self.is_set(m.is_core_city[i]),
                    is_control_center: self.is_set(m.is_control_center[i]),
                    demand: m.data.demand(i),
                    ingoing_flow,
                    outgoing_flow,
                }
            })
            .collect()
    }

    /// The core cities in route order.  A cycle starts at the control center, a path at
    /// its lower-indexed end.
    pub fn core_route(&self) -> Result<Vec<City>> {
        let edges = self.core_edges();
        let cities = self.core_cities();
        let mut adj: Map<City, Vec<City>> = Map::default();
        for &(i, j) in &edges {
            adj.entry(i).or_default().push(j);
            adj.entry(j).or_default().push(i);
        }
        for nbrs in adj.values_mut() {
            nbrs.sort_unstable();
        }
        if cities.is_empty() {
            return Ok(Vec::new());
        }
        if adj.values().any(|nbrs| nbrs.len() > 2) {
            bail!("core net is not a path or cycle");
        }

        let is_cycle = !edges.is_empty() && edges.len() == cities.len();
        let start = if is_cycle {
            match self.control_center() {
                Some(cc) => cc,
                None => bail!("no control center"),
            }
        } else {
            match cities.iter().copied().find(|i| adj.get(i).map_or(0, Vec::len) <= 1) {
                Some(end) => end,
                None => bail!("core path has no end point"),
            }
        };

        let mut route = vec![start];
        let mut prev = None;
        let mut current = start;
        loop {
            let next = adj.get(&current)
                .and_then(|nbrs| nbrs.iter().copied().find(|&n| Some(n) != prev));
            match next {
                Some(n) if n != start => {
                    route.push(n);
                    prev = Some(current);
                    current = n;
                },
                _ => break,
            }
            if route.len() > cities.len() {
                bail!("core net contains a sub-cycle");
            }
        }
        if route.len() != cities.len() || !route.iter().all(|c| cities.contains(c)) {
            bail!("core net is disconnected");
        }
        Ok(route)
    }

    /// Inflow minus outflow at each city, which should equal `B` at the control center
    /// and `-d_i` elsewhere.
    pub fn net_inflow(&self) -> Vec<f64> {
        self.city_info().iter().map(|c| c.ingoing_flow - c.outgoing_flow).collect()
    }
}
