//! A solver-neutral container for mixed-integer linear programs.
//!
//! Variables and constraints are stored by name, the latter grouped so a whole family
//! (eg. `conservation_of_flow`) can be inspected at once.  Backends in [`crate::solver`]
//! translate a [`Program`] into whatever their solver expects.
use std::fmt;
use std::io::{self, Write};
use std::ops::Range;
use itertools::Itertools;

use crate::Map;

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct Var(usize);

impl Var {
    #[inline]
    pub fn index(&self) -> usize { self.0 }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

impl VarKind {
    pub fn is_integral(&self) -> bool {
        !matches!(self, VarKind::Continuous)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub name: String,
    pub kind: VarKind,
    pub lb: f64,
    pub ub: f64,
    /// Objective coefficient
    pub obj: f64,
}

/// A linear expression `sum(coef * var) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    pub terms: Vec<(Var, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self { Self::default() }

    pub fn add_term(&mut self, var: Var, coef: f64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    pub fn add_constant(&mut self, c: f64) -> &mut Self {
        self.constant += c;
        self
    }

    pub fn with_term(mut self, var: Var, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn with_constant(mut self, c: f64) -> Self {
        self.constant += c;
        self
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item=Var>) -> Self {
        vars.into_iter().map(|v| (v, 1.0)).collect()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.0]).sum::<f64>() + self.constant
    }

    /// Merge duplicate variables and drop zero coefficients.  Terms end up sorted by variable.
    fn canonicalize(&mut self) {
        let terms = std::mem::take(&mut self.terms);
        self.terms = terms.into_iter()
            .sorted_by_key(|&(v, _)| v)
            .coalesce(|a, b| if a.0 == b.0 { Ok((a.0, a.1 + b.1)) } else { Err((a, b)) })
            .filter(|&(_, c)| c != 0.0)
            .collect();
    }
}

impl std::iter::FromIterator<(Var, f64)> for LinExpr {
    fn from_iter<I: IntoIterator<Item=(Var, f64)>>(iter: I) -> Self {
        LinExpr { terms: iter.into_iter().collect(), constant: 0.0 }
    }
}

impl Extend<(Var, f64)> for LinExpr {
    fn extend<I: IntoIterator<Item=(Var, f64)>>(&mut self, iter: I) {
        self.terms.extend(iter)
    }
}

impl From<Var> for LinExpr {
    fn from(v: Var) -> Self { LinExpr { terms: vec![(v, 1.0)], constant: 0.0 } }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

impl Cmp {
    pub fn holds(&self, lhs: f64, rhs: f64, tol: f64) -> bool {
        match self {
            Cmp::Le => lhs <= rhs + tol,
            Cmp::Ge => lhs >= rhs - tol,
            Cmp::Eq => (lhs - rhs).abs() <= tol,
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cmp::Le => "<=",
            Cmp::Ge => ">=",
            Cmp::Eq => "=",
        })
    }
}

/// A constraint `lhs cmp rhs`.  The constant of `lhs` is always folded into `rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub lhs: LinExpr,
    pub cmp: Cmp,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        self.cmp.holds(self.lhs.evaluate(values), self.rhs, tol)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    vars: Vec<VarInfo>,
    var_names: Map<String, Var>,
    constrs: Vec<Constraint>,
    groups: Vec<(String, Range<usize>)>,
    sense: Sense,
    obj_constant: f64,
}

impl Program {
    pub fn new(name: &str) -> Self {
        Program {
            name: name.to_string(),
            vars: Vec::new(),
            var_names: Map::default(),
            constrs: Vec::new(),
            groups: Vec::new(),
            sense: Sense::Minimize,
            obj_constant: 0.0,
        }
    }

    pub fn add_var(&mut self, name: String, kind: VarKind, lb: f64, ub: f64) -> Var {
        let (lb, ub) = match kind {
            VarKind::Binary => (lb.max(0.0), ub.min(1.0)),
            _ => (lb, ub),
        };
        let v = Var(self.vars.len());
        debug_assert!(!self.var_names.contains_key(&name), "duplicate variable name {}", name);
        self.var_names.insert(name.clone(), v);
        self.vars.push(VarInfo { name, kind, lb, ub, obj: 0.0 });
        v
    }

    #[inline]
    pub fn add_binary(&mut self, name: String) -> Var {
        self.add_var(name, VarKind::Binary, 0.0, 1.0)
    }

    #[inline]
    pub fn add_continuous(&mut self, name: String, lb: f64, ub: f64) -> Var {
        self.add_var(name, VarKind::Continuous, lb, ub)
    }

    fn push_constr(&mut self, name: String, mut lhs: LinExpr, cmp: Cmp, rhs: f64) {
        lhs.canonicalize();
        let rhs = rhs - lhs.constant;
        lhs.constant = 0.0;
        self.constrs.push(Constraint { name, lhs, cmp, rhs });
    }

    /// Add a single constraint, registered as a group of its own.
    pub fn add_constr(&mut self, name: &str, lhs: LinExpr, cmp: Cmp, rhs: f64) -> Range<usize> {
        let start = self.constrs.len();
        self.push_constr(name.to_string(), lhs, cmp, rhs);
        self.groups.push((name.to_string(), start..self.constrs.len()));
        start..self.constrs.len()
    }

    /// Add a family of constraints.  Each item carries the index label used to name the
    /// constraint, eg. `"3"` becomes `group[3]`.
    pub fn add_constrs<L: fmt::Display>(
        &mut self,
        group: &str,
        constrs: impl IntoIterator<Item=(L, LinExpr, Cmp, f64)>,
    ) -> Range<usize> {
        let start = self.constrs.len();
        for (label, lhs, cmp, rhs) in constrs {
            self.push_constr(format!("{}[{}]", group, label), lhs, cmp, rhs);
        }
        self.groups.push((group.to_string(), start..self.constrs.len()));
        start..self.constrs.len()
    }

    /// Set the objective, replacing any previous one.
    pub fn set_objective(&mut self, sense: Sense, mut expr: LinExpr) {
        expr.canonicalize();
        for v in &mut self.vars {
            v.obj = 0.0;
        }
        for (v, c) in expr.terms {
            self.vars[v.0].obj = c;
        }
        self.obj_constant = expr.constant;
        self.sense = sense;
    }

    pub fn sense(&self) -> Sense { self.sense }

    pub fn obj_constant(&self) -> f64 { self.obj_constant }

    pub fn vars(&self) -> &[VarInfo] { &self.vars }

    pub fn var(&self, v: Var) -> &VarInfo { &self.vars[v.0] }

    pub fn var_by_name(&self, name: &str) -> Option<Var> { self.var_names.get(name).copied() }

    pub fn constrs(&self) -> &[Constraint] { &self.constrs }

    pub fn constr_group(&self, name: &str) -> Option<&[Constraint]> {
        self.groups.iter()
            .find(|(g, _)| g == name)
            .map(|(_, r)| &self.constrs[r.clone()])
    }

    pub fn group_names(&self) -> impl Iterator<Item=&str> {
        self.groups.iter().map(|(g, _)| g.as_str())
    }

    pub fn num_vars(&self) -> usize { self.vars.len() }

    pub fn num_int_vars(&self) -> usize { self.vars.iter().filter(|v| v.kind.is_integral()).count() }

    pub fn num_constrs(&self) -> usize { self.constrs.len() }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.vars.iter().zip(values).map(|(v, x)| v.obj * x).sum::<f64>() + self.obj_constant
    }

    /// Names of constraints and variable bounds violated by `values` by more than `tol`.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<&str> {
        let bounds = self.vars.iter().zip(values)
            .filter(|&(v, &x)| x < v.lb - tol || x > v.ub + tol
                || (v.kind.is_integral() && (x - x.round()).abs() > tol))
            .map(|(v, _)| v.name.as_str());
        let constrs = self.constrs.iter()
            .filter(|c| !c.is_satisfied(values, tol))
            .map(|c| c.name.as_str());
        bounds.chain(constrs).collect()
    }

    /// Write the program in CPLEX LP format.
    pub fn write_lp(&self, mut w: impl Write) -> io::Result<()> {
        fn write_terms(w: &mut impl Write, program: &Program, terms: &[(Var, f64)]) -> io::Result<()> {
            if terms.is_empty() {
                return write!(w, " 0 {}", program.vars.first().map(|v| v.name.as_str()).unwrap_or(""));
            }
            for (k, &(v, c)) in terms.iter().enumerate() {
                let sign = if c < 0.0 { " -" } else if k > 0 { " +" } else { "" };
                write!(w, "{} {} {}", sign, c.abs(), program.vars[v.0].name)?;
            }
            Ok(())
        }

        writeln!(w, "\\ Problem name: {}", self.name)?;
        writeln!(w, "{}", match self.sense { Sense::Minimize => "Minimize", Sense::Maximize => "Maximize" })?;
        write!(w, " obj:")?;
        let obj_terms: Vec<_> = self.vars.iter().enumerate()
            .filter(|(_, v)| v.obj != 0.0)
            .map(|(k, v)| (Var(k), v.obj))
            .collect();
        write_terms(&mut w, self, &obj_terms)?;
        if self.obj_constant != 0.0 {
            write!(w, " + {}", self.obj_constant)?;
        }
        writeln!(w)?;

        writeln!(w, "Subject To")?;
        for c in &self.constrs {
            write!(w, " {}:", c.name)?;
            write_terms(&mut w, self, &c.lhs.terms)?;
            writeln!(w, " {} {}", c.cmp, c.rhs)?;
        }

        writeln!(w, "Bounds")?;
        for v in self.vars.iter().filter(|v| v.kind != VarKind::Binary) {
            match (v.lb.is_finite(), v.ub.is_finite()) {
                (false, false) => writeln!(w, " {} free", v.name)?,
                (true, true) => writeln!(w, " {} <= {} <= {}", v.lb, v.name, v.ub)?,
                (true, false) => writeln!(w, " {} >= {}", v.name, v.lb)?,
                (false, true) => writeln!(w, " -inf <= {} <= {}", v.name, v.ub)?,
            }
        }

        let binaries = self.vars.iter().filter(|v| v.kind == VarKind::Binary).map(|v| &v.name).collect_vec();
        if !binaries.is_empty() {
            writeln!(w, "Binaries")?;
            for chunk in binaries.chunks(8) {
                writeln!(w, " {}", chunk.iter().join(" "))?;
            }
        }
        let generals = self.vars.iter().filter(|v| v.kind == VarKind::Integer).map(|v| &v.name).collect_vec();
        if !generals.is_empty() {
            writeln!(w, "Generals")?;
            for chunk in generals.chunks(8) {
                writeln!(w, " {}", chunk.iter().join(" "))?;
            }
        }
        writeln!(w, "End")?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> (Program, Var, Var) {
        let mut p = Program::new("small");
        let x = p.add_binary("x".to_string());
        let y = p.add_continuous("y".to_string(), 0.0, 4.0);
        p.add_constr("cap", LinExpr::new().with_term(x, 2.0).with_term(y, 1.0), Cmp::Le, 5.0);
        p.add_constrs("link", (0..2).map(|k| (k, LinExpr::from(y).with_constant(k as f64), Cmp::Ge, 1.0)));
        p.set_objective(Sense::Maximize, LinExpr::new().with_term(x, 3.0).with_term(y, 1.0));
        (p, x, y)
    }

    #[test]
    fn counts_and_groups() {
        let (p, x, y) = small();
        assert_eq!(p.num_vars(), 2);
        assert_eq!(p.num_int_vars(), 1);
        assert_eq!(p.num_constrs(), 3);
        assert_eq!(p.group_names().collect_vec(), vec!["cap", "link"]);
        let link = p.constr_group("link").unwrap();
        assert_eq!(link.len(), 2);
        assert_eq!(link[1].name, "link[1]");
        // constant moved to the right-hand side
        assert_eq!(link[1].rhs, 0.0);
        assert_eq!(p.var_by_name("y"), Some(y));
        assert_eq!(p.var(x).obj, 3.0);
        assert!(p.constr_group("missing").is_none());
    }

    #[test]
    fn duplicate_terms_are_merged() {
        let mut p = Program::new("dup");
        let x = p.add_continuous("x".to_string(), 0.0, 1.0);
        let y = p.add_continuous("y".to_string(), 0.0, 1.0);
        let lhs = LinExpr::new().with_term(y, 1.0).with_term(x, 2.0).with_term(y, -1.0).with_term(x, 1.0);
        p.add_constr("c", lhs, Cmp::Eq, 3.0);
        assert_eq!(p.constrs()[0].lhs.terms, vec![(x, 3.0)]);
    }

    #[test]
    fn evaluate_and_violations() {
        let (p, _, _) = small();
        assert_eq!(p.objective_value(&[1.0, 3.0]), 6.0);
        assert!(p.violations(&[1.0, 3.0], 1e-9).is_empty());
        assert_eq!(p.violations(&[1.0, 4.0], 1e-9), vec!["cap"]);
        assert_eq!(p.violations(&[0.5, 1.0], 1e-9), vec!["x"]);
    }

    #[test]
    fn lp_format() {
        let (p, _, _) = small();
        let mut buf = Vec::new();
        p.write_lp(&mut buf).unwrap();
        let lp = String::from_utf8(buf).unwrap();
        assert!(lp.starts_with("\\ Problem name: small\nMaximize\n obj: 3 x + 1 y\n"), "{}", lp);
        assert!(lp.contains(" cap: 2 x + 1 y <= 5\n"));
        assert!(lp.contains(" link[0]: 1 y >= 1\n"));
        assert!(lp.contains("Bounds\n 0 <= y <= 4\n"));
        assert!(lp.contains("Binaries\n x\n"));
        assert!(!lp.contains("Generals"));
        assert!(lp.ends_with("End\n"));
    }
}
