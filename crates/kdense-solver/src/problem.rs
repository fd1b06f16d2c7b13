/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKind {
    /// Any non-negative real value
    Continuous,
    /// Restricted to 0 or 1
    Binary,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
}

/// A (mixed) integer linear program over non-negative variables.
///
/// Constraint and objective rows are dense. A row shorter than the variable
/// list is read as if padded with zeros, so variables may be added after
/// constraints that do not mention them.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpProblem {
    pub name: String,
    pub variables: Vec<Variable>,
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Constraint {
    /// Left-hand side evaluated at `values`
    pub fn lhs(&self, values: &[f64]) -> f64 {
        dot(&self.coefficients, values)
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs(values);
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + tolerance,
            ConstraintOp::Ge => lhs >= self.rhs - tolerance,
            ConstraintOp::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl LpProblem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a variable and return its column index
    pub fn add_variable(&mut self, name: impl Into<String>, kind: VarKind) -> usize {
        self.variables.push(Variable {
            name: name.into(),
            kind,
        });
        self.variables.len() - 1
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> usize {
        self.add_variable(name, VarKind::Binary)
    }

    pub fn add_continuous(&mut self, name: impl Into<String>) -> usize {
        self.add_variable(name, VarKind::Continuous)
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    /// Add a constraint given as sparse `(column, coefficient)` terms.
    /// Repeated columns are summed.
    pub fn add_sparse_constraint(
        &mut self,
        name: impl Into<String>,
        terms: &[(usize, f64)],
        op: ConstraintOp,
        rhs: f64,
    ) {
        let width = terms
            .iter()
            .map(|&(col, _)| col + 1)
            .max()
            .unwrap_or(0)
            .max(self.variables.len());
        let mut coefficients = vec![0.0; width];
        for &(col, coef) in terms {
            coefficients[col] += coef;
        }
        self.add_constraint(name, coefficients, op, rhs);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Column indices of all binary variables, in column order
    pub fn binary_indices(&self) -> Vec<usize> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.kind == VarKind::Binary)
            .map(|(i, _)| i)
            .collect()
    }

    /// Objective value at `values`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        dot(&self.objective.coefficients, values)
    }

    /// Whether `values` satisfies every constraint, non-negativity, and
    /// the 0/1 domain of binary variables.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let domains_ok = self.variables.iter().zip(values).all(|(var, &x)| match var.kind {
            VarKind::Continuous => x >= -tolerance,
            VarKind::Binary => x.abs() <= tolerance || (x - 1.0).abs() <= tolerance,
        });
        domains_ok && self.constraints.iter().all(|c| c.is_satisfied(values, tolerance))
    }
}

fn dot(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients.iter().zip(values).map(|(c, x)| c * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_constraint_pads_and_sums() {
        let mut problem = LpProblem::new("p");
        let x = problem.add_binary("x");
        let y = problem.add_binary("y");
        problem.add_sparse_constraint("c", &[(y, 2.0), (x, 1.0), (y, -1.0)], ConstraintOp::Le, 1.0);

        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 1.0]);
        assert_eq!(problem.binary_indices(), vec![x, y]);
        assert_eq!(problem.variable_index("y"), Some(1));
    }

    #[test]
    fn test_feasibility_checks_binary_domain() {
        let mut problem = LpProblem::new("p");
        problem.add_binary("x");
        problem.add_continuous("y");
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Eq, 1.5);

        assert!(problem.is_feasible(&[1.0, 0.5], 1e-9));
        assert!(!problem.is_feasible(&[0.5, 1.0], 1e-9));
        assert!(!problem.is_feasible(&[1.0], 1e-9));
    }
}
