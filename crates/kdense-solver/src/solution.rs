/// The result of solving an LP or ILP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Values for each variable, in column order.
    /// Empty unless a feasible point was found.
    pub values: Vec<f64>,
    /// Objective value at `values`
    pub objective_value: f64,
    /// Branch-and-bound nodes explored (1 for a plain LP solve)
    pub nodes: usize,
    /// Why the solver gave up, when `status` is `Error`
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver encountered an error or hit one of its limits
    Error,
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            nodes: 1,
            message: None,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes: 1,
            message: None,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes: 1,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SolutionStatus::Error,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes: 1,
            message: Some(message.into()),
        }
    }

    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Value of the variable in column `index`, if a point was found
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}
