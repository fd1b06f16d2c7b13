mod branch;
mod problem;
mod simplex;
mod solution;

pub use branch::BranchAndBound;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, VarKind, Variable};
pub use simplex::Solver;
pub use solution::{Solution, SolutionStatus};
