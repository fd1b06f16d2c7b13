use log::{debug, trace};

use crate::problem::{ConstraintOp, LpProblem};
use crate::simplex::Solver;
use crate::solution::{Solution, SolutionStatus};

/// Depth-first branch-and-bound over the binary variables of a problem,
/// using [`Solver`] for every LP relaxation.
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    solver: Solver,
    /// Maximum relaxations solved before giving up
    max_nodes: usize,
    /// Distance from 0 or 1 still treated as integral
    integrality_tolerance: f64,
    /// Relative gap below which a node cannot improve on the incumbent
    optimality_tolerance: f64,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            solver: Solver::default(),
            max_nodes: 100_000,
            integrality_tolerance: 1e-6,
            optimality_tolerance: 1e-9,
        }
    }
}

/// Variables pinned to 0 or 1 on the path from the root to a node
type Fixings = Vec<(usize, f64)>;

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn with_optimality_tolerance(mut self, tol: f64) -> Self {
        self.optimality_tolerance = tol;
        self
    }

    /// Solve `problem` to global optimality.
    ///
    /// Returns `Error` when the node limit is reached before the search
    /// completes; `values` then holds the best incumbent, if any.
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let binaries = problem.binary_indices();
        // Search internally as a maximization of `sense * objective`
        let sense = if problem.objective.minimize { -1.0 } else { 1.0 };

        let mut stack: Vec<Fixings> = vec![Vec::new()];
        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut nodes = 0;
        let mut root_unbounded = false;
        let mut lp_failure: Option<String> = None;

        while let Some(fixings) = stack.pop() {
            if nodes >= self.max_nodes {
                return self.interrupted(problem, incumbent, nodes);
            }
            nodes += 1;

            let relaxed = self.solver.solve(&with_fixings(problem, &fixings));
            match relaxed.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => {
                    trace!("node {}: infeasible at depth {}", nodes, fixings.len());
                    continue;
                }
                SolutionStatus::Unbounded => {
                    root_unbounded |= fixings.is_empty();
                    continue;
                }
                SolutionStatus::Error => {
                    lp_failure = relaxed.message;
                    continue;
                }
            }

            let bound = sense * relaxed.objective_value;
            if let Some((_, best)) = &incumbent {
                if bound <= *best + self.optimality_tolerance * best.abs().max(1.0) {
                    trace!("node {}: pruned, bound {} <= incumbent {}", nodes, bound, best);
                    continue;
                }
            }

            match self.most_fractional(&relaxed.values, &binaries) {
                None => {
                    let mut values = relaxed.values;
                    for &j in &binaries {
                        values[j] = values[j].round();
                    }
                    let score = sense * problem.evaluate(&values);
                    trace!("node {}: new incumbent {}", nodes, score);
                    incumbent = Some((values, score));
                }
                Some(j) => {
                    // Explore the side nearer the relaxed value first
                    let (far, near) =
                        if relaxed.values[j] >= 0.5 { (0.0, 1.0) } else { (1.0, 0.0) };
                    let mut far_child = fixings.clone();
                    far_child.push((j, far));
                    let mut near_child = fixings;
                    near_child.push((j, near));
                    stack.push(far_child);
                    stack.push(near_child);
                }
            }
        }

        debug!("branch-and-bound finished after {} nodes", nodes);

        // A failed relaxation leaves its subtree unexplored
        if let Some(message) = lp_failure {
            return with_incumbent(problem, Solution::error(message).with_nodes(nodes), incumbent);
        }

        match incumbent {
            Some((values, _)) => {
                let objective_value = problem.evaluate(&values);
                Solution::optimal(values, objective_value).with_nodes(nodes)
            }
            None if root_unbounded => Solution::unbounded().with_nodes(nodes),
            None => Solution::infeasible().with_nodes(nodes),
        }
    }

    fn most_fractional(&self, values: &[f64], binaries: &[usize]) -> Option<usize> {
        binaries
            .iter()
            .map(|&j| (j, (values[j] - values[j].round()).abs()))
            .filter(|&(_, frac)| frac > self.integrality_tolerance)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(j, _)| j)
    }

    fn interrupted(
        &self,
        problem: &LpProblem,
        incumbent: Option<(Vec<f64>, f64)>,
        nodes: usize,
    ) -> Solution {
        let message = format!("node limit of {} reached", self.max_nodes);
        let solution = Solution::error(message).with_nodes(nodes);
        with_incumbent(problem, solution, incumbent)
    }
}

fn with_incumbent(
    problem: &LpProblem,
    mut solution: Solution,
    incumbent: Option<(Vec<f64>, f64)>,
) -> Solution {
    if let Some((values, _)) = incumbent {
        solution.objective_value = problem.evaluate(&values);
        solution.values = values;
    }
    solution
}

fn with_fixings(problem: &LpProblem, fixings: &[(usize, f64)]) -> LpProblem {
    let mut node = problem.clone();
    for &(j, value) in fixings {
        node.add_sparse_constraint(format!("branch_{}", j), &[(j, 1.0)], ConstraintOp::Eq, value);
    }
    node
}
