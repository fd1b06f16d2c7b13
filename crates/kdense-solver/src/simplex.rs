use log::trace;

use crate::problem::{ConstraintOp, LpProblem, VarKind};
use crate::solution::Solution;

/// Simplex solver for the linear relaxation of a problem.
///
/// Binary variables are relaxed to the interval `[0, 1]`; integrality is
/// the job of [`BranchAndBound`](crate::BranchAndBound).
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for pivot selection
    tolerance: f64,
    /// Largest phase 1 residual still accepted as feasible
    feasibility_tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP relaxation using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let mut tableau = Tableau::build(problem);

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::Infeasible | SimplexResult::Unbounded => {
                    return Solution::infeasible();
                }
                SimplexResult::IterationLimit => {
                    return Solution::error(format!(
                        "phase 1 did not converge within {} iterations",
                        self.max_iterations
                    ));
                }
            }
        }

        tableau.load_objective(problem);
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Solution::unbounded(),
            SimplexResult::Infeasible => return Solution::infeasible(),
            SimplexResult::IterationLimit => {
                return Solution::error(format!(
                    "phase 2 did not converge within {} iterations",
                    self.max_iterations
                ));
            }
        }

        let values = tableau.values();
        let objective_value = problem.evaluate(&values);
        Solution::optimal(values, objective_value)
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        // Maximize -sum(artificials), expressed in terms of the starting basis
        let obj = tableau.obj_row();
        let art_start = tableau.artificial_start();
        tableau.data[obj].iter_mut().for_each(|x| *x = 0.0);
        for j in art_start..art_start + tableau.n_artificial {
            tableau.data[obj][j] = -1.0;
        }
        for i in 0..obj {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..tableau.n_cols() {
                    tableau.data[obj][j] += tableau.data[i][j];
                }
            }
        }

        let rhs = tableau.rhs_col();
        match self.iterate(tableau, rhs) {
            SimplexResult::Optimal => {}
            other => return other,
        }

        let residual: f64 = (0..obj)
            .filter(|&i| tableau.basic_vars[i] >= art_start)
            .map(|i| tableau.data[i][rhs])
            .sum();
        if residual > self.feasibility_tolerance {
            return SimplexResult::Infeasible;
        }

        // Drive zero-level artificials out of the basis. A row with no
        // usable column is redundant and never pivoted on again.
        for i in 0..obj {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(j) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                tableau.pivot(i, j);
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns may never re-enter
        let limit = tableau.artificial_start();
        self.iterate(tableau, limit)
    }

    /// Pivot until no column below `limit` improves the objective row.
    /// Bland's rule keeps degenerate problems from cycling.
    fn iterate(&self, tableau: &mut Tableau, limit: usize) -> SimplexResult {
        for iteration in 0..self.max_iterations {
            let Some(col) = self.entering_column(tableau, limit) else {
                trace!("simplex converged after {} pivots", iteration);
                return SimplexResult::Optimal;
            };
            let Some(row) = self.leaving_row(tableau, col) else {
                return SimplexResult::Unbounded;
            };
            tableau.pivot(row, col);
        }
        SimplexResult::IterationLimit
    }

    fn entering_column(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let obj = tableau.obj_row();
        (0..limit).find(|&j| tableau.data[obj][j] > self.tolerance)
    }

    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs = tableau.rhs_col();
        let mut best: Option<(f64, usize)> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs].max(0.0) / val;
            let better = match best {
                None => true,
                Some((best_ratio, best_row)) => {
                    ratio < best_ratio - self.tolerance
                        || ((ratio - best_ratio).abs() <= self.tolerance
                            && tableau.basic_vars[i] < tableau.basic_vars[best_row])
                }
            };
            if better {
                best = Some((ratio, i));
            }
        }

        best.map(|(_, row)| row)
    }
}

/// Dense tableau: one row per constraint plus the objective row last,
/// columns are structural, slack/surplus, artificial, then the RHS.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn build(problem: &LpProblem) -> Self {
        let n_vars = problem.num_variables();

        // Normalized rows with non-negative RHS, plus x <= 1 for binaries
        let mut rows: Vec<(Vec<f64>, ConstraintOp, f64)> = Vec::new();
        for c in &problem.constraints {
            let mut coefficients = vec![0.0; n_vars];
            for (j, &coef) in c.coefficients.iter().take(n_vars).enumerate() {
                coefficients[j] = coef;
            }
            let (op, rhs) = if c.rhs < 0.0 {
                coefficients.iter_mut().for_each(|x| *x = -*x);
                let flipped = match c.op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
                (flipped, -c.rhs)
            } else {
                (c.op, c.rhs)
            };
            rows.push((coefficients, op, rhs));
        }
        for (j, var) in problem.variables.iter().enumerate() {
            if var.kind == VarKind::Binary {
                let mut coefficients = vec![0.0; n_vars];
                coefficients[j] = 1.0;
                rows.push((coefficients, ConstraintOp::Le, 1.0));
            }
        }

        let n_slack = rows.iter().filter(|(_, op, _)| *op != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|(_, op, _)| *op != ConstraintOp::Le).count();
        let n_rows = rows.len();
        let total_cols = n_vars + n_slack + n_artificial + 1;

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_rows + 1],
            basic_vars: vec![0; n_rows],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;
        for (i, (coefficients, op, rhs)) in rows.into_iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(&coefficients);
            tableau.data[i][total_cols - 1] = rhs;
            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0;
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        tableau
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn rhs_col(&self) -> usize {
        self.n_cols() - 1
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    /// Install the real objective (as a maximization) and price out the
    /// current basis.
    fn load_objective(&mut self, problem: &LpProblem) {
        let obj = self.obj_row();
        let sign = if problem.objective.minimize { -1.0 } else { 1.0 };
        self.data[obj].iter_mut().for_each(|x| *x = 0.0);
        for (j, &coef) in problem.objective.coefficients.iter().take(self.n_vars).enumerate() {
            self.data[obj][j] = sign * coef;
        }
        for i in 0..obj {
            let basic = self.basic_vars[i];
            let ratio = self.data[obj][basic];
            if ratio != 0.0 {
                for j in 0..self.n_cols() {
                    self.data[obj][j] -= ratio * self.data[i][j];
                }
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        self.data[row].iter_mut().for_each(|x| *x /= pivot_val);

        let pivot_row = self.data[row].clone();
        for (i, r) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = r[col];
            if factor != 0.0 {
                for (x, p) in r.iter_mut().zip(&pivot_row) {
                    *x -= factor * p;
                }
            }
        }
    }

    fn values(&self) -> Vec<f64> {
        let rhs = self.rhs_col();
        let mut values = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                values[basic] = self.data[i][rhs].max(0.0);
            }
        }
        values
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolutionStatus;

    fn continuous(names: &[&str]) -> LpProblem {
        let mut problem = LpProblem::new("test");
        for name in names {
            problem.add_continuous(*name);
        }
        problem
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!(
            (solution.objective_value - 11.0).abs() < 1e-6,
            "obj = {} (expected 11)",
            solution.objective_value
        );
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.values[1] - 1.0).abs() < 1e-6);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = continuous(&["x"]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("diff", vec![1.0, -1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_negative_rhs_ge_is_flipped() {
        // a - x - y >= -1 with x = y = 1 forces a >= 1
        let mut problem = LpProblem::new("and");
        let x = problem.add_binary("x");
        let y = problem.add_binary("y");
        let a = problem.add_binary("a");
        problem.set_objective(vec![0.0, 0.0, -1.0], false);
        let link = [(a, 1.0), (x, -1.0), (y, -1.0)];
        problem.add_sparse_constraint("link", &link, ConstraintOp::Ge, -1.0);
        problem.add_sparse_constraint("fix_x", &[(x, 1.0)], ConstraintOp::Eq, 1.0);
        problem.add_sparse_constraint("fix_y", &[(y, 1.0)], ConstraintOp::Eq, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[a] - 1.0).abs() < 1e-6);
        assert!((solution.objective_value + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_redundant_equalities() {
        // The second row repeats the first; phase 1 leaves an artificial
        // basic at zero in a redundant row.
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![1.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Eq, 2.0);
        problem.add_constraint("sum_again", vec![2.0, 2.0], ConstraintOp::Eq, 4.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 1.5);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 0.5).abs() < 1e-6);
        assert!((solution.values[1] - 1.5).abs() < 1e-6);
        assert!((solution.objective_value - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_binary_relaxation_is_bounded_by_one() {
        let mut problem = LpProblem::new("box");
        problem.add_binary("x");
        problem.add_binary("y");
        problem.set_objective(vec![1.0, 1.0], false);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 2.0).abs() < 1e-6);
    }
}
