use std::collections::BTreeSet;
use std::fmt;

use kdense_solver::{ConstraintOp, LpProblem};
use log::debug;

use crate::error::ModelError;
use crate::pairs::PairMap;

/// Name of the exact-size constraint in the generated problem
pub const CARDINALITY: &str = "cardinality";

/// Entity indices of one unordered pair and the column of its activation
/// variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairColumn {
    pub first: usize,
    pub second: usize,
    pub column: usize,
}

/// Linear program selecting exactly `size` entities that maximize the
/// total weight of the pairs they contain.
///
/// The quadratic objective `sum w_ij * x_i * x_j` is linearized with one
/// binary activation variable per pair, tied to its endpoints by
/// `a_ij <= x_i`, `a_ij <= x_j` and `a_ij >= x_i + x_j - 1`. The last
/// inequality is what keeps a negative-weight pair from staying inactive
/// while both endpoints are selected.
#[derive(Debug, Clone)]
pub struct Program<T> {
    pub(crate) names: Vec<T>,
    pub(crate) size: usize,
    pub(crate) problem: LpProblem,
    pub(crate) selection_columns: Vec<usize>,
    pub(crate) pair_columns: Vec<PairColumn>,
    pub(crate) activation_columns: PairMap<T, usize>,
    pub(crate) weights: PairMap<T, f64>,
}

impl<T: Ord + Clone + fmt::Display> Program<T> {
    pub fn names(&self) -> &[T] {
        &self.names
    }

    /// Number of entities to select
    pub fn size(&self) -> usize {
        self.size
    }

    /// The problem to hand to a solver
    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    /// Column of each entity's selection variable, in `names` order
    pub fn selection_columns(&self) -> &[usize] {
        &self.selection_columns
    }

    /// One entry per combination of two entities, in `names` order
    pub fn pair_columns(&self) -> &[PairColumn] {
        &self.pair_columns
    }

    pub fn selection_column(&self, name: &T) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.selection_columns[i])
    }

    pub fn activation_column(&self, a: &T, b: &T) -> Result<usize, ModelError> {
        self.activation_columns.get(a, b).copied()
    }

    /// Readable name of a column: the entity for a selection variable,
    /// both endpoints for an activation variable
    pub fn column_label(&self, column: usize) -> String {
        if let Some(i) = self.selection_columns.iter().position(|&c| c == column) {
            return self.names[i].to_string();
        }
        match self.pair_columns.iter().find(|pair| pair.column == column) {
            Some(pair) => format!("{}-{}", self.names[pair.first], self.names[pair.second]),
            None => self.problem.variables[column].name.clone(),
        }
    }

    /// The weights that contribute to the objective
    pub fn weights(&self) -> &PairMap<T, f64> {
        &self.weights
    }
}

/// Builds a fresh [`Program`] per target size from a fixed entity list and
/// weight table.
#[derive(Debug, Clone, Copy)]
pub struct ModelBuilder<'a, T, W> {
    names: &'a [T],
    weights: &'a PairMap<T, W>,
}

impl<'a, T, W> ModelBuilder<'a, T, W>
where
    T: Ord + Clone + fmt::Display,
    W: Copy + Into<f64>,
{
    pub fn new(names: &'a [T], weights: &'a PairMap<T, W>) -> Self {
        Self { names, weights }
    }

    pub fn build(&self, n: usize) -> Result<Program<T>, ModelError> {
        self.validate(n)?;

        let names = self.names;
        let m = names.len();
        let mut problem = LpProblem::new(format!("select_{}_of_{}", n, m));

        // Variables are named by position so no entity name can collide
        let selection_columns: Vec<usize> = (0..m)
            .map(|i| problem.add_binary(format!("x_{}", i)))
            .collect();

        // Every combination gets an activation variable, weighted or not
        let mut pair_columns = Vec::with_capacity(m * m.saturating_sub(1) / 2);
        let mut activation_columns = PairMap::new();
        for i in 0..m {
            for j in (i + 1)..m {
                let column = problem.add_binary(format!("a_{}_{}", i, j));
                activation_columns.insert(names[i].clone(), names[j].clone(), column)?;
                pair_columns.push(PairColumn {
                    first: i,
                    second: j,
                    column,
                });
            }
        }

        for pair in &pair_columns {
            let (a, xi, xj) = (
                pair.column,
                selection_columns[pair.first],
                selection_columns[pair.second],
            );
            let label = &problem.variables[a].name;
            let (upper_i, upper_j, lower) = (
                format!("{}_le_x_{}", label, pair.first),
                format!("{}_le_x_{}", label, pair.second),
                format!("{}_ge_both", label),
            );
            problem.add_sparse_constraint(upper_i, &[(a, 1.0), (xi, -1.0)], ConstraintOp::Le, 0.0);
            problem.add_sparse_constraint(upper_j, &[(a, 1.0), (xj, -1.0)], ConstraintOp::Le, 0.0);
            problem.add_sparse_constraint(
                lower,
                &[(a, 1.0), (xi, -1.0), (xj, -1.0)],
                ConstraintOp::Ge,
                -1.0,
            );
        }

        let ones: Vec<(usize, f64)> = selection_columns.iter().map(|&c| (c, 1.0)).collect();
        problem.add_sparse_constraint(CARDINALITY, &ones, ConstraintOp::Eq, n as f64);

        // Objective: only stored pairs contribute, a missing pair weighs zero
        let mut coefficients = vec![0.0; problem.num_variables()];
        let mut weights = PairMap::new();
        for (a, b, &w) in self.weights.iter() {
            match activation_columns.try_get(a, b) {
                Some(&column) => {
                    let w: f64 = w.into();
                    coefficients[column] += w;
                    weights.insert(a.clone(), b.clone(), w)?;
                }
                None => debug!("ignoring weight for {}-{}: endpoint is not a candidate", a, b),
            }
        }
        problem.set_objective(coefficients, false);

        debug!(
            "built {}: {} selection and {} activation variables, {} constraints, {} weighted pairs",
            problem.name,
            selection_columns.len(),
            pair_columns.len(),
            problem.num_constraints(),
            weights.len()
        );

        Ok(Program {
            names: names.to_vec(),
            size: n,
            problem,
            selection_columns,
            pair_columns,
            activation_columns,
            weights,
        })
    }

    fn validate(&self, n: usize) -> Result<(), ModelError> {
        if self.names.is_empty() {
            return Err(ModelError::NoEntities);
        }

        let mut seen = BTreeSet::new();
        for name in self.names {
            if !seen.insert(name) {
                return Err(ModelError::DuplicateEntity(name.to_string()));
            }
        }

        if n > self.names.len() {
            return Err(ModelError::InvalidCardinality {
                n,
                entities: self.names.len(),
            });
        }

        Ok(())
    }
}

/// Shorthand for `ModelBuilder::new(names, weights).build(n)`
pub fn build<T, W>(names: &[T], weights: &PairMap<T, W>, n: usize) -> Result<Program<T>, ModelError>
where
    T: Ord + Clone + fmt::Display,
    W: Copy + Into<f64>,
{
    ModelBuilder::new(names, weights).build(n)
}
