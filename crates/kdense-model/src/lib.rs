//! Exact selection of the `n` entities whose pairwise weights sum highest.
//!
//! The quadratic selection problem is rewritten as a binary linear program
//! ([`ModelBuilder`]), solved by [`kdense_solver::BranchAndBound`], and read
//! back as a [`Selection`].
//!
//! ```no_run
//! use kdense_model::{solve, PairMap};
//! use kdense_solver::BranchAndBound;
//!
//! let names = ["Tony", "Paulie", "Silvio"];
//! let weights = PairMap::from_triples([
//!     ("Tony", "Paulie", 2),
//!     ("Tony", "Silvio", 3),
//!     ("Paulie", "Silvio", 2),
//! ])?;
//! let selection = solve(&names, &weights, 2, &BranchAndBound::new())?;
//! assert_eq!(selection.selected, vec!["Tony", "Silvio"]);
//! # Ok::<(), kdense_model::ModelError>(())
//! ```

mod error;
mod model;
mod pairs;
pub mod render;
mod selection;

use std::fmt;

use kdense_solver::BranchAndBound;
use log::info;

pub use error::{ModelError, SolveError};
pub use model::{build, ModelBuilder, PairColumn, Program, CARDINALITY};
pub use pairs::PairMap;
pub use selection::Selection;

/// Build the program for `n`, solve it, and extract the selection
pub fn solve<T, W>(
    names: &[T],
    weights: &PairMap<T, W>,
    n: usize,
    solver: &BranchAndBound,
) -> Result<Selection<T>, ModelError>
where
    T: Ord + Clone + fmt::Display,
    W: Copy + Into<f64>,
{
    let program = ModelBuilder::new(names, weights).build(n)?;
    let solution = solver.solve(program.problem());
    info!(
        "{}: {:?} after {} nodes, objective {}",
        program.problem().name,
        solution.status,
        solution.nodes,
        solution.objective_value
    );
    program.extract(&solution)
}
