use std::fmt;

use kdense_solver::{Solution, SolutionStatus};

use crate::error::{ModelError, SolveError};
use crate::model::Program;
use crate::pairs::PairMap;

/// Distance from 0 or 1 still read as a binary value
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// The chosen subset and the activation state of every pair
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Selection<T> {
    /// Selected entities, in input order
    pub selected: Vec<T>,
    /// Whether both endpoints of each pair are selected, for every
    /// combination of two entities
    pub activations: PairMap<T, bool>,
    /// Total weight of the selected pairs
    pub objective: f64,
    /// Requested subset size
    pub size: usize,
}

impl<T: Ord + Clone + fmt::Display> Selection<T> {
    pub fn is_selected(&self, name: &T) -> bool {
        self.selected.contains(name)
    }

    pub fn is_active(&self, a: &T, b: &T) -> Result<bool, ModelError> {
        self.activations.get(a, b).copied()
    }
}

impl<T: Ord + Clone + fmt::Display> Program<T> {
    /// Read the selection back out of a solved problem.
    ///
    /// Fails unless the solver reports an optimum whose selection and
    /// activation values are all binary and mutually consistent.
    pub fn extract(&self, solution: &Solution) -> Result<Selection<T>, ModelError> {
        match solution.status {
            SolutionStatus::Optimal => {}
            SolutionStatus::Infeasible => return Err(SolveError::Infeasible.into()),
            SolutionStatus::Unbounded => return Err(SolveError::Unbounded.into()),
            SolutionStatus::Error => {
                let message = solution
                    .message
                    .clone()
                    .unwrap_or_else(|| "unknown solver error".to_string());
                return Err(SolveError::Failed(message).into());
            }
        }

        if solution.values.len() != self.problem.num_variables() {
            return Err(SolveError::Failed(format!(
                "solution has {} values but the program has {} variables",
                solution.values.len(),
                self.problem.num_variables()
            ))
            .into());
        }

        let chosen = self
            .selection_columns
            .iter()
            .map(|&column| self.binary_value(solution, column))
            .collect::<Result<Vec<bool>, ModelError>>()?;

        let mut activations = PairMap::new();
        for pair in &self.pair_columns {
            let (a, b) = (&self.names[pair.first], &self.names[pair.second]);
            let active = self.binary_value(solution, pair.column)?;
            if active != (chosen[pair.first] && chosen[pair.second]) {
                return Err(ModelError::InconsistentActivation(a.to_string(), b.to_string()));
            }
            activations.insert(a.clone(), b.clone(), active)?;
        }

        let objective: f64 = self
            .weights
            .iter()
            .filter(|(a, b, _)| activations.try_get(a, b).copied().unwrap_or(false))
            .map(|(_, _, w)| w)
            .sum();

        let selected = self
            .names
            .iter()
            .zip(&chosen)
            .filter(|(_, chosen)| **chosen)
            .map(|(name, _)| name.clone())
            .collect();

        Ok(Selection {
            selected,
            activations,
            objective,
            size: self.size,
        })
    }

    fn binary_value(&self, solution: &Solution, column: usize) -> Result<bool, ModelError> {
        let value = solution.values[column];
        if (value - 1.0).abs() <= INTEGRALITY_TOLERANCE {
            Ok(true)
        } else if value.abs() <= INTEGRALITY_TOLERANCE {
            Ok(false)
        } else {
            Err(ModelError::NonIntegral {
                variable: self.column_label(column),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build;

    fn program() -> Program<&'static str> {
        let names = ["Tony", "Vito", "Paulie"];
        let weights = PairMap::from_triples([
            ("Tony", "Vito", 4),
            ("Tony", "Paulie", -1),
            ("Vito", "Paulie", 2),
        ])
        .unwrap();
        build(&names, &weights, 2).unwrap()
    }

    /// Hand-made solution selecting the given entities
    fn assignment(program: &Program<&'static str>, selected: &[&'static str]) -> Vec<f64> {
        let mut values = vec![0.0; program.problem().num_variables()];
        for name in selected {
            values[program.selection_column(name).unwrap()] = 1.0;
        }
        for pair in program.pair_columns() {
            let names = program.names();
            let both =
                selected.contains(&names[pair.first]) && selected.contains(&names[pair.second]);
            values[pair.column] = if both { 1.0 } else { 0.0 };
        }
        values
    }

    #[test]
    fn test_extract_selection() {
        let program = program();
        let values = assignment(&program, &["Tony", "Paulie"]);
        let solution = Solution::optimal(values, 0.0);

        let selection = program.extract(&solution).unwrap();

        assert_eq!(selection.selected, vec!["Tony", "Paulie"]);
        assert_eq!(selection.objective, -1.0);
        assert_eq!(selection.size, 2);
        assert_eq!(selection.activations.len(), 3);
        assert_eq!(selection.is_active(&"Paulie", &"Tony"), Ok(true));
        assert_eq!(selection.is_active(&"Tony", &"Vito"), Ok(false));
        assert!(selection.is_selected(&"Paulie"));
        assert!(!selection.is_selected(&"Vito"));
    }

    #[test]
    fn test_near_integral_values_are_rounded() {
        let program = program();
        let mut values = assignment(&program, &["Tony", "Vito"]);
        for v in values.iter_mut() {
            if *v == 1.0 {
                *v = 1.0 - 1e-9;
            } else {
                *v = 1e-9;
            }
        }

        let selection = program.extract(&Solution::optimal(values, 4.0)).unwrap();

        assert_eq!(selection.selected, vec!["Tony", "Vito"]);
        assert_eq!(selection.objective, 4.0);
    }

    #[test]
    fn test_fractional_value_rejected() {
        let program = program();
        let mut values = assignment(&program, &["Tony", "Vito"]);
        values[program.selection_column(&"Paulie").unwrap()] = 0.5;

        let err = program.extract(&Solution::optimal(values, 0.0)).unwrap_err();

        assert_eq!(
            err,
            ModelError::NonIntegral {
                variable: "Paulie".to_string(),
                value: 0.5
            }
        );
    }

    #[test]
    fn test_inconsistent_activation_rejected() {
        let program = program();
        let mut values = assignment(&program, &["Tony", "Vito"]);
        values[program.activation_column(&"Tony", &"Vito").unwrap()] = 0.0;

        let err = program.extract(&Solution::optimal(values, 0.0)).unwrap_err();

        assert_eq!(err, ModelError::InconsistentActivation("Tony".to_string(), "Vito".to_string()));
    }

    #[test]
    fn test_solver_statuses_map_to_errors() {
        let program = program();

        assert_eq!(
            program.extract(&Solution::infeasible()).unwrap_err(),
            ModelError::Solve(SolveError::Infeasible)
        );
        assert_eq!(
            program.extract(&Solution::unbounded()).unwrap_err(),
            ModelError::Solve(SolveError::Unbounded)
        );
        assert_eq!(
            program.extract(&Solution::error("node limit of 1 reached")).unwrap_err(),
            ModelError::Solve(SolveError::Failed("node limit of 1 reached".to_string()))
        );
        assert!(matches!(
            program.extract(&Solution::optimal(vec![1.0], 0.0)),
            Err(ModelError::Solve(SolveError::Failed(_)))
        ));
    }
}
