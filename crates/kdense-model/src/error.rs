use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("No entities to select from")]
    NoEntities,
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),
    #[error("Invalid cardinality: cannot select {n} of {entities} entities")]
    InvalidCardinality { n: usize, entities: usize },
    #[error("A pair needs two distinct entities, got {0} twice")]
    SelfPair(String),
    #[error("Missing pair: {0}-{1}")]
    MissingPair(String, String),
    #[error("Variable {variable} has non-integral value {value}")]
    NonIntegral { variable: String, value: f64 },
    #[error("Activation of {0}-{1} disagrees with the selection of its endpoints")]
    InconsistentActivation(String, String),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Outcomes of the solving step that leave no usable selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("No selection satisfies the constraints")]
    Infeasible,
    #[error("The objective is unbounded")]
    Unbounded,
    #[error("Solver failed: {0}")]
    Failed(String),
}
