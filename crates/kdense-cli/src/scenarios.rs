use clap::ValueEnum;
use kdense_model::{ModelError, PairMap};

/// Built-in groups to select from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioName {
    /// Five members with mostly friendly ties
    Crew,
    /// Four members, one of whom has a single strong ally and two enemies
    Rivals,
}

pub struct Scenario {
    pub names: Vec<String>,
    pub weights: PairMap<String, i32>,
    /// Subset sizes solved when none is given on the command line
    pub sizes: Vec<usize>,
}

impl ScenarioName {
    pub fn all() -> [ScenarioName; 2] {
        [ScenarioName::Crew, ScenarioName::Rivals]
    }

    pub fn load(self) -> Result<Scenario, ModelError> {
        match self {
            ScenarioName::Crew => scenario(
                &["Tony", "Vito", "Paulie", "Silvio", "Furio"],
                &[
                    ("Tony", "Vito", 1),
                    ("Tony", "Paulie", 2),
                    ("Tony", "Silvio", 3),
                    ("Tony", "Furio", 1),
                    ("Vito", "Paulie", -1),
                    ("Vito", "Silvio", 1),
                    ("Vito", "Furio", 0),
                    ("Paulie", "Silvio", 2),
                    ("Paulie", "Furio", 2),
                    ("Silvio", "Furio", 2),
                ],
                vec![3],
            ),
            ScenarioName::Rivals => scenario(
                &["Tony", "Vito", "Paulie", "Silvio"],
                &[
                    ("Tony", "Vito", 100),
                    ("Tony", "Paulie", -101),
                    ("Tony", "Silvio", -101),
                    ("Vito", "Paulie", 1),
                    ("Vito", "Silvio", 1),
                    ("Paulie", "Silvio", 1),
                ],
                vec![2, 3],
            ),
        }
    }
}

fn scenario(
    names: &[&str],
    weights: &[(&str, &str, i32)],
    sizes: Vec<usize>,
) -> Result<Scenario, ModelError> {
    Ok(Scenario {
        names: names.iter().map(|s| s.to_string()).collect(),
        weights: PairMap::from_triples(
            weights
                .iter()
                .map(|&(a, b, w)| (a.to_string(), b.to_string(), w)),
        )?,
        sizes,
    })
}
