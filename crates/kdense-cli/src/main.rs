mod scenarios;

use clap::{Parser, Subcommand};
use kdense_model::{render, ModelBuilder, ModelError, Selection};
use kdense_solver::BranchAndBound;
use log::info;

use scenarios::{Scenario, ScenarioName};

#[derive(Parser)]
#[command(name = "kdense")]
#[command(
    about = "Pick the n members of a group whose pairwise ties sum highest",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a scenario and print the selection
    Solve {
        /// The scenario to solve
        #[arg(value_enum)]
        scenario: ScenarioName,
        /// Subset size (defaults to the scenario's own sizes)
        #[arg(short = 'n', long)]
        size: Option<usize>,
        /// Print every variable of the solved program
        #[arg(short, long)]
        verbose: bool,
        /// Output format (pretty, json, dot)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Branch-and-bound node limit
        #[arg(long, default_value_t = 100_000)]
        max_nodes: usize,
    },
    /// Print the weight graph of a scenario as DOT
    Plot {
        /// The scenario to plot
        #[arg(value_enum)]
        scenario: ScenarioName,
    },
    /// Plot and solve every scenario at its own sizes
    Demo,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve {
            scenario,
            size,
            verbose,
            format,
            max_nodes,
        } => {
            let solver = BranchAndBound::new().with_max_nodes(max_nodes);
            scenario.load().and_then(|s| {
                let sizes = size.map(|n| vec![n]).unwrap_or_else(|| s.sizes.clone());
                sizes
                    .into_iter()
                    .try_for_each(|n| run(&s, n, &solver, verbose, &format).map(|_| ()))
            })
        }
        Commands::Plot { scenario } => scenario
            .load()
            .map(|s| print!("{}", render::plain_dot(&s.weights))),
        Commands::Demo => {
            let solver = BranchAndBound::new();
            ScenarioName::all().into_iter().try_for_each(|name| {
                let s = name.load()?;
                print!("{}", render::plain_dot(&s.weights));
                for &n in &s.sizes {
                    println!("n={}", n);
                    let selection = run(&s, n, &solver, true, "pretty")?;
                    print!("{}", render::solved_dot(&s.names, &s.weights, &selection));
                    println!("----");
                }
                Ok::<(), ModelError>(())
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(
    scenario: &Scenario,
    n: usize,
    solver: &BranchAndBound,
    verbose: bool,
    format: &str,
) -> Result<Selection<String>, ModelError> {
    let program = ModelBuilder::new(&scenario.names, &scenario.weights).build(n)?;
    let solution = solver.solve(program.problem());
    info!(
        "{} of {}: {:?} after {} nodes",
        n,
        scenario.names.len(),
        solution.status,
        solution.nodes
    );

    if verbose {
        println!("All variables:");
        for (column, value) in solution.values.iter().enumerate() {
            println!("{} = {}", program.column_label(column), value);
        }
    }

    let selection = program.extract(&solution)?;

    match format {
        "json" => match serde_json::to_string_pretty(&selection) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing selection: {}", e),
        },
        "dot" => print!("{}", render::solved_dot(&scenario.names, &scenario.weights, &selection)),
        _ => {
            println!("Status: OPTIMAL ({} nodes)", solution.nodes);
            let selected = selection.selected.join(", ");
            println!("Selected ({} of {}): {}", n, scenario.names.len(), selected);
            println!("Total weight: {}", selection.objective);
        }
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_solves_crew() {
        let scenario = ScenarioName::Crew.load().unwrap();

        let selection = run(&scenario, 3, &BranchAndBound::new(), false, "pretty").unwrap();

        assert_eq!(selection.selected, vec!["Tony", "Paulie", "Silvio"]);
        assert!((selection.objective - 7.0).abs() < 1e-9);
    }
}
