//! Graphviz DOT text for the weight graph before and after solving.
//!
//! Only pairs with a stored weight are drawn as edges. Turning the text
//! into an image is left to the caller.

use std::collections::BTreeMap;
use std::fmt;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{NodeIndex, UnGraph};

use crate::pairs::PairMap;
use crate::selection::Selection;

const FONT: &str = "Roboto Mono";
const SELECTED: &str = "#c1e4a5";
const UNSELECTED: &str = "grey";

struct Node {
    label: String,
    fill: Option<&'static str>,
}

struct Edge {
    label: String,
    color: Option<&'static str>,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn state_color(on: bool) -> &'static str {
    if on { SELECTED } else { UNSELECTED }
}

/// The weighted graph as given, one edge per stored pair
pub fn plain_dot<T, W>(weights: &PairMap<T, W>) -> String
where
    T: Ord + Clone + fmt::Display,
    W: fmt::Display,
{
    let mut graph = UnGraph::new_undirected();
    let mut nodes: BTreeMap<&T, NodeIndex> = BTreeMap::new();
    for (a, b, w) in weights.iter() {
        let ia = *nodes.entry(a).or_insert_with(|| {
            graph.add_node(Node {
                label: a.to_string(),
                fill: None,
            })
        });
        let ib = *nodes.entry(b).or_insert_with(|| {
            graph.add_node(Node {
                label: b.to_string(),
                fill: None,
            })
        });
        graph.add_edge(
            ia,
            ib,
            Edge {
                label: w.to_string(),
                color: None,
            },
        );
    }
    write_graph("plain", None, &graph)
}

/// Every entity filled by selection state, stored pairs coloured by
/// activation, labelled with the subset size
pub fn solved_dot<T, W>(names: &[T], weights: &PairMap<T, W>, selection: &Selection<T>) -> String
where
    T: Ord + Clone + fmt::Display,
    W: fmt::Display,
{
    let mut graph = UnGraph::new_undirected();
    let mut nodes: BTreeMap<&T, NodeIndex> = BTreeMap::new();
    for name in names {
        let index = graph.add_node(Node {
            label: name.to_string(),
            fill: Some(state_color(selection.is_selected(name))),
        });
        nodes.insert(name, index);
    }
    for (a, b, w) in weights.iter() {
        let (Some(&ia), Some(&ib)) = (nodes.get(a), nodes.get(b)) else {
            continue;
        };
        let active = selection.activations.try_get(a, b).copied().unwrap_or(false);
        graph.add_edge(
            ia,
            ib,
            Edge {
                label: w.to_string(),
                color: Some(state_color(active)),
            },
        );
    }
    let size = selection.size;
    write_graph(&format!("graph_n={}", size), Some(format!("n={}", size)), &graph)
}

/// A complete DOT document around petgraph's graph body
struct DotGraph<'a> {
    name: &'a str,
    label: Option<String>,
    graph: &'a UnGraph<Node, Edge>,
}

impl fmt::Display for DotGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph \"{}\" {{", self.name)?;
        match &self.label {
            Some(label) => {
                writeln!(f, "    graph [fontname = \"{}\" label = \"{}\"]", FONT, label)?
            }
            None => writeln!(f, "    graph [fontname = \"{}\"]", FONT)?,
        }
        writeln!(f, "    node [fontname = \"{}\" shape = box]", FONT)?;
        writeln!(f, "    edge [fontname = \"{}\"]", FONT)?;
        write!(
            f,
            "{}",
            Dot::with_attr_getters(
                self.graph,
                &[Config::GraphContentOnly],
                &|_, edge| match edge.weight().color {
                    Some(color) => format!("color = \"{}\" ", color),
                    None => String::new(),
                },
                &|_, (_, node)| match node.fill {
                    Some(fill) => format!("style = filled fillcolor = \"{}\" ", fill),
                    None => String::new(),
                },
            )
        )?;
        writeln!(f, "}}")
    }
}

fn write_graph(name: &str, label: Option<String>, graph: &UnGraph<Node, Edge>) -> String {
    DotGraph { name, label, graph }.to_string()
}
