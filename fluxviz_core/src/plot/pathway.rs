//! Static network diagram of core glycolysis
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::plot::{prepare_output, PlotConfig, PlotError};

/// Metabolites drawn in the glycolysis diagram
pub const GLYCOLYSIS_METABOLITES: [&str; 9] = [
    "Glucose", "G6P", "F6P", "FBP", "G3P", "PEP", "Pyruvate", "ATP", "NADH",
];

/// Conversions and cofactor links of the glycolysis diagram
pub const GLYCOLYSIS_EDGES: [(&str, &str); 9] = [
    ("Glucose", "G6P"),
    ("G6P", "F6P"),
    ("F6P", "FBP"),
    ("FBP", "G3P"),
    ("G3P", "PEP"),
    ("PEP", "Pyruvate"),
    ("ATP", "G6P"),
    ("ATP", "FBP"),
    ("NADH", "G3P"),
];

/// Seed of the spring layout, fixed so the diagram is the same on every run
pub const LAYOUT_SEED: u64 = 42;
/// Optimal distance between nodes in the spring layout
const LAYOUT_SPACING: f64 = 2.0;
const LAYOUT_ITERATIONS: usize = 50;

const NODE_RADIUS: i32 = 38;
const ARROW_LENGTH: f64 = 16.0;
const ARROW_WIDTH: f64 = 12.0;

/// Directed graph of metabolites
#[derive(Debug, Default)]
pub struct PathwayGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl PathwayGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The glycolysis diagram, 9 metabolites and 9 edges
    pub fn glycolysis() -> Self {
        let mut pathway = PathwayGraph::new();
        for metabolite in GLYCOLYSIS_METABOLITES {
            pathway.add_metabolite(metabolite);
        }
        for (from, to) in GLYCOLYSIS_EDGES {
            pathway.connect(from, to);
        }
        pathway
    }

    /// Add a metabolite node, returning the existing node if the name is already present
    pub fn add_metabolite(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.node_map.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), index);
        index
    }

    /// Connect two metabolites with a directed edge, adding them when missing
    pub fn connect(&mut self, from: &str, to: &str) {
        let from = self.add_metabolite(from);
        let to = self.add_metabolite(to);
        self.graph.add_edge(from, to, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node names, in insertion order
    pub fn metabolites(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|index| self.graph[index].as_str())
    }

    /// Edges as (from, to) names
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
            )
        })
    }

    /// Fruchterman-Reingold force directed layout
    ///
    /// Nodes start at random positions drawn from `seed`, repel each other and are pulled
    /// together along edges (in either direction) with `k` as the optimal distance. The
    /// result is centered on the origin and scaled so the largest coordinate is 1, one
    /// position per node in insertion order.
    pub fn spring_layout(&self, k: f64, iterations: usize, seed: u64) -> Vec<(f64, f64)> {
        let n = self.graph.node_count();
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![(0., 0.)];
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions: Vec<[f64; 2]> = (0..n)
            .map(|_| [rng.gen::<f64>(), rng.gen::<f64>()])
            .collect();
        let mut adjacency = vec![vec![0f64; n]; n];
        for edge in self.graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            adjacency[a][b] = 1.;
            adjacency[b][a] = 1.;
        }

        // Temperature, the largest step a node may take, cools linearly to 0
        let mut temperature = 0.1;
        let cooling = temperature / (iterations + 1) as f64;
        for _ in 0..iterations {
            let mut displacement = vec![[0f64; 2]; n];
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let dx = positions[i][0] - positions[j][0];
                    let dy = positions[i][1] - positions[j][1];
                    let distance = (dx * dx + dy * dy).sqrt().max(0.01);
                    let force = k * k / (distance * distance) - adjacency[i][j] * distance / k;
                    displacement[i][0] += dx * force;
                    displacement[i][1] += dy * force;
                }
            }
            for (position, step) in positions.iter_mut().zip(&displacement) {
                let length = (step[0] * step[0] + step[1] * step[1]).sqrt();
                let length = if length < 0.01 { 0.1 } else { length };
                position[0] += step[0] * temperature / length;
                position[1] += step[1] * temperature / length;
            }
            temperature -= cooling;
        }

        rescale(&positions)
    }
}

/// Center positions on the origin and scale them into [-1, 1]
fn rescale(positions: &[[f64; 2]]) -> Vec<(f64, f64)> {
    let n = positions.len() as f64;
    let center_x = positions.iter().map(|p| p[0]).sum::<f64>() / n;
    let center_y = positions.iter().map(|p| p[1]).sum::<f64>() / n;
    let scale = positions
        .iter()
        .map(|p| (p[0] - center_x).abs().max((p[1] - center_y).abs()))
        .fold(0f64, f64::max);
    let scale = if scale > 0. { scale } else { 1. };
    positions
        .iter()
        .map(|p| ((p[0] - center_x) / scale, (p[1] - center_y) / scale))
        .collect()
}

/// Draw the glycolysis network diagram
///
/// Metabolites are labeled circles, edges are arrows. The layout is seeded, so every run
/// draws the same picture.
pub fn plot_core_metabolic_pathway<P: AsRef<Path>>(
    output: P,
    config: &PlotConfig,
) -> Result<PathBuf, PlotError> {
    let pathway = PathwayGraph::glycolysis();
    let layout = pathway.spring_layout(LAYOUT_SPACING, LAYOUT_ITERATIONS, LAYOUT_SEED);

    let output = output.as_ref();
    prepare_output(output)?;
    let root = BitMapBackend::new(output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(&config.title, config.title_style())?;

    let (width, height) = area.dim_in_pixel();
    let padding = (NODE_RADIUS + config.margin as i32) as f64;
    let usable_width = (width as f64 - 2. * padding).max(1.);
    let usable_height = (height as f64 - 2. * padding).max(1.);
    let centers: Vec<(f64, f64)> = layout
        .iter()
        .map(|(x, y)| {
            (
                padding + (x + 1.) / 2. * usable_width,
                padding + (1. - (y + 1.) / 2.) * usable_height,
            )
        })
        .collect();

    let edge_color = config.primary_color.mix(0.7);
    for edge in pathway.graph.edge_references() {
        let from = centers[edge.source().index()];
        let to = centers[edge.target().index()];
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        if length <= 2. * NODE_RADIUS as f64 {
            continue;
        }
        let (ux, uy) = (dx / length, dy / length);
        let radius = NODE_RADIUS as f64;
        let start = (from.0 + ux * radius, from.1 + uy * radius);
        let tip = (to.0 - ux * radius, to.1 - uy * radius);
        let base = (tip.0 - ux * ARROW_LENGTH, tip.1 - uy * ARROW_LENGTH);
        let (px, py) = (-uy * ARROW_WIDTH / 2., ux * ARROW_WIDTH / 2.);

        area.draw(&PathElement::new(
            vec![pixel(start), pixel(base)],
            edge_color.stroke_width(2),
        ))?;
        area.draw(&Polygon::new(
            vec![
                pixel(tip),
                pixel((base.0 + px, base.1 + py)),
                pixel((base.0 - px, base.1 - py)),
            ],
            edge_color.filled(),
        ))?;
    }

    let node_style = config.secondary_color.mix(0.85).filled();
    let label_style = TextStyle::from((
        config.font_family.as_str(),
        config.label_font_size,
        FontStyle::Bold,
    ))
    .color(&WHITE)
    .pos(Pos::new(HPos::Center, VPos::Center));
    for (index, center) in pathway.graph.node_indices().zip(&centers) {
        let center = pixel(*center);
        area.draw(&Circle::new(center, NODE_RADIUS, node_style))?;
        area.draw(&Text::new(
            pathway.graph[index].as_str(),
            center,
            label_style.clone(),
        ))?;
    }

    root.present()?;
    log::info!("Pathway network saved to {}", output.display());
    Ok(output.to_path_buf())
}

fn pixel(point: (f64, f64)) -> (i32, i32) {
    (point.0.round() as i32, point.1.round() as i32)
}
