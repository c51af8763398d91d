//! Proximity graph over a point set
//!
//! Every unordered pair is tested, so construction is O(n²). The network has
//! about 80 nodes; larger inputs would want a spatial grid instead.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::Point3;

/// Undirected edge between two node indices, `from < to`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    /// `1 - distance / threshold`, used only for line alpha
    pub strength: f32,
}

/// Connect every pair of points strictly closer than `threshold`.
///
/// Edges come out in lexicographic `(from, to)` order. A non-positive
/// threshold connects nothing.
pub fn build_edges(points: &[Point3], threshold: f32) -> Vec<Edge> {
    let mut edges = Vec::new();
    if !(threshold > 0.0) {
        return edges;
    }

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dist = points[i].distance(&points[j]);
            if dist < threshold {
                edges.push(Edge {
                    from: i,
                    to: j,
                    strength: 1.0 - dist / threshold,
                });
            }
        }
    }

    edges
}

/// Immutable edge table over a fixed node set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProximityGraph {
    pub threshold: f32,
    pub node_count: usize,
    pub edges: Vec<Edge>,
}

impl ProximityGraph {
    pub fn build(points: &[Point3], threshold: f32) -> Self {
        Self {
            threshold,
            node_count: points.len(),
            edges: build_edges(points, threshold),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Uniformly random edge, `None` when the graph has no edges
    pub fn random_edge<R: Rng>(&self, rng: &mut R) -> Option<&Edge> {
        if self.edges.is_empty() {
            return None;
        }
        self.edges.get(rng.gen_range(0..self.edges.len()))
    }

    /// Indices of nodes sharing an edge with `node`
    pub fn neighbours(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().filter_map(move |e| {
            if e.from == node {
                Some(e.to)
            } else if e.to == node {
                Some(e.from)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn line(n: usize, spacing: f32) -> Vec<Point3> {
        (0..n)
            .map(|i| Point3::new(i as f32 * spacing, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn connects_only_close_pairs() {
        let points = line(4, 5.0);
        let edges = build_edges(&points, 6.0);
        let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn threshold_is_strict() {
        let points = vec![Point3::ORIGIN, Point3::new(12.0, 0.0, 0.0)];
        assert!(build_edges(&points, 12.0).is_empty());
    }

    #[test]
    fn closeness_tracks_distance() {
        let points = vec![Point3::ORIGIN, Point3::new(3.0, 0.0, 0.0)];
        let edges = build_edges(&points, 12.0);
        assert_eq!(edges.len(), 1);
        assert!((edges[0].strength - 0.75).abs() < 1e-6);
    }

    #[test]
    fn no_self_or_duplicate_edges() {
        // Coincident points still only produce one edge per unordered pair
        let points = vec![Point3::ORIGIN; 6];
        let edges = build_edges(&points, 1.0);
        assert_eq!(edges.len(), 15);

        let mut seen = HashSet::new();
        for e in &edges {
            assert!(e.from < e.to);
            assert!(seen.insert((e.from, e.to)));
            assert_eq!(e.strength, 1.0);
        }
    }

    #[test]
    fn non_positive_threshold_builds_nothing() {
        let points = vec![Point3::ORIGIN; 3];
        assert!(build_edges(&points, 0.0).is_empty());
        assert!(build_edges(&points, -1.0).is_empty());
    }

    #[test]
    fn neighbours_walk_both_directions() {
        let graph = ProximityGraph::build(&line(3, 1.0), 1.5);
        let mut around_middle: Vec<usize> = graph.neighbours(1).collect();
        around_middle.sort();
        assert_eq!(around_middle, vec![0, 2]);
    }

    #[test]
    fn random_edge_on_empty_graph_is_none() {
        use rand::SeedableRng;
        let graph = ProximityGraph::build(&[], 5.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        assert!(graph.random_edge(&mut rng).is_none());
    }
}
