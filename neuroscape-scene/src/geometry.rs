//! Icosphere wireframes for the nested sphere structure

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::math::Point3;

/// Unit-radius wireframe: vertices plus unique undirected edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wireframe {
    pub vertices: Vec<Point3>,
    pub edges: Vec<(u32, u32)>,
}

impl Wireframe {
    /// Wireframe of an icosphere with the given subdivision level.
    ///
    /// * 0: 12 vertices, 30 edges (icosahedron)
    /// * 1: 42 vertices, 120 edges
    /// * 2: 162 vertices, 480 edges
    pub fn icosphere(subdivisions: u32) -> Self {
        let (vertices, faces) = icosphere(subdivisions);

        let mut unique = BTreeSet::new();
        for face in &faces {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                unique.insert(if a < b { (a, b) } else { (b, a) });
            }
        }

        Self {
            vertices: vertices.into_iter().map(Point3::from).collect(),
            edges: unique.into_iter().collect(),
        }
    }
}

/// Icosphere triangles on the unit sphere
fn icosphere(subdivisions: u32) -> (Vec<[f32; 3]>, Vec<[u32; 3]>) {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut vertices: Vec<[f32; 3]> = vec![
        normalize([-1.0, phi, 0.0]),
        normalize([1.0, phi, 0.0]),
        normalize([-1.0, -phi, 0.0]),
        normalize([1.0, -phi, 0.0]),
        normalize([0.0, -1.0, phi]),
        normalize([0.0, 1.0, phi]),
        normalize([0.0, -1.0, -phi]),
        normalize([0.0, 1.0, -phi]),
        normalize([phi, 0.0, -1.0]),
        normalize([phi, 0.0, 1.0]),
        normalize([-phi, 0.0, -1.0]),
        normalize([-phi, 0.0, 1.0]),
    ];

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut next = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();

        for &[v1, v2, v3] in &faces {
            let a = midpoint(v1, v2, &mut vertices, &mut midpoints);
            let b = midpoint(v2, v3, &mut vertices, &mut midpoints);
            let c = midpoint(v3, v1, &mut vertices, &mut midpoints);

            next.push([v1, a, c]);
            next.push([v2, b, a]);
            next.push([v3, c, b]);
            next.push([a, b, c]);
        }

        faces = next;
    }

    (vertices, faces)
}

/// Shared midpoint of an edge, pushed onto the unit sphere
fn midpoint(
    v1: u32,
    v2: u32,
    vertices: &mut Vec<[f32; 3]>,
    cache: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    let key = if v1 < v2 { (v1, v2) } else { (v2, v1) };
    if let Some(&index) = cache.get(&key) {
        return index;
    }

    let p1 = vertices[v1 as usize];
    let p2 = vertices[v2 as usize];
    let mid = normalize([
        (p1[0] + p2[0]) / 2.0,
        (p1[1] + p2[1]) / 2.0,
        (p1[2] + p2[2]) / 2.0,
    ]);

    let index = vertices.len() as u32;
    vertices.push(mid);
    cache.insert(key, index);
    index
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icosahedron_counts() {
        let wire = Wireframe::icosphere(0);
        assert_eq!(wire.vertices.len(), 12);
        assert_eq!(wire.edges.len(), 30);
    }

    #[test]
    fn subdivided_counts() {
        let one = Wireframe::icosphere(1);
        assert_eq!(one.vertices.len(), 42);
        assert_eq!(one.edges.len(), 120);

        let two = Wireframe::icosphere(2);
        assert_eq!(two.vertices.len(), 162);
        assert_eq!(two.edges.len(), 480);
    }

    #[test]
    fn vertices_on_unit_sphere() {
        for v in &Wireframe::icosphere(2).vertices {
            let len = v.distance(&Point3::ORIGIN);
            assert!((len - 1.0).abs() < 0.001, "{v:?} has length {len}");
        }
    }

    #[test]
    fn edges_are_ordered_and_in_bounds() {
        let wire = Wireframe::icosphere(1);
        for &(a, b) in &wire.edges {
            assert!(a < b);
            assert!((b as usize) < wire.vertices.len());
        }
    }
}
