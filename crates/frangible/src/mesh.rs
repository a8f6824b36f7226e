//! The description of a body handed over by a loader.
//!
//! A loader (such as the `meshgen` crate) produces a [`MeshDefinition`]; the
//! [`Body`](crate::Body) builds its stores from it. Springs and triangles refer to
//! particles by their position in [`MeshDefinition::points`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{ElementIndex, FrontierType, MaterialId, MeshError, PlaneId, consts};

/// A particle as described by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDefinition {
    /// The position at load time.
    pub position: Vec2,
    /// The material of the particle.
    pub material: MaterialId,
    /// The strength of the particle, if it differs from the material's.
    #[serde(default)]
    pub strength: Option<f32>,
    /// Whether the particle is part of a rope.
    #[serde(default)]
    pub is_rope: bool,
    /// Whether the particle is watertight, if it differs from the material.
    #[serde(default)]
    pub is_hull: Option<bool>,
    /// The electrical element living on the particle.
    #[serde(default)]
    pub electrical_element: Option<ElementIndex>,
    /// The depth layer of the particle.
    #[serde(default)]
    pub plane: PlaneId,
}

impl PointDefinition {
    /// A particle with the material's properties.
    #[must_use]
    pub const fn new(position: Vec2, material: MaterialId) -> Self {
        Self {
            position,
            material,
            strength: None,
            is_rope: false,
            is_hull: None,
            electrical_element: None,
            plane: 0,
        }
    }

    /// Overrides the strength of the particle.
    #[must_use]
    pub const fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }
}

/// A spring as described by a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpringDefinition {
    /// The two endpoints.
    pub endpoints: [ElementIndex; 2],
}

/// A triangle as described by a loader.
///
/// `sub_springs[k]` joins `points[k]` and `points[(k + 1) % 3]`. The first
/// point owns the triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleDefinition {
    /// The three vertices.
    pub points: [ElementIndex; 3],
    /// The three edges.
    pub sub_springs: [ElementIndex; 3],
    /// The spring crossing the quad this triangle forms with a neighbor, if any.
    #[serde(default)]
    pub covered_traverse_spring: Option<ElementIndex>,
}

/// A boundary cycle as found by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierDefinition {
    /// Whether the cycle is an outer hull or a hole.
    pub kind: FrontierType,
    /// The springs of the cycle, in walking order.
    pub edges: Vec<ElementIndex>,
}

/// Everything needed to build a body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDefinition {
    /// The particles.
    pub points: Vec<PointDefinition>,
    /// The springs.
    pub springs: Vec<SpringDefinition>,
    /// The triangles.
    pub triangles: Vec<TriangleDefinition>,
    /// The boundary cycles of the intact body.
    pub frontiers: Vec<FrontierDefinition>,
    /// The size of the ephemeral particle pool.
    #[serde(default)]
    pub ephemeral_capacity: usize,
}

impl MeshDefinition {
    /// Reads a definition from a JSON file.
    ///
    /// # Errors
    ///
    /// - If the file cannot be read or parsed.
    pub fn from_json_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, MeshError> {
        let contents = std::fs::read_to_string(path).map_err(|e| MeshError::InvalidMesh(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| MeshError::InvalidMesh(e.to_string()))
    }

    /// Writes the definition to a JSON file.
    ///
    /// # Errors
    ///
    /// - If the definition cannot be serialized or the file cannot be written.
    pub fn to_json_path<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), MeshError> {
        let contents = serde_json::to_string(self).map_err(|e| MeshError::InvalidMesh(e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| MeshError::InvalidMesh(e.to_string()))
    }

    /// Checks the references and limits of the definition.
    ///
    /// # Errors
    ///
    /// - If any index is out of range.
    /// - If a spring joins a particle to itself.
    /// - If a triangle's sub-spring does not join the expected vertices.
    /// - If a spring is an edge of more than two triangles.
    /// - If a frontier edge is not a spring.
    pub fn validate(&self) -> Result<(), MeshError> {
        let n_points = self.points.len();
        let n_springs = self.springs.len();
        let check = |kind: &'static str, index: ElementIndex, count: usize| {
            if (index as usize) < count {
                Ok(())
            } else {
                Err(MeshError::IndexOutOfRange { kind, index, count })
            }
        };

        for (s, spring) in self.springs.iter().enumerate() {
            let [a, b] = spring.endpoints;
            check("point", a, n_points)?;
            check("point", b, n_points)?;
            if a == b {
                return Err(MeshError::InvalidMesh(format!("spring {s} joins point {a} to itself")));
            }
        }

        let mut super_triangle_counts = vec![0_usize; n_springs];
        for (t, triangle) in self.triangles.iter().enumerate() {
            for k in 0..3 {
                check("point", triangle.points[k], n_points)?;
                let s = triangle.sub_springs[k];
                check("spring", s, n_springs)?;

                let mut expected = [triangle.points[k], triangle.points[(k + 1) % 3]];
                let mut actual = self.springs[s as usize].endpoints;
                expected.sort_unstable();
                actual.sort_unstable();
                if expected != actual {
                    return Err(MeshError::InvalidMesh(format!(
                        "sub-spring {k} of triangle {t} joins {actual:?} instead of {expected:?}"
                    )));
                }

                super_triangle_counts[s as usize] += 1;
                if super_triangle_counts[s as usize] > consts::MAX_SUPER_TRIANGLES_PER_SPRING {
                    return Err(MeshError::InvalidMesh(format!("spring {s} is an edge of more than two triangles")));
                }
            }
            if let Some(s) = triangle.covered_traverse_spring {
                check("spring", s, n_springs)?;
            }
        }

        for frontier in &self.frontiers {
            for &s in &frontier.edges {
                check("spring", s, n_springs)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use crate::MaterialId;

    use super::{MeshDefinition, PointDefinition, SpringDefinition, TriangleDefinition};

    fn triangle() -> MeshDefinition {
        let m = MaterialId(1);
        MeshDefinition {
            points: vec![
                PointDefinition::new(Vec2::ZERO, m),
                PointDefinition::new(Vec2::Y, m),
                PointDefinition::new(Vec2::X, m),
            ],
            springs: vec![
                SpringDefinition { endpoints: [0, 1] },
                SpringDefinition { endpoints: [1, 2] },
                SpringDefinition { endpoints: [2, 0] },
            ],
            triangles: vec![TriangleDefinition {
                points: [0, 1, 2],
                sub_springs: [0, 1, 2],
                covered_traverse_spring: None,
            }],
            frontiers: Vec::new(),
            ephemeral_capacity: 0,
        }
    }

    #[test]
    fn accepts_consistent_triangle() -> Result<(), String> {
        triangle().validate().map_err(|e| e.to_string())
    }

    #[test]
    fn rejects_mismatched_sub_spring() {
        let mut mesh = triangle();
        mesh.triangles[0].sub_springs = [1, 0, 2];
        assert!(mesh.validate().is_err(), "Swapped sub-springs should be rejected");
    }

    #[test]
    fn rejects_dangling_endpoint() {
        let mut mesh = triangle();
        mesh.springs[0].endpoints = [0, 7];
        assert!(mesh.validate().is_err(), "Dangling endpoints should be rejected");
    }

    #[test]
    fn parses_json() -> Result<(), String> {
        let mesh = triangle();
        let json = serde_json::to_string(&mesh).map_err(|e| e.to_string())?;
        let parsed: MeshDefinition = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        assert_eq!(parsed, mesh);
        Ok(())
    }
}
