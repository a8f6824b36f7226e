//! Detection of the initial frontiers of a triangle mesh.

use frangible::{ElementIndex, FrontierDefinition, FrontierType, MeshError, PointDefinition, SpringDefinition, TriangleDefinition};

use crate::as_index;

/// Finds the closed boundary cycles of a mesh.
///
/// A boundary edge is a spring with exactly one triangle. It is directed like
/// the winding of that triangle, and its successor is the next boundary edge
/// found by rotating around its head through the same fan of triangles. A
/// particle where several fans meet therefore lies on several cycles.
///
/// A cycle is external when its signed area has the same sign as the winding
/// of the triangles, and internal otherwise. Cycles are reported in order of
/// their lowest spring, each starting from that spring.
///
/// # Errors
///
/// - If a spring has more than two triangles.
/// - If a triangle does not contain the particle a walk expects.
/// - If the walk around a particle does not terminate.
pub fn detect_frontiers(
    points: &[PointDefinition],
    springs: &[SpringDefinition],
    triangles: &[TriangleDefinition],
) -> Result<Vec<FrontierDefinition>, MeshError> {
    let mut super_triangles = vec![Vec::with_capacity(2); springs.len()];
    for (t, triangle) in triangles.iter().enumerate() {
        for &s in &triangle.sub_springs {
            let supers = super_triangles
                .get_mut(s as usize)
                .ok_or_else(|| MeshError::InvalidMesh(format!("triangle {t} refers to missing spring {s}")))?;
            if supers.len() == 2 {
                return Err(MeshError::InvalidMesh(format!("spring {s} has more than two triangles")));
            }
            supers.push(as_index(t));
        }
    }

    let Some(winding) = triangles.first().map(|t| winding_sign(points, t.points)) else {
        return Ok(Vec::new());
    };

    let walker = FanWalker {
        triangles,
        super_triangles: &super_triangles,
    };

    let mut visited = vec![false; springs.len()];
    let mut frontiers = Vec::new();
    for start in (0..springs.len()).filter(|&s| super_triangles[s].len() == 1) {
        if visited[start] {
            continue;
        }

        let mut edges = Vec::new();
        let mut area_x2 = 0.0;
        let mut s = as_index(start);
        loop {
            visited[s as usize] = true;
            edges.push(s);
            let [a, b] = walker.directed(s);
            area_x2 += shoelace_term(&points[a as usize], &points[b as usize]);

            s = walker.next_boundary_edge(s)?;
            if s as usize == start {
                break;
            }
            if visited[s as usize] || edges.len() > springs.len() {
                return Err(MeshError::InvalidMesh(format!("the boundary through spring {start} does not close")));
            }
        }

        let kind = if area_x2 * winding > 0.0 {
            FrontierType::External
        } else {
            FrontierType::Internal
        };
        ftlog::debug!("Detected {kind:?} frontier with {} edges starting at spring {start}", edges.len());
        frontiers.push(FrontierDefinition { kind, edges });
    }

    Ok(frontiers)
}

/// Walks fans of triangles around particles.
struct FanWalker<'a> {
    /// The triangles of the mesh.
    triangles: &'a [TriangleDefinition],
    /// The triangles of each spring.
    super_triangles: &'a [Vec<ElementIndex>],
}

impl FanWalker<'_> {
    /// The endpoints of a boundary edge, tail first.
    fn directed(&self, s: ElementIndex) -> [ElementIndex; 2] {
        let (triangle, k) = self.owner(s);
        [triangle.points[k], triangle.points[(k + 1) % 3]]
    }

    /// The only triangle of a boundary edge and the edge's ordinal in it.
    fn owner(&self, s: ElementIndex) -> (&TriangleDefinition, usize) {
        let triangle = &self.triangles[self.super_triangles[s as usize][0] as usize];
        let k = triangle.sub_springs.iter().position(|&e| e == s).unwrap_or_default();
        (triangle, k)
    }

    /// The boundary edge leaving the head of `s` in the same fan as `s`.
    fn next_boundary_edge(&self, s: ElementIndex) -> Result<ElementIndex, MeshError> {
        let [_, head] = self.directed(s);
        let mut t = self.super_triangles[s as usize][0];

        for _ in 0..=self.triangles.len() {
            let triangle = &self.triangles[t as usize];
            let k = triangle
                .points
                .iter()
                .position(|&p| p == head)
                .ok_or_else(|| MeshError::InvalidMesh(format!("triangle {t} does not contain point {head}")))?;
            let outgoing = triangle.sub_springs[k];
            match self.super_triangles[outgoing as usize].as_slice() {
                [_] => return Ok(outgoing),
                &[a, b] => t = if a == t { b } else { a },
                _ => break,
            }
        }

        Err(MeshError::InvalidMesh(format!("the fan around point {head} does not end on a boundary")))
    }
}

/// Twice the signed area contribution of the directed edge `a -> b`.
fn shoelace_term(a: &PointDefinition, b: &PointDefinition) -> f64 {
    f64::from(a.position.x).mul_add(f64::from(b.position.y), -f64::from(b.position.x) * f64::from(a.position.y))
}

/// The sign of the signed area of a triangle.
fn winding_sign(points: &[PointDefinition], vertices: [ElementIndex; 3]) -> f64 {
    let [a, b, c] = vertices.map(|p| &points[p as usize]);
    (shoelace_term(a, b) + shoelace_term(b, c) + shoelace_term(c, a)).signum()
}
