//! The triangle store.

use crate::{DestroyHandler, ElementIndex, MeshError, Points, as_index, utils};

/// The triangle store.
///
/// `sub_springs[k]` of a triangle joins its vertices `k` and `(k + 1) % 3`.
/// The first vertex owns the triangle.
pub struct Triangles {
    /// The callback fired right before a triangle is deleted.
    destroy_handler: Option<DestroyHandler>,
    /// Whether each triangle is deleted.
    is_deleted: Vec<bool>,
    /// The three vertices of each triangle.
    endpoints: Vec<[ElementIndex; 3]>,
    /// The three edges of each triangle.
    sub_springs: Vec<[ElementIndex; 3]>,
    /// The spring crossing the quad each triangle forms with a neighbor.
    covered_traverse_spring: Vec<Option<ElementIndex>>,
}

impl Triangles {
    /// Creates an empty store with room for `capacity` triangles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            destroy_handler: None,
            is_deleted: Vec::with_capacity(capacity),
            endpoints: Vec::with_capacity(capacity),
            sub_springs: Vec::with_capacity(capacity),
            covered_traverse_spring: Vec::with_capacity(capacity),
        }
    }

    /// Registers the callback fired right before a triangle is deleted.
    pub fn register_destroy_handler(&mut self, handler: DestroyHandler) {
        self.destroy_handler = Some(handler);
    }

    /// Adds a triangle. The caller connects it to its vertices and edges.
    pub fn add(
        &mut self,
        endpoints: [ElementIndex; 3],
        sub_springs: [ElementIndex; 3],
        covered_traverse_spring: Option<ElementIndex>,
    ) -> ElementIndex {
        let t = as_index(self.len());
        self.is_deleted.push(false);
        self.endpoints.push(endpoints);
        self.sub_springs.push(sub_springs);
        self.covered_traverse_spring.push(covered_traverse_spring);
        t
    }

    /// Marks a triangle deleted after the caller has detached it.
    pub fn destroy(&mut self, triangle: ElementIndex) {
        debug_assert!(!self.is_deleted(triangle), "Triangle {triangle} is already deleted");
        if let Some(handler) = self.destroy_handler.as_mut() {
            handler(triangle);
        }
        self.is_deleted[triangle as usize] = true;
    }

    /// Clears the deleted flag of a triangle. The caller reattaches it.
    ///
    /// # Errors
    ///
    /// - If the triangle is not deleted.
    pub fn restore(&mut self, triangle: ElementIndex) -> Result<(), MeshError> {
        if !self.is_deleted(triangle) {
            return Err(MeshError::NotDeleted {
                kind: "triangle",
                index: triangle,
            });
        }
        self.is_deleted[triangle as usize] = false;
        Ok(())
    }

    /// The number of triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the store has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Whether the triangle is deleted.
    #[must_use]
    pub fn is_deleted(&self, triangle: ElementIndex) -> bool {
        self.is_deleted[triangle as usize]
    }

    /// The three vertices of the triangle.
    #[must_use]
    pub fn endpoints(&self, triangle: ElementIndex) -> [ElementIndex; 3] {
        self.endpoints[triangle as usize]
    }

    /// The vertex that owns the triangle.
    #[must_use]
    pub fn owner(&self, triangle: ElementIndex) -> ElementIndex {
        self.endpoints[triangle as usize][0]
    }

    /// The three edges of the triangle.
    #[must_use]
    pub fn sub_springs(&self, triangle: ElementIndex) -> [ElementIndex; 3] {
        self.sub_springs[triangle as usize]
    }

    /// The spring crossing the quad the triangle forms with a neighbor.
    #[must_use]
    pub fn covered_traverse_spring(&self, triangle: ElementIndex) -> Option<ElementIndex> {
        self.covered_traverse_spring[triangle as usize]
    }

    /// The position of `point` among the vertices of the triangle.
    #[must_use]
    pub fn vertex_ordinal(&self, triangle: ElementIndex, point: ElementIndex) -> Option<usize> {
        self.endpoints[triangle as usize].iter().position(|&p| p == point)
    }

    /// The position of `spring` among the edges of the triangle.
    #[must_use]
    pub fn sub_spring_ordinal(&self, triangle: ElementIndex, spring: ElementIndex) -> Option<usize> {
        self.sub_springs[triangle as usize].iter().position(|&s| s == spring)
    }

    /// Whether `b` directly follows `a` in the winding order of the triangle.
    #[must_use]
    pub fn are_points_in_winding_order(&self, triangle: ElementIndex, a: ElementIndex, b: ElementIndex) -> bool {
        self.vertex_ordinal(triangle, a)
            .is_some_and(|k| self.endpoints[triangle as usize][(k + 1) % 3] == b)
    }

    /// Whether both points are vertices of the triangle.
    #[must_use]
    pub fn contains_both(&self, triangle: ElementIndex, a: ElementIndex, b: ElementIndex) -> bool {
        let endpoints = &self.endpoints[triangle as usize];
        endpoints.contains(&a) && endpoints.contains(&b)
    }

    /// Twice the signed area of the triangle at load time.
    ///
    /// Positive when the vertices wind counter-clockwise.
    #[must_use]
    pub fn factory_signed_area_x2(&self, triangle: ElementIndex, points: &Points) -> f64 {
        let [a, b, c] = self.endpoints[triangle as usize];
        utils::signed_area_x2(points.factory_position(a), points.factory_position(b), points.factory_position(c))
    }
}

#[cfg(test)]
mod tests {
    use super::Triangles;

    #[test]
    fn destroy_and_restore() -> Result<(), String> {
        let mut triangles = Triangles::with_capacity(1);
        let t = triangles.add([0, 1, 2], [0, 1, 2], None);
        assert_eq!(triangles.owner(t), 0);
        assert_eq!(triangles.vertex_ordinal(t, 2), Some(2));
        assert_eq!(triangles.sub_spring_ordinal(t, 5), None);
        assert!(triangles.contains_both(t, 2, 0));
        assert!(triangles.are_points_in_winding_order(t, 2, 0));
        assert!(!triangles.are_points_in_winding_order(t, 0, 2));

        assert!(triangles.restore(t).is_err(), "Restoring a live triangle is an error");
        triangles.destroy(t);
        assert!(triangles.is_deleted(t));
        triangles.restore(t).map_err(|e| e.to_string())?;
        assert!(!triangles.is_deleted(t));
        Ok(())
    }
}
