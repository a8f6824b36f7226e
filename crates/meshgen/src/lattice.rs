//! Rectangular lattice bodies.

use std::collections::{BTreeSet, HashMap};

use frangible::{
    ElementIndex, MaterialDatabase, MaterialId, MeshDefinition, MeshError, PointDefinition, SpringDefinition, StrengthRandomization,
    TriangleDefinition,
};
use glam::Vec2;
use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{as_index, detect_frontiers, randomize_strengths};

/// A rectangular lattice of square cells, each split along its rising
/// diagonal into two clockwise triangles.
///
/// Cells are addressed by `(row, col)`, with row `0` at the bottom. Cells
/// marked as holes produce no triangles; particles and springs that no
/// triangle uses are left out of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    /// The number of rows of cells.
    rows: usize,
    /// The number of columns of cells.
    cols: usize,
    /// The side of a cell.
    spacing: f32,
    /// The cells left empty.
    holes: BTreeSet<(usize, usize)>,
    /// Whether each cell also gets the spring along its falling diagonal.
    traverse_springs: bool,
    /// The size of the ephemeral particle pool.
    ephemeral_capacity: usize,
}

impl Lattice {
    /// A lattice of `rows x cols` unit cells without holes.
    ///
    /// # Errors
    ///
    /// - If either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self, MeshError> {
        if rows == 0 || cols == 0 {
            return Err(MeshError::InvalidMesh(format!("a lattice needs at least one cell, got {rows}x{cols}")));
        }
        Ok(Self {
            rows,
            cols,
            spacing: 1.0,
            holes: BTreeSet::new(),
            traverse_springs: false,
            ephemeral_capacity: 0,
        })
    }

    /// Sets the side of a cell.
    #[must_use]
    pub const fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Adds the spring along the falling diagonal of every cell, covered by
    /// both of the cell's triangles.
    #[must_use]
    pub const fn with_traverse_springs(mut self, traverse_springs: bool) -> Self {
        self.traverse_springs = traverse_springs;
        self
    }

    /// Sets the size of the ephemeral particle pool.
    #[must_use]
    pub const fn with_ephemeral_capacity(mut self, capacity: usize) -> Self {
        self.ephemeral_capacity = capacity;
        self
    }

    /// Leaves the given `(row, col)` cells empty.
    ///
    /// # Errors
    ///
    /// - If a cell is outside the lattice.
    pub fn with_holes<I: IntoIterator<Item = (usize, usize)>>(mut self, holes: I) -> Result<Self, MeshError> {
        for (row, col) in holes {
            if row >= self.rows || col >= self.cols {
                return Err(MeshError::InvalidMesh(format!(
                    "hole ({row}, {col}) is outside the {}x{} lattice",
                    self.rows, self.cols
                )));
            }
            self.holes.insert((row, col));
        }
        Ok(self)
    }

    /// Leaves `count` cells, chosen with the given seed among the cells that
    /// are not yet holes, empty.
    ///
    /// # Errors
    ///
    /// - If there are fewer than `count` cells left.
    pub fn with_random_holes(self, count: usize, seed: u64) -> Result<Self, MeshError> {
        let candidates = (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .filter(|cell| !self.holes.contains(cell))
            .collect::<Vec<_>>();
        if count > candidates.len() {
            return Err(MeshError::InvalidMesh(format!(
                "cannot punch {count} holes into {} remaining cells",
                candidates.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let chosen = candidates.choose_multiple(&mut rng, count).copied().collect::<Vec<_>>();
        self.with_holes(chosen)
    }

    /// The number of rows of cells.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The number of columns of cells.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The cells left empty.
    #[must_use]
    pub const fn holes(&self) -> &BTreeSet<(usize, usize)> {
        &self.holes
    }

    /// Builds the body description.
    ///
    /// Every particle is made of `material`. The initial frontiers are detected
    /// from the triangles, and particle strengths are randomized with
    /// `randomization`.
    ///
    /// # Errors
    ///
    /// - If `material` is not in `materials`.
    /// - If the frontiers cannot be detected.
    pub fn generate(
        &self,
        material: MaterialId,
        materials: &MaterialDatabase,
        randomization: &StrengthRandomization,
    ) -> Result<MeshDefinition, MeshError> {
        if usize::from(material.0) >= materials.len() {
            return Err(MeshError::InvalidMesh(format!("unknown material {material:?}")));
        }

        let mut builder = Builder::new(material, self.spacing);
        for row in 0..self.rows {
            for col in (0..self.cols).filter(|&col| !self.holes.contains(&(row, col))) {
                let bottom_left = builder.point(col, row);
                let top_left = builder.point(col, row + 1);
                let top_right = builder.point(col + 1, row + 1);
                let bottom_right = builder.point(col + 1, row);

                let traverse = self.traverse_springs.then(|| builder.spring(top_left, bottom_right));
                builder.triangle([bottom_left, top_left, top_right], traverse);
                builder.triangle([bottom_left, top_right, bottom_right], traverse);
            }
        }

        let Builder {
            mut points,
            springs,
            triangles,
            ..
        } = builder;

        let frontiers = detect_frontiers(&points, &springs, &triangles)?;
        randomize_strengths(&mut points, materials, randomization);

        ftlog::info!(
            "Generated a {}x{} lattice with {} holes: {} points, {} springs, {} triangles, {} frontiers",
            self.rows,
            self.cols,
            self.holes.len(),
            points.len(),
            springs.len(),
            triangles.len(),
            frontiers.len()
        );

        Ok(MeshDefinition {
            points,
            springs,
            triangles,
            frontiers,
            ephemeral_capacity: self.ephemeral_capacity,
        })
    }
}

/// Accumulates particles, springs and triangles, creating each lattice point
/// and spring once.
struct Builder {
    /// The material of every particle.
    material: MaterialId,
    /// The side of a cell.
    spacing: f32,
    /// The particles.
    points: Vec<PointDefinition>,
    /// The particle at each lattice coordinate.
    point_ids: HashMap<(usize, usize), ElementIndex>,
    /// The springs.
    springs: Vec<SpringDefinition>,
    /// The spring joining each ordered pair of particles.
    spring_ids: HashMap<(ElementIndex, ElementIndex), ElementIndex>,
    /// The triangles.
    triangles: Vec<TriangleDefinition>,
}

impl Builder {
    /// An empty builder.
    fn new(material: MaterialId, spacing: f32) -> Self {
        Self {
            material,
            spacing,
            points: Vec::new(),
            point_ids: HashMap::new(),
            springs: Vec::new(),
            spring_ids: HashMap::new(),
            triangles: Vec::new(),
        }
    }

    /// The particle at the lattice coordinate `(x, y)`.
    #[expect(clippy::cast_precision_loss)]
    fn point(&mut self, x: usize, y: usize) -> ElementIndex {
        if let Some(&p) = self.point_ids.get(&(x, y)) {
            return p;
        }
        let p = as_index(self.points.len());
        let position = Vec2::new(x as f32, y as f32) * self.spacing;
        self.points.push(PointDefinition::new(position, self.material));
        self.point_ids.insert((x, y), p);
        p
    }

    /// The spring joining `a` and `b`.
    fn spring(&mut self, a: ElementIndex, b: ElementIndex) -> ElementIndex {
        let key = (a.min(b), a.max(b));
        if let Some(&s) = self.spring_ids.get(&key) {
            return s;
        }
        let s = as_index(self.springs.len());
        self.springs.push(SpringDefinition { endpoints: [a, b] });
        self.spring_ids.insert(key, s);
        s
    }

    /// Adds the triangle with the given vertices in clockwise order.
    fn triangle(&mut self, points: [ElementIndex; 3], covered_traverse_spring: Option<ElementIndex>) {
        let sub_springs = [
            self.spring(points[0], points[1]),
            self.spring(points[1], points[2]),
            self.spring(points[2], points[0]),
        ];
        self.triangles.push(TriangleDefinition {
            points,
            sub_springs,
            covered_traverse_spring,
        });
    }
}
