//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use frangible::{
    Body, ElementIndex, EventSink, FrontierColor, FrontierId, FrontierRenderer, FrontierType, MaterialDatabase, MeshDefinition,
    SimulationParameters, StrengthRandomization, StructuralMaterial,
};
use meshgen::Lattice;

/// Parameters without gravity, so that resting bodies stay at rest.
pub fn weightless() -> SimulationParameters {
    SimulationParameters {
        apply_gravity: false,
        ..SimulationParameters::default()
    }
}

/// A wooden lattice with the given holes.
pub fn lattice(rows: usize, cols: usize, holes: &[(usize, usize)]) -> Result<MeshDefinition, String> {
    let materials = MaterialDatabase::builtin();
    let wood = materials.find("Wood").ok_or("Missing wood")?;
    Lattice::new(rows, cols)
        .and_then(|l| l.with_holes(holes.iter().copied()))
        .map(|l| l.with_ephemeral_capacity(8))
        .and_then(|l| l.generate(wood, &materials, &StrengthRandomization::default()))
        .map_err(|e| e.to_string())
}

/// Builds a body that reports to `sink`.
pub fn build_with_sink(mesh: &MeshDefinition, params: SimulationParameters, sink: Arc<dyn EventSink>) -> Result<Body, String> {
    Body::new(mesh, Arc::new(MaterialDatabase::builtin()), params, sink, 42).map_err(|e| e.to_string())
}

/// Builds a weightless body that drops its events.
pub fn build(mesh: &MeshDefinition) -> Result<Body, String> {
    build_with_sink(mesh, weightless(), Arc::new(frangible::NullEventSink))
}

/// The triangles of the cell at `(row, col)` of a lattice without holes,
/// upper-left first.
#[expect(clippy::cast_possible_truncation)]
pub const fn cell_triangles(cols: usize, row: usize, col: usize) -> [ElementIndex; 2] {
    let first = 2 * (row * cols + col) as ElementIndex;
    [first, first + 1]
}

/// The live triangles of the cell at `(row, col)` of a unit-spacing lattice,
/// found by their factory positions so that holes do not shift them.
pub fn triangles_in_cell(body: &Body, row: usize, col: usize) -> Vec<ElementIndex> {
    #[expect(clippy::cast_precision_loss)]
    let corner = glam::Vec2::new(col as f32, row as f32);
    let count = ElementIndex::try_from(body.triangles().len()).unwrap_or(ElementIndex::MAX);
    (0..count)
        .filter(|&t| !body.triangles().is_deleted(t))
        .filter(|&t| {
            let centroid = body
                .triangles()
                .endpoints(t)
                .iter()
                .map(|&p| body.points().factory_position(p))
                .sum::<glam::Vec2>()
                / 3.0;
            let offset = centroid - corner;
            (0.0..1.0).contains(&offset.x) && (0.0..1.0).contains(&offset.y)
        })
        .collect()
}

/// Counts the events it receives.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub breaks: AtomicUsize,
    pub destroys: AtomicUsize,
    pub leaks: AtomicUsize,
    pub spring_repairs: AtomicUsize,
    pub triangle_repairs: AtomicUsize,
    pub body_repairs: AtomicUsize,
    pub exhausted: AtomicUsize,
}

impl CountingSink {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

impl EventSink for CountingSink {
    fn on_break(&self, _: &StructuralMaterial, count: usize) {
        self.breaks.fetch_add(count, Ordering::Relaxed);
    }

    fn on_destroy(&self, _: &StructuralMaterial, count: usize) {
        self.destroys.fetch_add(count, Ordering::Relaxed);
    }

    fn on_leak(&self, _: ElementIndex) {
        self.leaks.fetch_add(1, Ordering::Relaxed);
    }

    fn on_spring_repaired(&self, _: &StructuralMaterial, count: usize) {
        self.spring_repairs.fetch_add(count, Ordering::Relaxed);
    }

    fn on_triangle_repaired(&self, _: &StructuralMaterial, count: usize) {
        self.triangle_repairs.fetch_add(count, Ordering::Relaxed);
    }

    fn on_body_repaired(&self) {
        self.body_repairs.fetch_add(1, Ordering::Relaxed);
    }

    fn on_ephemeral_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }
}

/// Keeps the last upload.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub uploads: usize,
    pub colors: Vec<FrontierColor>,
    pub frontiers: Vec<(FrontierId, FrontierType, Vec<[ElementIndex; 2]>)>,
}

impl FrontierRenderer for RecordingRenderer {
    fn upload_point_colors(&mut self, colors: &[FrontierColor]) {
        self.uploads += 1;
        self.colors = colors.to_vec();
        self.frontiers.clear();
    }

    fn upload_frontier(&mut self, id: FrontierId, kind: FrontierType, edges: &[[ElementIndex; 2]]) {
        self.frontiers.push((id, kind, edges.to_vec()));
    }
}
