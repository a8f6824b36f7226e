//! Serializable summaries of a body.

use frangible::{Aabb, Body, ElementIndex, FrontierId, FrontierType, StepStatistics};
use serde::Serialize;

/// A summary of one frontier.
#[derive(Debug, Serialize)]
pub struct FrontierReport {
    /// The id of the frontier.
    pub id: FrontierId,
    /// Hull or hole.
    pub kind: FrontierType,
    /// The number of edges.
    pub size: usize,
    /// The signed area enclosed by the cycle.
    pub area: f64,
    /// The lower-left corner of the box around the current positions of its particles.
    pub min: [f32; 2],
    /// The upper-right corner of that box.
    pub max: [f32; 2],
    /// The springs of the cycle, in walking order from the starting edge.
    pub springs: Vec<ElementIndex>,
}

/// A summary of the structure of a body.
#[derive(Debug, Serialize)]
pub struct BodyReport {
    /// The non-ephemeral particles.
    pub points: usize,
    /// The particles that are not deleted.
    pub live_points: usize,
    /// The springs that are not deleted.
    pub live_springs: usize,
    /// The triangles that are not deleted.
    pub live_triangles: usize,
    /// The particles missing a factory connection.
    pub damaged_points: usize,
    /// The damaged particles that let water in.
    pub leaking_points: usize,
    /// The connected components of particles.
    pub connected_components: usize,
    /// The frontiers, by id.
    pub frontiers: Vec<FrontierReport>,
}

impl BodyReport {
    /// Summarizes the current state of `body`.
    #[must_use]
    pub fn new(body: &Body) -> Self {
        let points = body.points();
        let springs = body.springs();
        let triangles = body.triangles();

        let mut frontiers = body
            .frontiers()
            .iter()
            .map(|(id, frontier)| {
                let cycle = body.frontiers().cycle(id);
                let mut aabb = Aabb::default();
                for edge in cycle.iter().filter_map(|&s| body.frontiers().edge(s)) {
                    aabb.extend(points.position(edge.point_a));
                }
                FrontierReport {
                    id,
                    kind: frontier.kind(),
                    size: frontier.size(),
                    area: frontier.area_x2() / 2.0,
                    min: aabb.min.to_array(),
                    max: aabb.max.to_array(),
                    springs: cycle,
                }
            })
            .collect::<Vec<_>>();
        frontiers.sort_by_key(|f| f.id);

        Self {
            points: points.ship_point_count(),
            live_points: points.ship_points().filter(|&p| !points.is_deleted(p)).count(),
            live_springs: (0..springs.len()).filter(|&s| !springs.is_deleted(as_index(s))).count(),
            live_triangles: (0..triangles.len()).filter(|&t| !triangles.is_deleted(as_index(t))).count(),
            damaged_points: points.damaged_count(),
            leaking_points: points.leaking_count(),
            connected_components: body.connected_component_count(),
            frontiers,
        }
    }
}

/// The outcome of a simulation run.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// The statistics of every step.
    pub steps: Vec<StepStatistics>,
    /// The totals over all steps.
    pub totals: StepStatistics,
    /// The body after the last step.
    pub body: BodyReport,
}

impl SimulationReport {
    /// Sums the per-step statistics and summarizes `body`.
    #[must_use]
    pub fn new(steps: Vec<StepStatistics>, body: &Body) -> Self {
        let totals = steps.iter().fold(StepStatistics::default(), |acc, s| StepStatistics {
            broken_springs: acc.broken_springs + s.broken_springs,
            destroyed_triangles: acc.destroyed_triangles + s.destroyed_triangles,
            expired_ephemerals: acc.expired_ephemerals + s.expired_ephemerals,
            connected_components: s.connected_components,
            frontiers: s.frontiers,
        });
        Self {
            steps,
            totals,
            body: BodyReport::new(body),
        }
    }
}

/// Converts a buffer position into an `ElementIndex`.
#[expect(clippy::cast_possible_truncation)]
const fn as_index(i: usize) -> ElementIndex {
    i as ElementIndex
}
