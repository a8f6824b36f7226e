//! The boundary tracker.
//!
//! A frontier is a closed, directed cycle of springs that separates the live
//! mesh from empty space. Every frontier edge is directed the same way as the
//! winding of its single live triangle, so an outer hull winds like the
//! triangles and a hole winds against them.
//!
//! The cycles are kept as doubly-linked lists threaded through a per-spring
//! array of [`FrontierEdge`]s and are updated incrementally as triangles are
//! destroyed and restored; see the `topology` module.

mod topology;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{ElementIndex, FrontierId, MeshError, Points, Springs, Triangles, VisitTracker, as_index, utils};

/// Whether a frontier bounds the body from the outside or a hole inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrontierType {
    /// An outer hull.
    External,
    /// An inner hole.
    Internal,
}

/// The per-spring frontier links. Only meaningful while the spring is on a frontier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierEdge {
    /// The endpoint the edge starts at, in walking order.
    pub point_a: ElementIndex,
    /// The endpoint the edge ends at, in walking order.
    pub point_b: ElementIndex,
    /// The next edge on the frontier.
    pub next: ElementIndex,
    /// The previous edge on the frontier.
    pub prev: ElementIndex,
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// The lower-left corner.
    pub min: Vec2,
    /// The upper-right corner.
    pub max: Vec2,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec2::splat(f32::INFINITY),
            max: Vec2::splat(f32::NEG_INFINITY),
        }
    }
}

impl Aabb {
    /// Grows the box to include `p`.
    pub fn extend(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Whether the box contains no point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Whether `p` lies inside the box.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// The size of the box.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        (self.max - self.min).max(Vec2::ZERO)
    }
}

/// The color of a particle on a frontier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrontierColor {
    /// The base color of the frontier.
    pub base: [u8; 3],
    /// The position of the particle along the frontier, starting at zero.
    pub progress: f32,
}

/// Receives the frontier visualization.
pub trait FrontierRenderer {
    /// Receives one color per particle; particles on no frontier get the default color.
    fn upload_point_colors(&mut self, colors: &[FrontierColor]);

    /// Receives the directed edges of one frontier, in walking order.
    fn upload_frontier(&mut self, id: FrontierId, kind: FrontierType, edges: &[[ElementIndex; 2]]);
}

/// A closed cycle of boundary springs.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontier {
    /// Whether the cycle is an outer hull or a hole.
    kind: FrontierType,
    /// Any edge of the cycle.
    starting_edge: ElementIndex,
    /// The number of edges.
    size: usize,
    /// The shoelace sum of the edges over load-time positions.
    area_x2: f64,
    /// Whether the cycle changed since it was last uploaded.
    is_dirty_for_rendering: bool,
    /// The bounding box of the cycle, as of the last refresh.
    aabb: Aabb,
}

impl Frontier {
    /// Whether the cycle is an outer hull or a hole.
    #[must_use]
    pub const fn kind(&self) -> FrontierType {
        self.kind
    }

    /// An edge of the cycle to start walks from.
    #[must_use]
    pub const fn starting_edge(&self) -> ElementIndex {
        self.starting_edge
    }

    /// The number of edges in the cycle.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Twice the signed area enclosed by the cycle at load time.
    #[must_use]
    pub const fn area_x2(&self) -> f64 {
        self.area_x2
    }

    /// Whether the cycle changed since it was last uploaded.
    #[must_use]
    pub const fn is_dirty_for_rendering(&self) -> bool {
        self.is_dirty_for_rendering
    }

    /// The bounding box of the cycle, as of the last call to [`Frontiers::update_aabbs`].
    #[must_use]
    pub const fn aabb(&self) -> &Aabb {
        &self.aabb
    }
}

/// Base colors of outer hulls.
const EXTERNAL_PALETTE: [[u8; 3]; 4] = [[0, 153, 0], [0, 51, 204], [51, 153, 51], [0, 0, 204]];

/// Base colors of holes.
const INTERNAL_PALETTE: [[u8; 3]; 4] = [[204, 51, 0], [255, 204, 0], [255, 0, 0], [255, 255, 0]];

/// The boundary tracker.
#[derive(Debug, Clone)]
pub struct Frontiers {
    /// The frontiers, by id. Freed ids hold `None` until reused.
    frontiers: Vec<Option<Frontier>>,
    /// Ids available for reuse.
    free_ids: Vec<FrontierId>,
    /// The frontier links, by spring.
    edges: Vec<FrontierEdge>,
    /// The frontier each spring is on, if any.
    edge_frontier: Vec<Option<FrontierId>>,
    /// Stamps springs during walks.
    visits: VisitTracker,
    /// The color of each particle, as of the last regeneration.
    point_colors: Vec<FrontierColor>,
    /// Whether some frontier was destroyed since the last upload.
    is_dirty_for_rendering: bool,
}

impl Frontiers {
    /// Creates a tracker with no frontiers.
    #[must_use]
    pub fn new(spring_count: usize, point_count: usize) -> Self {
        Self {
            frontiers: Vec::new(),
            free_ids: Vec::new(),
            edges: vec![FrontierEdge::default(); spring_count],
            edge_frontier: vec![None; spring_count],
            visits: VisitTracker::new(spring_count),
            point_colors: vec![FrontierColor::default(); point_count],
            is_dirty_for_rendering: false,
        }
    }

    /// Adds a frontier found by the loader.
    ///
    /// Each edge is directed from the endpoint it shares with the previous
    /// edge towards the endpoint it shares with the next one.
    ///
    /// # Errors
    ///
    /// - If fewer than three edges are given.
    /// - If an edge is already on a frontier.
    /// - If consecutive edges do not share an endpoint.
    pub fn add_frontier(
        &mut self,
        kind: FrontierType,
        edges: &[ElementIndex],
        springs: &Springs,
        points: &Points,
    ) -> Result<FrontierId, MeshError> {
        if edges.len() < 3 {
            return Err(MeshError::InvalidMesh(format!("a frontier needs at least three edges, got {}", edges.len())));
        }
        if let Some(&s) = edges.iter().find(|&&s| self.edge_frontier[s as usize].is_some()) {
            return Err(MeshError::InvalidMesh(format!("spring {s} is on two frontiers")));
        }

        let shared = |a: ElementIndex, b: ElementIndex| {
            let [a0, a1] = springs.endpoints(a);
            let [b0, b1] = springs.endpoints(b);
            if a0 == b0 || a0 == b1 {
                Ok(a0)
            } else if a1 == b0 || a1 == b1 {
                Ok(a1)
            } else {
                Err(MeshError::InvalidMesh(format!("frontier springs {a} and {b} share no endpoint")))
            }
        };

        let id = self.create_frontier(kind, edges[0]);
        let n = edges.len();
        let mut point_a = shared(edges[n - 1], edges[0])?;
        let mut area_x2 = 0.0;
        for (i, &s) in edges.iter().enumerate() {
            let point_b = springs.other_endpoint(s, point_a);
            self.edges[s as usize] = FrontierEdge {
                point_a,
                point_b,
                next: edges[(i + 1) % n],
                prev: edges[(i + n - 1) % n],
            };
            self.edge_frontier[s as usize] = Some(id);
            area_x2 += utils::shoelace_term(points.factory_position(point_a), points.factory_position(point_b));
            point_a = point_b;
        }

        if let Some(f) = self.frontiers[id as usize].as_mut() {
            f.size = n;
            f.area_x2 = area_x2;
        }

        ftlog::debug!("Added {kind:?} frontier {id} with {n} edges");
        Ok(id)
    }

    /// Allocates an empty frontier, reusing a freed id if one is available.
    fn create_frontier(&mut self, kind: FrontierType, starting_edge: ElementIndex) -> FrontierId {
        let frontier = Frontier {
            kind,
            starting_edge,
            size: 0,
            area_x2: 0.0,
            is_dirty_for_rendering: true,
            aabb: Aabb::default(),
        };

        if let Some(id) = self.free_ids.pop() {
            self.frontiers[id as usize] = Some(frontier);
            id
        } else {
            self.frontiers.push(Some(frontier));
            as_index(self.frontiers.len() - 1)
        }
    }

    /// Frees the id of a frontier whose edges have all been removed or relabeled.
    fn destroy_frontier(&mut self, id: FrontierId) {
        self.frontiers[id as usize] = None;
        self.free_ids.push(id);
        self.is_dirty_for_rendering = true;
    }

    /// The frontier with the given id.
    #[must_use]
    pub fn frontier(&self, id: FrontierId) -> Option<&Frontier> {
        self.frontiers.get(id as usize).and_then(Option::as_ref)
    }

    /// Mutable access to a live frontier. Callers only pass ids of live frontiers.
    fn frontier_mut(&mut self, id: FrontierId) -> Option<&mut Frontier> {
        self.frontiers.get_mut(id as usize).and_then(Option::as_mut)
    }

    /// Iterates over the live frontiers.
    pub fn iter(&self) -> impl Iterator<Item = (FrontierId, &Frontier)> {
        self.frontiers
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|f| (as_index(i), f)))
    }

    /// The number of live frontiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frontiers.iter().filter(|f| f.is_some()).count()
    }

    /// Whether there are no live frontiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frontiers.iter().all(Option::is_none)
    }

    /// The number of live frontiers of the given type.
    #[must_use]
    pub fn count_of_type(&self, kind: FrontierType) -> usize {
        self.iter().filter(|(_, f)| f.kind == kind).count()
    }

    /// The frontier the spring is on, if any.
    #[must_use]
    pub fn frontier_of(&self, spring: ElementIndex) -> Option<FrontierId> {
        self.edge_frontier[spring as usize]
    }

    /// The frontier links of the spring, if it is on a frontier.
    #[must_use]
    pub fn edge(&self, spring: ElementIndex) -> Option<&FrontierEdge> {
        self.edge_frontier[spring as usize].map(|_| &self.edges[spring as usize])
    }

    /// The springs of a frontier in walking order, from its starting edge.
    #[must_use]
    pub fn cycle(&self, id: FrontierId) -> Vec<ElementIndex> {
        self.frontier(id).map_or_else(Vec::new, |f| {
            let mut cycle = Vec::with_capacity(f.size);
            let mut e = f.starting_edge;
            for _ in 0..f.size {
                cycle.push(e);
                e = self.edges[e as usize].next;
            }
            cycle
        })
    }

    /// The colors of the particles, as of the last upload.
    #[must_use]
    pub fn point_colors(&self) -> &[FrontierColor] {
        &self.point_colors
    }

    /// Whether some frontier changed since the last upload.
    #[must_use]
    pub fn is_dirty_for_rendering(&self) -> bool {
        self.is_dirty_for_rendering || self.iter().any(|(_, f)| f.is_dirty_for_rendering)
    }

    /// Recomputes the particle colors.
    ///
    /// Each frontier takes the next base color of its type's palette; each
    /// particle records its position along the cycle.
    #[expect(clippy::cast_precision_loss)]
    pub fn regenerate_point_colors(&mut self) {
        self.point_colors.fill(FrontierColor::default());

        let (mut external, mut internal) = (0, 0);
        for frontier in self.frontiers.iter().flatten() {
            let base = match frontier.kind {
                FrontierType::External => {
                    external += 1;
                    EXTERNAL_PALETTE[(external - 1) % EXTERNAL_PALETTE.len()]
                }
                FrontierType::Internal => {
                    internal += 1;
                    INTERNAL_PALETTE[(internal - 1) % INTERNAL_PALETTE.len()]
                }
            };

            let mut e = frontier.starting_edge;
            for i in 0..frontier.size {
                let edge = &self.edges[e as usize];
                self.point_colors[edge.point_a as usize] = FrontierColor { base, progress: i as f32 };
                e = edge.next;
            }
        }
    }

    /// Hands the colors and edges to the renderer if anything changed since the last upload.
    pub fn upload(&mut self, renderer: &mut dyn FrontierRenderer) {
        if !self.is_dirty_for_rendering() {
            return;
        }

        self.regenerate_point_colors();
        renderer.upload_point_colors(&self.point_colors);

        let mut buffer = Vec::new();
        for (id, frontier) in self.iter() {
            buffer.clear();
            let mut e = frontier.starting_edge;
            for _ in 0..frontier.size {
                let edge = &self.edges[e as usize];
                buffer.push([edge.point_a, edge.point_b]);
                e = edge.next;
            }
            renderer.upload_frontier(id, frontier.kind, &buffer);
        }

        self.frontiers.iter_mut().flatten().for_each(|f| f.is_dirty_for_rendering = false);
        self.is_dirty_for_rendering = false;
    }

    /// Refreshes the bounding boxes of the outer hulls from the current positions.
    pub fn update_aabbs(&mut self, points: &Points) {
        for frontier in self.frontiers.iter_mut().flatten() {
            if frontier.kind != FrontierType::External {
                continue;
            }
            let mut aabb = Aabb::default();
            let mut e = frontier.starting_edge;
            for _ in 0..frontier.size {
                let edge = &self.edges[e as usize];
                aabb.extend(points.position(edge.point_a));
                e = edge.next;
            }
            frontier.aabb = aabb;
        }
    }

    /// Checks every frontier against the mesh.
    ///
    /// - Every cycle closes after exactly `size` steps and its links agree both ways.
    /// - Every edge is a live spring with exactly one live triangle, is directed
    ///   like that triangle, and is claimed by exactly one frontier.
    /// - Every spring with exactly one live triangle is on a frontier.
    ///
    /// # Errors
    ///
    /// - A description of the first violation found.
    pub fn verify_invariants(&self, springs: &Springs, triangles: &Triangles) -> Result<(), String> {
        let mut claimed = vec![false; self.edges.len()];
        let mut total = 0;

        for (id, frontier) in self.iter() {
            if frontier.size == 0 {
                return Err(format!("Frontier {id} is empty"));
            }

            let mut e = frontier.starting_edge;
            for _ in 0..frontier.size {
                let s = e as usize;
                if self.edge_frontier[s] != Some(id) {
                    return Err(format!("Edge {e} is walked by frontier {id} but claims {:?}", self.edge_frontier[s]));
                }
                if std::mem::replace(&mut claimed[s], true) {
                    return Err(format!("Edge {e} is walked twice"));
                }
                if springs.is_deleted(e) {
                    return Err(format!("Edge {e} of frontier {id} is a deleted spring"));
                }

                let edge = &self.edges[s];
                let mut endpoints = springs.endpoints(e);
                let mut directed = [edge.point_a, edge.point_b];
                endpoints.sort_unstable();
                directed.sort_unstable();
                if endpoints != directed {
                    return Err(format!("Edge {e} joins {:?} but its spring joins {endpoints:?}", [edge.point_a, edge.point_b]));
                }

                match springs.super_triangles(e) {
                    &[t] => {
                        if !triangles.are_points_in_winding_order(t, edge.point_a, edge.point_b) {
                            return Err(format!("Edge {e} is directed against triangle {t}"));
                        }
                    }
                    other => return Err(format!("Edge {e} of frontier {id} has triangles {other:?}")),
                }

                let next = &self.edges[edge.next as usize];
                if next.prev != e {
                    return Err(format!("Edge {e} links to {} which links back to {}", edge.next, next.prev));
                }
                if next.point_a != edge.point_b {
                    return Err(format!("Edge {e} ends at {} but edge {} starts at {}", edge.point_b, edge.next, next.point_a));
                }
                e = edge.next;
            }

            if e != frontier.starting_edge {
                return Err(format!("Frontier {id} does not close after {} edges", frontier.size));
            }
            total += frontier.size;
        }

        if let Some(s) = (0..springs.len())
            .map(as_index)
            .find(|&s| !claimed[s as usize] && self.edge_frontier[s as usize].is_some())
        {
            return Err(format!("Spring {s} claims frontier {:?} but no frontier walks it", self.edge_frontier[s as usize]));
        }

        let boundary = (0..springs.len())
            .map(as_index)
            .filter(|&s| !springs.is_deleted(s) && springs.super_triangles(s).len() == 1)
            .count();
        if boundary != total {
            return Err(format!("{boundary} boundary springs but {total} frontier edges"));
        }

        Ok(())
    }
}
