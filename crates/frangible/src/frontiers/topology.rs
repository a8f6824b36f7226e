//! Incremental frontier surgery.
//!
//! Around a particle, the live triangles form one or more fans. Each fan that
//! does not close into a full disk is bounded by an incoming frontier edge and
//! an outgoing one, and the frontier walk pairs exactly those two. Destroying
//! or restoring a triangle changes the fans at its three vertices only, so the
//! frontiers are patched at those vertices:
//!
//! - a *replacement* swaps the triangle's edges in or out of one frontier and
//!   relinks the edges around them;
//! - a *splice* exchanges the successors of two edges ending at the same
//!   particle. It splits a frontier in two when both edges are on it, and
//!   joins two frontiers otherwise.

use arrayvec::ArrayVec;

use crate::{ElementIndex, FrontierId, Points, Springs, Triangles, consts, utils};

use super::{FrontierType, Frontiers};

/// A link to make between two edges, as `(from, to)` with `from.next = to`.
type Link = (ElementIndex, ElementIndex);

/// An edge to put on a frontier, as `(spring, point_a, point_b)`.
type DirectedEdge = (ElementIndex, ElementIndex, ElementIndex);

impl Frontiers {
    /// Updates the frontiers after a triangle was destroyed.
    ///
    /// The triangle must already be gone from the super-triangle lists of its
    /// springs. Its edges that were on a frontier leave it; its edges shared
    /// with a live neighbor join one, directed like the neighbor.
    pub fn handle_triangle_destroy(&mut self, triangle: ElementIndex, springs: &Springs, triangles: &Triangles, points: &Points) {
        let p = triangles.endpoints(triangle);
        let e = triangles.sub_springs(triangle);
        let winding = winding_sign(triangle, triangles, points);
        let was_boundary = e.map(|s| self.edge_frontier[s as usize].is_some());

        let host = match (0..3).find(|&k| was_boundary[k]) {
            Some(k) => self.edge_frontier[e[k] as usize],
            None => None,
        };
        let host = host.unwrap_or_else(|| self.create_frontier(FrontierType::Internal, e[0]));

        let mut links = ArrayVec::<Link, 3>::new();
        let mut cusps = ArrayVec::<usize, 3>::new();
        for k in 0..3 {
            let (incoming, outgoing) = (e[(k + 2) % 3], e[k]);
            match (was_boundary[(k + 2) % 3], was_boundary[k]) {
                (true, true) => {}
                (true, false) => links.push((outgoing, self.edges[incoming as usize].next)),
                (false, true) => links.push((self.edges[outgoing as usize].prev, incoming)),
                (false, false) => {
                    links.push((outgoing, incoming));
                    cusps.push(k);
                }
            }
        }

        let mut removed = ArrayVec::<ElementIndex, 3>::new();
        let mut added = ArrayVec::<DirectedEdge, 3>::new();
        for k in 0..3 {
            if was_boundary[k] {
                removed.push(e[k]);
            } else {
                added.push((e[k], p[(k + 1) % 3], p[k]));
            }
        }
        self.replace_edges(host, &removed, &added, &links, points, winding);

        // The new edges were linked as if every fan at a cusp closed into a disk;
        // where it does not, the fan's own outgoing edge is the true successor.
        for k in cusps {
            match fan_outgoing_edge(p[k], e[k], springs, triangles) {
                Some(x) if x != e[(k + 2) % 3] => {
                    let prev = self.edges[x as usize].prev;
                    self.splice(prev, e[k], points, winding);
                }
                Some(_) => {}
                None => ftlog::error!("Fan walk around point {} from spring {} did not reach a boundary", p[k], e[k]),
            }
        }
    }

    /// Updates the frontiers before a restored triangle is attached to its springs.
    ///
    /// The triangle must not yet be in the super-triangle lists of its
    /// springs. Its edges shared with a live neighbor leave their frontier; its
    /// other edges join one, directed like the triangle.
    pub fn handle_triangle_restore(&mut self, triangle: ElementIndex, springs: &Springs, triangles: &Triangles, points: &Points) {
        let p = triangles.endpoints(triangle);
        let e = triangles.sub_springs(triangle);
        let winding = winding_sign(triangle, triangles, points);
        let has_neighbor = e.map(|s| !springs.super_triangles(s).is_empty());

        // Where two neighbors' fans meet at a vertex, make their edges adjacent
        // so that both can be dropped without touching anything else.
        for k in 0..3 {
            let (incoming, outgoing) = (e[(k + 2) % 3], e[k]);
            if has_neighbor[(k + 2) % 3] && has_neighbor[k] && self.edges[outgoing as usize].next != incoming {
                let prev = self.edges[incoming as usize].prev;
                self.splice(prev, outgoing, points, winding);
            }
        }

        let host = match (0..3).find(|&k| has_neighbor[k]) {
            Some(k) => self.edge_frontier[e[k] as usize],
            None => None,
        };
        let host = host.unwrap_or_else(|| self.create_frontier(FrontierType::External, e[0]));

        let mut links = ArrayVec::<Link, 3>::new();
        for k in 0..3 {
            let (incoming, outgoing) = (e[(k + 2) % 3], e[k]);
            match (has_neighbor[(k + 2) % 3], has_neighbor[k]) {
                (false, false) => links.push((incoming, outgoing)),
                (true, false) => links.push((self.edges[incoming as usize].prev, outgoing)),
                (false, true) => links.push((incoming, self.edges[outgoing as usize].next)),
                (true, true) => {}
            }
        }

        let mut removed = ArrayVec::<ElementIndex, 3>::new();
        let mut added = ArrayVec::<DirectedEdge, 3>::new();
        for k in 0..3 {
            if has_neighbor[k] {
                removed.push(e[k]);
            } else {
                added.push((e[k], p[k], p[(k + 1) % 3]));
            }
        }
        self.replace_edges(host, &removed, &added, &links, points, winding);
    }

    /// Takes edges off a frontier, puts others on it and relinks the cycle.
    ///
    /// Destroys the frontier if no edge is left.
    fn replace_edges(
        &mut self,
        id: FrontierId,
        removed: &[ElementIndex],
        added: &[DirectedEdge],
        links: &[Link],
        points: &Points,
        winding: f64,
    ) {
        let mut area_delta = 0.0;
        for &s in removed {
            let edge = &self.edges[s as usize];
            area_delta -= utils::shoelace_term(points.factory_position(edge.point_a), points.factory_position(edge.point_b));
            self.edge_frontier[s as usize] = None;
        }
        for &(s, point_a, point_b) in added {
            let edge = &mut self.edges[s as usize];
            edge.point_a = point_a;
            edge.point_b = point_b;
            self.edge_frontier[s as usize] = Some(id);
            area_delta += utils::shoelace_term(points.factory_position(point_a), points.factory_position(point_b));
        }
        for &(from, to) in links {
            self.edges[from as usize].next = to;
            self.edges[to as usize].prev = from;
        }

        let starting_edge = added.first().map(|&(s, _, _)| s).or_else(|| links.first().map(|&(from, _)| from));
        let start_is_stale = self.frontier(id).is_some_and(|f| self.edge_frontier[f.starting_edge as usize] != Some(id));

        let Some(frontier) = self.frontier_mut(id) else {
            ftlog::error!("Replacing edges of missing frontier {id}");
            return;
        };
        frontier.size = frontier.size + added.len() - removed.len();
        frontier.area_x2 += area_delta;

        if frontier.size == 0 {
            ftlog::debug!("Frontier {id} closed up");
            self.destroy_frontier(id);
            return;
        }

        if start_is_stale {
            if let Some(s) = starting_edge {
                frontier.starting_edge = s;
            }
        }
        frontier.is_dirty_for_rendering = true;
        self.classify(id, winding);
    }

    /// Exchanges the successors of two edges ending at the same particle.
    ///
    /// Splits their frontier in two if they share one, and joins their
    /// frontiers otherwise.
    fn splice(&mut self, a: ElementIndex, b: ElementIndex, points: &Points, winding: f64) {
        debug_assert_eq!(
            self.edges[a as usize].point_b, self.edges[b as usize].point_b,
            "Spliced edges {a} and {b} must end at the same point"
        );

        let (next_a, next_b) = (self.edges[a as usize].next, self.edges[b as usize].next);
        self.edges[a as usize].next = next_b;
        self.edges[next_b as usize].prev = a;
        self.edges[b as usize].next = next_a;
        self.edges[next_a as usize].prev = b;

        match (self.edge_frontier[a as usize], self.edge_frontier[b as usize]) {
            (Some(fa), Some(fb)) if fa == fb => self.split(fa, a, b, points, winding),
            (Some(fa), Some(fb)) => self.join(fa, fb, (a, next_a), (b, next_b), points, winding),
            other => ftlog::error!("Spliced edges {a} and {b} are not both on frontiers: {other:?}"),
        }
    }

    /// Gives the shorter of the two cycles through `a` and `b` a new frontier.
    fn split(&mut self, id: FrontierId, a: ElementIndex, b: ElementIndex, points: &Points, winding: f64) {
        let bound = self.frontier(id).map_or(0, |f| f.size);

        // Walk both cycles in lockstep so that only the shorter one is walked in full.
        let (mut x, mut y) = (self.edges[a as usize].next, self.edges[b as usize].next);
        let mut steps = 0;
        let (shorter, longer) = loop {
            if x == a {
                break (a, b);
            }
            if y == b {
                break (b, a);
            }
            steps += 1;
            if steps > bound {
                ftlog::error!("Frontier {id} did not split at edges {a} and {b}");
                return;
            }
            x = self.edges[x as usize].next;
            y = self.edges[y as usize].next;
        };

        let new_id = self.create_frontier(FrontierType::Internal, shorter);
        let last = self.edges[shorter as usize].prev;
        let (size, area_x2) = self.propagate_frontier(shorter, last, new_id, points);

        if let Some(frontier) = self.frontier_mut(new_id) {
            frontier.size = size;
            frontier.area_x2 = area_x2;
        }
        let start_moved = self.frontier(id).is_some_and(|f| self.edge_frontier[f.starting_edge as usize] != Some(id));
        if let Some(frontier) = self.frontier_mut(id) {
            frontier.size -= size;
            frontier.area_x2 -= area_x2;
            frontier.is_dirty_for_rendering = true;
            if start_moved {
                frontier.starting_edge = longer;
            }
        }

        self.classify(id, winding);
        self.classify(new_id, winding);
        ftlog::debug!("Split frontier {new_id} ({size} edges) off frontier {id}");
    }

    /// Merges two frontiers after their edges `a` and `b` had their successors exchanged.
    ///
    /// `(a, next_a)` and `(b, next_b)` are the edges with their successors before the exchange.
    /// The smaller frontier is relabeled into the larger one.
    fn join(
        &mut self,
        fa: FrontierId,
        fb: FrontierId,
        (a, next_a): (ElementIndex, ElementIndex),
        (b, next_b): (ElementIndex, ElementIndex),
        points: &Points,
        winding: f64,
    ) {
        let size_a = self.frontier(fa).map_or(0, |f| f.size);
        let size_b = self.frontier(fb).map_or(0, |f| f.size);

        // The absorbed frontier now runs from the old successor of its edge up to that edge.
        let (survivor, absorbed, first, last) = if size_b <= size_a {
            (fa, fb, next_b, b)
        } else {
            (fb, fa, next_a, a)
        };

        let (size, area_x2) = self.propagate_frontier(first, last, survivor, points);
        debug_assert_eq!(size, size_a.min(size_b), "Joined arc should be the whole absorbed frontier");

        if let Some(frontier) = self.frontier_mut(survivor) {
            frontier.size += size;
            frontier.area_x2 += area_x2;
            frontier.is_dirty_for_rendering = true;
        }
        self.destroy_frontier(absorbed);
        self.classify(survivor, winding);
        ftlog::debug!("Joined frontier {absorbed} ({size} edges) into frontier {survivor}");
    }

    /// Relabels the edges from `first` to `last` with `id`.
    ///
    /// # Returns
    ///
    /// * The number of edges relabeled and their shoelace sum.
    fn propagate_frontier(&mut self, first: ElementIndex, last: ElementIndex, id: FrontierId, points: &Points) -> (usize, f64) {
        self.visits.begin();

        let (mut size, mut area_x2) = (0, 0.0);
        let mut e = first;
        while self.visits.visit(e) {
            let edge = &self.edges[e as usize];
            self.edge_frontier[e as usize] = Some(id);
            size += 1;
            area_x2 += utils::shoelace_term(points.factory_position(edge.point_a), points.factory_position(edge.point_b));
            if e == last {
                break;
            }
            e = edge.next;
        }

        debug_assert_eq!(e, last, "Propagation from {first} looped before reaching {last}");
        (size, area_x2)
    }

    /// Sets the type of a frontier from the sign of its area relative to the triangle winding.
    fn classify(&mut self, id: FrontierId, winding: f64) {
        if let Some(frontier) = self.frontier_mut(id) {
            frontier.kind = if frontier.area_x2 * winding > 0.0 {
                FrontierType::External
            } else {
                FrontierType::Internal
            };
        }
    }
}

/// The sign of the winding of a triangle at load time.
fn winding_sign(triangle: ElementIndex, triangles: &Triangles, points: &Points) -> f64 {
    if triangles.factory_signed_area_x2(triangle, points) < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Walks the fan of live triangles around `point`, starting from the triangle
/// of the boundary spring `incoming` that ends at `point`.
///
/// # Returns
///
/// * The boundary spring that leaves `point` at the other side of the fan, or
///   `None` if the mesh around `point` is inconsistent.
fn fan_outgoing_edge(point: ElementIndex, incoming: ElementIndex, springs: &Springs, triangles: &Triangles) -> Option<ElementIndex> {
    let mut triangle = *springs.super_triangles(incoming).first()?;
    for _ in 0..=consts::MAX_TRIANGLES_PER_POINT {
        let k = triangles.vertex_ordinal(triangle, point)?;
        let leaving = triangles.sub_springs(triangle)[k];
        match *springs.super_triangles(leaving) {
            [_] => return Some(leaving),
            [t0, t1] => triangle = if t0 == triangle { t1 } else { t0 },
            _ => return None,
        }
    }
    None
}
