//! Connected components of the spring graph.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::{ElementIndex, as_index, consts};

use super::Body;

impl Body {
    /// Assigns a connected component to every live structural particle.
    ///
    /// Components are found by a breadth-first visit over live springs and
    /// are numbered in order of their lowest particle index.
    pub(crate) fn update_connectivity(&mut self) {
        self.points.visits_mut().begin();
        self.connected_component_sizes.clear();

        let mut queue = VecDeque::new();
        for seed in self.points.ship_points() {
            if self.points.is_deleted(seed) {
                self.points.set_connected_component(seed, None);
                continue;
            }
            if !self.points.visits_mut().visit(seed) {
                continue;
            }

            let component = as_index(self.connected_component_sizes.len());
            let mut size = 0;
            queue.push_back(seed);
            while let Some(p) = queue.pop_front() {
                self.points.set_connected_component(p, Some(component));
                size += 1;

                let neighbors = self
                    .points
                    .connected_springs(p)
                    .iter()
                    .map(|cs| cs.other_endpoint)
                    .collect::<ArrayVec<ElementIndex, { consts::MAX_SPRINGS_PER_POINT }>>();
                for q in neighbors {
                    if self.points.visits_mut().visit(q) {
                        queue.push_back(q);
                    }
                }
            }
            self.connected_component_sizes.push(size);
        }

        self.is_structure_dirty = false;
        ftlog::debug!("Found {} connected components", self.connected_component_sizes.len());
    }
}
