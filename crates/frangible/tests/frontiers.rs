//! Tests for the incremental frontier tracking.

use frangible::{Body, ElementIndex, FrontierType};
use rand::prelude::*;
use test_case::test_case;

mod common;

/// The frontier sizes, smallest first.
fn sizes(body: &Body) -> Vec<usize> {
    let mut sizes = body.frontiers().iter().map(|(_, f)| f.size()).collect::<Vec<_>>();
    sizes.sort_unstable();
    sizes
}

/// The springs of every frontier, sorted.
fn frontier_springs(body: &Body) -> Vec<ElementIndex> {
    let mut springs = body
        .frontiers()
        .iter()
        .flat_map(|(id, _)| body.frontiers().cycle(id))
        .collect::<Vec<_>>();
    springs.sort_unstable();
    springs
}

#[test]
fn cutting_off_a_corner_splits_the_hull() -> Result<(), String> {
    let mut body = common::build(&common::lattice(2, 2, &[])?)?;
    assert_eq!(sizes(&body), vec![8]);

    // The lower-right triangle of the upper-left cell touches the hull at two
    // particles, so its removal leaves the upper-left triangle as an island.
    let [island, cut] = common::cell_triangles(2, 1, 0);
    body.destroy_triangle(cut).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;

    assert_eq!(body.frontiers().len(), 2);
    assert_eq!(body.frontiers().count_of_type(FrontierType::External), 2);
    assert_eq!(sizes(&body), vec![3, 8], "8 hull edges plus 3 exposed edges");

    let island_edges = body.triangles().sub_springs(island);
    let island_frontier = body.frontiers().frontier_of(island_edges[0]).ok_or("Island edge is not on a frontier")?;
    for s in island_edges {
        assert_eq!(body.frontiers().frontier_of(s), Some(island_frontier));
    }

    body.restore_triangle(cut).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;
    assert_eq!(sizes(&body), vec![8]);
    assert_eq!(body.frontiers().count_of_type(FrontierType::External), 1);
    Ok(())
}

#[test]
fn hole_grows_and_merges_into_the_hull() -> Result<(), String> {
    let mut body = common::build(&common::lattice(3, 3, &[])?)?;

    let [a, b] = common::cell_triangles(3, 1, 1);
    body.destroy_triangle(a).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;
    assert_eq!(body.frontiers().count_of_type(FrontierType::Internal), 1);
    assert_eq!(sizes(&body), vec![3, 12]);

    body.destroy_triangle(b).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;
    assert_eq!(sizes(&body), vec![4, 12]);

    // Opening the cell to the right connects the hole to the outside.
    let [c, d] = common::cell_triangles(3, 1, 2);
    body.destroy_triangle(c).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;
    body.destroy_triangle(d).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;

    assert_eq!(body.frontiers().len(), 1);
    assert_eq!(body.frontiers().count_of_type(FrontierType::External), 1);
    assert_eq!(sizes(&body), vec![16]);

    // Closing the passage again separates the hole from the hull.
    body.restore_triangle(d).map_err(|e| e.to_string())?;
    body.restore_triangle(c).map_err(|e| e.to_string())?;
    body.verify_frontiers()?;
    assert_eq!(sizes(&body), vec![4, 12]);
    assert_eq!(body.frontiers().count_of_type(FrontierType::Internal), 1);
    Ok(())
}

#[test]
fn isolated_triangle_takes_its_frontier_with_it() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let [a, b] = common::cell_triangles(1, 0, 0);

    body.destroy_triangle(a).map_err(|e| e.to_string())?;
    assert_eq!(sizes(&body), vec![3]);
    body.destroy_triangle(b).map_err(|e| e.to_string())?;
    assert!(body.frontiers().is_empty());
    body.verify_frontiers()?;

    body.restore_triangle(b).map_err(|e| e.to_string())?;
    assert_eq!(sizes(&body), vec![3]);
    assert_eq!(body.frontiers().count_of_type(FrontierType::External), 1);
    body.restore_triangle(a).map_err(|e| e.to_string())?;
    assert_eq!(sizes(&body), vec![4]);
    body.verify_frontiers()
}

#[test_case(3, 3, 7; "small")]
#[test_case(4, 6, 11; "wide")]
#[test_case(6, 6, 2024; "large")]
fn random_destroy_and_restore(rows: usize, cols: usize, seed: u64) -> Result<(), String> {
    let mesh = common::lattice(rows, cols, &[])?;
    let mut body = common::build(&mesh)?;
    let factory = frontier_springs(&body);
    let mut rng = StdRng::seed_from_u64(seed);

    let count = common::cell_triangles(cols, rows - 1, cols - 1)[1] + 1;
    for i in 0..400 {
        let t = rng.random_range(0..count);
        // Destroy more often than restore, so that the body erodes.
        let result = if body.triangles().is_deleted(t) {
            if rng.random_bool(0.4) {
                body.restore_triangle(t)
            } else {
                continue;
            }
        } else {
            body.destroy_triangle(t)
        };
        result.map_err(|e| e.to_string())?;
        body.verify_frontiers().map_err(|e| format!("After operation {i} on triangle {t}: {e}"))?;
    }

    for t in 0..count {
        if body.triangles().is_deleted(t) {
            body.restore_triangle(t).map_err(|e| e.to_string())?;
            body.verify_frontiers()?;
        }
    }

    assert_eq!(sizes(&body), vec![2 * (rows + cols)]);
    assert_eq!(body.frontiers().count_of_type(FrontierType::External), 1);
    assert_eq!(frontier_springs(&body), factory);
    Ok(())
}

#[test]
fn every_spring_belongs_to_at_most_one_frontier() -> Result<(), String> {
    let mut body = common::build(&common::lattice(4, 4, &[(1, 1), (2, 2)])?)?;
    body.verify_frontiers()?;
    assert_eq!(body.frontiers().count_of_type(FrontierType::Internal), 1, "The holes touch at a corner");

    let corners = [common::triangles_in_cell(&body, 0, 0), common::triangles_in_cell(&body, 3, 3)].concat();
    assert_eq!(corners.len(), 4);
    for t in corners {
        body.destroy_triangle(t).map_err(|e| e.to_string())?;
    }
    body.verify_frontiers()?;

    let springs = frontier_springs(&body);
    let mut unique = springs.clone();
    unique.dedup();
    assert_eq!(springs, unique);
    Ok(())
}

#[test]
fn holes_touching_at_a_corner_share_the_pinch_particle() -> Result<(), String> {
    let body = common::build(&common::lattice(4, 4, &[(1, 1), (2, 2)])?)?;
    let (id, hole) = body
        .frontiers()
        .iter()
        .find(|(_, f)| f.kind() == FrontierType::Internal)
        .ok_or("No internal frontier")?;

    let cycle = body.frontiers().cycle(id);
    assert_eq!(hole.size(), 8);
    assert_eq!(cycle.len(), 8);

    let mut points = cycle
        .iter()
        .filter_map(|&s| body.frontiers().edge(s))
        .map(|edge| edge.point_a)
        .collect::<Vec<_>>();
    assert_eq!(points.len(), 8);
    points.sort_unstable();
    points.dedup();
    assert_eq!(points.len(), 7, "The particle where the holes touch is visited twice");
    body.verify_frontiers()
}
