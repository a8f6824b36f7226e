//! Tests for the step orchestrator and the tool actions.

use std::sync::{Arc, Mutex};

use float_cmp::approx_eq;
use frangible::{Body, DestroyOptions, EphemeralType, FrontierColor, MeshError, SimulationParameters, consts};
use glam::Vec2;

mod common;

use common::{CountingSink, RecordingRenderer};

/// A single wooden cell with its three upper and left particles pinned.
fn anchored_cell(sink: Arc<CountingSink>) -> Result<Body, String> {
    let mut body = common::build_with_sink(&common::lattice(1, 1, &[])?, common::weightless(), sink)?;
    for p in 0..3 {
        body.pin_point(p).map_err(|e| e.to_string())?;
    }
    Ok(body)
}

#[test]
fn overloaded_particle_tears_off() -> Result<(), String> {
    let sink = Arc::new(CountingSink::default());
    let mut body = anchored_cell(Arc::clone(&sink))?;
    let params = common::weightless();

    let (mut broken, mut destroyed) = (0, 0);
    for step in 0..32_u8 {
        if body.points().connected_springs(3).is_empty() {
            break;
        }
        body.apply_force(3, Vec2::new(1e9, 0.0)).map_err(|e| e.to_string())?;
        let stats = body.update(f32::from(step) * consts::SIMULATION_STEP_TIME_DURATION, &params);
        broken += stats.broken_springs;
        destroyed += stats.destroyed_triangles;
    }

    assert_eq!(broken, 2, "Both springs of the loaded particle break");
    assert_eq!(destroyed, 2, "The first break takes every triangle of its endpoints");
    assert!(body.frontiers().is_empty());
    assert_eq!(body.connected_component_count(), 2);
    assert_eq!(CountingSink::get(&sink.breaks), 2);
    assert!(CountingSink::get(&sink.leaks) > 0, "Wood is not hull, so damaged particles leak");
    assert!(body.points().is_damaged(3));
    for p in 0..3 {
        assert_eq!(body.points().position(p), body.points().factory_position(p), "Pinned point {p} moved");
    }
    body.verify_frontiers()
}

#[test]
fn applied_force_lasts_one_step() -> Result<(), String> {
    let mesh = common::lattice(1, 1, &[])?;
    let mut pushed = common::build(&mesh)?;
    let mut idle = common::build(&mesh)?;
    let params = common::weightless();

    pushed.apply_force(0, Vec2::new(0.0, 1e4)).map_err(|e| e.to_string())?;
    pushed.update(0.0, &params);
    idle.update(0.0, &params);

    assert_ne!(pushed.points().position(0), idle.points().position(0));
    assert_eq!(pushed.points().static_force(0), Vec2::ZERO, "Static forces are cleared after each step");
    Ok(())
}

#[test]
fn steps_are_deterministic() -> Result<(), String> {
    let mesh = common::lattice(4, 6, &[(1, 2), (2, 4)])?;
    let params = SimulationParameters::default();
    let mut a = common::build_with_sink(&mesh, params, Arc::new(frangible::NullEventSink))?;
    let mut b = common::build_with_sink(&mesh, params, Arc::new(frangible::NullEventSink))?;

    for step in 0..16_u8 {
        let t = f32::from(step) * consts::SIMULATION_STEP_TIME_DURATION;
        for body in [&mut a, &mut b] {
            body.apply_force(5, Vec2::new(2e5, 0.0)).map_err(|e| e.to_string())?;
        }
        let stats_a = a.update(t, &params);
        let stats_b = b.update(t, &params);
        assert_eq!(stats_a, stats_b);
    }

    assert_eq!(a.points().positions(), b.points().positions());
    assert_eq!(a.points().velocities(), b.points().velocities());
    Ok(())
}

#[test]
fn repairing_everything_repairs_the_body() -> Result<(), String> {
    let sink = Arc::new(CountingSink::default());
    let mut body = common::build_with_sink(&common::lattice(2, 2, &[])?, common::weightless(), sink.clone())?;

    // An interior spring has two triangles.
    let interior = (0..u32::try_from(body.springs().len()).map_err(|e| e.to_string())?)
        .find(|&s| body.springs().super_triangles(s).len() == 2)
        .ok_or("No interior spring")?;
    let doomed = body.springs().super_triangles(interior).to_vec();

    body.destroy_spring(interior, DestroyOptions::default()).map_err(|e| e.to_string())?;
    assert!(doomed.iter().all(|&t| body.triangles().is_deleted(t)));
    assert_eq!(body.points().damaged_count(), 2);
    assert_eq!(CountingSink::get(&sink.breaks), 0, "Tool destruction is not a break");
    body.verify_frontiers()?;

    assert!(matches!(body.restore_triangle(doomed[0]), Err(MeshError::Deleted { kind: "spring", .. })));

    body.restore_spring(interior).map_err(|e| e.to_string())?;
    assert_eq!(body.points().damaged_count(), 2, "The triangles are still missing");
    for &t in &doomed {
        body.restore_triangle(t).map_err(|e| e.to_string())?;
    }

    assert_eq!(body.points().damaged_count(), 0);
    assert_eq!(body.points().leaking_count(), 0);
    assert_eq!(CountingSink::get(&sink.spring_repairs), 1);
    assert_eq!(CountingSink::get(&sink.triangle_repairs), 2);
    assert_eq!(CountingSink::get(&sink.body_repairs), 1);
    assert_eq!(body.frontiers().len(), 1);
    body.verify_frontiers()
}

#[test]
fn bombs_weigh_down_both_endpoints_once() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let [a, b] = body.springs().endpoints(0);
    let (base, base_b) = (body.points().mass(a), body.points().mass(b));
    let stiffness = body.springs().stiffness_coefficient(0);

    assert_eq!(body.attach_bomb(0), Ok(true));
    assert_eq!(body.attach_bomb(0), Ok(false));
    assert!(approx_eq!(f32, body.points().mass(a), base + consts::BOMB_MASS, epsilon = 1e-2));
    assert!(approx_eq!(f32, body.points().mass(b), base_b + consts::BOMB_MASS, epsilon = 1e-2));
    assert!(body.springs().stiffness_coefficient(0) > stiffness, "Heavier endpoints need stiffer springs");

    assert_eq!(body.detach_bomb(0), Ok(true));
    assert_eq!(body.detach_bomb(0), Ok(false));
    assert!(approx_eq!(f32, body.points().mass(a), base, epsilon = 1e-3));
    Ok(())
}

#[test]
fn bombs_sharing_a_particle_add_up() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let [shared, _] = body.springs().endpoints(0);
    let other = body
        .points()
        .connected_springs(shared)
        .iter()
        .map(|cs| cs.spring)
        .find(|&s| s != 0)
        .ok_or("The particle has a single spring")?;
    let base = body.points().mass(shared);

    assert_eq!(body.attach_bomb(0), Ok(true));
    assert_eq!(body.attach_bomb(other), Ok(true));
    assert!(approx_eq!(f32, body.points().mass(shared), base + 2.0 * consts::BOMB_MASS, epsilon = 1e-2));

    assert_eq!(body.detach_bomb(0), Ok(true));
    assert!(approx_eq!(f32, body.points().mass(shared), base + consts::BOMB_MASS, epsilon = 1e-2), "The other bomb stays");

    assert_eq!(body.detach_bomb(other), Ok(true));
    assert_eq!(body.points().mass(shared).to_bits(), base.to_bits());
    Ok(())
}

#[test]
fn ephemeral_pool_is_shared_fairly() -> Result<(), String> {
    let sink = Arc::new(CountingSink::default());
    let mut body = common::build_with_sink(&common::lattice(1, 1, &[])?, common::weightless(), sink.clone())?;
    let capacity = body.points().ephemeral_capacity();

    let mut spawned = Vec::new();
    for _ in 0..capacity {
        spawned.push(
            body.spawn_ephemeral(EphemeralType::Sparkle, Vec2::ZERO, Vec2::X, None, 0)
                .map_err(|e| e.to_string())?,
        );
    }
    spawned.sort_unstable();
    spawned.dedup();
    assert_eq!(spawned.len(), capacity, "Every slot is handed out once");

    assert!(matches!(
        body.spawn_ephemeral(EphemeralType::AirBubble, Vec2::ZERO, Vec2::ZERO, None, 0),
        Err(MeshError::EphemeralPoolExhausted { .. })
    ));
    assert_eq!(CountingSink::get(&sink.exhausted), 1);

    let debris = body
        .spawn_ephemeral(EphemeralType::Debris, Vec2::ZERO, Vec2::Y, None, 0)
        .map_err(|e| e.to_string())?;
    assert!(spawned.contains(&debris), "Debris steals a slot");
    assert_eq!(body.points().ephemeral_in_use(), capacity);

    let stats = body.update(10.0, &common::weightless());
    assert_eq!(stats.expired_ephemerals, capacity);
    assert_eq!(body.points().ephemeral_in_use(), 0);
    Ok(())
}

#[test]
fn frontiers_are_uploaded_when_they_change() -> Result<(), String> {
    let mut body = common::build(&common::lattice(2, 2, &[])?)?;
    let mut renderer = RecordingRenderer::default();

    body.upload_frontiers(&mut renderer);
    assert_eq!(renderer.uploads, 1);
    assert_eq!(renderer.frontiers.len(), 1);
    let (_, _, edges) = &renderer.frontiers[0];
    assert_eq!(edges.len(), 8);
    for pair in edges.windows(2) {
        assert_eq!(pair[0][1], pair[1][0], "Edges are uploaded in walking order");
    }

    let colored = renderer.colors.iter().filter(|c| **c != FrontierColor::default()).count();
    assert_eq!(colored, 8, "Every particle but the center is on the hull");

    body.upload_frontiers(&mut renderer);
    assert_eq!(renderer.uploads, 1, "Nothing changed");

    let [_, cut] = common::cell_triangles(2, 1, 0);
    body.destroy_triangle(cut).map_err(|e| e.to_string())?;
    body.upload_frontiers(&mut renderer);
    assert_eq!(renderer.uploads, 2);
    assert_eq!(renderer.frontiers.len(), 2);
    Ok(())
}

#[test]
fn tool_actions_check_their_targets() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;

    assert!(matches!(body.destroy_triangle(9), Err(MeshError::IndexOutOfRange { kind: "triangle", .. })));
    assert!(matches!(body.restore_triangle(0), Err(MeshError::NotDeleted { .. })));
    body.destroy_point(3).map_err(|e| e.to_string())?;
    assert!(matches!(body.destroy_point(3), Err(MeshError::Deleted { .. })));
    assert!(matches!(body.pin_point(3), Err(MeshError::Deleted { .. })));
    assert!(body.triangles().is_deleted(1));
    assert_eq!(body.frontiers().len(), 1, "The remaining triangle keeps a frontier");
    body.verify_frontiers()?;

    body.restore_point(3).map_err(|e| e.to_string())?;
    assert!(!body.points().is_deleted(3));
    Ok(())
}

#[test]
fn destroy_handlers_see_every_casualty() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let log = Arc::new(Mutex::new(Vec::<(&str, u32)>::new()));
    for kind in ["point", "spring", "triangle"] {
        let log = Arc::clone(&log);
        let handler = Box::new(move |i: u32| {
            if let Ok(mut log) = log.lock() {
                log.push((kind, i));
            }
        });
        match kind {
            "point" => body.register_point_destroy_handler(handler),
            "spring" => body.register_spring_destroy_handler(handler),
            _ => body.register_triangle_destroy_handler(handler),
        }
    }

    let mut expected = body
        .points()
        .connected_springs(3)
        .iter()
        .map(|cs| ("spring", cs.spring))
        .collect::<Vec<_>>();
    expected.extend([("triangle", 1), ("point", 3)]);
    expected.sort_unstable();

    body.destroy_point(3).map_err(|e| e.to_string())?;
    let mut seen = log.lock().map_err(|e| e.to_string())?.clone();
    seen.sort_unstable();
    assert_eq!(seen, expected);
    Ok(())
}

#[test]
fn pinned_particles_stay_put_until_released() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let params = SimulationParameters::default();

    assert_eq!(body.pin_point(0), Ok(true));
    assert_eq!(body.pin_point(0), Ok(false));
    body.update(0.0, &params);
    assert_eq!(body.points().position(0), body.points().factory_position(0));

    assert_eq!(body.unpin_point(0), Ok(true));
    assert_eq!(body.unpin_point(0), Ok(false));
    assert!(!body.points().is_pinned(0));
    body.update(consts::SIMULATION_STEP_TIME_DURATION, &params);
    assert!(body.points().position(0).y < body.points().factory_position(0).y, "Gravity pulls the released particle down");
    Ok(())
}

#[test]
fn ephemeral_slots_are_recycled_without_overlap() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let params = common::weightless();
    let capacity = body.points().ephemeral_capacity();

    for round in 0..40_u8 {
        let t = f32::from(round) * 0.3;
        body.update(t, &params);
        let live = body
            .points()
            .ephemeral_points()
            .filter(|&p| body.points().ephemeral_particle(p).is_some())
            .collect::<Vec<_>>();
        assert!(live.len() + 2 < capacity, "Sparkles outlive two rounds at most");

        for _ in 0..2 {
            let p = body
                .spawn_ephemeral(EphemeralType::Sparkle, Vec2::ZERO, Vec2::X, None, 0)
                .map_err(|e| format!("Round {round}: {e}"))?;
            assert!(!live.contains(&p), "Round {round} reused slot {p} while it was in use");
            assert!(!body.points().is_pinned(p));
        }
        assert_eq!(body.points().ephemeral_in_use(), live.len() + 2);
    }
    Ok(())
}

#[test]
fn only_structural_particles_can_be_pinned() -> Result<(), String> {
    let mut body = common::build(&common::lattice(1, 1, &[])?)?;
    let sparkle = body
        .spawn_ephemeral(EphemeralType::Sparkle, Vec2::ZERO, Vec2::X, None, 0)
        .map_err(|e| e.to_string())?;

    assert!(matches!(body.pin_point(sparkle), Err(MeshError::IndexOutOfRange { kind: "point", .. })));
    assert!(matches!(body.unpin_point(sparkle), Err(MeshError::IndexOutOfRange { kind: "point", .. })));
    assert!(!body.points().is_pinned(sparkle));
    Ok(())
}
