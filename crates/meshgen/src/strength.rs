//! Deterministic randomization of particle strengths.

use frangible::{MaterialDatabase, PointDefinition, StrengthRandomization};
use glam::Vec2;

/// The side of a noise cell at unit density, in world units.
const CELL_WIDTH: f32 = 4.0;

/// Weakens particles following a smooth noise field over their positions.
///
/// Each particle's strength (its own, or its material's) is multiplied by
/// `(1 - extent) + extent * sqrt(|noise|)`. A higher density adjustment
/// shrinks the noise cells, scattering more weak spots. Ropes are left alone,
/// and nothing changes when either setting is zero.
///
/// The noise only depends on positions, so the same body always gets the same
/// strengths.
pub fn randomize_strengths(points: &mut [PointDefinition], materials: &MaterialDatabase, settings: &StrengthRandomization) {
    if settings.density_adjustment <= 0.0 || settings.extent <= 0.0 {
        return;
    }

    let cell_width = CELL_WIDTH / settings.density_adjustment;
    for point in points.iter_mut().filter(|p| !p.is_rope) {
        let noise = gradient_noise(point.position / cell_width);
        let strength = point.strength.unwrap_or_else(|| materials.get(point.material).strength);
        point.strength = Some(strength * settings.extent.mul_add(noise.abs().sqrt(), 1.0 - settings.extent));
    }
}

/// Gradient noise at a position in cell units, bilinearly interpolated from the
/// corners of its cell.
fn gradient_noise(position: Vec2) -> f32 {
    let corner = position.floor();
    let offset = position - corner;

    let dot_at = |dx: f32, dy: f32| {
        let at = corner + Vec2::new(dx, dy);
        (offset - Vec2::new(dx, dy)).dot(gradient_at(at))
    };

    let bottom = mix(dot_at(0.0, 0.0), dot_at(1.0, 0.0), offset.x);
    let top = mix(dot_at(0.0, 1.0), dot_at(1.0, 1.0), offset.x);
    mix(bottom, top, offset.y)
}

/// A pseudo-random gradient at a cell corner, with equal non-negative components.
fn gradient_at(corner: Vec2) -> Vec2 {
    let arg = (1.0 + (corner.x * corner.x.mul_add(12.9898, corner.y * 78.233)).sin()) * 43_758.547;
    Vec2::splat(arg - arg.floor())
}

/// Linear interpolation from `a` to `b`.
fn mix(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use frangible::{MaterialDatabase, PointDefinition, StrengthRandomization};
    use glam::Vec2;

    use super::randomize_strengths;

    fn points() -> Result<(MaterialDatabase, Vec<PointDefinition>), String> {
        let materials = MaterialDatabase::builtin();
        let wood = materials.find("Wood").ok_or("Missing wood")?;
        let points = (0..8_u8)
            .flat_map(|x| (0..8_u8).map(move |y| (x, y)))
            .map(|(x, y)| PointDefinition::new(Vec2::new(f32::from(x) * 0.7, f32::from(y) * 1.3), wood))
            .collect();
        Ok((materials, points))
    }

    #[test]
    fn disabled_randomization_keeps_material_strength() -> Result<(), String> {
        let (materials, mut points) = points()?;
        for settings in [
            StrengthRandomization {
                density_adjustment: 0.0,
                extent: 0.5,
            },
            StrengthRandomization {
                density_adjustment: 1.0,
                extent: 0.0,
            },
        ] {
            randomize_strengths(&mut points, &materials, &settings);
            assert!(points.iter().all(|p| p.strength.is_none()));
        }
        Ok(())
    }

    #[test]
    fn strengths_stay_within_the_extent() -> Result<(), String> {
        let (materials, mut points) = points()?;
        let settings = StrengthRandomization::default();
        let base = materials.get(points[0].material).strength;
        randomize_strengths(&mut points, &materials, &settings);

        let low = base * (1.0 - settings.extent);
        let high = base * settings.extent.mul_add(2.0_f32.sqrt(), 1.0 - settings.extent);
        for p in &points {
            let strength = p.strength.ok_or("Strength was not set")?;
            assert!(strength >= low * 0.999 && strength <= high * 1.001, "{strength} not in [{low}, {high}]");
        }
        assert!(
            points.iter().any(|p| p.strength.is_some_and(|s| !approx_eq!(f32, s, low, ulps = 4))),
            "Noise should vary across the body"
        );
        Ok(())
    }

    #[test]
    fn randomization_is_deterministic() -> Result<(), String> {
        let (materials, mut a) = points()?;
        let mut b = a.clone();
        let settings = StrengthRandomization::default();
        randomize_strengths(&mut a, &materials, &settings);
        randomize_strengths(&mut b, &materials, &settings);
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn own_strength_is_the_base() -> Result<(), String> {
        let (materials, points) = points()?;
        let mut own = points.iter().map(|p| p.clone().with_strength(1.0)).collect::<Vec<_>>();
        randomize_strengths(&mut own, &materials, &StrengthRandomization::default());
        for p in &own {
            let strength = p.strength.ok_or("Strength was lost")?;
            assert!(strength > 0.5, "{strength} was not scaled from the particle's own strength");
        }
        Ok(())
    }

    #[test]
    fn ropes_are_not_randomized() -> Result<(), String> {
        let (materials, mut points) = points()?;
        for p in &mut points {
            p.is_rope = true;
        }
        randomize_strengths(&mut points, &materials, &StrengthRandomization::default());
        assert!(points.iter().all(|p| p.strength.is_none()));
        Ok(())
    }
}
