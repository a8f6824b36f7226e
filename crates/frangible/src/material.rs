//! Structural materials.

use serde::{Deserialize, Serialize};

use crate::{MeshError, consts};

/// The index of a material in a [`MaterialDatabase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u16);

/// Materials with a special role in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniqueMaterial {
    /// The material of air bubbles.
    Air,
    /// Glass.
    Glass,
    /// The material of ropes.
    Rope,
    /// The material of water drops.
    Water,
}

/// The physical properties of a structural material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralMaterial {
    /// The name of the material.
    pub name: String,
    /// The mass of one particle made of this material.
    pub mass: f32,
    /// The relative elongation a spring of this material tolerates before breaking.
    pub strength: f32,
    /// The stiffness of springs of this material.
    pub stiffness: f32,
    /// The fraction of the breaking elongation above which a spring is stressed.
    pub strain_threshold_fraction: f32,
    /// How much of a particle's volume can fill with water.
    pub buoyancy_volume_fill: f32,
    /// Whether particles of this material are watertight.
    pub is_hull: bool,
    /// The special role of this material, if any.
    #[serde(default)]
    pub unique_type: Option<UniqueMaterial>,
}

impl StructuralMaterial {
    /// Creates an ordinary material.
    #[must_use]
    pub fn new(name: &str, mass: f32, strength: f32, stiffness: f32, is_hull: bool) -> Self {
        Self {
            name: name.to_string(),
            mass,
            strength,
            stiffness,
            strain_threshold_fraction: 0.5,
            buoyancy_volume_fill: 1.0,
            is_hull,
            unique_type: None,
        }
    }

    /// Assigns a special role to the material.
    #[must_use]
    pub const fn with_unique_type(mut self, unique_type: UniqueMaterial) -> Self {
        self.unique_type = Some(unique_type);
        self
    }

    /// Sets the strain threshold fraction of the material.
    #[must_use]
    pub const fn with_strain_threshold_fraction(mut self, fraction: f32) -> Self {
        self.strain_threshold_fraction = fraction;
        self
    }

    /// Sets the buoyancy volume fill of the material.
    #[must_use]
    pub const fn with_buoyancy_volume_fill(mut self, fill: f32) -> Self {
        self.buoyancy_volume_fill = fill;
        self
    }

    /// Whether this is the rope material.
    #[must_use]
    pub fn is_rope(&self) -> bool {
        self.unique_type == Some(UniqueMaterial::Rope)
    }
}

/// The set of materials a body is built from.
///
/// The database always contains an air material, which ephemeral bubbles are made of.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDatabase {
    /// The materials, indexed by `MaterialId`.
    materials: Vec<StructuralMaterial>,
    /// The id of the air material.
    air: MaterialId,
}

impl MaterialDatabase {
    /// Creates a database from a list of materials.
    ///
    /// # Errors
    ///
    /// - If there are more materials than a `MaterialId` can address.
    /// - If no material has the `Air` unique type.
    /// - If any material has a non-positive mass.
    pub fn new(materials: Vec<StructuralMaterial>) -> Result<Self, MeshError> {
        if materials.len() > usize::from(u16::MAX) {
            return Err(MeshError::InvalidMesh(format!("too many materials: {}", materials.len())));
        }

        if let Some(m) = materials.iter().find(|m| m.mass <= 0.0 || !m.mass.is_finite()) {
            return Err(MeshError::InvalidMesh(format!("material {} has a non-positive mass", m.name)));
        }

        let air = materials
            .iter()
            .position(|m| m.unique_type == Some(UniqueMaterial::Air))
            .map(to_material_id)
            .ok_or_else(|| MeshError::InvalidMesh("no air material".to_string()))?;

        Ok(Self { materials, air })
    }

    /// Reads a database from a JSON file containing a list of materials.
    ///
    /// # Errors
    ///
    /// - If the file cannot be read or parsed.
    /// - See [`MaterialDatabase::new`].
    pub fn from_json_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, MeshError> {
        let contents = std::fs::read_to_string(path).map_err(|e| MeshError::InvalidParameters(e.to_string()))?;
        let materials = serde_json::from_str(&contents).map_err(|e| MeshError::InvalidParameters(e.to_string()))?;
        Self::new(materials)
    }

    /// A small set of built-in materials.
    ///
    /// | id | name | hull |
    /// |----|------|------|
    /// | 0  | Air  | no   |
    /// | 1  | Wood | no   |
    /// | 2  | Iron | yes  |
    /// | 3  | Glass| no   |
    /// | 4  | Rope | no   |
    /// | 5  | Water| no   |
    #[must_use]
    pub fn builtin() -> Self {
        let materials = vec![
            StructuralMaterial::new("Air", consts::AIR_MASS, 0.01, 0.1, false)
                .with_unique_type(UniqueMaterial::Air)
                .with_buoyancy_volume_fill(0.0),
            StructuralMaterial::new("Wood", 600.0, 0.05, 1.0, false).with_strain_threshold_fraction(0.6),
            StructuralMaterial::new("Iron", 1500.0, 0.1, 1.0, true).with_strain_threshold_fraction(0.5),
            StructuralMaterial::new("Glass", 2500.0, 0.008, 1.0, false)
                .with_unique_type(UniqueMaterial::Glass)
                .with_strain_threshold_fraction(0.8),
            StructuralMaterial::new("Rope", 50.0, 0.6, 0.4, false)
                .with_unique_type(UniqueMaterial::Rope)
                .with_strain_threshold_fraction(0.7),
            StructuralMaterial::new("Water", consts::WATER_MASS, 0.01, 0.1, false)
                .with_unique_type(UniqueMaterial::Water)
                .with_buoyancy_volume_fill(0.0),
        ];

        Self {
            materials,
            air: MaterialId(0),
        }
    }

    /// Returns the material with the given id.
    ///
    /// # Panics
    ///
    /// - If the id was not handed out by this database.
    #[must_use]
    pub fn get(&self, id: MaterialId) -> &StructuralMaterial {
        &self.materials[usize::from(id.0)]
    }

    /// Looks up a material by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.materials.iter().position(|m| m.name == name).map(to_material_id)
    }

    /// Looks up the material with the given special role.
    #[must_use]
    pub fn unique(&self, unique_type: UniqueMaterial) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.unique_type == Some(unique_type))
            .map(to_material_id)
    }

    /// The id of the air material.
    #[must_use]
    pub const fn air(&self) -> MaterialId {
        self.air
    }

    /// The number of materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the database is empty. Never true for a valid database.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterates over the ids and materials.
    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &StructuralMaterial)> {
        self.materials.iter().enumerate().map(|(i, m)| (to_material_id(i), m))
    }
}

/// Converts a position in the material list to an id. Callers have checked the bound.
#[expect(clippy::cast_possible_truncation)]
const fn to_material_id(i: usize) -> MaterialId {
    MaterialId(i as u16)
}

#[cfg(test)]
mod tests {
    use super::{MaterialDatabase, StructuralMaterial, UniqueMaterial};

    #[test]
    fn builtin_has_air() -> Result<(), String> {
        let db = MaterialDatabase::builtin();
        let air = db.unique(UniqueMaterial::Air).ok_or("Missing air")?;
        assert_eq!(air, db.air());
        assert_eq!(db.find("Iron").map(|id| db.get(id).is_hull), Some(true));
        assert!(db.get(db.find("Rope").ok_or("Missing rope")?).is_rope());
        Ok(())
    }

    #[test]
    fn rejects_missing_air() {
        let result = MaterialDatabase::new(vec![StructuralMaterial::new("Wood", 600.0, 0.05, 1.0, false)]);
        assert!(result.is_err(), "A database without air should be rejected");
    }

    #[test]
    fn round_trips_through_json() -> Result<(), String> {
        let db = MaterialDatabase::builtin();
        let materials = db.iter().map(|(_, m)| m.clone()).collect::<Vec<_>>();
        let json = serde_json::to_string(&materials).map_err(|e| e.to_string())?;
        let parsed: Vec<StructuralMaterial> = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        let parsed = MaterialDatabase::new(parsed).map_err(|e| e.to_string())?;
        assert_eq!(parsed, db);
        Ok(())
    }
}
