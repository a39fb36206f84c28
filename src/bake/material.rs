use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::foundation::error::{StickerError, StickerResult};

/// Stable mesh identifier: an index into [`MaterialStore`], valid for one loaded model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// A texture as assigned to a material slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    /// Pixel data.
    pub image: Arc<DecodedImage>,
    /// Flip rows on upload. Model and baked textures both keep this `false`: row 0 is `v = 1`.
    pub flip_y: bool,
}

impl Texture {
    /// Texture loaded from a model file, rows stored top (`v = 1`) first.
    pub fn from_model(image: Arc<DecodedImage>) -> Self {
        Self {
            image,
            flip_y: false,
        }
    }

    /// Composite produced by a bake.
    pub fn baked(image: DecodedImage) -> Self {
        Self {
            image: Arc::new(image),
            flip_y: false,
        }
    }
}

/// A mesh's original PBR maps and base color, captured once when the model loads.
#[derive(Clone, Debug, PartialEq)]
pub struct PbrSnapshot {
    /// Color (albedo) map.
    pub map: Option<Texture>,
    /// Normal map.
    pub normal_map: Option<Texture>,
    /// Roughness map.
    pub roughness_map: Option<Texture>,
    /// Metalness map.
    pub metalness_map: Option<Texture>,
    /// Ambient-occlusion map.
    pub ao_map: Option<Texture>,
    /// Emissive map.
    pub emissive_map: Option<Texture>,
    /// Material base color.
    pub base_color: Color,
}

impl PbrSnapshot {
    /// Snapshot with only a base color and no maps.
    pub fn untextured(base_color: Color) -> Self {
        Self {
            map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            ao_map: None,
            emissive_map: None,
            base_color,
        }
    }
}

/// Live, renderer-facing material of one mesh. Mutated in place by bakes and resets.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Color map.
    pub map: Option<Texture>,
    /// Normal map.
    pub normal_map: Option<Texture>,
    /// Roughness map.
    pub roughness_map: Option<Texture>,
    /// Metalness map.
    pub metalness_map: Option<Texture>,
    /// Ambient-occlusion map.
    pub ao_map: Option<Texture>,
    /// Emissive map.
    pub emissive_map: Option<Texture>,
    /// Color multiplied with the color map.
    pub color: Color,
    version: u64,
}

impl Material {
    /// Material mirroring `snapshot` verbatim.
    pub fn from_snapshot(snapshot: &PbrSnapshot) -> Self {
        let mut m = Self {
            map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            ao_map: None,
            emissive_map: None,
            color: Color::WHITE,
            version: 0,
        };
        m.restore(snapshot);
        m
    }

    /// Overwrite every map and the base color from `snapshot`.
    pub(crate) fn restore(&mut self, snapshot: &PbrSnapshot) {
        self.map = snapshot.map.clone();
        self.restore_secondary_maps(snapshot);
        self.color = snapshot.base_color;
        self.needs_update();
    }

    /// Reassign the non-color maps from `snapshot`, leaving `map` and `color` alone.
    pub(crate) fn restore_secondary_maps(&mut self, snapshot: &PbrSnapshot) {
        self.normal_map = snapshot.normal_map.clone();
        self.roughness_map = snapshot.roughness_map.clone();
        self.metalness_map = snapshot.metalness_map.clone();
        self.ao_map = snapshot.ao_map.clone();
        self.emissive_map = snapshot.emissive_map.clone();
    }

    /// Flag the material for re-evaluation by the renderer.
    pub(crate) fn needs_update(&mut self) {
        self.version += 1;
    }

    /// Bumped on every change; renderers compare it to decide whether to re-upload.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Arena of live materials, indexed by [`MeshId`].
#[derive(Clone, Debug, Default)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh whose material starts as its snapshot.
    pub fn push(&mut self, snapshot: &PbrSnapshot) -> MeshId {
        let id = MeshId(self.materials.len() as u32);
        self.materials.push(Material::from_snapshot(snapshot));
        id
    }

    /// Material of `mesh`.
    pub fn get(&self, mesh: MeshId) -> Option<&Material> {
        self.materials.get(mesh.0 as usize)
    }

    pub(crate) fn get_mut(&mut self, mesh: MeshId) -> StickerResult<&mut Material> {
        self.materials
            .get_mut(mesh.0 as usize)
            .ok_or_else(|| StickerError::validation(format!("unknown mesh id {}", mesh.0)))
    }

    /// All mesh ids in load order.
    pub fn mesh_ids(&self) -> impl Iterator<Item = MeshId> + '_ {
        (0..self.materials.len()).map(|i| MeshId(i as u32))
    }

    /// Number of meshes.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// `true` when no model is loaded.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Drop every material (model unload).
    pub fn clear(&mut self) {
        self.materials.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bake/material.rs"]
mod tests;
