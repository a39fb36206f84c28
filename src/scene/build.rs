use crate::assets::color::Color;
use crate::assets::store::{ImageRef, ImageStore};
use crate::bake::material::{PbrSnapshot, Texture};
use crate::color_mode::ColorMode;
use crate::editor::session::EditorSession;
use crate::foundation::config::EditorConfig;
use crate::foundation::error::StickerResult;
use crate::scene::model::{MeshDef, SceneDef};
use crate::sticker::model::StickerPatch;

impl SceneDef {
    /// Build an editor session holding this scene's model, stickers and color mode.
    ///
    /// Unloadable mesh maps are logged and left empty (the bake then falls back to the base
    /// color). Sticker images must load; crops are committed immediately.
    #[tracing::instrument(skip_all, fields(meshes = self.meshes.len(), stickers = self.stickers.len()))]
    pub fn build_session(
        &self,
        config: EditorConfig,
        store: ImageStore,
    ) -> StickerResult<EditorSession> {
        let mut session = EditorSession::new(config, store)?;
        let snapshots = self
            .meshes
            .iter()
            .map(|m| mesh_snapshot(session.store(), m))
            .collect();
        session.load_model(snapshots);

        for def in &self.stickers {
            let id = session.add_sticker(def.src.clone())?;
            let patch = StickerPatch {
                uv_x: Some(def.uv.u),
                uv_y: Some(def.uv.v),
                scale: def.scale,
                rotation: Some(def.rotation),
                crop: def.crop,
                ..StickerPatch::default()
            };
            session.update_sticker(id, &patch)?;
            session.commit_crop(id)?;
        }
        session.deselect();

        if let ColorMode::Custom(color) = self.color_mode {
            session.pick_color(color);
        }
        Ok(session)
    }
}

fn mesh_snapshot(store: &ImageStore, def: &MeshDef) -> PbrSnapshot {
    let load = |src: &Option<ImageRef>| -> Option<Texture> {
        let src = src.as_ref()?;
        match store.load(src) {
            Ok(img) => Some(Texture::from_model(img)),
            Err(e) => {
                tracing::warn!(src = %src, error = %e, "mesh map unusable; leaving it empty");
                None
            }
        }
    };
    PbrSnapshot {
        map: load(&def.map),
        normal_map: load(&def.normal_map),
        roughness_map: load(&def.roughness_map),
        metalness_map: load(&def.metalness_map),
        ao_map: load(&def.ao_map),
        emissive_map: load(&def.emissive_map),
        base_color: def.base_color.unwrap_or(Color::WHITE),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/build.rs"]
mod tests;
