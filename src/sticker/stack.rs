use serde::{Deserialize, Serialize};

use crate::assets::store::ImageRef;
use crate::foundation::error::{StickerError, StickerResult};
use crate::sticker::model::{Sticker, StickerId, StickerPatch};

/// Direction for [`StickerStack::reorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reorder {
    /// Paint last (visually on top).
    ToFront,
    /// Paint first (visually at the bottom).
    ToBack,
}

/// Ordered sticker collection. Array position is paint order.
///
/// Every structural mutation re-derives `z_index` from position before returning, so the
/// z-indices always form the contiguous permutation `0..len`.
#[derive(Clone, Debug, Default)]
pub struct StickerStack {
    stickers: Vec<Sticker>,
    selected: Option<StickerId>,
    next_id: u64,
    revision: u64,
}

impl StickerStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sticker for an uploaded image of `width x height` pixels and select it.
    pub fn add(
        &mut self,
        src: ImageRef,
        width: u32,
        height: u32,
        scale: f64,
    ) -> StickerResult<StickerId> {
        let id = StickerId(self.next_id);
        let sticker = Sticker::new(id, src, width, height, scale)?;
        self.next_id += 1;
        self.stickers.push(sticker);
        self.selected = Some(id);
        self.reindex();
        Ok(id)
    }

    /// Remove a sticker, clearing the selection if it pointed at it.
    pub fn remove(&mut self, id: StickerId) -> StickerResult<Sticker> {
        let idx = self.position(id)?;
        let removed = self.stickers.remove(idx);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.reindex();
        Ok(removed)
    }

    /// Select a sticker.
    pub fn select(&mut self, id: StickerId) -> StickerResult<()> {
        self.position(id)?;
        self.selected = Some(id);
        Ok(())
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Currently selected sticker id.
    pub fn selected(&self) -> Option<StickerId> {
        self.selected
    }

    /// Move a sticker to the top or bottom of paint order.
    pub fn reorder(&mut self, id: StickerId, to: Reorder) -> StickerResult<()> {
        let idx = self.position(id)?;
        let sticker = self.stickers.remove(idx);
        match to {
            Reorder::ToFront => self.stickers.push(sticker),
            Reorder::ToBack => self.stickers.insert(0, sticker),
        }
        self.reindex();
        Ok(())
    }

    /// Apply a partial update. On error the sticker is left unchanged.
    pub fn update(&mut self, id: StickerId, patch: &StickerPatch) -> StickerResult<()> {
        let idx = self.position(id)?;
        if patch.is_empty() {
            return Ok(());
        }
        let next = self.stickers[idx].patched(patch)?;
        self.stickers[idx] = next;
        self.revision += 1;
        Ok(())
    }

    /// Look up a sticker.
    pub fn get(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    /// Stickers in paint order (lowest z-index first).
    pub fn paint_order(&self) -> &[Sticker] {
        &self.stickers
    }

    /// Iterate in paint order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sticker> {
        self.stickers.iter()
    }

    /// Number of stickers.
    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    /// `true` when there are no stickers.
    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    /// Counter bumped by every successful mutation that changes sticker data or order.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Remove every sticker.
    pub fn clear(&mut self) {
        if self.stickers.is_empty() {
            return;
        }
        self.stickers.clear();
        self.selected = None;
        self.revision += 1;
    }

    fn position(&self, id: StickerId) -> StickerResult<usize> {
        self.stickers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StickerError::validation(format!("unknown sticker id {}", id.0)))
    }

    fn reindex(&mut self) {
        for (i, s) in self.stickers.iter_mut().enumerate() {
            s.z_index = i;
        }
        self.revision += 1;
    }
}

impl<'a> IntoIterator for &'a StickerStack {
    type Item = &'a Sticker;
    type IntoIter = std::slice::Iter<'a, Sticker>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sticker/stack.rs"]
mod tests;
