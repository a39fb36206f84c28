/// Convenience result type used across stickerbake.
pub type StickerResult<T> = Result<T, StickerError>;

/// Top-level error taxonomy used by editor and bake APIs.
#[derive(thiserror::Error, Debug)]
pub enum StickerError {
    /// Invalid user-provided data: unknown ids, out-of-range fields, bad config.
    #[error("validation error: {0}")]
    Validation(String),

    /// A sticker or base texture image could not be fetched or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A crop could not be committed; the sticker keeps its previous source.
    #[error("crop error: {0}")]
    Crop(String),

    /// The rasterizer could not produce a canvas for a bake.
    #[error("bake error: {0}")]
    Bake(String),

    /// Errors when serializing or deserializing scene or config files.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StickerError {
    /// Build a [`StickerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StickerError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`StickerError::Crop`] value.
    pub fn crop(msg: impl Into<String>) -> Self {
        Self::Crop(msg.into())
    }

    /// Build a [`StickerError::Bake`] value.
    pub fn bake(msg: impl Into<String>) -> Self {
        Self::Bake(msg.into())
    }

    /// Build a [`StickerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
