//! Error type for the scene core.
//!
//! Missing artboards, animations, state machines and inputs are not errors:
//! scene files are treated as partial content and those lookups degrade to
//! no-ops. Only failures the host has to act on surface here.

/// Result alias used across the crate.
pub type SceneResult<T> = Result<T, SceneError>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum SceneError {
    /// The external asset loader could not provide the scene bytes.
    #[error("asset load failed for '{name}': {reason}")]
    AssetLoad { name: String, reason: String },

    /// The engine rejected the scene file.
    #[error("scene parse error: {0}")]
    SceneParse(String),

    /// The runtime location can only be set once, before the engine loads.
    #[error("runtime location is locked: {0}")]
    RuntimeLocked(String),

    /// The engine could not create a renderer for the drawing surface.
    #[error("renderer error: {0}")]
    Renderer(String),

    /// Construction options were malformed.
    #[error("options error: {0}")]
    Options(String),
}

impl SceneError {
    pub fn asset_load(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AssetLoad {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn scene_parse(msg: impl Into<String>) -> Self {
        Self::SceneParse(msg.into())
    }

    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Options(err.to_string())
    }
}
