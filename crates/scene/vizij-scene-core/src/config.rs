//! Construction options and host capabilities for [`SceneView`](crate::scene::SceneView).

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, Fit};
use crate::engine::Engine;
use crate::error::SceneResult;

/// Scene source: a name resolved by the host's [`AssetLoader`], or raw bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Asset {
    Named(String),
    Bytes(Vec<u8>),
}

impl Default for Asset {
    fn default() -> Self {
        Asset::Bytes(Vec::new())
    }
}

impl From<&str> for Asset {
    fn from(name: &str) -> Self {
        Asset::Named(name.to_string())
    }
}

impl From<Vec<u8>> for Asset {
    fn from(bytes: Vec<u8>) -> Self {
        Asset::Bytes(bytes)
    }
}

/// A single name or a list of names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameSelection {
    One(String),
    Many(Vec<String>),
}

impl NameSelection {
    pub fn into_names(self) -> Vec<String> {
        match self {
            NameSelection::One(name) => vec![name],
            NameSelection::Many(names) => names,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneOptions {
    pub asset: Asset,
    /// Draw into a visible surface instead of a hidden buffer.
    pub debug: bool,
    pub auto_play: bool,
    /// Route pointer events into state machines. Fixed at construction.
    pub interactive: bool,
    pub artboard: Option<String>,
    pub animation: Option<NameSelection>,
    pub state_machine: Option<NameSelection>,
    pub fit: Fit,
    pub align: Alignment,
    /// 0 = artboard width.
    pub max_width: f32,
    /// 0 = artboard height.
    pub max_height: f32,
}

impl SceneOptions {
    pub fn new(asset: impl Into<Asset>) -> Self {
        Self {
            asset: asset.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Host capability resolving an asset name to scene bytes.
pub trait AssetLoader {
    fn load(&mut self, name: &str) -> SceneResult<Vec<u8>>;
}

impl<F> AssetLoader for F
where
    F: FnMut(&str) -> SceneResult<Vec<u8>>,
{
    fn load(&mut self, name: &str) -> SceneResult<Vec<u8>> {
        self(name)
    }
}

pub type StateChangeHook = Box<dyn FnMut(&[String])>;
pub type ReadyHook = Box<dyn FnOnce(&Rc<dyn Engine>)>;

/// Optional host callbacks.
#[derive(Default)]
pub struct SceneHooks {
    /// Called once per step with every state entered during that step.
    pub on_state_change: Option<StateChangeHook>,
    /// Called once after the initial artboard/instances are loaded.
    pub on_ready: Option<ReadyHook>,
}

impl std::fmt::Debug for SceneHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneHooks")
            .field("on_state_change", &self.on_state_change.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}

impl SceneHooks {
    pub fn on_state_change(mut self, f: impl FnMut(&[String]) + 'static) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    pub fn on_ready(mut self, f: impl FnOnce(&Rc<dyn Engine>) + 'static) -> Self {
        self.on_ready = Some(Box::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_camel_case_with_defaults() {
        let opts = SceneOptions::from_json(
            r#"{ "asset": "hero.riv", "autoPlay": true, "stateMachine": "Idle", "fit": "cover" }"#,
        )
        .unwrap();
        assert_eq!(opts.asset, Asset::Named("hero.riv".into()));
        assert!(opts.auto_play);
        assert!(!opts.interactive);
        assert_eq!(opts.state_machine, Some(NameSelection::One("Idle".into())));
        assert_eq!(opts.fit, Fit::Cover);
        assert_eq!(opts.align, Alignment::Center);
        assert_eq!(opts.max_width, 0.0);
    }

    #[test]
    fn name_selection_accepts_list() {
        let opts = SceneOptions::from_json(r#"{ "animation": ["a", "b"] }"#).unwrap();
        assert_eq!(
            opts.animation.unwrap().into_names(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn byte_assets_parse_from_arrays() {
        let opts = SceneOptions::from_json(r#"{ "asset": [1, 2, 3] }"#).unwrap();
        assert_eq!(opts.asset, Asset::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn closures_are_asset_loaders() {
        let mut loader = |name: &str| -> SceneResult<Vec<u8>> { Ok(name.as_bytes().to_vec()) };
        assert_eq!(AssetLoader::load(&mut loader, "ab").unwrap(), b"ab".to_vec());
    }
}
