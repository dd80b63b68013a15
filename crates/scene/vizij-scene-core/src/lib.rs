//! Vizij Scene Core (engine-agnostic)
//!
//! Embeds a vector-animation scene (artboard, timeline animations, state
//! machines) in a host drawing surface. The host supplies an [`Engine`], a
//! [`FrameScheduler`] and an [`AssetLoader`]; [`SceneView`] owns the live
//! instances, advances them on every frame, draws them under the current
//! fit/alignment and routes pointer input back into scene space.

pub mod alignment;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod instances;
pub mod pointer;
pub mod registry;
pub mod runtime;
pub mod scene;
pub mod scripted;
pub mod surface;

// Re-exports for consumers (adapters)
pub use alignment::{compute_alignment, Aligned, Alignment, Bounds, Fit, Layout};
pub use config::{Asset, AssetLoader, NameSelection, SceneHooks, SceneOptions};
pub use driver::{DriverState, FrameDriver, FrameHandle, FrameScheduler, ManualScheduler};
pub use engine::{
    AnimationInstance, Artboard, Engine, InputField, InputKind, InputValue, Renderer, SceneFile,
    StateMachineInstance,
};
pub use error::{SceneError, SceneResult};
pub use instances::InstanceSet;
pub use pointer::{HostTransform, InputBridge, PointerEvent, PointerKind};
pub use registry::{InputKey, InputRegistry};
pub use runtime::{runtime_location, set_runtime_location, shared_engine};
pub use scene::SceneView;
pub use scripted::{Journal, JournalEntry, ObjectKind, RenderOp, ScriptedEngine, ScriptedScene};
pub use surface::{Surface, SurfaceKind};
