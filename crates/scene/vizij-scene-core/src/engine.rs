//! Engine seam: traits the host's animation engine implements.
//!
//! The core never interprets scene files itself. An [`Engine`] parses bytes
//! into a [`SceneFile`], which instantiates [`Artboard`]s, which in turn
//! instantiate [`AnimationInstance`]s and [`StateMachineInstance`]s bound to
//! them. Every handle is an owned box; dropping it releases the native object.
//! Adapters (WASM, headless) implement these and hand an `Rc<dyn Engine>` to
//! [`SceneView`](crate::scene::SceneView).

use serde::{Deserialize, Serialize};

use crate::alignment::{Bounds, Layout};
use crate::error::SceneResult;
use crate::surface::Surface;

/// Process-wide factory for scene files and renderers.
pub trait Engine {
    /// Parse a scene file. The returned description is immutable.
    fn load_scene(&self, bytes: &[u8]) -> SceneResult<Box<dyn SceneFile>>;

    /// Create a renderer drawing into `surface`.
    fn make_renderer(&self, surface: &Surface) -> SceneResult<Box<dyn Renderer>>;
}

/// Parsed, immutable scene description.
pub trait SceneFile {
    fn artboard_count(&self) -> usize;
    fn artboard_name(&self, index: usize) -> Option<String>;
    fn artboard_by_name(&self, name: &str) -> Option<Box<dyn Artboard>>;
    fn default_artboard(&self) -> Option<Box<dyn Artboard>>;
}

/// Live, stateful artboard instance.
pub trait Artboard {
    fn name(&self) -> &str;
    fn bounds(&self) -> Bounds;

    fn animation_count(&self) -> usize;
    fn animation_name(&self, index: usize) -> Option<String>;
    fn state_machine_count(&self) -> usize;
    fn state_machine_name(&self, index: usize) -> Option<String>;

    /// Instantiate a timeline animation bound to this artboard.
    fn instantiate_animation(&mut self, name: &str) -> Option<Box<dyn AnimationInstance>>;
    /// Instantiate a state machine bound to this artboard.
    fn instantiate_state_machine(&mut self, name: &str)
        -> Option<Box<dyn StateMachineInstance>>;

    fn advance(&mut self, elapsed: f32);
    fn draw(&mut self, renderer: &mut dyn Renderer);
}

/// Playback cursor over one timeline animation.
pub trait AnimationInstance {
    fn name(&self) -> &str;
    /// Move the cursor by `elapsed` seconds. Returns `false` once a one-shot
    /// animation has completed.
    fn advance(&mut self, elapsed: f32) -> bool;
    /// Write the sampled values at the current cursor onto `artboard`.
    fn apply(&mut self, artboard: &mut dyn Artboard, mix: f32);
}

/// Kind of a state machine input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    Boolean,
    Numeric,
    Trigger,
}

/// Current value of a state machine input. Triggers carry no value.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum InputField {
    Boolean(bool),
    Numeric(f32),
    Trigger,
}

impl InputField {
    #[inline]
    pub fn kind(&self) -> InputKind {
        match self {
            InputField::Boolean(_) => InputKind::Boolean,
            InputField::Numeric(_) => InputKind::Numeric,
            InputField::Trigger => InputKind::Trigger,
        }
    }
}

/// Value written to a boolean or numeric input.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Number(f32),
}

impl InputValue {
    pub fn as_bool(self) -> bool {
        match self {
            InputValue::Bool(b) => b,
            InputValue::Number(n) => n != 0.0,
        }
    }

    pub fn as_number(self) -> f32 {
        match self {
            InputValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            InputValue::Number(n) => n,
        }
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Bool(b)
    }
}

impl From<f32> for InputValue {
    fn from(n: f32) -> Self {
        InputValue::Number(n)
    }
}

/// Live state machine bound to an artboard.
pub trait StateMachineInstance {
    fn name(&self) -> &str;

    fn advance(&mut self, artboard: &mut dyn Artboard, elapsed: f32);
    /// Names of the states entered during the last [`advance`](Self::advance),
    /// in the order the engine reports them.
    fn changed_states(&self) -> Vec<String>;

    fn input_count(&self) -> usize;
    fn input_name(&self, index: usize) -> Option<String>;
    fn input(&self, index: usize) -> Option<InputField>;
    /// Write a boolean/numeric input. Engines ignore writes to triggers.
    fn set_input(&mut self, index: usize, value: InputValue);
    fn fire_input(&mut self, index: usize);

    fn pointer_down(&mut self, x: f32, y: f32);
    fn pointer_up(&mut self, x: f32, y: f32);
    fn pointer_move(&mut self, x: f32, y: f32);
}

/// Drawing backend bound to one [`Surface`].
pub trait Renderer {
    fn clear(&mut self);
    fn save(&mut self);
    /// Apply the fit/alignment transform for the current layout.
    fn align(&mut self, layout: &Layout);
    fn restore(&mut self);
    /// Present everything drawn since the last clear.
    fn flush(&mut self);
    fn resize(&mut self, width: u32, height: u32);
    /// Concrete renderer, for adapters whose artboards draw into their own
    /// renderer type.
    fn as_any(&self) -> &dyn std::any::Any;
}
