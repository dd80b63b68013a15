//! Headless engine driven by a JSON scene script.
//!
//! Useful anywhere a real vector engine is unavailable: native tools, tests,
//! benchmarks. Scene bytes are a serialized [`ScriptedScene`]. Timeline
//! animations keep a cursor under their loop mode; state machines walk
//! input-guarded transitions, one per advance. Every object creation, release,
//! advance, pointer event and draw call is appended to a shared [`Journal`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::alignment::{Aligned, Bounds, Layout};
use crate::engine::{
    AnimationInstance, Artboard, Engine, InputField, InputKind, InputValue, Renderer, SceneFile,
    StateMachineInstance,
};
use crate::error::{SceneError, SceneResult};
use crate::pointer::PointerKind;
use crate::surface::Surface;

// ---------- scene script ----------

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopMode {
    #[default]
    Once,
    Loop,
    PingPong,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDef {
    pub name: String,
    /// Seconds.
    pub duration: f32,
    #[serde(default, rename = "loop")]
    pub loop_mode: LoopMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default)]
    pub default: Option<InputValue>,
}

/// Edge `from -> to`, taken when its guard holds. Without `input` the edge is
/// unconditional. Boolean inputs compare against `equals` (default `true`);
/// numeric inputs test `> above` (default `!= 0`); triggers test "fired".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDef {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub equals: Option<bool>,
    #[serde(default)]
    pub above: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMachineDef {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    /// The first state is entered on the first advance.
    pub states: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtboardDef {
    pub name: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub animations: Vec<AnimationDef>,
    #[serde(default)]
    pub state_machines: Vec<StateMachineDef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedScene {
    pub artboards: Vec<ArtboardDef>,
    /// Falls back to the first artboard.
    #[serde(default)]
    pub default_artboard: Option<String>,
}

impl ScriptedScene {
    pub fn from_json(bytes: &[u8]) -> SceneResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SceneError::scene_parse(e.to_string()))
    }

    pub fn to_bytes(&self) -> SceneResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ---------- journal ----------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Scene,
    Artboard,
    Animation,
    StateMachine,
    Renderer,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    Clear,
    Save,
    Align(Aligned),
    DrawArtboard(String),
    Restore,
    Flush,
    Resize(u32, u32),
}

#[derive(Clone, Debug, PartialEq)]
pub enum JournalEntry {
    Created(ObjectKind, String),
    Released(ObjectKind, String),
    Advanced {
        kind: ObjectKind,
        name: String,
        elapsed: f32,
    },
    Applied {
        animation: String,
        artboard: String,
        time: f32,
    },
    Pointer {
        machine: String,
        kind: PointerKind,
        x: f32,
        y: f32,
    },
    Render(RenderOp),
}

/// Append-only log shared by every object of one [`ScriptedEngine`].
#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<Vec<JournalEntry>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: JournalEntry) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Objects of `kind` created and not yet released.
    pub fn live(&self, kind: ObjectKind) -> usize {
        let entries = self.0.borrow();
        let created = entries
            .iter()
            .filter(|e| matches!(e, JournalEntry::Created(k, _) if *k == kind))
            .count();
        let released = entries
            .iter()
            .filter(|e| matches!(e, JournalEntry::Released(k, _) if *k == kind))
            .count();
        created.saturating_sub(released)
    }

    /// Number of advance calls on objects of `kind`.
    pub fn advances(&self, kind: ObjectKind) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| matches!(e, JournalEntry::Advanced { kind: k, .. } if *k == kind))
            .count()
    }

    pub fn render_ops(&self) -> Vec<RenderOp> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                JournalEntry::Render(op) => Some(op.clone()),
                _ => None,
            })
            .collect()
    }

    /// Index of the first entry matching `pred`.
    pub fn position(&self, pred: impl Fn(&JournalEntry) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(pred)
    }
}

// ---------- engine ----------

#[derive(Clone, Debug, Default)]
pub struct ScriptedEngine {
    journal: Journal,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl Engine for ScriptedEngine {
    fn load_scene(&self, bytes: &[u8]) -> SceneResult<Box<dyn SceneFile>> {
        let scene = ScriptedScene::from_json(bytes)?;
        self.journal
            .push(JournalEntry::Created(ObjectKind::Scene, "scene".into()));
        Ok(Box::new(ScriptedFile {
            scene: Rc::new(scene),
            journal: self.journal.clone(),
        }))
    }

    fn make_renderer(&self, surface: &Surface) -> SceneResult<Box<dyn Renderer>> {
        Ok(Box::new(RecordingRenderer::new(
            self.journal.clone(),
            surface.width(),
            surface.height(),
        )))
    }
}

struct ScriptedFile {
    scene: Rc<ScriptedScene>,
    journal: Journal,
}

impl ScriptedFile {
    fn artboard_at(&self, index: usize) -> Box<dyn Artboard> {
        let name = self.scene.artboards[index].name.clone();
        self.journal
            .push(JournalEntry::Created(ObjectKind::Artboard, name));
        Box::new(ScriptedArtboard {
            scene: Rc::clone(&self.scene),
            index,
            time: 0.0,
            journal: self.journal.clone(),
        })
    }
}

impl SceneFile for ScriptedFile {
    fn artboard_count(&self) -> usize {
        self.scene.artboards.len()
    }

    fn artboard_name(&self, index: usize) -> Option<String> {
        self.scene.artboards.get(index).map(|a| a.name.clone())
    }

    fn artboard_by_name(&self, name: &str) -> Option<Box<dyn Artboard>> {
        let index = self.scene.artboards.iter().position(|a| a.name == name)?;
        Some(self.artboard_at(index))
    }

    fn default_artboard(&self) -> Option<Box<dyn Artboard>> {
        let index = match self.scene.default_artboard.as_deref() {
            Some(name) => self.scene.artboards.iter().position(|a| a.name == name)?,
            None if self.scene.artboards.is_empty() => return None,
            None => 0,
        };
        Some(self.artboard_at(index))
    }
}

impl Drop for ScriptedFile {
    fn drop(&mut self) {
        self.journal
            .push(JournalEntry::Released(ObjectKind::Scene, "scene".into()));
    }
}

// ---------- artboard ----------

struct ScriptedArtboard {
    scene: Rc<ScriptedScene>,
    index: usize,
    /// Total advanced time, seconds.
    time: f32,
    journal: Journal,
}

impl ScriptedArtboard {
    fn def(&self) -> &ArtboardDef {
        &self.scene.artboards[self.index]
    }
}

impl Artboard for ScriptedArtboard {
    fn name(&self) -> &str {
        &self.def().name
    }

    fn bounds(&self) -> Bounds {
        self.def().bounds
    }

    fn animation_count(&self) -> usize {
        self.def().animations.len()
    }

    fn animation_name(&self, index: usize) -> Option<String> {
        self.def().animations.get(index).map(|a| a.name.clone())
    }

    fn state_machine_count(&self) -> usize {
        self.def().state_machines.len()
    }

    fn state_machine_name(&self, index: usize) -> Option<String> {
        self.def().state_machines.get(index).map(|s| s.name.clone())
    }

    fn instantiate_animation(&mut self, name: &str) -> Option<Box<dyn AnimationInstance>> {
        let def = self.def().animations.iter().find(|a| a.name == name)?.clone();
        self.journal
            .push(JournalEntry::Created(ObjectKind::Animation, def.name.clone()));
        Some(Box::new(ScriptedAnimation {
            def,
            elapsed: 0.0,
            time: 0.0,
            journal: self.journal.clone(),
        }))
    }

    fn instantiate_state_machine(&mut self, name: &str) -> Option<Box<dyn StateMachineInstance>> {
        let def = self
            .def()
            .state_machines
            .iter()
            .find(|s| s.name == name)?
            .clone();
        self.journal
            .push(JournalEntry::Created(ObjectKind::StateMachine, def.name.clone()));
        Some(Box::new(ScriptedStateMachine::new(def, self.journal.clone())))
    }

    fn advance(&mut self, elapsed: f32) {
        self.time += elapsed;
        self.journal.push(JournalEntry::Advanced {
            kind: ObjectKind::Artboard,
            name: self.def().name.clone(),
            elapsed,
        });
    }

    fn draw(&mut self, _renderer: &mut dyn Renderer) {
        self.journal
            .push(JournalEntry::Render(RenderOp::DrawArtboard(self.def().name.clone())));
    }
}

impl Drop for ScriptedArtboard {
    fn drop(&mut self) {
        let name = self.def().name.clone();
        self.journal
            .push(JournalEntry::Released(ObjectKind::Artboard, name));
    }
}

// ---------- animation ----------

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect `t` into `[0, span]`, bouncing off both ends.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let m = fmod(t, 2.0 * span);
    if m <= span {
        m
    } else {
        2.0 * span - m
    }
}

struct ScriptedAnimation {
    def: AnimationDef,
    /// Total advanced time, seconds.
    elapsed: f32,
    /// Cursor inside `[0, duration]`.
    time: f32,
    journal: Journal,
}

impl AnimationInstance for ScriptedAnimation {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn advance(&mut self, elapsed: f32) -> bool {
        self.journal.push(JournalEntry::Advanced {
            kind: ObjectKind::Animation,
            name: self.def.name.clone(),
            elapsed,
        });
        let duration = self.def.duration;
        if duration <= 0.0 {
            self.time = 0.0;
            return false;
        }
        if self.def.loop_mode == LoopMode::Once && self.elapsed >= duration {
            return false;
        }
        self.elapsed += elapsed;
        self.time = match self.def.loop_mode {
            LoopMode::Once => self.elapsed.clamp(0.0, duration),
            LoopMode::Loop => fmod(self.elapsed, duration),
            LoopMode::PingPong => ping_pong(self.elapsed, duration),
        };
        self.def.loop_mode != LoopMode::Once || self.elapsed < duration
    }

    fn apply(&mut self, artboard: &mut dyn Artboard, _mix: f32) {
        self.journal.push(JournalEntry::Applied {
            animation: self.def.name.clone(),
            artboard: artboard.name().to_string(),
            time: self.time,
        });
    }
}

impl Drop for ScriptedAnimation {
    fn drop(&mut self) {
        self.journal
            .push(JournalEntry::Released(ObjectKind::Animation, self.def.name.clone()));
    }
}

// ---------- state machine ----------

struct ScriptedStateMachine {
    def: StateMachineDef,
    inputs: Vec<InputField>,
    fired: Vec<bool>,
    current: Option<usize>,
    changed: Vec<String>,
    journal: Journal,
}

impl ScriptedStateMachine {
    fn new(def: StateMachineDef, journal: Journal) -> Self {
        let inputs: Vec<InputField> = def
            .inputs
            .iter()
            .map(|input| match input.kind {
                InputKind::Boolean => {
                    InputField::Boolean(input.default.map(InputValue::as_bool).unwrap_or(false))
                }
                InputKind::Numeric => {
                    InputField::Numeric(input.default.map(InputValue::as_number).unwrap_or(0.0))
                }
                InputKind::Trigger => InputField::Trigger,
            })
            .collect();
        let fired = vec![false; inputs.len()];
        Self {
            def,
            inputs,
            fired,
            current: None,
            changed: Vec::new(),
            journal,
        }
    }

    fn guard_holds(&self, transition: &TransitionDef) -> bool {
        let Some(input) = transition.input.as_deref() else {
            return true;
        };
        let Some(index) = self.def.inputs.iter().position(|i| i.name == input) else {
            return false;
        };
        match self.inputs[index] {
            InputField::Boolean(b) => b == transition.equals.unwrap_or(true),
            InputField::Numeric(n) => match transition.above {
                Some(threshold) => n > threshold,
                None => n != 0.0,
            },
            InputField::Trigger => self.fired[index],
        }
    }

    fn next_state(&self) -> Option<usize> {
        let Some(current) = self.current else {
            return if self.def.states.is_empty() { None } else { Some(0) };
        };
        let from = &self.def.states[current];
        self.def
            .transitions
            .iter()
            .filter(|t| &t.from == from)
            .find(|t| self.guard_holds(t))
            .and_then(|t| self.def.states.iter().position(|s| *s == t.to))
    }

    fn record_pointer(&self, kind: PointerKind, x: f32, y: f32) {
        self.journal.push(JournalEntry::Pointer {
            machine: self.def.name.clone(),
            kind,
            x,
            y,
        });
    }
}

impl StateMachineInstance for ScriptedStateMachine {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn advance(&mut self, _artboard: &mut dyn Artboard, elapsed: f32) {
        self.journal.push(JournalEntry::Advanced {
            kind: ObjectKind::StateMachine,
            name: self.def.name.clone(),
            elapsed,
        });
        self.changed.clear();
        if let Some(next) = self.next_state() {
            self.current = Some(next);
            self.changed.push(self.def.states[next].clone());
        }
        self.fired.iter_mut().for_each(|f| *f = false);
    }

    fn changed_states(&self) -> Vec<String> {
        self.changed.clone()
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn input_name(&self, index: usize) -> Option<String> {
        self.def.inputs.get(index).map(|i| i.name.clone())
    }

    fn input(&self, index: usize) -> Option<InputField> {
        self.inputs.get(index).copied()
    }

    fn set_input(&mut self, index: usize, value: InputValue) {
        match self.inputs.get_mut(index) {
            Some(InputField::Boolean(b)) => *b = value.as_bool(),
            Some(InputField::Numeric(n)) => *n = value.as_number(),
            _ => {}
        }
    }

    fn fire_input(&mut self, index: usize) {
        if let (Some(InputField::Trigger), Some(fired)) =
            (self.inputs.get(index), self.fired.get_mut(index))
        {
            *fired = true;
        }
    }

    fn pointer_down(&mut self, x: f32, y: f32) {
        self.record_pointer(PointerKind::Down, x, y);
    }

    fn pointer_up(&mut self, x: f32, y: f32) {
        self.record_pointer(PointerKind::Up, x, y);
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        self.record_pointer(PointerKind::Move, x, y);
    }
}

impl Drop for ScriptedStateMachine {
    fn drop(&mut self) {
        self.journal
            .push(JournalEntry::Released(ObjectKind::StateMachine, self.def.name.clone()));
    }
}

// ---------- renderer ----------

/// Renderer that only records the calls it receives.
#[derive(Debug)]
pub struct RecordingRenderer {
    journal: Journal,
    width: u32,
    height: u32,
    depth: usize,
}

impl RecordingRenderer {
    pub fn new(journal: Journal, width: u32, height: u32) -> Self {
        journal.push(JournalEntry::Created(ObjectKind::Renderer, "renderer".into()));
        Self {
            journal,
            width,
            height,
            depth: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Renderer for RecordingRenderer {
    fn clear(&mut self) {
        self.journal.push(JournalEntry::Render(RenderOp::Clear));
    }

    fn save(&mut self) {
        self.depth += 1;
        self.journal.push(JournalEntry::Render(RenderOp::Save));
    }

    fn align(&mut self, layout: &Layout) {
        self.journal
            .push(JournalEntry::Render(RenderOp::Align(layout.aligned)));
    }

    fn restore(&mut self) {
        if self.depth == 0 {
            log::warn!("renderer: restore without matching save");
        }
        self.depth = self.depth.saturating_sub(1);
        self.journal.push(JournalEntry::Render(RenderOp::Restore));
    }

    fn flush(&mut self) {
        self.journal.push(JournalEntry::Render(RenderOp::Flush));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.journal
            .push(JournalEntry::Render(RenderOp::Resize(width, height)));
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl Drop for RecordingRenderer {
    fn drop(&mut self) {
        self.journal
            .push(JournalEntry::Released(ObjectKind::Renderer, "renderer".into()));
    }
}
