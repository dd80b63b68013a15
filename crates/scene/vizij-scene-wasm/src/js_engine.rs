//! Bridge from the engine traits to a JS animation runtime object.
//!
//! The runtime is duck-typed. Every handle it returns is a plain JS object and
//! each trait method maps onto one method call:
//!
//! ```text
//! runtime.loadScene(bytes: Uint8Array) -> file
//! runtime.makeRenderer(width, height, visible: boolean) -> renderer
//! file.artboardCount() / artboardName(i) / artboardByName(name) / defaultArtboard()
//! artboard.name, bounds() -> { minX, minY, maxX, maxY }
//! artboard.animationCount() / animationName(i) / animationByName(name)
//! artboard.stateMachineCount() / stateMachineName(i) / stateMachineByName(name)
//! artboard.advance(seconds) / draw(renderer)   (renderer from makeRenderer)
//! animation.name, advance(seconds) -> boolean, apply(mix)
//! machine.name, advance(seconds), stateChangedCount(), stateChangedNameByIndex(i)
//! machine.inputCount(), input(i) -> { name, type, value }, setInput(i, value), fireInput(i)
//! machine.pointerDown(x, y) / pointerUp(x, y) / pointerMove(x, y)
//! renderer.clear() / save() / align(layout) / restore() / flush() / resize(w, h)
//! ```
//!
//! Handles exposing `delete()` have it called exactly once, on drop. Missing
//! lookups return `null`/`undefined`. Calls that throw during a frame are
//! logged and skipped; calls that throw while loading become [`SceneError`]s.

use js_sys::{Function, Reflect, Uint8Array};
use serde::Deserialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use vizij_scene::{
    AnimationInstance, Artboard, Bounds, Engine, InputField, InputKind, InputValue, Layout,
    Renderer, SceneError, SceneFile, SceneResult, StateMachineInstance, Surface, SurfaceKind,
};

pub(crate) fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

fn is_nullish(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Owned JS object. Calls `delete()` on drop when the object has one.
struct JsHandle {
    obj: JsValue,
}

impl JsHandle {
    fn new(obj: JsValue) -> Option<Self> {
        if is_nullish(&obj) {
            None
        } else {
            Some(Self { obj })
        }
    }

    fn method(&self, name: &str) -> Result<Function, JsValue> {
        Reflect::get(&self.obj, &JsValue::from_str(name))?
            .dyn_into::<Function>()
            .map_err(|_| JsValue::from_str(&format!("'{name}' is not a function")))
    }

    fn call0(&self, name: &str) -> Result<JsValue, JsValue> {
        self.method(name)?.call0(&self.obj)
    }

    fn call1(&self, name: &str, a: &JsValue) -> Result<JsValue, JsValue> {
        self.method(name)?.call1(&self.obj, a)
    }

    fn call2(&self, name: &str, a: &JsValue, b: &JsValue) -> Result<JsValue, JsValue> {
        self.method(name)?.call2(&self.obj, a, b)
    }

    fn call3(&self, name: &str, a: &JsValue, b: &JsValue, c: &JsValue) -> Result<JsValue, JsValue> {
        self.method(name)?.call3(&self.obj, a, b, c)
    }

    /// Fire-and-forget call used on the frame path.
    fn invoke(&self, name: &str, args: &[JsValue]) {
        let res = match args {
            [] => self.call0(name),
            [a] => self.call1(name, a),
            [a, b] => self.call2(name, a, b),
            [a, b, c] => self.call3(name, a, b, c),
            _ => Err(JsValue::from_str("too many arguments")),
        };
        if let Err(e) = res {
            log::warn!("js engine: {name}() failed: {}", describe(&e));
        }
    }

    fn count(&self, name: &str) -> usize {
        self.call0(name)
            .ok()
            .and_then(|v| v.as_f64())
            .map(|n| n.max(0.0) as usize)
            .unwrap_or(0)
    }

    fn string_at(&self, name: &str, index: usize) -> Option<String> {
        self.call1(name, &JsValue::from_f64(index as f64))
            .ok()
            .and_then(|v| v.as_string())
    }

    fn child(&self, name: &str, arg: Option<&str>) -> Option<JsHandle> {
        let res = match arg {
            Some(a) => self.call1(name, &JsValue::from_str(a)),
            None => self.call0(name),
        };
        match res {
            Ok(v) => JsHandle::new(v),
            Err(e) => {
                log::debug!("js engine: {name}({arg:?}) failed: {}", describe(&e));
                None
            }
        }
    }

    fn name(&self) -> String {
        Reflect::get(&self.obj, &JsValue::from_str("name"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    }
}

impl Drop for JsHandle {
    fn drop(&mut self) {
        if self.method("delete").is_ok() {
            self.invoke("delete", &[]);
        }
    }
}

/// [`Engine`] backed by a JS runtime object.
pub struct JsEngine {
    runtime: JsValue,
}

impl JsEngine {
    pub fn new(runtime: JsValue) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &JsValue {
        &self.runtime
    }

    fn call(&self, name: &str, args: &js_sys::Array) -> SceneResult<JsValue> {
        let f = Reflect::get(&self.runtime, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
            .ok_or_else(|| SceneError::Options(format!("runtime has no '{name}' function")))?;
        f.apply(&self.runtime, args)
            .map_err(|e| SceneError::Options(format!("{name}: {}", describe(&e))))
    }
}

impl Engine for JsEngine {
    fn load_scene(&self, bytes: &[u8]) -> SceneResult<Box<dyn SceneFile>> {
        let array = Uint8Array::from(bytes);
        let file = self
            .call("loadScene", &js_sys::Array::of1(&array))
            .map_err(|e| SceneError::scene_parse(e.to_string()))?;
        let handle = JsHandle::new(file)
            .ok_or_else(|| SceneError::scene_parse("loadScene returned nothing"))?;
        Ok(Box::new(JsSceneFile { handle }))
    }

    fn make_renderer(&self, surface: &Surface) -> SceneResult<Box<dyn Renderer>> {
        let args = js_sys::Array::of3(
            &JsValue::from_f64(surface.width() as f64),
            &JsValue::from_f64(surface.height() as f64),
            &JsValue::from_bool(surface.kind() == SurfaceKind::Visible),
        );
        let renderer = self
            .call("makeRenderer", &args)
            .map_err(|e| SceneError::renderer(e.to_string()))?;
        let handle = JsHandle::new(renderer)
            .ok_or_else(|| SceneError::renderer("makeRenderer returned nothing"))?;
        Ok(Box::new(JsRenderer { handle }))
    }
}

struct JsSceneFile {
    handle: JsHandle,
}

impl SceneFile for JsSceneFile {
    fn artboard_count(&self) -> usize {
        self.handle.count("artboardCount")
    }

    fn artboard_name(&self, index: usize) -> Option<String> {
        self.handle.string_at("artboardName", index)
    }

    fn artboard_by_name(&self, name: &str) -> Option<Box<dyn Artboard>> {
        let handle = self.handle.child("artboardByName", Some(name))?;
        Some(Box::new(JsArtboard::new(handle)))
    }

    fn default_artboard(&self) -> Option<Box<dyn Artboard>> {
        let handle = self.handle.child("defaultArtboard", None)?;
        Some(Box::new(JsArtboard::new(handle)))
    }
}

struct JsArtboard {
    handle: JsHandle,
    name: String,
}

impl JsArtboard {
    fn new(handle: JsHandle) -> Self {
        let name = handle.name();
        Self { handle, name }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsBounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Artboard for JsArtboard {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> Bounds {
        match self.handle.call0("bounds").map(swb::from_value::<JsBounds>) {
            Ok(Ok(b)) => Bounds::new(b.min_x, b.min_y, b.max_x, b.max_y),
            Ok(Err(e)) => {
                log::warn!("js engine: bad bounds for '{}': {e}", self.name);
                Bounds::default()
            }
            Err(e) => {
                log::warn!("js engine: bounds() failed: {}", describe(&e));
                Bounds::default()
            }
        }
    }

    fn animation_count(&self) -> usize {
        self.handle.count("animationCount")
    }

    fn animation_name(&self, index: usize) -> Option<String> {
        self.handle.string_at("animationName", index)
    }

    fn state_machine_count(&self) -> usize {
        self.handle.count("stateMachineCount")
    }

    fn state_machine_name(&self, index: usize) -> Option<String> {
        self.handle.string_at("stateMachineName", index)
    }

    fn instantiate_animation(&mut self, name: &str) -> Option<Box<dyn AnimationInstance>> {
        let handle = self.handle.child("animationByName", Some(name))?;
        Some(Box::new(JsAnimation {
            handle,
            name: name.to_string(),
        }))
    }

    fn instantiate_state_machine(&mut self, name: &str) -> Option<Box<dyn StateMachineInstance>> {
        let handle = self.handle.child("stateMachineByName", Some(name))?;
        Some(Box::new(JsStateMachine {
            handle,
            name: name.to_string(),
        }))
    }

    fn advance(&mut self, elapsed: f32) {
        self.handle
            .invoke("advance", &[JsValue::from_f64(elapsed as f64)]);
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) {
        match renderer.as_any().downcast_ref::<JsRenderer>() {
            Some(js) => self.handle.invoke("draw", &[js.handle.obj.clone()]),
            None => log::warn!("js engine: '{}' can only draw into a JS renderer", self.name),
        }
    }
}

struct JsAnimation {
    handle: JsHandle,
    name: String,
}

impl AnimationInstance for JsAnimation {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, elapsed: f32) -> bool {
        match self
            .handle
            .call1("advance", &JsValue::from_f64(elapsed as f64))
        {
            Ok(v) => v.as_bool().unwrap_or(true),
            Err(e) => {
                log::warn!("js engine: advance('{}') failed: {}", self.name, describe(&e));
                false
            }
        }
    }

    fn apply(&mut self, _artboard: &mut dyn Artboard, mix: f32) {
        self.handle.invoke("apply", &[JsValue::from_f64(mix as f64)]);
    }
}

#[derive(Deserialize)]
struct JsInput {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<InputValue>,
}

impl JsInput {
    fn kind(&self) -> Option<InputKind> {
        match self.kind.as_str() {
            "boolean" | "bool" => Some(InputKind::Boolean),
            "number" | "numeric" => Some(InputKind::Numeric),
            "trigger" => Some(InputKind::Trigger),
            _ => None,
        }
    }

    fn field(&self) -> Option<InputField> {
        Some(match self.kind()? {
            InputKind::Boolean => {
                InputField::Boolean(self.value.map(InputValue::as_bool).unwrap_or(false))
            }
            InputKind::Numeric => {
                InputField::Numeric(self.value.map(InputValue::as_number).unwrap_or(0.0))
            }
            InputKind::Trigger => InputField::Trigger,
        })
    }
}

struct JsStateMachine {
    handle: JsHandle,
    name: String,
}

impl JsStateMachine {
    fn read_input(&self, index: usize) -> Option<JsInput> {
        let v = self
            .handle
            .call1("input", &JsValue::from_f64(index as f64))
            .ok()?;
        if is_nullish(&v) {
            return None;
        }
        swb::from_value(v).ok()
    }
}

impl StateMachineInstance for JsStateMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, _artboard: &mut dyn Artboard, elapsed: f32) {
        self.handle
            .invoke("advance", &[JsValue::from_f64(elapsed as f64)]);
    }

    fn changed_states(&self) -> Vec<String> {
        (0..self.handle.count("stateChangedCount"))
            .filter_map(|i| self.handle.string_at("stateChangedNameByIndex", i))
            .collect()
    }

    fn input_count(&self) -> usize {
        self.handle.count("inputCount")
    }

    fn input_name(&self, index: usize) -> Option<String> {
        self.read_input(index).map(|i| i.name)
    }

    fn input(&self, index: usize) -> Option<InputField> {
        self.read_input(index)?.field()
    }

    fn set_input(&mut self, index: usize, value: InputValue) {
        let Some(field) = self.input(index) else {
            return;
        };
        let js = match field {
            InputField::Boolean(_) => JsValue::from_bool(value.as_bool()),
            InputField::Numeric(_) => JsValue::from_f64(value.as_number() as f64),
            InputField::Trigger => return,
        };
        self.handle
            .invoke("setInput", &[JsValue::from_f64(index as f64), js]);
    }

    fn fire_input(&mut self, index: usize) {
        self.handle
            .invoke("fireInput", &[JsValue::from_f64(index as f64)]);
    }

    fn pointer_down(&mut self, x: f32, y: f32) {
        self.handle.invoke(
            "pointerDown",
            &[JsValue::from_f64(x as f64), JsValue::from_f64(y as f64)],
        );
    }

    fn pointer_up(&mut self, x: f32, y: f32) {
        self.handle.invoke(
            "pointerUp",
            &[JsValue::from_f64(x as f64), JsValue::from_f64(y as f64)],
        );
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        self.handle.invoke(
            "pointerMove",
            &[JsValue::from_f64(x as f64), JsValue::from_f64(y as f64)],
        );
    }
}

struct JsRenderer {
    handle: JsHandle,
}

impl Renderer for JsRenderer {
    fn clear(&mut self) {
        self.handle.invoke("clear", &[]);
    }

    fn save(&mut self) {
        self.handle.invoke("save", &[]);
    }

    fn align(&mut self, layout: &Layout) {
        match swb::to_value(layout) {
            Ok(v) => self.handle.invoke("align", &[v]),
            Err(e) => log::warn!("js engine: layout serialization failed: {e}"),
        }
    }

    fn restore(&mut self) {
        self.handle.invoke("restore", &[]);
    }

    fn flush(&mut self) {
        self.handle.invoke("flush", &[]);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.handle.invoke(
            "resize",
            &[JsValue::from_f64(width as f64), JsValue::from_f64(height as f64)],
        );
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
