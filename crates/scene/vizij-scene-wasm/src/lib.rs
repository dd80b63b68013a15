use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use vizij_scene::{
    shared_engine, Alignment, Asset, Engine, Fit, HostTransform, NameSelection, SceneError,
    SceneHooks, SceneOptions, SceneResult, SceneView,
};

mod js_engine;
mod raf;

pub use js_engine::JsEngine;
pub use raf::RafScheduler;

use js_engine::describe;

thread_local! {
    /// JS runtime object behind the shared engine, handed to `onReady`.
    static RUNTIME: once_cell::unsync::OnceCell<JsValue> = once_cell::unsync::OnceCell::new();
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    swb::to_value(value).map_err(|e| JsError::new(&format!("serialize error: {e}")))
}

fn scene_error(err: SceneError) -> JsError {
    JsError::new(&err.to_string())
}

/// `undefined`, a single name or a list of names.
fn names_from(value: JsValue) -> Result<Vec<String>, JsError> {
    if jsvalue_is_undefined_or_null(&value) {
        return Ok(Vec::new());
    }
    let selection: NameSelection =
        swb::from_value(value).map_err(|e| JsError::new(&format!("names error: {e}")))?;
    Ok(selection.into_names())
}

fn hook(hooks: &JsValue, name: &str) -> Result<Option<Function>, JsError> {
    if jsvalue_is_undefined_or_null(hooks) {
        return Ok(None);
    }
    let value = Reflect::get(hooks, &JsValue::from_str(name))
        .map_err(|e| JsError::new(&format!("hooks error: {}", describe(&e))))?;
    if jsvalue_is_undefined_or_null(&value) {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| JsError::new(&format!("hooks.{name} must be a function")))
}

fn bytes_of(value: &JsValue) -> Option<Vec<u8>> {
    if let Some(array) = value.dyn_ref::<Uint8Array>() {
        return Some(array.to_vec());
    }
    if let Some(buffer) = value.dyn_ref::<js_sys::ArrayBuffer>() {
        return Some(Uint8Array::new(buffer).to_vec());
    }
    None
}

/// Options object -> [`SceneOptions`]. `asset` may be a name, a `Uint8Array`
/// or an `ArrayBuffer`; binary assets bypass serde.
fn parse_options(options: JsValue) -> Result<SceneOptions, JsError> {
    if jsvalue_is_undefined_or_null(&options) {
        return Err(JsError::new("options error: an options object with `asset` is required"));
    }
    let asset = Reflect::get(&options, &JsValue::from_str("asset"))
        .map_err(|e| JsError::new(&format!("options error: {}", describe(&e))))?;
    if let Some(bytes) = bytes_of(&asset) {
        let rest = Object::assign(&Object::new(), options.unchecked_ref::<Object>());
        Reflect::delete_property(&rest, &JsValue::from_str("asset"))
            .map_err(|e| JsError::new(&format!("options error: {}", describe(&e))))?;
        let mut parsed: SceneOptions = swb::from_value(rest.into())
            .map_err(|e| JsError::new(&format!("options error: {e}")))?;
        parsed.asset = Asset::Bytes(bytes);
        return Ok(parsed);
    }
    if asset.as_string().is_none() {
        return Err(JsError::new(
            "options error: `asset` must be a name, Uint8Array or ArrayBuffer",
        ));
    }
    swb::from_value(options).map_err(|e| JsError::new(&format!("options error: {e}")))
}

fn engine_from(factory: &Function) -> Result<Rc<dyn Engine>, JsError> {
    shared_engine(|location| {
        let arg = location.map(JsValue::from_str).unwrap_or(JsValue::UNDEFINED);
        let runtime = factory
            .call1(&JsValue::UNDEFINED, &arg)
            .map_err(|e| SceneError::Options(format!("runtime factory: {}", describe(&e))))?;
        if jsvalue_is_undefined_or_null(&runtime) {
            return Err(SceneError::Options("runtime factory returned nothing".into()));
        }
        RUNTIME.with(|cell| {
            let _ = cell.set(runtime.clone());
        });
        Ok(Rc::new(JsEngine::new(runtime)) as Rc<dyn Engine>)
    })
    .map_err(scene_error)
}

fn scene_hooks(hooks: &JsValue) -> Result<SceneHooks, JsError> {
    let mut out = SceneHooks::default();
    if let Some(f) = hook(hooks, "onStateChange")? {
        out = out.on_state_change(move |states: &[String]| {
            let names: Array = states.iter().map(|s| JsValue::from_str(s)).collect();
            if let Err(e) = f.call1(&JsValue::UNDEFINED, &names) {
                log::warn!("onStateChange threw: {}", describe(&e));
            }
        });
    }
    if let Some(f) = hook(hooks, "onReady")? {
        out = out.on_ready(move |_engine: &Rc<dyn Engine>| {
            let runtime = RUNTIME.with(|cell| cell.get().cloned()).unwrap_or(JsValue::UNDEFINED);
            if let Err(e) = f.call1(&JsValue::UNDEFINED, &runtime) {
                log::warn!("onReady threw: {}", describe(&e));
            }
        });
    }
    Ok(out)
}

type Slot = Rc<RefCell<Option<SceneView>>>;

/// A scene embedded in the page, driven by `requestAnimationFrame`.
///
/// ```js
/// const scene = new VizijScene(() => runtime, { asset: "hero", autoPlay: true },
///   { loadAsset: (name) => bytes[name], onStateChange: (s) => console.log(s) });
/// ```
#[wasm_bindgen]
pub struct VizijScene {
    view: Slot,
}

impl VizijScene {
    fn with_view<R>(&self, f: impl FnOnce(&mut SceneView) -> R) -> Result<R, JsError> {
        let mut slot = self
            .view
            .try_borrow_mut()
            .map_err(|_| JsError::new("scene is busy (called from inside a frame hook)"))?;
        let view = slot
            .as_mut()
            .ok_or_else(|| JsError::new("scene has been destroyed"))?;
        Ok(f(view))
    }
}

#[wasm_bindgen]
impl VizijScene {
    /// `runtime_factory(location)` is called once per page to obtain the JS
    /// animation runtime. `hooks` may provide `loadAsset(name) -> Uint8Array`,
    /// `onStateChange(names)` and `onReady(runtime)`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        runtime_factory: Function,
        options: JsValue,
        hooks: JsValue,
    ) -> Result<VizijScene, JsError> {
        console_error_panic_hook::set_once();

        let options = parse_options(options)?;
        let scene_hooks = scene_hooks(&hooks)?;
        let load_asset = hook(&hooks, "loadAsset")?;
        let engine = engine_from(&runtime_factory)?;

        let mut loader = |name: &str| -> SceneResult<Vec<u8>> {
            let f = load_asset
                .as_ref()
                .ok_or_else(|| SceneError::asset_load(name, "no loadAsset hook"))?;
            let value = f
                .call1(&JsValue::UNDEFINED, &JsValue::from_str(name))
                .map_err(|e| SceneError::asset_load(name, describe(&e)))?;
            bytes_of(&value)
                .ok_or_else(|| SceneError::asset_load(name, "loadAsset must return bytes"))
        };

        let view: Slot = Rc::new(RefCell::new(None));
        let weak: Weak<RefCell<Option<SceneView>>> = Rc::downgrade(&view);
        let scheduler = RafScheduler::new(move |timestamp| {
            let Some(slot) = weak.upgrade() else {
                return;
            };
            let Ok(mut guard) = slot.try_borrow_mut() else {
                log::debug!("frame skipped: scene busy");
                return;
            };
            if let Some(view) = guard.as_mut() {
                view.tick(timestamp);
            }
        });

        let scene = SceneView::new(
            engine,
            options,
            scene_hooks,
            &mut loader,
            Box::new(scheduler),
        )
        .map_err(scene_error)?;
        *view.borrow_mut() = Some(scene);
        Ok(VizijScene { view })
    }

    pub fn enable(&self) -> Result<(), JsError> {
        self.with_view(|v| v.enable())
    }

    pub fn disable(&self) -> Result<(), JsError> {
        self.with_view(|v| v.disable())
    }

    #[wasm_bindgen(js_name = is_running)]
    pub fn is_running(&self) -> Result<bool, JsError> {
        self.with_view(|v| v.is_running())
    }

    /// Step now instead of on the next animation frame. `timestamp_ms` is
    /// on the rAF clock. Only has an effect while the scene is running.
    pub fn tick(&self, timestamp_ms: f64) -> Result<(), JsError> {
        self.with_view(|v| v.advance_to(timestamp_ms))
    }

    pub fn draw(&self) -> Result<(), JsError> {
        self.with_view(|v| v.draw())
    }

    /// Replace the artboard (default one when `name` is omitted). All state
    /// machines and animations are released.
    #[wasm_bindgen(js_name = load_artboard)]
    pub fn load_artboard(&self, name: Option<String>) -> Result<(), JsError> {
        self.with_view(|v| v.load_artboard(name.as_deref()))
    }

    #[wasm_bindgen(js_name = artboard_name)]
    pub fn artboard_name(&self) -> Result<Option<String>, JsError> {
        self.with_view(|v| v.instances().artboard_name().map(str::to_string))
    }

    /// Returns the names that were actually loaded.
    #[wasm_bindgen(js_name = load_state_machine)]
    pub fn load_state_machine(&self, names: JsValue) -> Result<JsValue, JsError> {
        let names = names_from(names)?;
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let loaded = self.with_view(|v| v.load_state_machine(&refs))?;
        to_js(&loaded)
    }

    #[wasm_bindgen(js_name = unload_state_machine)]
    pub fn unload_state_machine(&self, name: &str) -> Result<bool, JsError> {
        self.with_view(|v| v.unload_state_machine(name))
    }

    #[wasm_bindgen(js_name = play_animation)]
    pub fn play_animation(&self, names: JsValue) -> Result<JsValue, JsError> {
        let names = names_from(names)?;
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let played = self.with_view(|v| v.play_animation(&refs))?;
        to_js(&played)
    }

    #[wasm_bindgen(js_name = stop_animation)]
    pub fn stop_animation(&self, name: &str) -> Result<bool, JsError> {
        self.with_view(|v| v.stop_animation(name))
    }

    #[wasm_bindgen(js_name = available_artboards)]
    pub fn available_artboards(&self) -> Result<JsValue, JsError> {
        to_js(&self.with_view(|v| v.available_artboards())?)
    }

    #[wasm_bindgen(js_name = available_state_machines)]
    pub fn available_state_machines(&self) -> Result<JsValue, JsError> {
        to_js(&self.with_view(|v| v.available_state_machines())?)
    }

    #[wasm_bindgen(js_name = available_animations)]
    pub fn available_animations(&self) -> Result<JsValue, JsError> {
        to_js(&self.with_view(|v| v.available_animations())?)
    }

    #[wasm_bindgen(js_name = input_names)]
    pub fn input_names(&self) -> Result<JsValue, JsError> {
        to_js(&self.with_view(|v| v.input_names())?)
    }

    /// `{ type: "boolean" | "numeric" | "trigger", value? }` or `null`.
    #[wasm_bindgen(js_name = input_value)]
    pub fn input_value(&self, name: &str) -> Result<JsValue, JsError> {
        match self.with_view(|v| v.input_value(name))? {
            Some(field) => to_js(&field),
            None => Ok(JsValue::NULL),
        }
    }

    /// Accepts a boolean or a number; the value is coerced to the input's kind.
    #[wasm_bindgen(js_name = set_input_value)]
    pub fn set_input_value(&self, name: &str, value: JsValue) -> Result<bool, JsError> {
        if let Some(b) = value.as_bool() {
            return self.with_view(|v| v.set_input_value(name, b));
        }
        if let Some(n) = value.as_f64() {
            return self.with_view(|v| v.set_input_value(name, n as f32));
        }
        Err(JsError::new("input value must be a boolean or a number"))
    }

    #[wasm_bindgen(js_name = fire_trigger)]
    pub fn fire_trigger(&self, name: &str) -> Result<bool, JsError> {
        self.with_view(|v| v.fire_trigger(name))
    }

    /// Recompute the layout from the current artboard and limits.
    #[wasm_bindgen(js_name = update_size)]
    pub fn update_size(&self) -> Result<(), JsError> {
        self.with_view(|v| v.update_size())
    }

    /// `{ width, height }` of the drawing surface in pixels.
    #[wasm_bindgen(js_name = surface_size)]
    pub fn surface_size(&self) -> Result<JsValue, JsError> {
        #[derive(Serialize)]
        struct Size {
            width: u32,
            height: u32,
        }
        let size = self.with_view(|v| Size {
            width: v.surface().width(),
            height: v.surface().height(),
        })?;
        to_js(&size)
    }

    pub fn fit(&self) -> Result<JsValue, JsError> {
        to_js(&self.with_view(|v| v.fit())?)
    }

    #[wasm_bindgen(js_name = set_fit)]
    pub fn set_fit(&self, fit: JsValue) -> Result<(), JsError> {
        let fit: Fit = swb::from_value(fit).map_err(|e| JsError::new(&format!("fit error: {e}")))?;
        self.with_view(|v| v.set_fit(fit))
    }

    pub fn align(&self) -> Result<JsValue, JsError> {
        to_js(&self.with_view(|v| v.align())?)
    }

    #[wasm_bindgen(js_name = set_align)]
    pub fn set_align(&self, align: JsValue) -> Result<(), JsError> {
        let align: Alignment =
            swb::from_value(align).map_err(|e| JsError::new(&format!("align error: {e}")))?;
        self.with_view(|v| v.set_align(align))
    }

    #[wasm_bindgen(js_name = max_width)]
    pub fn max_width(&self) -> Result<f32, JsError> {
        self.with_view(|v| v.max_width())
    }

    #[wasm_bindgen(js_name = set_max_width)]
    pub fn set_max_width(&self, max_width: f32) -> Result<(), JsError> {
        self.with_view(|v| v.set_max_width(max_width))
    }

    #[wasm_bindgen(js_name = max_height)]
    pub fn max_height(&self) -> Result<f32, JsError> {
        self.with_view(|v| v.max_height())
    }

    #[wasm_bindgen(js_name = set_max_height)]
    pub fn set_max_height(&self, max_height: f32) -> Result<(), JsError> {
        self.with_view(|v| v.set_max_height(max_height))
    }

    /// Host-to-frame affine `[a, b, c, d, e, f]` applied before alignment
    /// when translating pointers. `undefined` clears it.
    #[wasm_bindgen(js_name = set_host_transform)]
    pub fn set_host_transform(&self, matrix: Option<Vec<f32>>) -> Result<(), JsError> {
        let transform = match matrix {
            None => None,
            Some(m) => {
                let m: [f32; 6] = m
                    .try_into()
                    .map_err(|_| JsError::new("host transform must have 6 entries"))?;
                Some(HostTransform(m))
            }
        };
        self.with_view(|v| v.set_host_transform(transform))
    }

    #[wasm_bindgen(js_name = is_interactive)]
    pub fn is_interactive(&self) -> Result<bool, JsError> {
        self.with_view(|v| v.is_interactive())
    }

    #[wasm_bindgen(js_name = pointer_down)]
    pub fn pointer_down(&self, x: f32, y: f32) -> Result<bool, JsError> {
        self.with_view(|v| v.pointer_down(x, y))
    }

    #[wasm_bindgen(js_name = pointer_up)]
    pub fn pointer_up(&self, x: f32, y: f32) -> Result<bool, JsError> {
        self.with_view(|v| v.pointer_up(x, y))
    }

    #[wasm_bindgen(js_name = pointer_move)]
    pub fn pointer_move(&self, x: f32, y: f32) -> Result<bool, JsError> {
        self.with_view(|v| v.pointer_move(x, y))
    }

    /// True once after each draw.
    #[wasm_bindgen(js_name = take_dirty)]
    pub fn take_dirty(&self) -> Result<bool, JsError> {
        self.with_view(|v| v.take_dirty())
    }

    /// Stop the frame loop and release every engine object. Calling it again
    /// is a no-op; other methods fail afterwards.
    pub fn destroy(&self) -> Result<(), JsError> {
        let taken = self
            .view
            .try_borrow_mut()
            .map_err(|_| JsError::new("scene is busy (called from inside a frame hook)"))?
            .take();
        if let Some(mut view) = taken {
            view.destroy();
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = is_destroyed)]
    pub fn is_destroyed(&self) -> bool {
        self.view.try_borrow().map(|v| v.is_none()).unwrap_or(false)
    }
}

/// Where the JS runtime should be fetched from. Must be called before the
/// first scene is created, and only once.
#[wasm_bindgen(js_name = set_runtime_location)]
pub fn set_runtime_location(location: String) -> Result<(), JsError> {
    vizij_scene::set_runtime_location(location).map_err(scene_error)
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
