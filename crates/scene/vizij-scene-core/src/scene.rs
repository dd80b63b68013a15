//! `SceneView`: one embedded scene bound to one drawing surface.
//!
//! Ties together the instance set, the frame driver, the pointer bridge and
//! the cached layout. The host owns the view and forwards two things into it:
//! frame callbacks from its [`FrameScheduler`] (`tick`) and pointer events.

use std::rc::Rc;

use crate::alignment::{Alignment, Fit, Layout};
use crate::config::{Asset, AssetLoader, SceneHooks, SceneOptions, StateChangeHook};
use crate::driver::{FrameDriver, FrameScheduler};
use crate::engine::{Engine, InputField, InputValue, Renderer};
use crate::error::SceneResult;
use crate::instances::InstanceSet;
use crate::pointer::{HostTransform, InputBridge, PointerEvent, PointerKind};
use crate::surface::{Surface, SurfaceKind};

pub struct SceneView {
    engine: Rc<dyn Engine>,
    instances: InstanceSet,
    renderer: Option<Box<dyn Renderer>>,
    scheduler: Box<dyn FrameScheduler>,
    driver: FrameDriver,
    bridge: InputBridge,
    surface: Surface,
    fit: Fit,
    align: Alignment,
    max_width: f32,
    max_height: f32,
    layout: Layout,
    on_state_change: Option<StateChangeHook>,
    destroyed: bool,
}

impl std::fmt::Debug for SceneView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneView")
            .field("instances", &self.instances)
            .field("driver", &self.driver)
            .field("surface", &self.surface)
            .field("layout", &self.layout)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

fn names_of(selection: Option<crate::config::NameSelection>) -> Vec<String> {
    selection.map(|s| s.into_names()).unwrap_or_default()
}

fn as_strs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

impl SceneView {
    /// Load the scene described by `options` and perform the initial setup:
    /// artboard, state machines, animations, sizing, then either start the
    /// frame driver (`autoPlay`) or draw a single frame.
    ///
    /// Asset, parse and renderer failures propagate; missing names do not.
    pub fn new(
        engine: Rc<dyn Engine>,
        options: SceneOptions,
        hooks: SceneHooks,
        loader: &mut dyn AssetLoader,
        scheduler: Box<dyn FrameScheduler>,
    ) -> SceneResult<Self> {
        let SceneOptions {
            asset,
            debug,
            auto_play,
            interactive,
            artboard,
            animation,
            state_machine,
            fit,
            align,
            max_width,
            max_height,
        } = options;

        let bytes = match asset {
            Asset::Named(name) => loader.load(&name)?,
            Asset::Bytes(bytes) => bytes,
        };
        let file = engine.load_scene(&bytes)?;

        let surface = Surface::new(SurfaceKind::from_debug(debug));
        let renderer = engine.make_renderer(&surface)?;

        let mut instances = InstanceSet::new();
        instances.attach_scene(file);

        let SceneHooks {
            on_state_change,
            on_ready,
        } = hooks;

        let mut view = Self {
            engine,
            instances,
            renderer: Some(renderer),
            scheduler,
            driver: FrameDriver::new(),
            bridge: InputBridge::new(interactive),
            surface,
            fit,
            align,
            max_width,
            max_height,
            layout: Layout::default(),
            on_state_change,
            destroyed: false,
        };

        view.instances.load_artboard(artboard.as_deref());
        view.apply_layout();
        let machines = names_of(state_machine);
        view.load_state_machine(&as_strs(&machines));
        let animations = names_of(animation);
        view.play_animation(&as_strs(&animations));

        if auto_play {
            view.enable();
        } else {
            view.draw();
        }

        if let Some(ready) = on_ready {
            ready(&view.engine);
        }
        log::info!(
            "scene ready: artboard={:?} state_machines={:?} animations={:?}",
            view.instances.artboard_name(),
            view.instances.active_state_machines(),
            view.instances.active_animations()
        );
        Ok(view)
    }

    pub fn engine(&self) -> &Rc<dyn Engine> {
        &self.engine
    }

    pub fn instances(&self) -> &InstanceSet {
        &self.instances
    }

    // ---- frame driver ----

    pub fn enable(&mut self) {
        if self.destroyed {
            return;
        }
        self.driver.enable(self.scheduler.as_mut());
    }

    pub fn disable(&mut self) {
        self.driver.disable(self.scheduler.as_mut());
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    /// The scheduled step. `timestamp_ms` is the host clock in milliseconds.
    pub fn tick(&mut self, timestamp_ms: f64) {
        let Some(elapsed) = self.driver.begin_step(timestamp_ms) else {
            log::trace!("tick at {timestamp_ms}ms ignored: driver stopped");
            return;
        };
        if self.renderer.is_some() && self.instances.has_artboard() {
            log::trace!("step: elapsed={elapsed}s");
            let changed = self.instances.advance_state_machines(elapsed);
            if !changed.is_empty() {
                if let Some(hook) = self.on_state_change.as_mut() {
                    hook(&changed);
                }
            }
            self.instances.advance_animations(elapsed);
            self.instances.advance_artboard(elapsed);
            self.draw();
        }
        self.driver.end_step(self.scheduler.as_mut());
    }

    /// Step now at `timestamp_ms` instead of waiting for the scheduler. The
    /// pending frame is replaced, not duplicated.
    pub fn advance_to(&mut self, timestamp_ms: f64) {
        self.driver.cancel_pending(self.scheduler.as_mut());
        self.tick(timestamp_ms);
    }

    /// Render the current state without advancing.
    pub fn draw(&mut self) {
        let Some(renderer) = self.renderer.as_deref_mut() else {
            return;
        };
        if !self.instances.has_artboard() {
            return;
        }
        self.instances.draw(renderer, &self.layout);
        self.surface.mark_dirty();
    }

    // ---- instances ----

    /// Swap the artboard (`None` = the scene's default) and resize for it.
    pub fn load_artboard(&mut self, name: Option<&str>) {
        self.instances.load_artboard(name);
        self.update_size();
    }

    pub fn load_state_machine(&mut self, names: &[&str]) -> Vec<String> {
        self.instances.load_state_machines(names)
    }

    pub fn unload_state_machine(&mut self, name: &str) -> bool {
        self.instances.unload_state_machine(name)
    }

    pub fn play_animation(&mut self, names: &[&str]) -> Vec<String> {
        self.instances.play_animations(names)
    }

    pub fn stop_animation(&mut self, name: &str) -> bool {
        self.instances.stop_animation(name)
    }

    pub fn available_artboards(&self) -> Vec<String> {
        self.instances.artboard_names()
    }

    pub fn available_state_machines(&self) -> Vec<String> {
        self.instances.state_machine_names()
    }

    pub fn available_animations(&self) -> Vec<String> {
        self.instances.animation_names()
    }

    // ---- inputs ----

    pub fn input_value(&self, name: &str) -> Option<InputField> {
        self.instances.input_value(name)
    }

    pub fn set_input_value(&mut self, name: &str, value: impl Into<InputValue>) -> bool {
        self.instances.set_input_value(name, value.into())
    }

    pub fn fire_trigger(&mut self, name: &str) -> bool {
        self.instances.fire_trigger(name)
    }

    pub fn input_names(&self) -> Vec<String> {
        self.instances.input_names()
    }

    // ---- sizing ----

    /// Recompute the layout from the current artboard, fit, alignment and
    /// max size; resize the surface and renderer to the frame. Redraws when
    /// the driver is stopped so the surface reflects the new layout.
    pub fn update_size(&mut self) {
        if self.apply_layout() && !self.driver.is_running() {
            self.draw();
        }
    }

    /// Recompute the layout and resize surface and renderer, without drawing.
    /// Returns `false` when no artboard is loaded.
    fn apply_layout(&mut self) -> bool {
        let Some(content) = self.instances.artboard_bounds() else {
            log::debug!("update_size: no artboard loaded");
            return false;
        };
        self.layout = Layout::compute(self.fit, self.align, self.max_width, self.max_height, content);
        let frame = self.layout.frame;
        if self.surface.resize(frame.width(), frame.height()) {
            if let Some(renderer) = self.renderer.as_deref_mut() {
                renderer.resize(self.surface.width(), self.surface.height());
            }
        }
        true
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn fit(&self) -> Fit {
        self.fit
    }

    pub fn set_fit(&mut self, fit: Fit) {
        self.fit = fit;
        self.update_size();
    }

    pub fn align(&self) -> Alignment {
        self.align
    }

    pub fn set_align(&mut self, align: Alignment) {
        self.align = align;
        self.update_size();
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    pub fn set_max_width(&mut self, max_width: f32) {
        self.max_width = max_width;
        self.update_size();
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn set_max_height(&mut self, max_height: f32) {
        self.max_height = max_height;
        self.update_size();
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Whether a draw happened since the last call.
    pub fn take_dirty(&mut self) -> bool {
        self.surface.take_dirty()
    }

    // ---- pointer ----

    pub fn set_host_transform(&mut self, transform: Option<HostTransform>) {
        self.bridge.set_host_transform(transform);
    }

    pub fn is_interactive(&self) -> bool {
        self.bridge.is_interactive()
    }

    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        self.bridge
            .dispatch(event, &self.layout.aligned, &mut self.instances)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.pointer(PointerEvent::new(PointerKind::Down, x, y))
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.pointer(PointerEvent::new(PointerKind::Up, x, y))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.pointer(PointerEvent::new(PointerKind::Move, x, y))
    }

    // ---- teardown ----

    /// Stop the driver and release everything in dependency order: state
    /// machines, animations, artboard, renderer, scene. Safe to call twice.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.driver.disable(self.scheduler.as_mut());
        self.instances.unload_all();
        self.renderer = None;
        self.instances.detach_scene();
        self.on_state_change = None;
        log::info!("scene destroyed");
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Drop for SceneView {
    fn drop(&mut self) {
        self.destroy();
    }
}
