//! `requestAnimationFrame` frame scheduler.
//!
//! The closure registered with the browser is created once and re-used for
//! every frame. It only holds a weak reference to the scene it drives, so the
//! scene (which owns this scheduler) is never kept alive by a pending frame.
//! The driver cancels any pending frame before the scene drops the scheduler.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use vizij_scene::{FrameHandle, FrameScheduler};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type FrameClosure = Closure<dyn FnMut(f64)>;

pub struct RafScheduler {
    closure: FrameClosure,
}

impl RafScheduler {
    /// `on_frame` receives the rAF `DOMHighResTimeStamp` in milliseconds.
    pub fn new(on_frame: impl FnMut(f64) + 'static) -> Self {
        Self {
            closure: Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>),
        }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let id = request_animation_frame(self.closure.as_ref().unchecked_ref());
        FrameHandle(id as u32)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        cancel_animation_frame(handle.0 as i32);
    }
}

impl std::fmt::Debug for RafScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RafScheduler").finish_non_exhaustive()
    }
}
