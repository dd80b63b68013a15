//! Process-wide engine handle.
//!
//! The engine runtime is loaded at most once. Its location may be overridden
//! exactly once, and only before the first [`shared_engine`] call has started
//! initialization. Engine objects are not `Send`, so the handle itself is
//! memoized per thread; hosts are single-threaded in practice.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use once_cell::unsync::OnceCell as LocalOnceCell;

use crate::engine::Engine;
use crate::error::{SceneError, SceneResult};

static RUNTIME_LOCATION: OnceCell<String> = OnceCell::new();
static ENGINE_STARTED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static ENGINE: LocalOnceCell<Rc<dyn Engine>> = LocalOnceCell::new();
}

/// Override where the engine runtime is fetched from.
pub fn set_runtime_location(location: impl Into<String>) -> SceneResult<()> {
    let location = location.into();
    if ENGINE_STARTED.load(Ordering::Acquire) {
        return Err(SceneError::RuntimeLocked(format!(
            "engine already initialized; cannot switch to '{location}'"
        )));
    }
    RUNTIME_LOCATION
        .set(location)
        .map_err(|rejected| SceneError::RuntimeLocked(format!("location already set; ignoring '{rejected}'")))
}

pub fn runtime_location() -> Option<&'static str> {
    RUNTIME_LOCATION.get().map(String::as_str)
}

pub fn engine_started() -> bool {
    ENGINE_STARTED.load(Ordering::Acquire)
}

/// Shared engine for this thread, initialized on first use.
///
/// `init` runs at most once per thread and receives the configured runtime
/// location. A failed initialization is not cached, so the next call retries.
pub fn shared_engine<F>(init: F) -> SceneResult<Rc<dyn Engine>>
where
    F: FnOnce(Option<&str>) -> SceneResult<Rc<dyn Engine>>,
{
    ENGINE.with(|cell| {
        cell.get_or_try_init(|| {
            ENGINE_STARTED.store(true, Ordering::Release);
            log::info!("initializing scene engine (runtime: {:?})", runtime_location());
            init(runtime_location())
        })
        .map(Rc::clone)
    })
}
