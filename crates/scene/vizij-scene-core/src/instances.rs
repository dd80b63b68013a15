//! Instance set: sole owner of the artboard and everything bound to it.
//!
//! Lifetimes follow the engine's dependency order. Animation and state machine
//! instances are dropped before the artboard they were created from, and a
//! replace (load of an already-active name) drops the old instance before the
//! new one is created, so there is never more than one live instance per name.

use indexmap::IndexMap;

use crate::alignment::{Bounds, Layout};
use crate::engine::{
    AnimationInstance, Artboard, InputField, InputValue, Renderer, SceneFile,
    StateMachineInstance,
};
use crate::registry::{InputRegistry, StateMachineMap};

#[derive(Default)]
pub struct InstanceSet {
    file: Option<Box<dyn SceneFile>>,
    artboard: Option<Box<dyn Artboard>>,
    animations: IndexMap<String, Box<dyn AnimationInstance>>,
    state_machines: StateMachineMap,
    registry: InputRegistry,
}

impl std::fmt::Debug for InstanceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceSet")
            .field("scene", &self.file.is_some())
            .field("artboard", &self.artboard.as_ref().map(|a| a.name().to_string()))
            .field("animations", &self.animations.keys().collect::<Vec<_>>())
            .field("state_machines", &self.state_machines.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the parsed scene. Anything loaded from a previous scene is
    /// released first.
    pub fn attach_scene(&mut self, file: Box<dyn SceneFile>) {
        self.unload_all();
        self.file = Some(file);
    }

    /// Release the scene description. Call after [`unload_all`](Self::unload_all).
    pub fn detach_scene(&mut self) -> Option<Box<dyn SceneFile>> {
        self.unload_all();
        self.file.take()
    }

    #[inline]
    pub fn has_scene(&self) -> bool {
        self.file.is_some()
    }

    #[inline]
    pub fn has_artboard(&self) -> bool {
        self.artboard.is_some()
    }

    pub fn artboard_name(&self) -> Option<&str> {
        self.artboard.as_deref().map(|a| a.name())
    }

    pub fn artboard_bounds(&self) -> Option<Bounds> {
        self.artboard.as_deref().map(|a| a.bounds())
    }

    /// Tear everything down in dependency order: state machines, animations,
    /// then the artboard.
    pub fn unload_all(&mut self) {
        self.state_machines.clear();
        self.registry.clear();
        self.animations.clear();
        self.artboard = None;
    }

    /// Replace the artboard with `name`, or the scene's default artboard.
    ///
    /// The current artboard and every instance bound to it are released even
    /// when the new artboard cannot be found. Returns whether an artboard is
    /// installed afterwards.
    pub fn load_artboard(&mut self, name: Option<&str>) -> bool {
        self.unload_all();
        let Some(file) = self.file.as_deref() else {
            log::debug!("load_artboard: no scene loaded");
            return false;
        };
        self.artboard = match name {
            Some(name) => file.artboard_by_name(name),
            None => file.default_artboard(),
        };
        if self.artboard.is_none() {
            log::debug!("load_artboard: artboard {name:?} not found");
        }
        self.artboard.is_some()
    }

    /// Activate state machines by name; an empty list picks the artboard's
    /// first state machine. Returns the names that were instantiated.
    pub fn load_state_machines(&mut self, names: &[&str]) -> Vec<String> {
        let Some(artboard) = self.artboard.as_deref_mut() else {
            log::debug!("load_state_machines: no artboard loaded");
            return Vec::new();
        };
        let resolved: Vec<String> = if names.is_empty() {
            artboard.state_machine_name(0).into_iter().collect()
        } else {
            names.iter().map(|n| n.to_string()).collect()
        };

        let mut loaded = Vec::with_capacity(resolved.len());
        for name in resolved {
            // Release before instantiating the replacement.
            self.state_machines.shift_remove(&name);
            match artboard.instantiate_state_machine(&name) {
                Some(sm) => {
                    self.state_machines.insert(name.clone(), sm);
                    loaded.push(name);
                }
                None => log::debug!("load_state_machines: '{name}' not found"),
            }
        }
        self.registry.rebuild(&self.state_machines);
        loaded
    }

    /// Release the named state machine. Returns whether one was active.
    pub fn unload_state_machine(&mut self, name: &str) -> bool {
        if self.state_machines.shift_remove(name).is_none() {
            return false;
        }
        self.registry.rebuild(&self.state_machines);
        true
    }

    /// Start timeline animations by name. An empty list picks the artboard's
    /// first animation, unless a state machine is driving the artboard.
    /// Returns the names that were instantiated.
    pub fn play_animations(&mut self, names: &[&str]) -> Vec<String> {
        let Some(artboard) = self.artboard.as_deref_mut() else {
            log::debug!("play_animations: no artboard loaded");
            return Vec::new();
        };
        let resolved: Vec<String> = if names.is_empty() {
            if !self.state_machines.is_empty() {
                return Vec::new();
            }
            artboard.animation_name(0).into_iter().collect()
        } else {
            names.iter().map(|n| n.to_string()).collect()
        };

        let mut started = Vec::with_capacity(resolved.len());
        for name in resolved {
            self.animations.shift_remove(&name);
            match artboard.instantiate_animation(&name) {
                Some(anim) => {
                    self.animations.insert(name.clone(), anim);
                    started.push(name);
                }
                None => log::debug!("play_animations: '{name}' not found"),
            }
        }
        started
    }

    /// Release the named animation. Returns whether one was active.
    pub fn stop_animation(&mut self, name: &str) -> bool {
        self.animations.shift_remove(name).is_some()
    }

    pub fn artboard_names(&self) -> Vec<String> {
        let Some(file) = self.file.as_deref() else {
            return Vec::new();
        };
        (0..file.artboard_count())
            .filter_map(|i| file.artboard_name(i))
            .collect()
    }

    pub fn state_machine_names(&self) -> Vec<String> {
        let Some(artboard) = self.artboard.as_deref() else {
            return Vec::new();
        };
        (0..artboard.state_machine_count())
            .filter_map(|i| artboard.state_machine_name(i))
            .collect()
    }

    pub fn animation_names(&self) -> Vec<String> {
        let Some(artboard) = self.artboard.as_deref() else {
            return Vec::new();
        };
        (0..artboard.animation_count())
            .filter_map(|i| artboard.animation_name(i))
            .collect()
    }

    pub fn active_animations(&self) -> Vec<String> {
        self.animations.keys().cloned().collect()
    }

    pub fn active_state_machines(&self) -> Vec<String> {
        self.state_machines.keys().cloned().collect()
    }

    /// Advance every state machine and collect the states they entered, in
    /// machine order. Names repeated across machines are kept.
    pub fn advance_state_machines(&mut self, elapsed: f32) -> Vec<String> {
        let Some(artboard) = self.artboard.as_deref_mut() else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        for sm in self.state_machines.values_mut() {
            sm.advance(artboard, elapsed);
            changed.extend(sm.changed_states());
        }
        changed
    }

    /// Advance every animation and apply it onto the artboard at full mix.
    pub fn advance_animations(&mut self, elapsed: f32) {
        let Some(artboard) = self.artboard.as_deref_mut() else {
            return;
        };
        for anim in self.animations.values_mut() {
            anim.advance(elapsed);
            anim.apply(artboard, 1.0);
        }
    }

    pub fn advance_artboard(&mut self, elapsed: f32) {
        if let Some(artboard) = self.artboard.as_deref_mut() {
            artboard.advance(elapsed);
        }
    }

    /// Draw the artboard through `renderer` under `layout`.
    pub fn draw(&mut self, renderer: &mut dyn Renderer, layout: &Layout) {
        let Some(artboard) = self.artboard.as_deref_mut() else {
            return;
        };
        renderer.clear();
        renderer.save();
        renderer.align(layout);
        artboard.draw(renderer);
        renderer.restore();
        renderer.flush();
    }

    pub fn input_value(&self, name: &str) -> Option<InputField> {
        self.registry.get(&self.state_machines, name)
    }

    pub fn set_input_value(&mut self, name: &str, value: InputValue) -> bool {
        self.registry.set(&mut self.state_machines, name, value)
    }

    pub fn fire_trigger(&mut self, name: &str) -> bool {
        self.registry.fire(&mut self.state_machines, name)
    }

    pub fn input_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Visit every active state machine in activation order.
    pub fn for_each_state_machine(
        &mut self,
        mut f: impl FnMut(&mut dyn StateMachineInstance),
    ) {
        for sm in self.state_machines.values_mut() {
            f(sm.as_mut());
        }
    }
}

impl Drop for InstanceSet {
    fn drop(&mut self) {
        self.unload_all();
        self.file = None;
    }
}
