//! Name -> input field lookup across the active state machines.
//!
//! The registry never owns inputs. Each entry records which machine exposes
//! the input and at which index, so every read and write goes through the
//! live [`StateMachineInstance`]. It must be rebuilt whenever the set of
//! active machines changes; [`InstanceSet`](crate::instances::InstanceSet)
//! does that on every load/unload.

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::engine::{InputField, InputKind, InputValue, StateMachineInstance};

/// Machines keyed by name, in activation order.
pub type StateMachineMap = IndexMap<String, Box<dyn StateMachineInstance>>;

/// Location of one input inside the active machine set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputKey {
    pub machine: String,
    pub index: usize,
    pub kind: InputKind,
}

#[derive(Debug, Default)]
pub struct InputRegistry {
    fields: HashMap<String, InputKey>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every input of every machine. On a name collision the machine
    /// activated last wins.
    pub fn rebuild(&mut self, machines: &StateMachineMap) {
        self.fields.clear();
        for (machine, sm) in machines.iter() {
            for index in 0..sm.input_count() {
                let (Some(name), Some(field)) = (sm.input_name(index), sm.input(index)) else {
                    continue;
                };
                self.fields.insert(
                    name,
                    InputKey {
                        machine: machine.clone(),
                        index,
                        kind: field.kind(),
                    },
                );
            }
        }
        log::trace!("input registry rebuilt with {} fields", self.fields.len());
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn key(&self, name: &str) -> Option<&InputKey> {
        self.fields.get(name)
    }

    /// Registered input names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }

    /// Current value of `name`, or `None` if no active machine exposes it.
    pub fn get(&self, machines: &StateMachineMap, name: &str) -> Option<InputField> {
        let key = self.fields.get(name)?;
        machines.get(&key.machine)?.input(key.index)
    }

    /// Write a boolean/numeric input. Unknown names and triggers are ignored.
    /// Returns whether a write happened.
    pub fn set(&self, machines: &mut StateMachineMap, name: &str, value: InputValue) -> bool {
        let Some(key) = self.fields.get(name) else {
            log::debug!("set_input: unknown input '{name}'");
            return false;
        };
        if key.kind == InputKind::Trigger {
            log::debug!("set_input: '{name}' is a trigger; use fire instead");
            return false;
        }
        match machines.get_mut(&key.machine) {
            Some(sm) => {
                sm.set_input(key.index, value);
                true
            }
            None => false,
        }
    }

    /// Fire a trigger input. Unknown names and non-triggers are ignored.
    /// Returns whether the trigger fired.
    pub fn fire(&self, machines: &mut StateMachineMap, name: &str) -> bool {
        let Some(key) = self.fields.get(name) else {
            log::debug!("fire_trigger: unknown input '{name}'");
            return false;
        };
        if key.kind != InputKind::Trigger {
            return false;
        }
        match machines.get_mut(&key.machine) {
            Some(sm) => {
                sm.fire_input(key.index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Artboard;

    /// Minimal machine exposing a fixed input list.
    struct Inputs {
        name: String,
        inputs: Vec<(String, InputField)>,
    }

    impl Inputs {
        fn boxed(name: &str, inputs: &[(&str, InputField)]) -> Box<dyn StateMachineInstance> {
            Box::new(Inputs {
                name: name.to_string(),
                inputs: inputs
                    .iter()
                    .map(|(n, f)| (n.to_string(), *f))
                    .collect(),
            })
        }
    }

    impl StateMachineInstance for Inputs {
        fn name(&self) -> &str {
            &self.name
        }
        fn advance(&mut self, _artboard: &mut dyn Artboard, _elapsed: f32) {}
        fn changed_states(&self) -> Vec<String> {
            Vec::new()
        }
        fn input_count(&self) -> usize {
            self.inputs.len()
        }
        fn input_name(&self, index: usize) -> Option<String> {
            self.inputs.get(index).map(|(n, _)| n.clone())
        }
        fn input(&self, index: usize) -> Option<InputField> {
            self.inputs.get(index).map(|(_, f)| *f)
        }
        fn set_input(&mut self, index: usize, value: InputValue) {
            if let Some((_, field)) = self.inputs.get_mut(index) {
                match field {
                    InputField::Boolean(b) => *b = value.as_bool(),
                    InputField::Numeric(n) => *n = value.as_number(),
                    InputField::Trigger => {}
                }
            }
        }
        fn fire_input(&mut self, _index: usize) {}
        fn pointer_down(&mut self, _x: f32, _y: f32) {}
        fn pointer_up(&mut self, _x: f32, _y: f32) {}
        fn pointer_move(&mut self, _x: f32, _y: f32) {}
    }

    fn machines() -> StateMachineMap {
        let mut m: StateMachineMap = IndexMap::new();
        m.insert(
            "A".into(),
            Inputs::boxed(
                "A",
                &[
                    ("Active", InputField::Boolean(false)),
                    ("Level", InputField::Numeric(2.0)),
                    ("Shared", InputField::Numeric(1.0)),
                ],
            ),
        );
        m.insert(
            "B".into(),
            Inputs::boxed(
                "B",
                &[
                    ("Jump", InputField::Trigger),
                    ("Shared", InputField::Boolean(true)),
                ],
            ),
        );
        m
    }

    #[test]
    fn rebuild_indexes_every_input_last_writer_wins() {
        let m = machines();
        let mut reg = InputRegistry::new();
        reg.rebuild(&m);
        assert_eq!(reg.names(), vec!["Active", "Jump", "Level", "Shared"]);
        let shared = reg.key("Shared").unwrap();
        assert_eq!(shared.machine, "B");
        assert_eq!(shared.kind, InputKind::Boolean);
        assert_eq!(reg.get(&m, "Shared"), Some(InputField::Boolean(true)));
    }

    #[test]
    fn set_skips_triggers_and_unknown_names() {
        let mut m = machines();
        let mut reg = InputRegistry::new();
        reg.rebuild(&m);

        assert!(reg.set(&mut m, "Active", true.into()));
        assert_eq!(reg.get(&m, "Active"), Some(InputField::Boolean(true)));

        assert!(reg.set(&mut m, "Level", InputValue::Bool(true)));
        assert_eq!(reg.get(&m, "Level"), Some(InputField::Numeric(1.0)));

        assert!(!reg.set(&mut m, "Jump", true.into()));
        assert!(!reg.set(&mut m, "Missing", InputValue::Number(3.0)));
        assert_eq!(reg.get(&m, "Missing"), None);
    }

    #[test]
    fn fire_only_reaches_triggers() {
        let mut m = machines();
        let mut reg = InputRegistry::new();
        reg.rebuild(&m);
        assert!(!reg.fire(&mut m, "Active"));
        assert!(reg.fire(&mut m, "Jump"));
        assert_eq!(reg.get(&m, "Jump"), Some(InputField::Trigger));
    }

    #[test]
    fn stale_entries_resolve_to_none_after_machine_removed() {
        let mut m = machines();
        let mut reg = InputRegistry::new();
        reg.rebuild(&m);
        m.shift_remove("A");
        assert_eq!(reg.get(&m, "Active"), None);
        reg.rebuild(&m);
        assert!(reg.key("Active").is_none());
        assert_eq!(reg.len(), 2);
    }
}
