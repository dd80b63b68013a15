//! Pointer bridge: host pointer events into artboard space.
//!
//! Coordinates arrive in host space. If the host placed the surface under its
//! own affine transform, that transform is undone first; the cached
//! [`Aligned`] result then maps frame coordinates into the artboard. The
//! translated point goes to every active state machine.

use serde::{Deserialize, Serialize};

use crate::alignment::Aligned;
use crate::instances::InstanceSet;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerKind {
    Down,
    Up,
    Move,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self { kind, x, y }
    }
}

/// Surface-to-host affine matrix `[a, b, c, d, e, f]`:
/// `host = (a*x + c*y + e, b*x + d*y + f)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostTransform(pub [f32; 6]);

impl Default for HostTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl HostTransform {
    pub const IDENTITY: HostTransform = HostTransform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Map a host-space point back into surface-local space. `None` when the
    /// matrix is singular.
    pub fn invert(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let [a, b, c, d, e, f] = self.0;
        let det = a * d - b * c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let px = x - e;
        let py = y - f;
        Some(((d * px - c * py) / det, (a * py - b * px) / det))
    }
}

#[derive(Clone, Debug, Default)]
pub struct InputBridge {
    interactive: bool,
    host_transform: Option<HostTransform>,
}

impl InputBridge {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            host_transform: None,
        }
    }

    #[inline]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn host_transform(&self) -> Option<HostTransform> {
        self.host_transform
    }

    pub fn set_host_transform(&mut self, transform: Option<HostTransform>) {
        self.host_transform = transform;
    }

    /// Host point to artboard point. Events that cannot be mapped to a finite
    /// point are dropped.
    pub fn translate(&self, aligned: &Aligned, x: f32, y: f32) -> Option<(f32, f32)> {
        let (fx, fy) = match self.host_transform {
            Some(t) => match t.invert(x, y) {
                Some(p) => p,
                None => {
                    log::warn!("pointer: host transform is singular, dropping event");
                    return None;
                }
            },
            None => (x, y),
        };
        let (sx, sy) = aligned.invert(fx, fy);
        if !sx.is_finite() || !sy.is_finite() {
            log::warn!("pointer: ({x}, {y}) maps outside artboard space, dropping event");
            return None;
        }
        Some((sx, sy))
    }

    /// Forward `event` to every active state machine. Returns whether it was
    /// delivered.
    pub fn dispatch(&self, event: PointerEvent, aligned: &Aligned, instances: &mut InstanceSet) -> bool {
        if !self.interactive {
            return false;
        }
        let Some((x, y)) = self.translate(aligned, event.x, event.y) else {
            return false;
        };
        log::trace!("pointer {:?} at scene ({x}, {y})", event.kind);
        instances.for_each_state_machine(|sm| match event.kind {
            PointerKind::Down => sm.pointer_down(x, y),
            PointerKind::Up => sm.pointer_up(x, y),
            PointerKind::Move => sm.pointer_move(x, y),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{compute_alignment, Alignment, Bounds, Fit};

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-4, "left={a} right={b}");
    }

    #[test]
    fn translate_undoes_alignment() {
        let aligned = compute_alignment(
            Fit::Contain,
            Alignment::Center,
            Bounds::from_size(200.0, 200.0),
            Bounds::from_size(100.0, 50.0),
        );
        let bridge = InputBridge::new(true);
        let (x, y) = bridge.translate(&aligned, 100.0, 100.0).unwrap();
        approx(x, 50.0);
        approx(y, 25.0);
    }

    #[test]
    fn host_transform_is_inverted_first() {
        let mut bridge = InputBridge::new(true);
        // Surface scaled by 2 and moved to (10, 20) in host space.
        bridge.set_host_transform(Some(HostTransform([2.0, 0.0, 0.0, 2.0, 10.0, 20.0])));
        let (x, y) = bridge.translate(&Aligned::IDENTITY, 30.0, 60.0).unwrap();
        approx(x, 10.0);
        approx(y, 20.0);
    }

    #[test]
    fn rotated_host_transform_round_trips() {
        let t = HostTransform([0.0, 1.0, -1.0, 0.0, 5.0, 0.0]);
        let (lx, ly) = t.invert(5.0, 3.0).unwrap();
        approx(lx, 3.0);
        approx(ly, 0.0);
    }

    #[test]
    fn singular_transform_drops_event() {
        let mut bridge = InputBridge::new(true);
        bridge.set_host_transform(Some(HostTransform([0.0, 0.0, 0.0, 0.0, 0.0, 0.0])));
        assert!(bridge.translate(&Aligned::IDENTITY, 1.0, 1.0).is_none());
    }

    #[test]
    fn zero_scale_alignment_drops_event() {
        let bridge = InputBridge::new(true);
        let aligned = Aligned {
            scale_x: 0.0,
            ..Aligned::IDENTITY
        };
        assert!(bridge.translate(&aligned, 4.0, 4.0).is_none());
    }

    #[test]
    fn non_interactive_bridge_delivers_nothing() {
        let bridge = InputBridge::new(false);
        let mut set = InstanceSet::new();
        let ev = PointerEvent::new(PointerKind::Down, 1.0, 1.0);
        assert!(!bridge.dispatch(ev, &Aligned::IDENTITY, &mut set));
    }
}
