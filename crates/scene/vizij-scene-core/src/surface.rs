//! Drawing surface the renderer targets and the host samples from.

use serde::{Deserialize, Serialize};

/// Whether the surface is a hidden buffer or an inspectable on-page canvas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
    #[default]
    Offscreen,
    Visible,
}

impl SurfaceKind {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            SurfaceKind::Visible
        } else {
            SurfaceKind::Offscreen
        }
    }
}

/// Pixel size plus a dirty flag raised after every draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    kind: SurfaceKind,
    dirty: bool,
}

impl Surface {
    pub fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Resize to whole pixels. Returns `true` if the size changed.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let w = width.max(0.0).ceil() as u32;
        let h = height.max(0.0).ceil() as u32;
        if w == self.width && h == self.height {
            return false;
        }
        self.width = w;
        self.height = h;
        true
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the dirty flag. Hosts call this once per frame to
    /// decide whether their texture needs re-uploading.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_rounds_up_and_reports_change() {
        let mut s = Surface::new(SurfaceKind::Offscreen);
        assert!(s.resize(99.2, 50.0));
        assert_eq!((s.width(), s.height()), (100, 50));
        assert!(!s.resize(99.9, 50.0));
    }

    #[test]
    fn take_dirty_clears_flag() {
        let mut s = Surface::new(SurfaceKind::from_debug(true));
        assert_eq!(s.kind(), SurfaceKind::Visible);
        assert!(!s.take_dirty());
        s.mark_dirty();
        assert!(s.is_dirty());
        assert!(s.take_dirty());
        assert!(!s.is_dirty());
    }
}
