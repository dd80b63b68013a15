//! Fit and alignment of artboard content inside a target frame.
//!
//! [`compute_alignment`] is a pure function. The result is used twice per
//! scene: by the renderer to map artboard space into the frame, and by the
//! pointer bridge to map frame coordinates back into artboard space.

use serde::{Deserialize, Serialize};

/// How content bounds are scaled into the target frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Fit {
    /// Fill the frame preserving aspect; may crop.
    Cover,
    /// Fit entirely inside the frame preserving aspect; may letterbox.
    #[default]
    Contain,
    /// Stretch both axes independently.
    Fill,
    FitWidth,
    FitHeight,
    /// Identity scale.
    None,
    /// Contain, but never upscale.
    ScaleDown,
}

/// Placement of scaled content on a 3x3 grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Alignment {
    /// Normalized anchor in [-1, 1] per axis (-1 = left/top, 1 = right/bottom).
    pub fn anchor(self) -> (f32, f32) {
        match self {
            Alignment::TopLeft => (-1.0, -1.0),
            Alignment::TopCenter => (0.0, -1.0),
            Alignment::TopRight => (1.0, -1.0),
            Alignment::CenterLeft => (-1.0, 0.0),
            Alignment::Center => (0.0, 0.0),
            Alignment::CenterRight => (1.0, 0.0),
            Alignment::BottomLeft => (-1.0, 1.0),
            Alignment::BottomCenter => (0.0, 1.0),
            Alignment::BottomRight => (1.0, 1.0),
        }
    }

    pub const ALL: [Alignment; 9] = [
        Alignment::TopLeft,
        Alignment::TopCenter,
        Alignment::TopRight,
        Alignment::CenterLeft,
        Alignment::Center,
        Alignment::CenterRight,
        Alignment::BottomLeft,
        Alignment::BottomCenter,
        Alignment::BottomRight,
    ];
}

impl Fit {
    pub const ALL: [Fit; 7] = [
        Fit::Cover,
        Fit::Contain,
        Fit::Fill,
        Fit::FitWidth,
        Fit::FitHeight,
        Fit::None,
        Fit::ScaleDown,
    ];
}

/// Axis-aligned rectangle given by its min/max corners.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Frame anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn corners(&self) -> [(f32, f32); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }
}

/// Scale + translation mapping artboard space into frame space.
///
/// `frame = scene * scale + translate`, per axis.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aligned {
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for Aligned {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Aligned {
    pub const IDENTITY: Aligned = Aligned {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// Map an artboard-space point into the frame.
    #[inline]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale_x + self.translate_x,
            y * self.scale_y + self.translate_y,
        )
    }

    /// Map a frame-space point back into artboard space.
    #[inline]
    pub fn invert(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.translate_x) / self.scale_x,
            (y - self.translate_y) / self.scale_y,
        )
    }

    /// Affine matrix `[xx, xy, yx, yy, tx, ty]` for renderers.
    pub fn to_affine(&self) -> [f32; 6] {
        [
            self.scale_x,
            0.0,
            0.0,
            self.scale_y,
            self.translate_x,
            self.translate_y,
        ]
    }
}

/// Cached sizing state: the inputs to [`compute_alignment`] and its result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub fit: Fit,
    pub alignment: Alignment,
    pub frame: Bounds,
    pub content: Bounds,
    pub aligned: Aligned,
}

impl Layout {
    /// Size the frame from `max_width`/`max_height` (0 = the content's own
    /// width/height) and compute the alignment for it.
    pub fn compute(
        fit: Fit,
        alignment: Alignment,
        max_width: f32,
        max_height: f32,
        content: Bounds,
    ) -> Self {
        let width = if max_width > 0.0 {
            max_width
        } else {
            content.width()
        };
        let height = if max_height > 0.0 {
            max_height
        } else {
            content.height()
        };
        let frame = Bounds::from_size(width, height);
        Self {
            fit,
            alignment,
            frame,
            content,
            aligned: compute_alignment(fit, alignment, frame, content),
        }
    }
}

fn ratio(frame: f32, content: f32) -> f32 {
    if content <= 0.0 {
        1.0
    } else {
        frame / content
    }
}

/// Compute the transform placing `content` inside `frame` under `fit`/`alignment`.
pub fn compute_alignment(fit: Fit, alignment: Alignment, frame: Bounds, content: Bounds) -> Aligned {
    let content_w = content.width();
    let content_h = content.height();
    let rx = ratio(frame.width(), content_w);
    let ry = ratio(frame.height(), content_h);

    let (scale_x, scale_y) = match fit {
        Fit::Fill => (rx, ry),
        Fit::Contain => {
            let s = rx.min(ry);
            (s, s)
        }
        Fit::Cover => {
            let s = rx.max(ry);
            (s, s)
        }
        Fit::FitWidth => (rx, rx),
        Fit::FitHeight => (ry, ry),
        Fit::None => (1.0, 1.0),
        Fit::ScaleDown => {
            let s = rx.min(ry).min(1.0);
            (s, s)
        }
    };

    let (ax, ay) = alignment.anchor();

    // Anchor point of the content, moved to the origin.
    let content_x = -content.min_x - content_w / 2.0 - ax * content_w / 2.0;
    let content_y = -content.min_y - content_h / 2.0 - ay * content_h / 2.0;

    // Matching anchor point of the frame.
    let frame_x = frame.min_x + frame.width() / 2.0 + ax * frame.width() / 2.0;
    let frame_y = frame.min_y + frame.height() / 2.0 + ay * frame.height() / 2.0;

    Aligned {
        scale_x,
        scale_y,
        translate_x: frame_x + scale_x * content_x,
        translate_y: frame_y + scale_y * content_y,
    }
}
