use vizij_scene::{
    alignment::{compute_alignment, Alignment, Bounds, Fit},
    pointer::{HostTransform, InputBridge},
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

const EPS: f32 = 1e-3;

fn cases() -> Vec<(Bounds, Bounds)> {
    vec![
        (Bounds::from_size(300.0, 120.0), Bounds::new(-20.0, 10.0, 80.0, 60.0)),
        (Bounds::from_size(64.0, 256.0), Bounds::from_size(100.0, 50.0)),
        (Bounds::new(10.0, 20.0, 110.0, 220.0), Bounds::from_size(400.0, 400.0)),
    ]
}

fn mapped_extent(frame: Bounds, content: Bounds, fit: Fit, align: Alignment) -> (f32, f32, f32, f32) {
    let out = compute_alignment(fit, align, frame, content);
    let pts: Vec<(f32, f32)> = content
        .corners()
        .iter()
        .map(|(x, y)| out.apply(*x, *y))
        .collect();
    let min_x = pts.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
    let max_x = pts.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
    let min_y = pts.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
    let max_y = pts.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);
    (min_x, min_y, max_x, max_y)
}

/// it should keep every content corner inside the frame under Contain/ScaleDown
#[test]
fn contain_and_scale_down_stay_inside_frame() {
    for (frame, content) in cases() {
        for fit in [Fit::Contain, Fit::ScaleDown] {
            for align in Alignment::ALL {
                let (x0, y0, x1, y1) = mapped_extent(frame, content, fit, align);
                assert!(x0 >= frame.min_x - EPS, "{fit:?}/{align:?}: {x0} < {}", frame.min_x);
                assert!(y0 >= frame.min_y - EPS, "{fit:?}/{align:?}: {y0} < {}", frame.min_y);
                assert!(x1 <= frame.max_x + EPS, "{fit:?}/{align:?}: {x1} > {}", frame.max_x);
                assert!(y1 <= frame.max_y + EPS, "{fit:?}/{align:?}: {y1} > {}", frame.max_y);
            }
        }
    }
}

/// it should cover the whole frame under Cover/Fill
#[test]
fn cover_and_fill_cover_frame() {
    for (frame, content) in cases() {
        for fit in [Fit::Cover, Fit::Fill] {
            for align in Alignment::ALL {
                let (x0, y0, x1, y1) = mapped_extent(frame, content, fit, align);
                assert!(x0 <= frame.min_x + EPS, "{fit:?}/{align:?}");
                assert!(y0 <= frame.min_y + EPS, "{fit:?}/{align:?}");
                assert!(x1 >= frame.max_x - EPS, "{fit:?}/{align:?}");
                assert!(y1 >= frame.max_y - EPS, "{fit:?}/{align:?}");
            }
        }
    }
}

#[test]
fn fill_maps_corners_onto_frame_corners() {
    for (frame, content) in cases() {
        let (x0, y0, x1, y1) = mapped_extent(frame, content, Fit::Fill, Alignment::TopLeft);
        approx(x0, frame.min_x, EPS);
        approx(y0, frame.min_y, EPS);
        approx(x1, frame.max_x, EPS);
        approx(y1, frame.max_y, EPS);
    }
}

#[test]
fn none_is_identity_scale_and_fit_axes_match() {
    for (frame, content) in cases() {
        for align in Alignment::ALL {
            let out = compute_alignment(Fit::None, align, frame, content);
            approx(out.scale_x, 1.0, 0.0);
            approx(out.scale_y, 1.0, 0.0);

            let w = compute_alignment(Fit::FitWidth, align, frame, content);
            approx(w.scale_x, frame.width() / content.width(), EPS);
            approx(w.scale_y, w.scale_x, 0.0);

            let h = compute_alignment(Fit::FitHeight, align, frame, content);
            approx(h.scale_y, frame.height() / content.height(), EPS);
            approx(h.scale_x, h.scale_y, 0.0);
        }
    }
}

#[test]
fn fill_center_scenario() {
    let out = compute_alignment(
        Fit::Fill,
        Alignment::Center,
        Bounds::from_size(200.0, 200.0),
        Bounds::from_size(100.0, 50.0),
    );
    approx(out.scale_x, 2.0, EPS);
    approx(out.scale_y, 4.0, EPS);
    approx(out.translate_x, 0.0, EPS);
    approx(out.translate_y, 0.0, EPS);
}

/// it should recover the artboard point from the frame point it was drawn at
#[test]
fn pointer_round_trip_for_every_fit_and_alignment() {
    let bridge = InputBridge::new(true);
    let scene_points = [(0.0, 0.0), (12.5, 33.0), (-20.0, 60.0), (79.0, 10.0)];
    for (frame, content) in cases() {
        for fit in Fit::ALL {
            for align in Alignment::ALL {
                let out = compute_alignment(fit, align, frame, content);
                for (sx, sy) in scene_points {
                    let (fx, fy) = out.apply(sx, sy);
                    let (rx, ry) = bridge.translate(&out, fx, fy).unwrap();
                    approx(rx, sx, 1e-2);
                    approx(ry, sy, 1e-2);
                }
            }
        }
    }
}

#[test]
fn pointer_round_trip_through_host_transform() {
    let mut bridge = InputBridge::new(true);
    // Surface rotated 90 degrees, scaled by 2 and offset in host space.
    let [a, b, c, d, e, f] = [0.0, 2.0, -2.0, 0.0, 40.0, 8.0];
    bridge.set_host_transform(Some(HostTransform([a, b, c, d, e, f])));
    let out = compute_alignment(
        Fit::Contain,
        Alignment::BottomLeft,
        Bounds::from_size(200.0, 100.0),
        Bounds::from_size(50.0, 50.0),
    );
    let (sx, sy) = (10.0, 20.0);
    let (lx, ly) = out.apply(sx, sy);
    let (hx, hy) = (a * lx + c * ly + e, b * lx + d * ly + f);
    let (rx, ry) = bridge.translate(&out, hx, hy).unwrap();
    approx(rx, sx, 1e-3);
    approx(ry, sy, 1e-3);
}
