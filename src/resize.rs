//! Handle-driven crop resizing.
//!
//! Every drag is computed from the crop and pointer position captured at
//! pointer-down, never from the previous move event, so replaying only the
//! latest pointer position gives the same rectangle as replaying them all.

use eframe::egui;

use crate::crop::{CropRect, MIN_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragHandle {
    N,
    S,
    E,
    W,
    NW,
    NE,
    SW,
    SE,
    Move, // drag the body
}

impl DragHandle {
    pub const CORNERS: [DragHandle; 4] = [Self::NW, Self::NE, Self::SW, Self::SE];
    pub const EDGES: [DragHandle; 4] = [Self::N, Self::S, Self::E, Self::W];

    pub fn is_corner(&self) -> bool {
        matches!(self, Self::NW | Self::NE | Self::SW | Self::SE)
    }

    fn moves_west(&self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    fn moves_east(&self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    fn moves_north(&self) -> bool {
        matches!(self, Self::N | Self::NW | Self::NE)
    }

    fn moves_south(&self) -> bool {
        matches!(self, Self::S | Self::SW | Self::SE)
    }

    /// Screen position of this handle on a crop rect already mapped to screen.
    pub fn position(&self, rect: egui::Rect) -> egui::Pos2 {
        match self {
            Self::N => rect.center_top(),
            Self::S => rect.center_bottom(),
            Self::E => rect.right_center(),
            Self::W => rect.left_center(),
            Self::NW => rect.left_top(),
            Self::NE => rect.right_top(),
            Self::SW => rect.left_bottom(),
            Self::SE => rect.right_bottom(),
            Self::Move => rect.center(),
        }
    }

    pub fn cursor(&self) -> egui::CursorIcon {
        match self {
            Self::N | Self::S => egui::CursorIcon::ResizeVertical,
            Self::E | Self::W => egui::CursorIcon::ResizeHorizontal,
            Self::NW | Self::SE => egui::CursorIcon::ResizeNwSe,
            Self::NE | Self::SW => egui::CursorIcon::ResizeNeSw,
            Self::Move => egui::CursorIcon::Move,
        }
    }
}

/// Finds the handle under `pos`. Corners win over edges, edges over the
/// body. Edge handles are not offered while a ratio is locked.
pub fn hit_test(
    pos: egui::Pos2,
    rect: egui::Rect,
    tolerance: f32,
    ratio_locked: bool,
) -> Option<DragHandle> {
    for handle in DragHandle::CORNERS {
        if pos.distance(handle.position(rect)) < tolerance {
            return Some(handle);
        }
    }

    if !ratio_locked {
        let (min, max) = (rect.min, rect.max);
        if (pos.x - min.x).abs() < tolerance && pos.y > min.y && pos.y < max.y {
            return Some(DragHandle::W);
        }
        if (pos.x - max.x).abs() < tolerance && pos.y > min.y && pos.y < max.y {
            return Some(DragHandle::E);
        }
        if (pos.y - min.y).abs() < tolerance && pos.x > min.x && pos.x < max.x {
            return Some(DragHandle::N);
        }
        if (pos.y - max.y).abs() < tolerance && pos.x > min.x && pos.x < max.x {
            return Some(DragHandle::S);
        }
    }

    if rect.contains(pos) {
        return Some(DragHandle::Move);
    }

    None
}

/// Per-gesture state, captured at pointer-down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub handle: DragHandle,
    /// Pointer at pointer-down, in normalized image space.
    pub start_pointer: egui::Pos2,
    pub start_crop: CropRect,
}

impl DragSession {
    pub fn new(handle: DragHandle, start_pointer: egui::Pos2, start_crop: CropRect) -> Self {
        Self {
            handle,
            start_pointer,
            start_crop,
        }
    }

    /// Crop for the pointer now being at `pointer` (normalized).
    pub fn update(&self, pointer: egui::Pos2, ratio: Option<f32>) -> CropRect {
        apply_drag(self.handle, self.start_crop, pointer - self.start_pointer, ratio)
    }
}

/// Applies a normalized drag `delta` to `start` through `handle`.
pub fn apply_drag(
    handle: DragHandle,
    start: CropRect,
    delta: egui::Vec2,
    ratio: Option<f32>,
) -> CropRect {
    let out = match (handle, ratio) {
        (DragHandle::Move, _) => move_by(start, delta),
        (_, Some(ratio)) if ratio.is_finite() && ratio > 0.0 => {
            resize_locked(handle, start, delta, ratio)
        }
        _ => resize_free(handle, start, delta),
    };
    out.clamped()
}

/// Translates without resizing; each axis is clamped on its own.
pub fn move_by(start: CropRect, delta: egui::Vec2) -> CropRect {
    CropRect {
        x: (start.x + delta.x).clamp(0.0, 1.0 - start.w),
        y: (start.y + delta.y).clamp(0.0, 1.0 - start.h),
        ..start
    }
}

/// Each dragged edge moves on its own; the opposite edge stays put.
fn resize_free(handle: DragHandle, start: CropRect, delta: egui::Vec2) -> CropRect {
    let mut out = start;

    if handle.moves_west() {
        let max_left = start.right() - MIN_SIZE;
        out.x = (start.x + delta.x).min(max_left).max(0.0);
        out.w = start.w + (start.x - out.x);
    } else if handle.moves_east() {
        let max_w = 1.0 - start.x;
        out.w = (start.w + delta.x).min(max_w).max(MIN_SIZE);
    }

    if handle.moves_north() {
        let max_top = start.bottom() - MIN_SIZE;
        out.y = (start.y + delta.y).min(max_top).max(0.0);
        out.h = start.h + (start.y - out.y);
    } else if handle.moves_south() {
        let max_h = 1.0 - start.y;
        out.h = (start.h + delta.y).min(max_h).max(MIN_SIZE);
    }

    out
}

/// Ratio-locked corner resize around the opposite corner. Edge handles are
/// a no-op here.
fn resize_locked(handle: DragHandle, start: CropRect, delta: egui::Vec2, ratio: f32) -> CropRect {
    if !handle.is_corner() {
        return start;
    }
    let east = handle.moves_east();
    let south = handle.moves_south();

    // 1. Anchor (Fixed Point) is the opposite corner
    let anchor_x = if east { start.x } else { start.right() };
    let anchor_y = if south { start.y } else { start.bottom() };

    // 2. Width follows the dragged vertical edge
    let mut w = if east {
        start.right() + delta.x - anchor_x
    } else {
        anchor_x - (start.x + delta.x)
    };
    // Both sides must stay above the minimum once the height is derived
    w = w.max(MIN_SIZE.max(MIN_SIZE * ratio));
    let mut h = w / ratio;

    // 3. Height bound first, then width bound. Shrinking one side can push
    // the other out, so both passes are needed.
    let max_h = if south { 1.0 - anchor_y } else { anchor_y };
    if h > max_h {
        h = max_h;
        w = h * ratio;
    }
    let max_w = if east { 1.0 - anchor_x } else { anchor_x };
    if w > max_w {
        w = max_w;
        h = w / ratio;
    }

    // 4. Reconstruct rect from Anchor
    CropRect {
        x: if east { anchor_x } else { anchor_x - w },
        y: if south { anchor_y } else { anchor_y - h },
        w,
        h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [DragHandle; 9] = [
        DragHandle::N,
        DragHandle::S,
        DragHandle::E,
        DragHandle::W,
        DragHandle::NW,
        DragHandle::NE,
        DragHandle::SW,
        DragHandle::SE,
        DragHandle::Move,
    ];

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn move_is_clamped_to_far_edge() {
        let c = apply_drag(DragHandle::Move, CropRect::default(), egui::vec2(0.5, 0.5), None);
        assert!(approx(c.x, 0.2));
        assert!(approx(c.y, 0.2));
        assert_eq!((c.w, c.h), (0.8, 0.8));
    }

    #[test]
    fn move_ignores_ratio() {
        let start = CropRect::new(0.2, 0.2, 0.3, 0.1);
        let c = apply_drag(DragHandle::Move, start, egui::vec2(-1.0, 0.05), Some(3.0));
        assert!(approx(c.x, 0.0));
        assert!(approx(c.y, 0.25));
        assert_eq!((c.w, c.h), (start.w, start.h));
    }

    #[test]
    fn free_west_holds_east_edge() {
        let start = CropRect::default();
        let c = apply_drag(DragHandle::W, start, egui::vec2(-0.3, 0.0), None);
        assert!(approx(c.x, 0.0));
        assert!(approx(c.right(), 0.9));
        let c = apply_drag(DragHandle::W, start, egui::vec2(2.0, 0.0), None);
        assert!(approx(c.w, MIN_SIZE));
        assert!(approx(c.right(), 0.9));
    }

    #[test]
    fn free_east_is_bounded() {
        let c = apply_drag(DragHandle::E, CropRect::default(), egui::vec2(0.5, 0.3), None);
        assert!(approx(c.right(), 1.0));
        assert_eq!(c.y, 0.1);
        assert_eq!(c.h, 0.8);
        let c = apply_drag(DragHandle::E, CropRect::default(), egui::vec2(-5.0, 0.0), None);
        assert!(approx(c.w, MIN_SIZE));
        assert_eq!(c.x, 0.1);
    }

    #[test]
    fn corner_combines_edges() {
        let c = apply_drag(DragHandle::NW, CropRect::default(), egui::vec2(0.1, 0.2), None);
        assert!(approx(c.x, 0.2));
        assert!(approx(c.y, 0.3));
        assert!(approx(c.right(), 0.9));
        assert!(approx(c.bottom(), 0.9));
    }

    #[test]
    fn locked_se_grows_from_nw_anchor() {
        let start = CropRect::new(0.1, 0.1, 0.2, 0.1);
        let c = apply_drag(DragHandle::SE, start, egui::vec2(0.2, 0.0), Some(2.0));
        assert!(approx(c.x, 0.1));
        assert!(approx(c.y, 0.1));
        assert!(approx(c.w, 0.4));
        assert!(approx(c.h, 0.2));
    }

    #[test]
    fn locked_nw_keeps_se_corner() {
        let start = CropRect::new(0.4, 0.4, 0.4, 0.4);
        let c = apply_drag(DragHandle::NW, start, egui::vec2(-0.1, 0.0), Some(1.0));
        assert!(approx(c.right(), 0.8));
        assert!(approx(c.bottom(), 0.8));
        assert!(approx(c.w, 0.5));
        assert!(approx(c.h, 0.5));
    }

    #[test]
    fn locked_two_pass_clamp_converges() {
        // Height binds first (0.55 > 0.4), which re-derives a width of 0.8
        // that then overflows the 0.5 left to the right edge.
        let start = CropRect::new(0.5, 0.6, 0.2, 0.1);
        let c = apply_drag(DragHandle::SE, start, egui::vec2(0.9, 0.0), Some(2.0));
        assert!(approx(c.x, 0.5));
        assert!(approx(c.y, 0.6));
        assert!(approx(c.w, 0.5));
        assert!(approx(c.h, 0.25));
        assert!(c.is_valid());
    }

    #[test]
    fn locked_edge_handles_are_no_ops() {
        let start = CropRect::new(0.2, 0.2, 0.4, 0.2);
        for handle in DragHandle::EDGES {
            let c = apply_drag(handle, start, egui::vec2(0.1, 0.1), Some(2.0));
            assert_eq!(c, start, "{:?}", handle);
        }
    }

    #[test]
    fn locked_min_size_respects_both_sides() {
        let start = CropRect::new(0.3, 0.3, 0.4, 0.1);
        let c = apply_drag(DragHandle::SE, start, egui::vec2(-1.0, -1.0), Some(4.0));
        assert!(c.h >= MIN_SIZE - 1e-6);
        assert!(c.w >= MIN_SIZE - 1e-6);
        assert!(approx(c.aspect(), 4.0));
    }

    #[test]
    fn session_uses_delta_from_start() {
        let session = DragSession::new(DragHandle::SE, egui::pos2(0.9, 0.9), CropRect::default());
        // Intermediate moves do not accumulate.
        let _ = session.update(egui::pos2(0.5, 0.5), None);
        let c = session.update(egui::pos2(0.95, 0.8), None);
        assert!(approx(c.w, 0.85));
        assert!(approx(c.h, 0.7));
    }

    #[test]
    fn hit_test_priorities() {
        let rect = egui::Rect::from_min_max(egui::pos2(100.0, 100.0), egui::pos2(300.0, 200.0));
        assert_eq!(hit_test(egui::pos2(102.0, 101.0), rect, 10.0, false), Some(DragHandle::NW));
        assert_eq!(hit_test(egui::pos2(299.0, 199.0), rect, 10.0, false), Some(DragHandle::SE));
        assert_eq!(hit_test(egui::pos2(200.0, 104.0), rect, 10.0, false), Some(DragHandle::N));
        assert_eq!(hit_test(egui::pos2(296.0, 150.0), rect, 10.0, false), Some(DragHandle::E));
        assert_eq!(hit_test(egui::pos2(296.0, 150.0), rect, 10.0, true), Some(DragHandle::Move));
        assert_eq!(hit_test(egui::pos2(200.0, 150.0), rect, 10.0, false), Some(DragHandle::Move));
        assert_eq!(hit_test(egui::pos2(50.0, 50.0), rect, 10.0, false), None);
    }

    fn any_crop() -> impl Strategy<Value = CropRect> {
        (0.0f32..1.0, 0.0f32..1.0, 0.0f32..1.0, 0.0f32..1.0)
            .prop_map(|(x, y, w, h)| CropRect::new(x, y, w, h))
    }

    fn any_drag() -> impl Strategy<Value = (usize, f32, f32, Option<f32>)> {
        (
            0usize..ALL.len(),
            -2.0f32..2.0,
            -2.0f32..2.0,
            prop::option::of(0.25f32..4.0),
        )
    }

    /// A valid crop that already has the normalized ratio `r`.
    fn ratio_crop() -> impl Strategy<Value = (CropRect, f32)> {
        (0.0f32..0.95, 0.0f32..0.95, 0.05f32..1.0, 0.05f32..1.0, 0.25f32..4.0)
            .prop_map(|(x, y, w, h, r)| (CropRect::new(x, y, w, h).fit_aspect(r), r))
    }

    proptest! {
        #[test]
        fn bounds_hold_for_any_drag_sequence(
            start in any_crop(),
            drags in prop::collection::vec(any_drag(), 1..12),
        ) {
            let mut crop = start;
            for (idx, dx, dy, ratio) in drags {
                crop = apply_drag(ALL[idx], crop, egui::vec2(dx, dy), ratio);
                prop_assert!(crop.is_valid(), "{:?}", crop);
            }
        }

        #[test]
        fn corner_drags_keep_ratio(
            (start, r) in ratio_crop(),
            corner in 0usize..4,
            dx in -1.5f32..1.5,
            dy in -1.5f32..1.5,
        ) {
            prop_assume!(start.is_valid());
            prop_assume!((start.aspect() - r).abs() < 1e-3 * r.max(1.0));
            let c = apply_drag(DragHandle::CORNERS[corner], start, egui::vec2(dx, dy), Some(r));
            prop_assert!(c.is_valid(), "{:?}", c);
            prop_assert!((c.aspect() - r).abs() < 1e-3 * r.max(1.0), "{} vs {}", c.aspect(), r);
        }

        #[test]
        fn se_drag_keeps_nw_anchor(
            (start, r) in ratio_crop(),
            dx in -1.5f32..1.5,
            dy in -1.5f32..1.5,
        ) {
            prop_assume!(start.is_valid());
            let c = apply_drag(DragHandle::SE, start, egui::vec2(dx, dy), Some(r));
            prop_assert!((c.x - start.x).abs() < 1e-5);
            prop_assert!((c.y - start.y).abs() < 1e-5);
        }

        #[test]
        fn move_never_resizes(start in any_crop(), dx in -2.0f32..2.0, dy in -2.0f32..2.0) {
            let c = apply_drag(DragHandle::Move, start, egui::vec2(dx, dy), None);
            prop_assert_eq!((c.w, c.h), (start.w, start.h));
            prop_assert!(c.is_valid());
        }
    }
}
