// camera.rs — orientation / FOV state and the input that drives it

use crate::tasks::{FrameTask, TaskStatus};
use glam::{Mat4, Vec2, Vec3};
use serde::Deserialize;

pub const MIN_FOV: f32 = 10.0;
pub const MAX_FOV: f32 = 75.0;
pub const DEFAULT_FOV: f32 = 75.0;
pub const MIN_LATITUDE: f32 = -85.0;
pub const MAX_LATITUDE: f32 = 85.0;

pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 1100.0;

// one FOV-worth of degrees per 600 px of drag
const DRAG_PIXELS_PER_FOV: f32 = 600.0;
const WHEEL_FOV_PER_DELTA: f32 = 0.05;
const ZOOM_EASE_FACTOR: f32 = 0.05;
const LOOK_TARGET_DISTANCE: f32 = 0.001;
/// FOV differences within this many ulps count as equal.
const FOV_ULPS: f32 = 4.0;

/// Smallest FOV difference worth animating at this magnitude.
fn fov_tolerance(fov: f32) -> f32 {
    fov.abs().max(1.0) * f32::EPSILON * FOV_ULPS
}

/// How drag deltas accumulate into the orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    /// Orientation = orientation at press + (pointer - press position).
    /// Dragging back to the press point restores the original view.
    #[default]
    Anchored,
    /// The anchor moves to every new pointer position, so deltas add up
    /// move by move. Latitude lost to clamping is not recovered.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub longitude: f32,
    pub latitude: f32,
}

impl Orientation {
    pub fn new(longitude: f32, latitude: f32) -> Self {
        Self {
            longitude,
            latitude: latitude.clamp(MIN_LATITUDE, MAX_LATITUDE),
        }
    }

    /// Spherical -> Cartesian, scaled to `distance`.
    pub fn direction(&self, distance: f32) -> Vec3 {
        let phi = (90.0 - self.latitude).to_radians();
        let theta = self.longitude.to_radians();
        Vec3::new(
            distance * phi.sin() * theta.cos(),
            distance * phi.cos(),
            distance * phi.sin() * theta.sin(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    anchor: Vec2,
    anchor_orientation: Orientation,
}

#[derive(Debug, Clone)]
pub struct CameraController {
    orientation: Orientation,
    fov: f32,
    drag: Option<DragState>,
    drag_mode: DragMode,
    sensitivity: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(DragMode::default(), 1.0)
    }
}

impl CameraController {
    pub fn new(drag_mode: DragMode, sensitivity: f32) -> Self {
        Self {
            orientation: Orientation::default(),
            fov: DEFAULT_FOV,
            drag: None,
            drag_mode,
            sensitivity,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        if sensitivity.is_finite() && sensitivity > 0.0 {
            self.sensitivity = sensitivity;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[cfg(test)]
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = Orientation::new(orientation.longitude, orientation.latitude);
    }

    pub fn set_fov(&mut self, fov: f32) {
        if fov.is_finite() {
            self.fov = fov.clamp(MIN_FOV, MAX_FOV);
        }
    }

    pub fn reset(&mut self) {
        self.orientation = Orientation::default();
        self.fov = DEFAULT_FOV;
        self.drag = None;
    }

    pub fn begin_drag(&mut self, pos: Vec2) {
        self.drag = Some(DragState {
            anchor: pos,
            anchor_orientation: self.orientation,
        });
    }

    /// Returns false when no drag is active.
    pub fn drag_to(&mut self, pos: Vec2) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };

        let scale = self.fov / DRAG_PIXELS_PER_FOV * self.sensitivity;
        let lon = drag.anchor_orientation.longitude + (drag.anchor.x - pos.x) * scale;
        let lat = drag.anchor_orientation.latitude + (pos.y - drag.anchor.y) * scale;
        let next = Orientation::new(lon, lat);

        if self.drag_mode == DragMode::Incremental {
            drag.anchor = pos;
            drag.anchor_orientation = next;
        }
        self.orientation = next;
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Browser-style wheel delta: positive zooms out.
    pub fn apply_wheel(&mut self, delta_y: f32) {
        self.set_fov(self.fov + delta_y * WHEEL_FOV_PER_DELTA);
    }

    /// Point a short distance from the origin along the view direction.
    pub fn look_target(&self) -> Vec3 {
        self.orientation.direction(LOOK_TARGET_DISTANCE)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::ZERO, self.look_target(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Eases the FOV toward a target one step away, a fixed fraction of the
/// total distance per tick, then snaps onto the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomAnimation {
    start_fov: f32,
    target_fov: f32,
    direction: ZoomDirection,
}

impl ZoomAnimation {
    /// `None` when the clamped target equals the current FOV.
    pub fn new(current_fov: f32, direction: ZoomDirection, step: f32) -> Option<Self> {
        let target_fov = match direction {
            ZoomDirection::In => current_fov - step,
            ZoomDirection::Out => current_fov + step,
        }
        .clamp(MIN_FOV, MAX_FOV);

        if (target_fov - current_fov).abs() <= fov_tolerance(current_fov) {
            return None;
        }
        Some(Self {
            start_fov: current_fov,
            target_fov,
            direction,
        })
    }

    pub fn target_fov(&self) -> f32 {
        self.target_fov
    }
}

impl FrameTask for ZoomAnimation {
    type Context = CameraController;

    fn tick(&mut self, camera: &mut CameraController) -> TaskStatus {
        let current = camera.fov();
        let next = current + (self.target_fov - self.start_fov) * ZOOM_EASE_FACTOR;
        let passed = match self.direction {
            ZoomDirection::In => next <= self.target_fov,
            ZoomDirection::Out => next >= self.target_fov,
        };
        // a step below f32 resolution would never reach the target
        let stalled = next == current || (self.target_fov - next).abs() <= fov_tolerance(next);
        if passed || stalled {
            camera.set_fov(self.target_fov);
            return TaskStatus::Done;
        }
        camera.set_fov(next);
        TaskStatus::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskSlot;
    use approx::assert_relative_eq;

    #[test]
    fn latitude_is_clamped_on_every_path() {
        let mut cam = CameraController::default();
        cam.set_orientation(Orientation {
            longitude: 10.0,
            latitude: 120.0,
        });
        assert_eq!(cam.orientation().latitude, MAX_LATITUDE);

        cam.begin_drag(Vec2::new(0.0, 0.0));
        cam.drag_to(Vec2::new(0.0, -100_000.0));
        assert_eq!(cam.orientation().latitude, MIN_LATITUDE);
        cam.drag_to(Vec2::new(0.0, 100_000.0));
        assert_eq!(cam.orientation().latitude, MAX_LATITUDE);
    }

    #[test]
    fn fov_is_clamped_for_wheel_input() {
        let mut cam = CameraController::default();
        for delta in [-10_000.0, -3.0, 0.0, 250.0, 10_000.0] {
            cam.apply_wheel(delta);
            assert!((MIN_FOV..=MAX_FOV).contains(&cam.fov()), "fov {}", cam.fov());
        }
        cam.apply_wheel(-10_000.0);
        assert_eq!(cam.fov(), MIN_FOV);
        cam.apply_wheel(-100.0);
        assert_eq!(cam.fov(), MIN_FOV);
    }

    #[test]
    fn wheel_scales_delta() {
        let mut cam = CameraController::default();
        cam.apply_wheel(-100.0);
        assert_relative_eq!(cam.fov(), 70.0);
        cam.apply_wheel(40.0);
        assert_relative_eq!(cam.fov(), 72.0);
    }

    #[test]
    fn anchored_drag_matches_formula() {
        let sensitivity = 1.5;
        let mut cam = CameraController::new(DragMode::Anchored, sensitivity);
        cam.begin_drag(Vec2::new(100.0, 100.0));
        cam.drag_to(Vec2::new(85.0, 100.0));
        cam.drag_to(Vec2::new(70.0, 100.0));

        let expected = (100.0 - 70.0) * 75.0 / 600.0 * sensitivity;
        assert_relative_eq!(cam.orientation().longitude, expected);
        assert_relative_eq!(cam.orientation().latitude, 0.0);
    }

    #[test]
    fn anchored_drag_returns_home_after_clamping() {
        let mut cam = CameraController::new(DragMode::Anchored, 1.0);
        cam.begin_drag(Vec2::new(0.0, 0.0));
        cam.drag_to(Vec2::new(0.0, 2000.0));
        assert_eq!(cam.orientation().latitude, MAX_LATITUDE);
        cam.drag_to(Vec2::new(0.0, 0.0));
        assert_relative_eq!(cam.orientation().latitude, 0.0);
    }

    #[test]
    fn incremental_drag_accumulates_from_previous_move() {
        let mut cam = CameraController::new(DragMode::Incremental, 1.0);
        cam.begin_drag(Vec2::new(100.0, 100.0));
        cam.drag_to(Vec2::new(85.0, 100.0));
        // the second move is measured from (85, 100), not from the press point
        cam.drag_to(Vec2::new(70.0, 100.0));
        assert_relative_eq!(cam.orientation().longitude, 30.0 * 75.0 / 600.0, epsilon = 1e-5);

        // clamped latitude is not recovered when dragging back
        cam.drag_to(Vec2::new(70.0, 2000.0));
        assert_eq!(cam.orientation().latitude, MAX_LATITUDE);
        cam.drag_to(Vec2::new(70.0, 100.0));
        assert!(cam.orientation().latitude < 0.0);
    }

    #[test]
    fn drag_without_press_is_ignored() {
        let mut cam = CameraController::default();
        assert!(!cam.drag_to(Vec2::new(50.0, 50.0)));
        assert_eq!(cam.orientation(), Orientation::default());

        cam.begin_drag(Vec2::new(0.0, 0.0));
        cam.end_drag();
        assert!(!cam.is_dragging());
        assert!(!cam.drag_to(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn look_target_follows_orientation() {
        let mut cam = CameraController::default();
        let t = cam.look_target();
        assert_relative_eq!(t.x, 0.001, epsilon = 1e-9);
        assert_relative_eq!(t.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(t.z, 0.0, epsilon = 1e-9);

        cam.set_orientation(Orientation::new(90.0, 0.0));
        let t = cam.look_target();
        assert_relative_eq!(t.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(t.z, 0.001, epsilon = 1e-9);

        cam.set_orientation(Orientation::new(0.0, 85.0));
        assert!(cam.look_target().y > 0.0009);
    }

    #[test]
    fn zoom_in_converges_exactly_and_stops() {
        let mut cam = CameraController::default();
        let anim = ZoomAnimation::new(cam.fov(), ZoomDirection::In, 1.0).expect("animation");
        assert_eq!(anim.target_fov(), 74.0);

        let mut slot = TaskSlot::default();
        slot.schedule(anim);
        let mut ticks = 0;
        while slot.run(&mut cam) == TaskStatus::Continue {
            ticks += 1;
            assert!(cam.fov() > 74.0 && cam.fov() < 75.0);
            assert!(ticks < 100, "zoom never converged");
        }
        assert_eq!(cam.fov(), 74.0);
        assert!(!slot.is_scheduled());
        assert!(ticks >= 18);
    }

    #[test]
    fn zoom_out_converges() {
        let mut cam = CameraController::default();
        cam.set_fov(40.0);
        let mut anim = ZoomAnimation::new(cam.fov(), ZoomDirection::Out, 5.0).expect("animation");
        while anim.tick(&mut cam) == TaskStatus::Continue {}
        assert_eq!(cam.fov(), 45.0);
    }

    #[test]
    fn zoom_at_limit_schedules_nothing() {
        assert!(ZoomAnimation::new(MAX_FOV, ZoomDirection::Out, 1.0).is_none());
        assert!(ZoomAnimation::new(MIN_FOV, ZoomDirection::In, 1.0).is_none());

        let anim = ZoomAnimation::new(10.5, ZoomDirection::In, 1.0).expect("animation");
        assert_eq!(anim.target_fov(), MIN_FOV);

        // below f32 resolution at this magnitude
        assert!(ZoomAnimation::new(74.999_99, ZoomDirection::Out, 1e-6).is_none());
    }

    #[test]
    fn tiny_zoom_step_still_terminates() {
        let mut cam = CameraController::default();
        cam.apply_wheel(-0.0002);
        assert!(cam.fov() < MAX_FOV);

        // one ulp short of the limit: each eased step rounds away to nothing
        let mut slot = TaskSlot::default();
        slot.schedule(ZoomAnimation {
            start_fov: cam.fov(),
            target_fov: MAX_FOV,
            direction: ZoomDirection::Out,
        });
        let mut ticks = 0;
        while slot.run(&mut cam) == TaskStatus::Continue {
            ticks += 1;
            assert!(ticks < 1_000, "ease stuck at {}", cam.fov());
        }
        assert!(!slot.is_scheduled());
        assert_eq!(cam.fov(), MAX_FOV);

        // a configured step only a few ulps wide also settles
        cam.set_fov(40.0);
        slot.schedule(ZoomAnimation::new(cam.fov(), ZoomDirection::In, 1e-4).expect("animation"));
        let mut ticks = 0;
        while slot.run(&mut cam) == TaskStatus::Continue {
            ticks += 1;
            assert!(ticks < 1_000, "ease stuck at {}", cam.fov());
        }
        assert!(!slot.is_scheduled());
        assert_relative_eq!(cam.fov(), 40.0 - 1e-4, epsilon = 1e-4);
    }

    #[test]
    fn invalid_sensitivity_is_ignored() {
        let mut cam = CameraController::default();
        cam.set_sensitivity(0.0);
        cam.set_sensitivity(f32::NAN);
        assert_eq!(cam.sensitivity(), 1.0);
        cam.set_sensitivity(2.0);
        assert_eq!(cam.sensitivity(), 2.0);
    }
}
