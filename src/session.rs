// session.rs — one viewer instance: camera, hotspot lookup and per-frame upkeep

use crate::camera::{CameraController, DragMode, Orientation, ZoomAnimation, ZoomDirection};
use crate::hit_test::{HitResult, PanoramaSphere, PointerHitTester, ViewportRect};
use crate::hotspot::HotspotRegistry;
use crate::mask::{MaskBuffer, MaskSampler};
use crate::tasks::{TaskSlot, TaskStatus};
use glam::{Mat4, Vec2, Vec3};

/// What the renderer needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub view: Mat4,
    pub projection: Mat4,
    pub look_target: Vec3,
    pub orientation: Orientation,
    pub fov: f32,
    /// UV under the pointer, drives the hover highlight.
    pub pointer_uv: Option<Vec2>,
}

/// Drawing backend as seen by the session.
pub trait SceneRenderer {
    fn set_viewport_size(&mut self, width: u32, height: u32);

    /// Where the drawing surface sits in window pixels.
    fn viewport_rect(&self) -> ViewportRect;

    /// Stages camera and pointer state for the next draw.
    fn submit_frame(&mut self, frame: &FrameState);
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub drag_mode: DragMode,
    pub sensitivity: f32,
    pub zoom_step: f32,
    /// False when no mask was configured.
    pub hotspots_enabled: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            drag_mode: DragMode::Anchored,
            sensitivity: 1.0,
            zoom_step: 1.0,
            hotspots_enabled: true,
        }
    }
}

pub struct ViewportSession {
    camera: CameraController,
    zoom: TaskSlot<ZoomAnimation>,
    zoom_step: f32,
    mask: MaskSampler,
    registry: HotspotRegistry,
    hotspots_enabled: bool,
    surface: PanoramaSphere,
    viewport: ViewportRect,
    last_pointer: Option<Vec2>,
    /// Button went down before any pointer position was reported.
    press_pending: bool,
    pointer_uv: Option<Vec2>,
    hit: Option<HitResult>,
}

impl ViewportSession {
    pub fn new(registry: HotspotRegistry, options: SessionOptions, viewport: ViewportRect) -> Self {
        Self {
            camera: CameraController::new(options.drag_mode, options.sensitivity),
            zoom: TaskSlot::default(),
            zoom_step: options.zoom_step,
            mask: MaskSampler::new(),
            registry,
            hotspots_enabled: options.hotspots_enabled,
            surface: PanoramaSphere::default(),
            viewport,
            last_pointer: None,
            press_pending: false,
            pointer_uv: None,
            hit: None,
        }
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn hotspots_enabled(&self) -> bool {
        self.hotspots_enabled
    }

    pub fn mask_loaded(&self) -> bool {
        self.mask.is_loaded()
    }

    #[cfg(test)]
    pub fn viewport(&self) -> ViewportRect {
        self.viewport
    }

    #[cfg(test)]
    pub fn pointer_uv(&self) -> Option<Vec2> {
        self.pointer_uv
    }

    /// Latest hit-test result, `None` until the pointer has been seen.
    pub fn hit(&self) -> Option<&HitResult> {
        self.hit.as_ref()
    }

    pub fn install_mask(&mut self, buffer: MaskBuffer) {
        if !self.hotspots_enabled {
            log::debug!("hotspots disabled, enabling for newly loaded mask");
            self.hotspots_enabled = true;
        }
        self.mask.install(buffer);
    }

    /// `None` is a touch event without a usable touch point; it is ignored.
    pub fn pointer_down(&mut self, pos: Option<Vec2>) {
        let Some(pos) = pos else {
            return;
        };
        self.camera.begin_drag(pos);
    }

    /// A mouse press with no known cursor position, e.g. the click that
    /// focuses the window. The drag is anchored at the next reported position.
    pub fn pointer_down_unplaced(&mut self) {
        self.press_pending = true;
    }

    pub fn pointer_move(&mut self, pos: Option<Vec2>) {
        let Some(pos) = pos else {
            return;
        };
        self.last_pointer = Some(pos);
        if std::mem::take(&mut self.press_pending) {
            self.camera.begin_drag(pos);
        }
        self.camera.drag_to(pos);
        self.refresh_hit();
    }

    pub fn pointer_up(&mut self) {
        self.press_pending = false;
        self.camera.end_drag();
    }

    /// Pointer left the window: stop tracking it so the label disappears.
    pub fn pointer_left(&mut self) {
        self.last_pointer = None;
        self.press_pending = false;
        self.hit = None;
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.camera.apply_wheel(delta_y);
    }

    /// Starts an eased zoom. Returns false when already at the limit.
    pub fn zoom(&mut self, direction: ZoomDirection) -> bool {
        match ZoomAnimation::new(self.camera.fov(), direction, self.zoom_step) {
            Some(anim) => {
                log::debug!("zoom {:?}: {:.1} -> {:.1}", direction, self.camera.fov(), anim.target_fov());
                self.zoom.schedule(anim);
                true
            }
            None => false,
        }
    }

    pub fn has_pending_zoom(&self) -> bool {
        self.zoom.is_scheduled()
    }

    /// One step of the zoom ease. `Done` once there is nothing left to run.
    pub fn tick_zoom(&mut self) -> TaskStatus {
        let status = self.zoom.run(&mut self.camera);
        if status == TaskStatus::Done {
            log::trace!("zoom settled at {:.2}", self.camera.fov());
        }
        status
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.camera.set_sensitivity(sensitivity);
    }

    pub fn reset_view(&mut self) {
        self.zoom.cancel();
        self.camera.reset();
    }

    /// Viewport size only; orientation and FOV are untouched.
    pub fn resize<R: SceneRenderer>(&mut self, renderer: &mut R, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        renderer.set_viewport_size(width, height);
        self.viewport = renderer.viewport_rect();
    }

    /// Render tick: re-aim the camera, re-test the last pointer position so
    /// the label tracks a moving camera, then hand the frame to the renderer.
    pub fn tick_frame<R: SceneRenderer>(&mut self, renderer: &mut R) -> TaskStatus {
        if self.last_pointer.is_some() {
            self.refresh_hit();
        }
        let frame = FrameState {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(self.viewport.aspect()),
            look_target: self.camera.look_target(),
            orientation: self.camera.orientation(),
            fov: self.camera.fov(),
            pointer_uv: self.pointer_uv,
        };
        renderer.submit_frame(&frame);
        TaskStatus::Continue
    }

    fn refresh_hit(&mut self) {
        let Some(pointer) = self.last_pointer else {
            return;
        };
        let tester = PointerHitTester::new(&self.mask, &self.registry);
        let result = tester.hit_test(pointer, &self.viewport, &self.camera, &self.surface);
        // keep the previous highlight when the ray found no UV
        if result.uv.is_some() {
            self.pointer_uv = result.uv;
        }
        self.hit = Some(result);
    }
}
