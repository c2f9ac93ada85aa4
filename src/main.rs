// main.rs — window, event loop and viewer chrome around a ViewportSession

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod assets;
mod camera;
mod config;
mod fonts;
mod hotspot;
mod mask;
mod renderer;
mod session;
mod tasks;

use assets::{AssetKind, AssetLoader, LoadedAsset};
use camera::ZoomDirection;
use clap::Parser;
use config::{Cli, ConfigError, ViewerConfig};
use hit_test::ViewportRect;
use hotspot::HotspotRegistry;
use mask::MaskBuffer;
use renderer::{RenderError, Renderer};
use session::ViewportSession;

use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{CursorIcon, Fullscreen, Window, WindowBuilder},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

#[derive(Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Requests collected from the UI during a frame, applied after it.
#[derive(Debug, Clone, PartialEq)]
enum UiAction {
    OpenPanorama,
    OpenMask,
    Zoom(ZoomDirection),
    ResetView,
    ToggleFullscreen,
    SetSensitivity(f32),
    Exit,
}

struct UiState {
    sensitivity: f32,
    is_fullscreen: bool,
    texture_size: Option<(u32, u32)>,
    mask_size: Option<(u32, u32)>,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("warn,hotspot_panorama={level}")),
    )
    .init();

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), StartupError> {
    let cfg = ViewerConfig::resolve(&cli)?;

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Hotspot Panorama")
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), cfg.label_font.as_deref()))?;
    let registry = HotspotRegistry::new(cfg.hotspots.clone());
    log::info!("{} hotspot(s) configured", registry.len());
    if registry.is_empty() && cfg.mask_path().is_some() {
        log::warn!("a mask is configured but no hotspot labels, nothing will be shown");
    }

    let viewport = ViewportRect::from_size(renderer.size.width as f32, renderer.size.height as f32);
    let mut session = ViewportSession::new(registry, cfg.session_options(), viewport);

    let mut loader = AssetLoader::new();
    match cfg.texture_path() {
        Some(path) => loader.request(AssetKind::Texture, path),
        None => log::warn!("no panorama configured, use File > Open panorama"),
    }
    match cfg.mask_path() {
        Some(path) => loader.request(AssetKind::Mask, path),
        None => log::info!("no mask configured, hotspots disabled"),
    }

    let mut ui = UiState {
        sensitivity: cfg.sensitivity,
        is_fullscreen: false,
        texture_size: None,
        mask_size: None,
    };
    let mut cursor: Option<Vec2> = None;
    let mut touch_id: Option<u64> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        while let Some(asset) = loader.poll() {
            apply_asset(asset, &mut renderer, &mut session, &mut ui);
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);

                // a release over the UI must still end the drag
                if let WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                } = event
                {
                    session.pointer_up();
                    update_cursor_icon(&window, &session);
                }
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(size) => {
                        session.resize(&mut renderer, size.width, size.height);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        session.resize(&mut renderer, new_inner_size.width, new_inner_size.height);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            let action = match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => Some(UiAction::OpenPanorama),
                                Some(VirtualKeyCode::M) => Some(UiAction::OpenMask),
                                Some(VirtualKeyCode::F11) => Some(UiAction::ToggleFullscreen),
                                Some(VirtualKeyCode::R) => Some(UiAction::ResetView),
                                Some(
                                    VirtualKeyCode::Plus
                                    | VirtualKeyCode::Equals
                                    | VirtualKeyCode::NumpadAdd,
                                ) => Some(UiAction::Zoom(ZoomDirection::In)),
                                Some(VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract) => {
                                    Some(UiAction::Zoom(ZoomDirection::Out))
                                }
                                _ => None,
                            };
                            if let Some(action) = action {
                                apply_action(
                                    action,
                                    &window,
                                    &mut session,
                                    &mut loader,
                                    &mut ui,
                                    control_flow,
                                );
                            }
                        }
                    }

                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        match cursor {
                            Some(pos) => session.pointer_down(Some(pos)),
                            None => session.pointer_down_unplaced(),
                        }
                        update_cursor_icon(&window, &session);
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        let was_dragging = session.camera().is_dragging();
                        cursor = Some(pos);
                        session.pointer_move(Some(pos));
                        if session.camera().is_dragging() != was_dragging {
                            update_cursor_icon(&window, &session);
                        }
                    }

                    WindowEvent::CursorLeft { .. } => {
                        cursor = None;
                        session.pointer_left();
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        session.wheel(wheel_delta_y(delta));
                    }

                    WindowEvent::Touch(touch) => match touch.phase {
                        TouchPhase::Started => {
                            if touch_id.is_none() {
                                touch_id = Some(touch.id);
                                session.pointer_down(touch_position(&touch, touch_id));
                            }
                        }
                        TouchPhase::Moved => {
                            session.pointer_move(touch_position(&touch, touch_id));
                        }
                        TouchPhase::Ended | TouchPhase::Cancelled => {
                            if touch_id == Some(touch.id) {
                                touch_id = None;
                                session.pointer_up();
                            }
                        }
                    },

                    WindowEvent::DroppedFile(path) => {
                        change_location(path, &mut loader);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                if session.has_pending_zoom() {
                    session.tick_zoom();
                }
                session.tick_frame(&mut renderer);

                let mut actions = Vec::new();
                let is_loading = loader.is_loading();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &session, &mut ui, is_loading, &window, &mut actions);
                });

                for action in actions {
                    apply_action(action, &window, &mut session, &mut loader, &mut ui, control_flow);
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}

/// Browser convention: positive delta = scroll down = zoom out.
fn update_cursor_icon(window: &Window, session: &ViewportSession) {
    let icon = if session.camera().is_dragging() {
        CursorIcon::Grabbing
    } else {
        CursorIcon::Default
    };
    window.set_cursor_icon(icon);
}

fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    }
}

/// Position of the tracked finger, `None` for other fingers or a location
/// that is not a usable number.
fn touch_position(touch: &Touch, tracked: Option<u64>) -> Option<Vec2> {
    finger_position(touch.id, touch.location, tracked)
}

fn finger_position(id: u64, location: PhysicalPosition<f64>, tracked: Option<u64>) -> Option<Vec2> {
    if tracked != Some(id) {
        return None;
    }
    let pos = Vec2::new(location.x as f32, location.y as f32);
    pos.is_finite().then_some(pos)
}

fn pick_image(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Swaps only the panorama texture; camera and mask stay as they are.
fn change_location(path: PathBuf, loader: &mut AssetLoader) {
    log::debug!("change location -> {}", path.display());
    loader.request(AssetKind::Texture, path);
}

fn apply_asset(
    asset: LoadedAsset,
    renderer: &mut Renderer,
    session: &mut ViewportSession,
    ui: &mut UiState,
) {
    let dims = asset.image.dimensions();
    log::info!("{:?} ready: {} ({}x{})", asset.kind, asset.path.display(), dims.0, dims.1);
    match asset.kind {
        AssetKind::Texture => {
            ui.texture_size = Some(dims);
            renderer.load_panorama(asset.image);
        }
        AssetKind::Mask => {
            ui.mask_size = Some(dims);
            renderer.load_mask(&asset.image);
            session.install_mask(MaskBuffer::from_image(asset.image));
        }
    }
    if let (Some(t), Some(m)) = (ui.texture_size, ui.mask_size) {
        if u64::from(t.0) * u64::from(m.1) != u64::from(t.1) * u64::from(m.0) {
            log::warn!(
                "mask {}x{} and panorama {}x{} differ in aspect, hotspots will be misaligned",
                m.0,
                m.1,
                t.0,
                t.1
            );
        }
    }
}

fn apply_action(
    action: UiAction,
    window: &Window,
    session: &mut ViewportSession,
    loader: &mut AssetLoader,
    ui: &mut UiState,
    control_flow: &mut ControlFlow,
) {
    match action {
        UiAction::OpenPanorama => {
            if let Some(path) = pick_image("Open panorama") {
                change_location(path, loader);
            }
        }
        UiAction::OpenMask => {
            if let Some(path) = pick_image("Open hotspot mask") {
                loader.request(AssetKind::Mask, path);
            }
        }
        UiAction::Zoom(direction) => {
            session.zoom(direction);
        }
        UiAction::ResetView => session.reset_view(),
        UiAction::ToggleFullscreen => {
            ui.is_fullscreen = !ui.is_fullscreen;
            if ui.is_fullscreen {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            } else {
                window.set_fullscreen(None);
            }
        }
        UiAction::SetSensitivity(s) => session.set_sensitivity(s),
        UiAction::Exit => *control_flow = ControlFlow::Exit,
    }
}

fn draw_ui(
    ctx: &egui::Context,
    session: &ViewportSession,
    ui_state: &mut UiState,
    is_loading: bool,
    window: &Window,
    actions: &mut Vec<UiAction>,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open panorama…").clicked() {
                    ui.close_menu();
                    actions.push(UiAction::OpenPanorama);
                }
                if ui.button("Open hotspot mask…").clicked() {
                    ui.close_menu();
                    actions.push(UiAction::OpenMask);
                }
                ui.separator();
                if ui.button("Exit").clicked() {
                    actions.push(UiAction::Exit);
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset view").clicked() {
                    actions.push(UiAction::ResetView);
                    ui.close_menu();
                }
                let fullscreen_label = if ui_state.is_fullscreen {
                    "Exit fullscreen"
                } else {
                    "Fullscreen"
                };
                if ui.button(fullscreen_label).clicked() {
                    actions.push(UiAction::ToggleFullscreen);
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button("Drag sensitivity", |ui| {
                    let slider = egui::Slider::new(&mut ui_state.sensitivity, 0.1..=5.0).text("×");
                    if ui.add(slider).changed() {
                        actions.push(UiAction::SetSensitivity(ui_state.sensitivity));
                    }
                    if ui.button("Reset to 1.0").clicked() {
                        ui_state.sensitivity = 1.0;
                        actions.push(UiAction::SetSensitivity(1.0));
                    }
                });
            });

            ui.separator();
            if ui.button("➕").on_hover_text("Zoom in").clicked() {
                actions.push(UiAction::Zoom(ZoomDirection::In));
            }
            if ui.button("➖").on_hover_text("Zoom out").clicked() {
                actions.push(UiAction::Zoom(ZoomDirection::Out));
            }
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(egui::RichText::new("Loading…").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            let camera = session.camera();
            ui.label(format!("FOV: {:.1}°", camera.fov()));
            ui.label("|");
            ui.label(format!("Lon: {:.1}°", camera.orientation().longitude));
            ui.label("|");
            ui.label(format!("Lat: {:.1}°", camera.orientation().latitude));
            ui.label("|");
            ui.label(format!("Drag: {:.1}×", camera.sensitivity()));
            ui.label("|");

            if !session.hotspots_enabled() {
                ui.label("Hotspots off");
            } else if !session.mask_loaded() {
                ui.label("Mask loading");
            } else {
                let label = session
                    .hit()
                    .filter(|hit| hit.shows_label())
                    .map(|hit| hit.label.as_str())
                    .unwrap_or("—");
                ui.label(format!("Hotspot: {label}"));
            }
        });
    });

    if let Some(hit) = session.hit().filter(|hit| hit.shows_label()) {
        // hit positions are physical pixels, egui works in points
        let ppp = window.scale_factor() as f32;
        let pos = egui::pos2(hit.screen_position.x / ppp, hit.screen_position.y / ppp);
        egui::Area::new("hotspot_label")
            .order(egui::Order::Tooltip)
            .fixed_pos(pos)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(&hit.label);
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_follows_browser_sign() {
        assert_eq!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, 1.0)), -100.0);
        assert_eq!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, -2.0)), 200.0);
        assert_eq!(
            wheel_delta_y(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 30.0))),
            -30.0
        );
    }

    #[test]
    fn only_tracked_finger_moves_camera() {
        let at = PhysicalPosition::new(10.0, 20.0);
        assert_eq!(finger_position(3, at, Some(3)), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(finger_position(4, at, Some(3)), None);
        assert_eq!(finger_position(3, at, None), None);
        assert_eq!(finger_position(3, PhysicalPosition::new(f64::NAN, 20.0), Some(3)), None);
    }
}
