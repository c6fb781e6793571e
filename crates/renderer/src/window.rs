use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use driver::{BoxedHaptics, ParameterDriver, SurfaceRect, Transition};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::error::EventLoopError;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::compile::load_effect;
use crate::gpu::GpuState;
use crate::runtime::{RenderPolicy, TickScheduler};
use crate::types::RendererConfig;

const WINDOW_TITLE: &str = "Harmonic Shaders";

/// Aggregates GPU state, the parameter driver, and pointer tracking.
pub(crate) struct WindowState {
    // Declared before `window` so the surface is dropped first.
    gpu: GpuState,
    driver: ParameterDriver,
    pointer: PointerState,
    scheduler: TickScheduler,
    captions: bool,
    window: Arc<Window>,
}

impl WindowState {
    pub(crate) fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        haptics: BoxedHaptics,
    ) -> Result<Self> {
        let wrapped = load_effect(&config.effect)?;
        let gpu = GpuState::new(
            window.as_ref(),
            window.inner_size(),
            wrapped,
            config.base_color,
            config.color_space,
            config.vsync,
        )?;

        let mut driver = ParameterDriver::new(config.driver.clone(), haptics, Instant::now())
            .context("invalid driver configuration")?;
        if let RenderPolicy::Still { time } = config.policy {
            driver.freeze_at(f64::from(time));
        }

        let state = Self {
            gpu,
            driver,
            pointer: PointerState::default(),
            scheduler: TickScheduler::new(),
            captions: config.captions,
            window,
        };
        state.refresh_title();
        Ok(state)
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.window.request_redraw();
    }

    pub(crate) fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let size = self.size();
        let bounds = SurfaceRect::from_size(size.width, size.height);
        let params = self.driver.parameters(bounds, Instant::now());
        self.gpu.render(&params)
    }

    /// Runs a tick if one is due and returns the deadline of the next one.
    pub(crate) fn drive(&mut self, now: Instant) -> Option<Instant> {
        if self.scheduler.ready_for_tick(now) {
            let elapsed = self.driver.tick(now);
            let interval = self.driver.tick_interval(now);
            self.scheduler.mark_ticked(now, interval);
            tracing::trace!(elapsed, interval_us = interval.as_micros(), "tick");
            self.window.request_redraw();

            if self.driver.is_frozen() && !self.driver.is_animating(now) {
                debug!("clock frozen and set-point reached; parking ticks");
                self.scheduler.park();
            }
        }
        self.scheduler.next_deadline()
    }

    pub(crate) fn handle_pointer(&mut self, edge: PointerEdge) {
        let now = Instant::now();
        let transition = match edge {
            PointerEdge::Pressed => self.driver.press(now),
            PointerEdge::Released => self.driver.release(now),
            PointerEdge::Unchanged => return,
        };
        if transition == Transition::Ignored {
            return;
        }
        self.refresh_title();
        if self.scheduler.is_parked() {
            debug!(?transition, "waking ticks for set-point animation");
            self.scheduler.wake();
        }
        self.window.request_redraw();
    }

    fn refresh_title(&self) {
        if self.captions {
            self.window
                .set_title(&format!("{WINDOW_TITLE} - {}", self.driver.caption()));
        }
    }
}

/// Runs the interactive window on the calling thread until it is closed.
pub(crate) fn run_window(config: RendererConfig, haptics: BoxedHaptics) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.surface_size;
    let mut builder = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)));
    if config.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = builder
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, haptics)
        .context("failed to initialise window renderer")?;

    info!(
        width = state.size().width,
        height = state.size().height,
        layers = config.driver.layers,
        base_interval_ms = config.driver.base_interval.as_millis(),
        transition_ms = config.driver.transition.as_millis(),
        curve = %config.driver.curve,
        still = config.policy.is_still(),
        "window ready; press and hold anywhere"
    );
    state.window().request_redraw();

    let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::new(RefCell::new(None));
    let loop_failure = Rc::clone(&failure);
    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if is_escape(&event) {
                        elwt.exit();
                    }
                }
                WindowEvent::MouseInput {
                    state: button_state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let edge = state.pointer.mouse_button(button_state);
                    state.handle_pointer(edge);
                }
                WindowEvent::CursorLeft { .. } => {
                    let edge = state.pointer.cursor_left();
                    state.handle_pointer(edge);
                }
                WindowEvent::Touch(Touch { phase, id, .. }) => {
                    let edge = state.pointer.touch(phase, id);
                    state.handle_pointer(edge);
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    if let Err(err) = inner_size_writer.request_inner_size(state.size()) {
                        debug!(error = %err, "failed to keep surface size on scale change");
                    }
                }
                WindowEvent::RedrawRequested => {
                    let Err(err) = state.render_frame() else {
                        return;
                    };
                    match classify_surface_error(&err) {
                        SurfaceRecovery::Reconfigure => {
                            state.gpu.recover_surface();
                            state.window().request_redraw();
                        }
                        SurfaceRecovery::Retry => {
                            warn!("surface error: {err:?}; retrying next frame");
                        }
                        SurfaceRecovery::Fatal => {
                            tracing::error!("surface error: {err:?}; exiting");
                            let mut slot = loop_failure.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(anyhow!("fatal surface error: {err}"));
                            }
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => match state.drive(Instant::now()) {
            Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => {
                tracing::trace!("scheduler: idle (waiting for input)");
                elwt.set_control_flow(ControlFlow::Wait);
            }
        },
        _ => {}
    });

    let fatal = failure.borrow_mut().take();
    loop_outcome(run_result, fatal)
}

/// How the loop reacts to a failed frame acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceRecovery {
    Reconfigure,
    Retry,
    Fatal,
}

fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceRecovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Fatal,
        _ => SurfaceRecovery::Retry,
    }
}

/// A fatal error recorded inside the loop wins over a clean loop exit.
fn loop_outcome(
    run_result: Result<(), EventLoopError>,
    fatal: Option<anyhow::Error>,
) -> Result<()> {
    if let Some(err) = fatal {
        return Err(err);
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

/// Change in the overall "held" state caused by one pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PointerEdge {
    Pressed,
    Released,
    Unchanged,
}

/// Merges the left mouse button and every active touch into one held flag.
///
/// A gesture starts when the first contact goes down and ends when the last
/// one lifts, so a second finger never re-triggers the press.
#[derive(Debug, Default)]
pub(crate) struct PointerState {
    mouse_down: bool,
    touches: HashSet<u64>,
}

impl PointerState {
    pub fn is_held(&self) -> bool {
        self.mouse_down || !self.touches.is_empty()
    }

    pub fn mouse_button(&mut self, state: ElementState) -> PointerEdge {
        self.update(|pointer| pointer.mouse_down = state == ElementState::Pressed)
    }

    /// Leaving the window with the button down ends the press.
    pub fn cursor_left(&mut self) -> PointerEdge {
        self.update(|pointer| pointer.mouse_down = false)
    }

    pub fn touch(&mut self, phase: TouchPhase, id: u64) -> PointerEdge {
        self.update(|pointer| match phase {
            TouchPhase::Started => {
                pointer.touches.insert(id);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                pointer.touches.remove(&id);
            }
            TouchPhase::Moved => {}
        })
    }

    fn update(&mut self, apply: impl FnOnce(&mut Self)) -> PointerEdge {
        let was_held = self.is_held();
        apply(self);
        match (was_held, self.is_held()) {
            (false, true) => PointerEdge::Pressed,
            (true, false) => PointerEdge::Released,
            _ => PointerEdge::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_is_fatal_and_lost_surfaces_reconfigure() {
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::OutOfMemory),
            SurfaceRecovery::Fatal
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Lost),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Outdated),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Timeout),
            SurfaceRecovery::Retry
        );
    }

    #[test]
    fn fatal_error_fails_an_otherwise_clean_exit() {
        let err = loop_outcome(Ok(()), Some(anyhow!("fatal surface error: out of memory")))
            .unwrap_err();
        assert!(err.to_string().contains("out of memory"));
        assert!(loop_outcome(Ok(()), None).is_ok());
        assert!(loop_outcome(Err(EventLoopError::ExitFailure(3)), None).is_err());
    }

    #[test]
    fn mouse_press_and_release_produce_edges() {
        let mut pointer = PointerState::default();
        assert_eq!(
            pointer.mouse_button(ElementState::Pressed),
            PointerEdge::Pressed
        );
        assert!(pointer.is_held());
        assert_eq!(
            pointer.mouse_button(ElementState::Pressed),
            PointerEdge::Unchanged
        );
        assert_eq!(
            pointer.mouse_button(ElementState::Released),
            PointerEdge::Released
        );
        assert!(!pointer.is_held());
    }

    #[test]
    fn release_without_press_is_unchanged() {
        let mut pointer = PointerState::default();
        assert_eq!(
            pointer.mouse_button(ElementState::Released),
            PointerEdge::Unchanged
        );
        assert_eq!(pointer.cursor_left(), PointerEdge::Unchanged);
    }

    #[test]
    fn cursor_leaving_while_pressed_releases() {
        let mut pointer = PointerState::default();
        pointer.mouse_button(ElementState::Pressed);
        assert_eq!(pointer.cursor_left(), PointerEdge::Released);
    }

    #[test]
    fn second_finger_does_not_restart_gesture() {
        let mut pointer = PointerState::default();
        assert_eq!(pointer.touch(TouchPhase::Started, 1), PointerEdge::Pressed);
        assert_eq!(
            pointer.touch(TouchPhase::Started, 2),
            PointerEdge::Unchanged
        );
        assert_eq!(pointer.touch(TouchPhase::Moved, 2), PointerEdge::Unchanged);
        assert_eq!(pointer.touch(TouchPhase::Ended, 1), PointerEdge::Unchanged);
        assert_eq!(
            pointer.touch(TouchPhase::Cancelled, 2),
            PointerEdge::Released
        );
    }

    #[test]
    fn mouse_and_touch_share_one_gesture() {
        let mut pointer = PointerState::default();
        pointer.touch(TouchPhase::Started, 7);
        assert_eq!(
            pointer.mouse_button(ElementState::Pressed),
            PointerEdge::Unchanged
        );
        assert_eq!(
            pointer.mouse_button(ElementState::Released),
            PointerEdge::Unchanged
        );
        assert_eq!(pointer.touch(TouchPhase::Ended, 7), PointerEdge::Released);
    }
}
