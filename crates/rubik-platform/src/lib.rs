// SPDX-License-Identifier: CEPL-1.0
//! Window and OS events on `winit`, pumped by the host loop instead of owning it.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use rubik_render::{EventPump, RenderSize, WindowSignal};
use tracing::{debug, info};

pub use winit;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowId},
};

/// Pumps allowed before giving up on the first `resumed`.
const STARTUP_PUMPS: u32 = 200;
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(5);

#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Rubik Rescue".to_owned(),
            width: 1080,
            height: 720,
        }
    }
}

/// Maps a window event onto what the frame loop cares about.
pub fn signal_for(event: &WindowEvent) -> Option<WindowSignal> {
    match event {
        WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(WindowSignal::QuitRequested),
        WindowEvent::Resized(size) => Some(WindowSignal::Resized(RenderSize {
            width: size.width,
            height: size.height,
        })),
        _ => None,
    }
}

struct WindowState {
    cfg: WindowConfig,
    window: Option<Window>,
    create_error: Option<OsError>,
    signals: Vec<WindowSignal>,
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.create_error.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.cfg.title.clone())
            .with_inner_size(LogicalSize::new(self.cfg.width, self.cfg.height))
            .with_resizable(false);
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                info!(
                    "window \"{}\" created ({}x{})",
                    self.cfg.title, size.width, size.height
                );
                self.window = Some(window);
            }
            Err(e) => self.create_error = Some(e),
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }
        if let Some(signal) = signal_for(&event) {
            debug!("{signal:?}");
            self.signals.push(signal);
        }
    }
}

/// The application window plus the event loop that feeds it.
pub struct Platform {
    // Window goes before the loop.
    state: WindowState,
    event_loop: EventLoop<()>,
}

impl Platform {
    pub fn new(cfg: WindowConfig) -> Result<Self> {
        let event_loop: EventLoop<()> = EventLoop::new()?;
        let mut platform = Self {
            state: WindowState {
                cfg,
                window: None,
                create_error: None,
                signals: Vec::new(),
            },
            event_loop,
        };

        for _ in 0..STARTUP_PUMPS {
            let status = platform
                .event_loop
                .pump_app_events(Some(STARTUP_PUMP_TIMEOUT), &mut platform.state);
            if let Some(e) = platform.state.create_error.take() {
                return Err(anyhow!(e).context("create_window"));
            }
            if platform.state.window.is_some() {
                return Ok(platform);
            }
            if let PumpStatus::Exit(code) = status {
                bail!("event loop exited with code {code} before the window was created");
            }
        }
        bail!("window was not created after {STARTUP_PUMPS} event pumps")
    }

    pub fn window(&self) -> Result<&Window> {
        self.state
            .window
            .as_ref()
            .ok_or_else(|| anyhow!("window is gone"))
    }

    /// Current drawable size in physical pixels, never zero.
    pub fn drawable_size(&self) -> Result<RenderSize> {
        let size = self.window()?.inner_size();
        Ok(RenderSize {
            width: size.width.max(1),
            height: size.height.max(1),
        })
    }
}

impl EventPump for Platform {
    fn poll_events(&mut self) -> Vec<WindowSignal> {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        let mut signals = std::mem::take(&mut self.state.signals);
        if let PumpStatus::Exit(code) = status {
            debug!("event loop exited with code {code}");
            signals.push(WindowSignal::QuitRequested);
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn close_maps_to_quit() {
        assert_eq!(
            signal_for(&WindowEvent::CloseRequested),
            Some(WindowSignal::QuitRequested)
        );
        assert_eq!(
            signal_for(&WindowEvent::Destroyed),
            Some(WindowSignal::QuitRequested)
        );
    }

    #[test]
    fn resize_carries_physical_size() {
        let ev = WindowEvent::Resized(PhysicalSize::new(800, 600));
        assert_eq!(
            signal_for(&ev),
            Some(WindowSignal::Resized(RenderSize {
                width: 800,
                height: 600
            }))
        );
    }

    #[test]
    fn other_events_are_ignored() {
        assert_eq!(signal_for(&WindowEvent::Focused(false)), None);
        assert_eq!(signal_for(&WindowEvent::RedrawRequested), None);
    }

    #[test]
    fn default_window_matches_app_defaults() {
        let cfg = WindowConfig::default();
        assert_eq!(cfg.title, "Rubik Rescue");
        assert_eq!((cfg.width, cfg.height), (1080, 720));
    }
}
