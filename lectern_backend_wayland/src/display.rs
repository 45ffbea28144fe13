// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Display`] implementation: one `xdg_toplevel` window presented from
//! a shared-memory buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lectern_core::canvas::Canvas;
use lectern_core::display::{Display, Wake};
use lectern_core::event::Event;
use lectern_core::time::{Duration, HostTime};
use signal_hook::consts::SIGHUP;
use wayland_client::globals::registry_queue_init;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_data_device::WlDataDevice;
use wayland_client::protocol::wl_data_device_manager::WlDataDeviceManager;
use wayland_client::protocol::wl_output::WlOutput;
use wayland_client::protocol::wl_seat::WlSeat;
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, QueueHandle};
use wayland_protocols::xdg::shell::client::xdg_surface::XdgSurface;
use wayland_protocols::xdg::shell::client::xdg_toplevel::XdgToplevel;
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;

use crate::clipboard::TEXT_MIME_TYPE;
use crate::error::BackendError;
use crate::event_loop::{OwnedQueueMode, WaylandState};
use crate::shm::ShmBuffer;

/// Application id announced to the compositor.
const APP_ID: &str = "lectern";

/// A Wayland connection owning a single toplevel window.
///
/// Created with [`WaylandDisplay::connect`]. The window has no buffer until
/// the run loop calls [`Display::resize_surface`]; `SIGHUP` is turned into
/// [`Event::Reload`].
#[derive(Debug)]
pub struct WaylandDisplay {
    queue: OwnedQueueMode,
    qh: QueueHandle<WaylandState>,
    shm: WlShm,
    surface: WlSurface,
    xdg_surface: XdgSurface,
    toplevel: XdgToplevel,
    data_device_manager: Option<WlDataDeviceManager>,
    data_device: Option<WlDataDevice>,
    buffer: Option<ShmBuffer>,
    reload: Arc<AtomicBool>,
    _connection: Connection,
    _wm_base: XdgWmBase,
    _seat: WlSeat,
    _output: WlOutput,
}

impl WaylandDisplay {
    /// Connects to the compositor named by `WAYLAND_DISPLAY`, creates a
    /// toplevel titled `title`, and waits for its first configure.
    ///
    /// # Errors
    ///
    /// Fails when no compositor is reachable, a required global
    /// (`wl_compositor`, `wl_shm`, `xdg_wm_base`, `wl_seat`, `wl_output`) is
    /// missing, or the `SIGHUP` handler cannot be installed. Clipboard
    /// support is optional.
    pub fn connect(title: &str) -> Result<Self, BackendError> {
        let connection = Connection::connect_to_env()?;
        let (globals, event_queue) = registry_queue_init::<WaylandState>(&connection)?;
        let qh = event_queue.handle();

        let compositor: WlCompositor = globals
            .bind(&qh, 1..=4, ())
            .map_err(|_| BackendError::MissingGlobal("wl_compositor"))?;
        let shm: WlShm = globals
            .bind(&qh, 1..=1, ())
            .map_err(|_| BackendError::MissingGlobal("wl_shm"))?;
        let wm_base: XdgWmBase = globals
            .bind(&qh, 1..=2, ())
            .map_err(|_| BackendError::MissingGlobal("xdg_wm_base"))?;
        let seat: WlSeat = globals
            .bind(&qh, 1..=5, ())
            .map_err(|_| BackendError::MissingGlobal("wl_seat"))?;
        let output: WlOutput = globals
            .bind(&qh, 1..=3, ())
            .map_err(|_| BackendError::MissingGlobal("wl_output"))?;
        let data_device_manager: Option<WlDataDeviceManager> = globals.bind(&qh, 1..=3, ()).ok();
        if data_device_manager.is_none() {
            log::info!("compositor has no wl_data_device_manager; copying is disabled");
        }
        let data_device = data_device_manager
            .as_ref()
            .map(|manager| manager.get_data_device(&seat, &qh, ()));

        let surface = compositor.create_surface(&qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
        let toplevel = xdg_surface.get_toplevel(&qh, ());
        toplevel.set_title(title.to_owned());
        toplevel.set_app_id(APP_ID.to_owned());
        surface.commit();

        let mut queue = OwnedQueueMode::new(event_queue, WaylandState::new());
        queue.roundtrip()?;
        while !queue.state().configured {
            queue.blocking_dispatch()?;
        }

        let reload = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGHUP, Arc::clone(&reload)).map_err(BackendError::Signal)?;

        log::debug!("connected; output resolution {:?}", queue.state().output.resolution());
        Ok(Self {
            queue,
            qh,
            shm,
            surface,
            xdg_surface,
            toplevel,
            data_device_manager,
            data_device,
            buffer: None,
            reload,
            _connection: connection,
            _wm_base: wm_base,
            _seat: seat,
            _output: output,
        })
    }

    /// Horizontal resolution of the output in dots per inch, clamped to
    /// `36..=1200`, if the compositor reported a physical size.
    #[must_use]
    pub fn resolution(&self) -> Option<u32> {
        self.queue.state().output.resolution()
    }

    fn ensure_buffer(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        if self
            .buffer
            .as_ref()
            .is_none_or(|buffer| buffer.size() != (width, height))
        {
            // Release the old pool before allocating a new one.
            self.buffer = None;
            self.buffer = Some(ShmBuffer::new(&self.shm, &self.qh, width, height)?);
        }
        Ok(())
    }
}

impl Display for WaylandDisplay {
    type Error = BackendError;

    fn now(&self) -> HostTime {
        crate::time::now()
    }

    fn dispatch_pending(&mut self, events: &mut Vec<Event>) -> Result<(), BackendError> {
        self.queue.dispatch_pending()?;
        events.append(&mut self.queue.state_mut().events);
        if self.reload.swap(false, Ordering::Relaxed) {
            log::info!("SIGHUP received; reloading");
            events.push(Event::Reload);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        Ok(self.queue.flush()?)
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<Wake, BackendError> {
        if !self.queue.state().events.is_empty() || self.reload.load(Ordering::Relaxed) {
            return Ok(Wake::Readable);
        }
        self.queue.wait(timeout)
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        self.ensure_buffer(width, height)
    }

    fn submit_frame(&mut self, canvas: &Canvas) -> Result<(), BackendError> {
        let (width, height) = (canvas.width(), canvas.height());
        let too_large = BackendError::BufferTooLarge { width, height };
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(too_large);
        };
        self.ensure_buffer(width, height)?;
        let Some(buffer) = &self.buffer else {
            return Err(too_large);
        };
        buffer.write(canvas.pixels())?;
        self.surface.attach(Some(buffer.buffer()), 0, 0);
        self.surface.damage(0, 0, w, h);
        self.surface.frame(&self.qh, ());
        self.surface.commit();
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), BackendError> {
        self.toplevel.set_title(title.to_owned());
        Ok(())
    }

    fn set_selection(&mut self, text: String) -> Result<(), BackendError> {
        let (Some(manager), Some(device)) = (&self.data_device_manager, &self.data_device) else {
            return Err(BackendError::MissingGlobal("wl_data_device_manager"));
        };
        let source = manager.create_data_source(&self.qh, ());
        source.offer(TEXT_MIME_TYPE.to_owned());
        let state = self.queue.state_mut();
        device.set_selection(Some(&source), state.serial);
        if let Some(previous) = state.source.replace(source) {
            previous.destroy();
        }
        state.selection = Some(text);
        Ok(())
    }

    fn set_fullscreen(&mut self) -> Result<(), BackendError> {
        self.toplevel.set_fullscreen(None);
        Ok(())
    }
}

impl Drop for WaylandDisplay {
    fn drop(&mut self) {
        self.buffer = None;
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
    }
}
