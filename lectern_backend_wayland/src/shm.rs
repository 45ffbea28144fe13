// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `wl_shm` backing buffer.

use std::fs::File;
use std::os::fd::AsFd;
use std::os::unix::fs::FileExt;

use rustix::fs::{MemfdFlags, memfd_create};
use wayland_client::QueueHandle;
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_shm::{self, WlShm};
use wayland_client::protocol::wl_shm_pool::WlShmPool;

use crate::error::BackendError;
use crate::event_loop::WaylandState;

/// One XRGB8888 buffer backed by an anonymous memory file.
///
/// Pixels are copied in with positioned writes, so no mapping is held on the
/// client side.
#[derive(Debug)]
pub(crate) struct ShmBuffer {
    file: File,
    pool: WlShmPool,
    buffer: WlBuffer,
    width: u32,
    height: u32,
}

impl ShmBuffer {
    pub(crate) fn new(
        shm: &WlShm,
        qh: &QueueHandle<WaylandState>,
        width: u32,
        height: u32,
    ) -> Result<Self, BackendError> {
        let too_large = || BackendError::BufferTooLarge { width, height };
        let stride = width.checked_mul(4).ok_or_else(too_large)?;
        let size = stride.checked_mul(height).ok_or_else(too_large)?;
        let (Ok(w), Ok(h), Ok(stride), Ok(size)) = (
            i32::try_from(width),
            i32::try_from(height),
            i32::try_from(stride),
            i32::try_from(size),
        ) else {
            return Err(too_large());
        };

        let shm_err = |source: std::io::Error| BackendError::Shm {
            width,
            height,
            source,
        };
        let fd = memfd_create("lectern-canvas", MemfdFlags::CLOEXEC)
            .map_err(|errno| shm_err(errno.into()))?;
        let file = File::from(fd);
        file.set_len(u64::from(size.unsigned_abs()))
            .map_err(shm_err)?;

        let pool = shm.create_pool(file.as_fd(), size, qh, ());
        let buffer = pool.create_buffer(0, w, h, stride, wl_shm::Format::Xrgb8888, qh, ());
        log::debug!("allocated {width}x{height} shm buffer ({size} bytes)");
        Ok(Self {
            file,
            pool,
            buffer,
            width,
            height,
        })
    }

    pub(crate) fn buffer(&self) -> &WlBuffer {
        &self.buffer
    }

    pub(crate) const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copies `pixels` to the start of the buffer.
    pub(crate) fn write(&self, pixels: &[u32]) -> Result<(), BackendError> {
        self.file
            .write_all_at(bytemuck::cast_slice(pixels), 0)
            .map_err(|source| BackendError::Shm {
                width: self.width,
                height: self.height,
                source,
            })
    }
}

impl Drop for ShmBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
        self.pool.destroy();
    }
}
