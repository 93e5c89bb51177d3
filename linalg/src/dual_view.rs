//! A buffer mirrored in two memory spaces with an explicit dirty flag.
//!
//! The device copy is authoritative. Host-side writes only reach it through
//! [`DualView::sync_device`], and only when the host copy was marked modified first;
//! unmarked host writes are lost on the next synchronization.

use std::ops::{Deref, DerefMut};

use crate::{LinalgError, LinalgResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Both copies hold the same data
    Clean,
    /// The host copy is newer than the device copy
    HostModified,
    /// The device copy is newer than the host copy
    DeviceModified,
}

#[derive(Debug, Clone)]
pub struct DualView<T> {
    host: Vec<T>,
    device: Vec<T>,
    state: SyncState,
}

impl<T: Copy + Default> DualView<T> {
    pub fn new(len: usize) -> Self {
        Self {
            host: vec![T::default(); len],
            device: vec![T::default(); len],
            state: SyncState::Clean,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.device.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.device.is_empty()
    }

    #[inline(always)]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[inline(always)]
    pub fn need_sync_host(&self) -> bool {
        self.state == SyncState::DeviceModified
    }

    #[inline(always)]
    pub fn need_sync_device(&self) -> bool {
        self.state == SyncState::HostModified
    }

    /// Mark the host copy as the newer one
    pub fn modify_host(&mut self) -> LinalgResult<()> {
        if self.need_sync_host() {
            return Err(LinalgError::ConcurrentModification("device"));
        }
        self.state = SyncState::HostModified;
        Ok(())
    }

    /// Mark the device copy as the newer one
    pub fn modify_device(&mut self) -> LinalgResult<()> {
        if self.need_sync_device() {
            return Err(LinalgError::ConcurrentModification("host"));
        }
        self.state = SyncState::DeviceModified;
        Ok(())
    }

    /// Refresh the host copy if the device copy is newer
    pub fn sync_host(&mut self) {
        if self.need_sync_host() {
            log::trace!("dual view: device -> host ({} entries)", self.len());
            self.host.copy_from_slice(&self.device);
            self.state = SyncState::Clean;
        }
    }

    /// Propagate the host copy if it was marked modified
    pub fn sync_device(&mut self) {
        if self.need_sync_device() {
            log::trace!("dual view: host -> device ({} entries)", self.len());
            self.device.copy_from_slice(&self.host);
            self.state = SyncState::Clean;
        }
    }

    #[inline(always)]
    pub fn view_host(&self) -> &[T] {
        &self.host
    }

    /// Host copy without touching the dirty flag; pair with [`DualView::modify_host`].
    #[inline(always)]
    pub fn view_host_mut(&mut self) -> &mut [T] {
        &mut self.host
    }

    #[inline(always)]
    pub fn view_device(&self) -> &[T] {
        &self.device
    }

    /// Whichever copy currently holds the newest data
    #[inline]
    pub fn current(&self) -> &[T] {
        match self.state {
            SyncState::HostModified => &self.host,
            _ => &self.device,
        }
    }

    /// Synced host copy, for reading
    pub fn read(&mut self) -> &[T] {
        self.sync_host();
        &self.host
    }

    /// Synced host copy, already marked modified.
    ///
    /// Call [`HostWrite::commit`] to push the writes to the device right away; dropping
    /// the guard instead leaves them pending until the next [`DualView::sync_device`].
    pub fn begin_write(&mut self) -> HostWrite<'_, T> {
        self.sync_host();
        self.state = SyncState::HostModified;
        HostWrite { view: self }
    }

    /// Synced device copy, already marked modified
    pub fn device_mut(&mut self) -> &mut [T] {
        self.sync_device();
        self.state = SyncState::DeviceModified;
        &mut self.device
    }
}

pub struct HostWrite<'a, T: Copy + Default> {
    view: &'a mut DualView<T>,
}

impl<T: Copy + Default> HostWrite<'_, T> {
    pub fn commit(self) {
        self.view.sync_device();
    }
}

impl<T: Copy + Default> Deref for HostWrite<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.view.host
    }
}

impl<T: Copy + Default> DerefMut for HostWrite<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.view.host
    }
}
