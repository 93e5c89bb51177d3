use std::{fmt, sync::Arc};

use communicator::{Communicator, ReduceOp};
use itertools::Itertools;
use rand::Rng;

use crate::{DualView, GlobalOrdinal, HostWrite, LinalgError, LinalgResult, Map};

/// Distributed vector of `f64`, one entry per global index of its map.
///
/// Each participant stores only the entries its rank owns. Kernels (`put_scalar`, `scale`,
/// `update`, `randomize`) run on the device copy; reductions read whichever copy is newest
/// and combine the partial results collectively, so every participant gets the same value.
#[derive(Debug)]
pub struct Vector<C: Communicator> {
    map: Arc<Map<C>>,
    values: DualView<f64>,
}

impl<C: Communicator> Vector<C> {
    /// Zero-filled vector over `map`
    pub fn new(map: Arc<Map<C>>) -> Self {
        let values = DualView::new(map.num_local_elements());
        Self { map, values }
    }

    #[inline(always)]
    pub fn map(&self) -> &Arc<Map<C>> {
        &self.map
    }

    #[inline(always)]
    pub fn local_length(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    pub fn global_length(&self) -> u64 {
        self.map.num_global_elements()
    }

    #[inline]
    fn check_compatible(&self, other: &Vector<C>) -> LinalgResult<()> {
        if self.map.is_compatible(&other.map) {
            Ok(())
        } else {
            Err(LinalgError::IncompatibleMaps)
        }
    }

    // ---------------------------------------------------------------------------------------
    // device-side kernels

    /// Set every entry to `value`
    pub fn put_scalar(&mut self, value: f64) {
        self.values.device_mut().fill(value);
    }

    pub fn scale(&mut self, alpha: f64) {
        self.values.device_mut().iter_mut().for_each(|v| *v *= alpha);
    }

    /// self = alpha * x + beta * self
    pub fn update(&mut self, alpha: f64, x: &Vector<C>, beta: f64) -> LinalgResult<()> {
        self.check_compatible(x)?;
        self.values
            .device_mut()
            .iter_mut()
            .zip(x.values.current())
            .for_each(|(y, x)| *y = alpha * x + beta * *y);
        Ok(())
    }

    /// Fill with values drawn uniformly from [-1, 1)
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.values
            .device_mut()
            .iter_mut()
            .for_each(|v| *v = rng.gen_range(-1.0..1.0));
    }

    // ---------------------------------------------------------------------------------------
    // collective reductions

    pub fn norm1(&self) -> f64 {
        let local = self.values.current().iter().map(|v| v.abs()).sum();
        self.map.comm().all_reduce_f64(local, ReduceOp::Sum)
    }

    /// Euclidean norm over all participants' entries
    pub fn norm2(&self) -> f64 {
        let local = self.values.current().iter().map(|v| v * v).sum();
        self.map.comm().all_reduce_f64(local, ReduceOp::Sum).sqrt()
    }

    pub fn norm_inf(&self) -> f64 {
        let local = self
            .values
            .current()
            .iter()
            .fold(0.0, |acc: f64, v| acc.max(v.abs()));
        self.map.comm().all_reduce_f64(local, ReduceOp::Max)
    }

    pub fn dot(&self, other: &Vector<C>) -> LinalgResult<f64> {
        self.check_compatible(other)?;
        let local = self
            .values
            .current()
            .iter()
            .zip(other.values.current())
            .map(|(a, b)| a * b)
            .sum();
        Ok(self.map.comm().all_reduce_f64(local, ReduceOp::Sum))
    }

    /// Average of all entries; 0 for an empty vector
    pub fn mean_value(&self) -> f64 {
        let local = self.values.current().iter().sum();
        let total = self.map.comm().all_reduce_f64(local, ReduceOp::Sum);
        match self.global_length() {
            0 => 0.0,
            n => total / n as f64,
        }
    }

    // ---------------------------------------------------------------------------------------
    // host access

    #[inline]
    pub fn sync_host(&mut self) {
        self.values.sync_host();
    }

    #[inline]
    pub fn sync_device(&mut self) {
        self.values.sync_device();
    }

    #[inline]
    pub fn modify_host(&mut self) -> LinalgResult<()> {
        self.values.modify_host()
    }

    #[inline]
    pub fn modify_device(&mut self) -> LinalgResult<()> {
        self.values.modify_device()
    }

    #[inline(always)]
    pub fn need_sync_host(&self) -> bool {
        self.values.need_sync_host()
    }

    #[inline(always)]
    pub fn need_sync_device(&self) -> bool {
        self.values.need_sync_device()
    }

    /// Host copy of the local entries, as last synced
    #[inline(always)]
    pub fn local_view_host(&self) -> &[f64] {
        self.values.view_host()
    }

    /// Host copy of the local entries; writes are only kept after [`Vector::modify_host`]
    #[inline(always)]
    pub fn local_view_host_mut(&mut self) -> &mut [f64] {
        self.values.view_host_mut()
    }

    /// Synced host copy of the local entries
    #[inline]
    pub fn read_local(&mut self) -> &[f64] {
        self.values.read()
    }

    /// Synced, modification-flagged host copy of the local entries
    #[inline]
    pub fn write_local(&mut self) -> HostWrite<'_, f64> {
        self.values.begin_write()
    }

    /// Newest value of local entry `local`
    pub fn local_value(&self, local: usize) -> Option<f64> {
        self.values.current().get(local).copied()
    }

    fn with_local_entry(&mut self, local: usize, f: impl FnOnce(&mut f64)) -> LinalgResult<()> {
        let len = self.local_length();
        if local >= len {
            return Err(LinalgError::LocalIndexOutOfRange { index: local, len });
        }
        let mut write = self.values.begin_write();
        f(&mut write[local]);
        Ok(())
    }

    pub fn replace_local_value(&mut self, local: usize, value: f64) -> LinalgResult<()> {
        self.with_local_entry(local, |v| *v = value)
    }

    pub fn sum_into_local_value(&mut self, local: usize, value: f64) -> LinalgResult<()> {
        self.with_local_entry(local, |v| *v += value)
    }

    fn owned_local_index(&self, global: GlobalOrdinal) -> LinalgResult<usize> {
        self.map
            .local_index(global)
            .ok_or(LinalgError::GlobalIndexNotOwned(global))
    }

    pub fn replace_global_value(&mut self, global: GlobalOrdinal, value: f64) -> LinalgResult<()> {
        let local = self.owned_local_index(global)?;
        self.replace_local_value(local, value)
    }

    pub fn sum_into_global_value(&mut self, global: GlobalOrdinal, value: f64) -> LinalgResult<()> {
        let local = self.owned_local_index(global)?;
        self.sum_into_local_value(local, value)
    }
}

impl<C: Communicator> fmt::Display for Vector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vector: global length {}, local length {} on rank {}: [{}]",
            self.global_length(),
            self.local_length(),
            self.map.comm().world_rank(),
            self.values.current().iter().join(", ")
        )
    }
}
