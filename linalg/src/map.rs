use std::{fmt, sync::Arc};

use communicator::Communicator;

use crate::{GlobalOrdinal, LinalgError, LinalgResult};

/// Contiguous assignment of global indices to the participants of a group.
///
/// Rank `r` owns the half-open range `[index_base + offsets[r], index_base + offsets[r + 1])`.
/// The offsets are replicated on every participant, so ownership queries never communicate.
#[derive(Debug)]
pub struct Map<C: Communicator> {
    comm: Arc<C>,
    num_global: u64,
    index_base: GlobalOrdinal,
    offsets: Vec<u64>,
}

impl<C: Communicator> Map<C> {
    /// Uniform contiguous map: every rank owns `num_global / P` indices and the first
    /// `num_global % P` ranks own one more.
    pub fn new(num_global: u64, index_base: GlobalOrdinal, comm: Arc<C>) -> LinalgResult<Self> {
        Self::check_overflow(num_global, index_base)?;

        let world_size = comm.world_size() as u64;
        let quotient = num_global / world_size;
        let remainder = num_global % world_size;
        let offsets = (0..=world_size)
            .map(|r| r * quotient + r.min(remainder))
            .collect();

        let map = Self {
            comm,
            num_global,
            index_base,
            offsets,
        };
        log::debug!("{}", map);
        Ok(map)
    }

    /// Contiguous map in which this rank owns `num_local` indices.
    ///
    /// Collective. The global count is the sum of all local counts; when `num_global` is
    /// supplied it must agree with that sum.
    pub fn with_local_count(
        num_global: Option<u64>,
        num_local: usize,
        index_base: GlobalOrdinal,
        comm: Arc<C>,
    ) -> LinalgResult<Self> {
        let counts = comm.all_gather_u64(num_local as u64);
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        offsets.push(0u64);
        for count in counts {
            offsets.push(offsets[offsets.len() - 1] + count);
        }

        let computed = offsets[offsets.len() - 1];
        if let Some(supplied) = num_global {
            if supplied != computed {
                return Err(LinalgError::GlobalCountMismatch { supplied, computed });
            }
        }
        Self::check_overflow(computed, index_base)?;

        let map = Self {
            comm,
            num_global: computed,
            index_base,
            offsets,
        };
        log::debug!("{}", map);
        Ok(map)
    }

    fn check_overflow(num_global: u64, index_base: GlobalOrdinal) -> LinalgResult<()> {
        GlobalOrdinal::try_from(num_global)
            .ok()
            .and_then(|n| index_base.checked_add(n))
            .map(|_| ())
            .ok_or(LinalgError::GlobalIndexOverflow {
                index_base,
                num_global,
            })
    }

    #[inline(always)]
    pub fn comm(&self) -> &Arc<C> {
        &self.comm
    }

    #[inline(always)]
    pub fn num_global_elements(&self) -> u64 {
        self.num_global
    }

    #[inline(always)]
    pub fn num_local_elements(&self) -> usize {
        let rank = self.comm.world_rank();
        (self.offsets[rank + 1] - self.offsets[rank]) as usize
    }

    #[inline(always)]
    pub fn index_base(&self) -> GlobalOrdinal {
        self.index_base
    }

    #[inline]
    fn first_local(&self) -> GlobalOrdinal {
        self.index_base + self.offsets[self.comm.world_rank()] as GlobalOrdinal
    }

    /// Smallest global index owned here, `None` when this rank owns nothing
    pub fn min_global_index(&self) -> Option<GlobalOrdinal> {
        (self.num_local_elements() > 0).then(|| self.first_local())
    }

    pub fn max_global_index(&self) -> Option<GlobalOrdinal> {
        let n = self.num_local_elements();
        (n > 0).then(|| self.first_local() + n as GlobalOrdinal - 1)
    }

    pub fn min_all_global_index(&self) -> Option<GlobalOrdinal> {
        (self.num_global > 0).then_some(self.index_base)
    }

    pub fn max_all_global_index(&self) -> Option<GlobalOrdinal> {
        (self.num_global > 0).then(|| self.index_base + self.num_global as GlobalOrdinal - 1)
    }

    /// Global index of local index `local`
    pub fn global_index(&self, local: usize) -> Option<GlobalOrdinal> {
        (local < self.num_local_elements()).then(|| self.first_local() + local as GlobalOrdinal)
    }

    /// Local index of global index `global`, if this rank owns it
    pub fn local_index(&self, global: GlobalOrdinal) -> Option<usize> {
        let local = global.checked_sub(self.first_local())?;
        usize::try_from(local)
            .ok()
            .filter(|&l| l < self.num_local_elements())
    }

    #[inline]
    pub fn is_node_global_element(&self, global: GlobalOrdinal) -> bool {
        self.local_index(global).is_some()
    }

    #[inline]
    pub fn is_node_local_element(&self, local: usize) -> bool {
        local < self.num_local_elements()
    }

    /// Rank owning global index `global`, `None` when it is outside the map
    pub fn owner_rank(&self, global: GlobalOrdinal) -> Option<usize> {
        let offset = global
            .checked_sub(self.index_base)
            .and_then(|o| u64::try_from(o).ok())
            .filter(|&o| o < self.num_global)?;
        Some(self.offsets.partition_point(|&start| start <= offset) - 1)
    }

    /// Same number of indices on every rank, so local data can be combined element-wise
    pub fn is_compatible(&self, other: &Map<C>) -> bool {
        self.offsets == other.offsets
    }

    /// Same global indices on every rank
    pub fn is_same_as(&self, other: &Map<C>) -> bool {
        std::ptr::eq(self, other)
            || (self.index_base == other.index_base && self.is_compatible(other))
    }
}

impl<C: Communicator> fmt::Display for Map<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Map: {} global elements, index base {}, rank {} of {} owns {} starting at {}",
            self.num_global,
            self.index_base,
            self.comm.world_rank(),
            self.comm.world_size(),
            self.num_local_elements(),
            self.first_local()
        )
    }
}

#[cfg(test)]
mod tests {
    use communicator::ThreadCommunicator;

    use super::*;

    fn single() -> Arc<ThreadCommunicator> {
        Arc::new(ThreadCommunicator::world(1).unwrap().remove(0))
    }

    #[test]
    fn test_single_participant_owns_everything() {
        let map = Map::new(5, 0, single()).unwrap();
        assert_eq!(map.num_global_elements(), 5);
        assert_eq!(map.num_local_elements(), 5);
        assert_eq!(map.min_global_index(), Some(0));
        assert_eq!(map.max_global_index(), Some(4));
        assert_eq!(map.global_index(3), Some(3));
        assert_eq!(map.global_index(5), None);
        assert!(map.is_node_local_element(4));
        assert!(!map.is_node_local_element(5));
        assert_eq!(map.local_index(4), Some(4));
        assert_eq!(map.local_index(-1), None);
        assert_eq!(map.owner_rank(4), Some(0));
        assert_eq!(map.owner_rank(5), None);
    }

    #[test]
    fn test_index_base_shifts_global_indices() {
        let map = Map::new(3, 10, single()).unwrap();
        assert_eq!(map.min_all_global_index(), Some(10));
        assert_eq!(map.max_all_global_index(), Some(12));
        assert_eq!(map.local_index(11), Some(1));
        assert!(!map.is_node_global_element(9));
        assert!(!map.is_node_global_element(13));
    }

    #[test]
    fn test_empty_map() {
        let map = Map::new(0, 0, single()).unwrap();
        assert_eq!(map.num_local_elements(), 0);
        assert_eq!(map.min_global_index(), None);
        assert_eq!(map.max_all_global_index(), None);
        assert_eq!(map.owner_rank(0), None);
    }

    #[test]
    fn test_overflow_rejected() {
        assert_eq!(
            Map::new(10, GlobalOrdinal::MAX - 5, single()).unwrap_err(),
            LinalgError::GlobalIndexOverflow {
                index_base: GlobalOrdinal::MAX - 5,
                num_global: 10
            }
        );
        assert!(Map::new(u64::MAX, 0, single()).is_err());
    }

    #[test]
    fn test_local_count_mismatch() {
        assert_eq!(
            Map::with_local_count(Some(6), 5, 0, single()).unwrap_err(),
            LinalgError::GlobalCountMismatch {
                supplied: 6,
                computed: 5
            }
        );
        let map = Map::with_local_count(None, 5, 0, single()).unwrap();
        assert_eq!(map.num_global_elements(), 5);
    }
}
