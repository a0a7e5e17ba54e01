//! Free-list recycling for per-frame values.
//!
//! Every pooled type owns a statically chosen slot in [`ObjectPool`]: a free list of
//! single values plus fixed-length sequence buckets keyed by length. Dispatch is
//! resolved at compile time through [`Pooled`]; there is no runtime type lookup.
//!
//! Ownership moves to the borrower on acquire and back to the pool on release, so a
//! released value is never reachable from a live snapshot.

use hashbrown::HashMap;

use crate::config::Config;
use crate::data::Spatial;
use crate::frame::{FrameObject, TagList, VarMap};

/// A value that can be wiped back to its freshly constructed state.
pub trait Poolable: Default {
    fn reset(&mut self);
}

/// Maps a poolable type to its slot in [`ObjectPool`].
pub trait Pooled: Poolable + Sized {
    fn slot(pool: &mut ObjectPool) -> &mut PoolSlot<Self>;
}

/// Recycled singles and length-keyed sequences of one type.
#[derive(Debug)]
pub struct PoolSlot<T> {
    free: Vec<T>,
    sequences: HashMap<usize, Vec<Box<[Option<T>]>>>,
}

impl<T> Default for PoolSlot<T> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            sequences: HashMap::new(),
        }
    }
}

impl<T> PoolSlot<T> {
    fn clear(&mut self) {
        self.free.clear();
        self.sequences.clear();
    }
}

/// Allocation counters across all pooled types.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values and sequences constructed because nothing could be recycled.
    pub created: usize,
    /// Acquisitions served from a free list.
    pub recycled: usize,
    /// Acquired and not yet released.
    pub outstanding: usize,
}

#[derive(Debug, Default)]
pub struct ObjectPool {
    enabled: bool,
    stats: PoolStats,
    objects: PoolSlot<FrameObject>,
    spatials: PoolSlot<Spatial>,
    var_maps: PoolSlot<VarMap>,
    tag_lists: PoolSlot<TagList>,
}

macro_rules! pooled {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Pooled for $ty {
                #[inline]
                fn slot(pool: &mut ObjectPool) -> &mut PoolSlot<Self> {
                    &mut pool.$field
                }
            }
        )*
    };
}

pooled! {
    FrameObject => objects,
    Spatial => spatials,
    VarMap => var_maps,
    TagList => tag_lists,
}

impl Poolable for Spatial {
    fn reset(&mut self) {
        *self = Spatial::default();
    }
}

impl Poolable for VarMap {
    fn reset(&mut self) {
        self.clear();
    }
}

impl Poolable for TagList {
    fn reset(&mut self) {
        self.clear();
    }
}

impl ObjectPool {
    pub fn new(cfg: &Config) -> Self {
        Self {
            enabled: cfg.pooling_enabled,
            ..Self::default()
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every recycled value. Outstanding values are unaffected.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.spatials.clear();
        self.var_maps.clear();
        self.tag_lists.clear();
    }

    /// A recycled `T` when one is available, else a new one.
    pub fn acquire<T: Pooled>(&mut self) -> T {
        self.stats.outstanding += 1;
        if self.enabled {
            if let Some(item) = T::slot(self).free.pop() {
                self.stats.recycled += 1;
                return item;
            }
        }
        self.stats.created += 1;
        T::default()
    }

    /// Wipe `item` and push it on its free list (dropped when pooling is off).
    pub fn release<T: Pooled>(&mut self, mut item: T) {
        self.stats.outstanding = self.stats.outstanding.saturating_sub(1);
        if !self.enabled {
            return;
        }
        item.reset();
        T::slot(self).free.push(item);
    }

    /// Release when present; `None` is a no-op.
    pub fn release_opt<T: Pooled>(&mut self, item: Option<T>) {
        if let Some(item) = item {
            self.release(item);
        }
    }

    /// A sequence of exactly `len` empty slots. Sequences of different lengths are
    /// never interchanged.
    pub fn acquire_sequence<T: Pooled>(&mut self, len: usize) -> Box<[Option<T>]> {
        self.stats.outstanding += 1;
        if self.enabled {
            if let Some(seq) = T::slot(self).sequences.get_mut(&len).and_then(Vec::pop) {
                self.stats.recycled += 1;
                return seq;
            }
        }
        self.stats.created += 1;
        std::iter::repeat_with(|| None).take(len).collect()
    }

    /// Release every element, empty each slot, then recycle the sequence itself.
    pub fn release_sequence<T: Pooled>(&mut self, mut seq: Box<[Option<T>]>) {
        for slot in seq.iter_mut() {
            if let Some(item) = slot.take() {
                self.release(item);
            }
        }
        self.stats.outstanding = self.stats.outstanding.saturating_sub(1);
        if !self.enabled {
            return;
        }
        T::slot(self)
            .sequences
            .entry(seq.len())
            .or_default()
            .push(seq);
    }
}
