//! Outstanding request sequence record

use fw_core::Sequence;

use crate::map::{Map, MapError};

/// Record of the sequence numbers of requests still awaiting confirmation,
/// keyed by the destination of each request.
#[derive(Debug, Clone)]
pub struct SeqRec<K, const N: usize> {
    map: Map<K, Sequence, N>,
}

impl<K: Copy + PartialEq, const N: usize> SeqRec<K, N> {
    pub const fn new(unused_key: K) -> Self {
        Self {
            map: Map::new(unused_key, 0),
        }
    }

    pub fn reset(&mut self) {
        self.map.reset();
    }

    /// Record `seq` as outstanding for `key`, replacing any older sequence
    /// for the same key. With `reset` the record is cleared first, starting
    /// a new fan-out.
    pub fn save(&mut self, key: K, seq: Sequence, reset: bool) -> Result<(), MapError> {
        if reset {
            self.reset();
        }
        if let Some(slot) = self.map.get_by_key_mut(&key) {
            *slot = seq;
            return Ok(());
        }
        self.map.save(key, seq).map(|_| ())
    }

    /// True if `seq` is the outstanding sequence for `key`. A match clears
    /// the entry so each confirmation is accepted at most once.
    pub fn matches(&mut self, key: K, seq: Sequence) -> bool {
        if self.map.get_by_key(&key) == Some(&seq) {
            self.map.clear_by_key(&key)
        } else {
            false
        }
    }

    pub fn clear(&mut self, key: K) {
        self.map.clear_by_key(&key);
    }

    pub fn is_cleared(&self, key: K) -> bool {
        !self.map.contains_key(&key)
    }

    pub fn is_all_cleared(&self) -> bool {
        self.map.is_empty()
    }

    pub fn outstanding(&self) -> usize {
        self.map.used_count()
    }
}
