//! Fixed capacity associative store
//!
//! A `Map` is a flat array of key/value slots. Free slots hold a sentinel
//! key chosen at construction time, so the map never allocates and can be
//! placed in a `static`. Lookups are linear scans; capacities are small.

use core::fmt;

/// One key/value slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// Map operation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// No slot holds the sentinel key
    Full,
    /// Key already has a live slot
    DuplicateKey,
    /// The sentinel key cannot be stored
    UnusedKey,
    IndexOutOfRange(usize),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Full => write!(f, "Map is full"),
            MapError::DuplicateKey => write!(f, "Key already present"),
            MapError::UnusedKey => write!(f, "Sentinel key cannot be saved"),
            MapError::IndexOutOfRange(i) => write!(f, "Index {} out of range", i),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MapError {}

#[cfg(feature = "defmt")]
impl defmt::Format for MapError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            MapError::Full => defmt::write!(fmt, "Full"),
            MapError::DuplicateKey => defmt::write!(fmt, "DuplicateKey"),
            MapError::UnusedKey => defmt::write!(fmt, "UnusedKey"),
            MapError::IndexOutOfRange(i) => defmt::write!(fmt, "IndexOutOfRange({})", i),
        }
    }
}

/// Map with `N` slots. At most one slot holds any live key.
#[derive(Debug, Clone)]
pub struct Map<K, V, const N: usize> {
    stor: [KeyValue<K, V>; N],
    unused: KeyValue<K, V>,
}

impl<K, V, const N: usize> Map<K, V, N>
where
    K: Copy + PartialEq,
    V: Copy,
{
    /// Create an empty map. `unused_key` marks free slots and
    /// `unused_value` is stored alongside it.
    pub const fn new(unused_key: K, unused_value: V) -> Self {
        let unused = KeyValue::new(unused_key, unused_value);
        Self {
            stor: [unused; N],
            unused,
        }
    }

    pub fn unused_key(&self) -> K {
        self.unused.key
    }

    pub fn unused_kv(&self) -> KeyValue<K, V> {
        self.unused
    }

    /// Mark every slot unused.
    pub fn reset(&mut self) {
        self.stor = [self.unused; N];
    }

    fn is_unused(&self, kv: &KeyValue<K, V>) -> bool {
        kv.key == self.unused.key
    }

    fn position(&self, key: &K) -> Option<usize> {
        if *key == self.unused.key {
            return None;
        }
        self.stor.iter().position(|kv| kv.key == *key)
    }

    /// Store `key` in the first free slot and return the slot index.
    ///
    /// Never overwrites a live entry: a full map or an already present key
    /// is reported as an error.
    pub fn save(&mut self, key: K, value: V) -> Result<usize, MapError> {
        if key == self.unused.key {
            return Err(MapError::UnusedKey);
        }
        if self.position(&key).is_some() {
            return Err(MapError::DuplicateKey);
        }
        let index = self
            .stor
            .iter()
            .position(|kv| kv.key == self.unused.key)
            .ok_or(MapError::Full)?;
        self.stor[index] = KeyValue::new(key, value);
        Ok(index)
    }

    pub fn get_by_key(&self, key: &K) -> Option<&V> {
        self.position(key).map(|i| &self.stor[i].value)
    }

    pub fn get_by_key_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.position(key) {
            Some(i) => Some(&mut self.stor[i].value),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    /// Restore the sentinel in the slot holding `key`. Returns false if the
    /// key was not present.
    pub fn clear_by_key(&mut self, key: &K) -> bool {
        match self.position(key) {
            Some(i) => {
                self.stor[i] = self.unused;
                true
            }
            None => false,
        }
    }

    /// Raw slot access, including unused slots
    pub fn get_by_index(&self, index: usize) -> Option<&KeyValue<K, V>> {
        self.stor.get(index)
    }

    /// Overwrite slot `index`. Refused if `kv.key` is live in another slot.
    pub fn put(&mut self, index: usize, kv: KeyValue<K, V>) -> Result<(), MapError> {
        if index >= N {
            return Err(MapError::IndexOutOfRange(index));
        }
        if let Some(other) = self.position(&kv.key) {
            if other != index {
                return Err(MapError::DuplicateKey);
            }
        }
        self.stor[index] = kv;
        Ok(())
    }

    pub fn clear_by_index(&mut self, index: usize) -> Result<(), MapError> {
        if index >= N {
            return Err(MapError::IndexOutOfRange(index));
        }
        self.stor[index] = self.unused;
        Ok(())
    }

    pub const fn total_count(&self) -> usize {
        N
    }

    pub fn unused_count(&self) -> usize {
        self.stor.iter().filter(|kv| self.is_unused(kv)).count()
    }

    pub fn used_count(&self) -> usize {
        N - self.unused_count()
    }

    pub fn is_full(&self) -> bool {
        self.unused_count() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.unused_count() == N
    }

    /// Iterate over live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue<K, V>> + '_ {
        self.stor.iter().filter(move |kv| !self.is_unused(kv))
    }

    /// Live keys in slot order
    pub fn keys(&self) -> heapless::Vec<K, N> {
        self.iter().map(|kv| kv.key).collect()
    }
}

impl<K, V, const N: usize> Map<K, V, N>
where
    K: Copy + PartialEq,
    V: Copy + PartialEq,
{
    /// Key of the first live slot holding `value`
    pub fn get_first_by_value(&self, value: &V) -> Option<K> {
        self.iter().find(|kv| kv.value == *value).map(|kv| kv.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: u8 = 0xFF;

    #[test]
    fn test_save_uses_first_free_slot() {
        let mut map: Map<u8, u16, 4> = Map::new(NONE, 0);
        assert_eq!(map.save(1, 10), Ok(0));
        assert_eq!(map.save(2, 20), Ok(1));
        assert!(map.clear_by_key(&1));
        assert_eq!(map.save(3, 30), Ok(0));
        assert_eq!(map.keys().as_slice(), &[3, 2]);
    }

    #[test]
    fn test_save_on_full_map_fails() {
        let mut map: Map<u8, u16, 2> = Map::new(NONE, 0);
        map.save(1, 10).unwrap();
        map.save(2, 20).unwrap();
        assert_eq!(map.save(3, 30), Err(MapError::Full));
        assert_eq!(map.get_by_key(&1), Some(&10));
        assert_eq!(map.get_by_key(&2), Some(&20));
        assert_eq!(map.get_by_key(&3), None);
    }

    #[test]
    fn test_live_key_never_duplicated() {
        let mut map: Map<u8, u16, 4> = Map::new(NONE, 0);
        map.save(1, 10).unwrap();
        assert_eq!(map.save(1, 11), Err(MapError::DuplicateKey));
        assert_eq!(map.put(2, KeyValue::new(1, 12)), Err(MapError::DuplicateKey));
        assert_eq!(map.put(0, KeyValue::new(1, 12)), Ok(()));
        assert_eq!(map.get_by_key(&1), Some(&12));
        assert_eq!(map.used_count(), 1);
    }

    #[test]
    fn test_sentinel_key_is_not_a_key() {
        let mut map: Map<u8, u16, 4> = Map::new(NONE, 0);
        assert_eq!(map.save(NONE, 1), Err(MapError::UnusedKey));
        assert!(!map.contains_key(&NONE));
        assert!(!map.clear_by_key(&NONE));
        assert!(map.is_empty());
    }

    #[test]
    fn test_first_by_value() {
        let mut map: Map<u8, u16, 4> = Map::new(NONE, 0);
        map.save(5, 7).unwrap();
        map.save(6, 7).unwrap();
        assert_eq!(map.get_first_by_value(&7), Some(5));
        assert_eq!(map.get_first_by_value(&8), None);
    }
}
