//! Scoped critical-section guard
//!
//! Data touched from more than one execution context (a driver ISR and its
//! component, or several threads) lives in a [`Shared`]. Access is only
//! possible inside [`Shared::lock`], whose closure runs with the critical
//! section held; the section is released on every exit path, including
//! unwinding.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

use crate::{Map, Pipe};

pub struct Shared<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access inside a critical section.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| self.lock_in(cs, f))
    }

    /// Run `f` inside a critical section the caller already holds.
    ///
    /// Panics if the value is already borrowed by an enclosing `lock`.
    pub fn lock_in<R>(&self, cs: CriticalSection<'_>, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.borrow_ref_mut(cs);
        f(&mut guard)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Pipe shared between execution contexts
pub type SharedPipe<T, const N: usize> = Shared<Pipe<T, N>>;

/// Map shared between execution contexts
pub type SharedMap<K, V, const N: usize> = Shared<Map<K, V, N>>;

#[cfg(test)]
mod tests {
    use super::*;

    static COUNTS: SharedMap<u8, u32, 4> = Shared::new(Map::new(0, 0));

    #[test]
    fn test_static_map_access() {
        COUNTS.lock(|m| m.save(1, 10)).unwrap();
        let v = COUNTS.lock(|m| m.get_by_key(&1).copied());
        assert_eq!(v, Some(10));
        COUNTS.lock(|m| m.reset());
    }

    #[test]
    fn test_nested_lock_in_same_section() {
        let a: SharedPipe<u8, 8> = Shared::new(Pipe::new());
        let b: SharedPipe<u8, 8> = Shared::new(Pipe::new());
        a.lock(|p| p.write(&[1, 2, 3]));
        critical_section::with(|cs| {
            a.lock_in(cs, |src| {
                b.lock_in(cs, |dst| {
                    while let Some(x) = src.read_one() {
                        dst.write_one(x);
                    }
                })
            })
        });
        assert_eq!(b.lock(|p| p.used_count()), 3);
        assert!(a.lock(|p| p.is_empty()));
    }
}
