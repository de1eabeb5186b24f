//! Power-of-two ring buffer
//!
//! `Pipe` is the byte/word FIFO shared between a driver's interrupt handler
//! and its owning component. One slot is always left unused so that
//! `read == write` unambiguously means empty, giving a usable capacity of
//! `N - 1` without a separate counter.
//!
//! The pipe itself is not synchronized. When both ends are touched from
//! different execution contexts wrap it in [`crate::Shared`].

/// Ring buffer over `N` slots where `N` is a power of two.
#[derive(Debug, Clone)]
pub struct Pipe<T, const N: usize> {
    stor: [T; N],
    write_index: usize,
    read_index: usize,
    truncated: bool,
}

impl<T: Copy + Default, const N: usize> Default for Pipe<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> Pipe<T, N> {
    /// Index mask. Fails to compile for a storage size that is not a power
    /// of two or is smaller than 2.
    pub const MASK: usize = {
        assert!(N >= 2 && N.is_power_of_two(), "pipe size must be a power of two");
        N - 1
    };

    pub fn new() -> Self {
        Self::filled(T::default())
    }

    /// Create an empty pipe with every slot set to `value`. Usable in a
    /// `static` initializer.
    pub const fn filled(value: T) -> Self {
        let _ = Self::MASK;
        Self {
            stor: [value; N],
            write_index: 0,
            read_index: 0,
            truncated: false,
        }
    }

    /// Empty the pipe and clear the truncated flag.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.truncated = false;
    }

    /// True when the last `write` was refused for lack of space
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Usable capacity, one less than the storage size
    pub const fn capacity(&self) -> usize {
        Self::MASK
    }

    /// Storage size in slots
    pub const fn buf_size(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        self.read_index == self.write_index
    }

    pub fn is_full(&self) -> bool {
        self.avail_count() == 0
    }

    pub fn used_count(&self) -> usize {
        self.write_index.wrapping_sub(self.read_index) & Self::MASK
    }

    pub fn avail_count(&self) -> usize {
        self.read_index
            .wrapping_sub(self.write_index)
            .wrapping_sub(1)
            & Self::MASK
    }

    /// Largest contiguous run of used slots starting at the read index.
    pub fn used_block_count(&self) -> usize {
        let count = self.used_count();
        if self.read_index + count > N {
            N - self.read_index
        } else {
            count
        }
    }

    /// Largest contiguous run of free slots starting at the write index.
    pub fn avail_block_count(&self) -> usize {
        let count = self.avail_count();
        if self.write_index + count > N {
            N - self.write_index
        } else {
            count
        }
    }

    /// Write all of `src` or nothing.
    ///
    /// Returns the number of entries written, which is either `src.len()`
    /// or 0. A refused write sets the truncated flag; a successful one
    /// clears it.
    pub fn write(&mut self, src: &[T]) -> usize {
        self.write_status(src).0
    }

    /// Like [`Pipe::write`], also reporting whether this write turned the
    /// pipe from empty to non-empty.
    pub fn write_status(&mut self, src: &[T]) -> (usize, bool) {
        let was_empty = self.is_empty();
        let count = src.len();
        if count > self.avail_count() {
            self.truncated = true;
            return (0, false);
        }
        self.truncated = false;
        let first = count.min(N - self.write_index);
        self.stor[self.write_index..self.write_index + first].copy_from_slice(&src[..first]);
        self.stor[..count - first].copy_from_slice(&src[first..]);
        self.inc_write_index(count);
        (count, count > 0 && was_empty)
    }

    /// Write a single entry. Returns false when the pipe is full.
    ///
    /// Does not touch the truncated flag.
    pub fn write_one(&mut self, value: T) -> bool {
        if self.avail_count() == 0 {
            return false;
        }
        self.stor[self.write_index] = value;
        self.inc_write_index(1);
        true
    }

    /// Read up to `dest.len()` entries; returns the number read.
    pub fn read(&mut self, dest: &mut [T]) -> usize {
        self.read_status(dest).0
    }

    /// Like [`Pipe::read`], also reporting whether this read drained the
    /// pipe.
    pub fn read_status(&mut self, dest: &mut [T]) -> (usize, bool) {
        let count = dest.len().min(self.used_count());
        let first = count.min(N - self.read_index);
        dest[..first].copy_from_slice(&self.stor[self.read_index..self.read_index + first]);
        dest[first..count].copy_from_slice(&self.stor[..count - first]);
        self.inc_read_index(count);
        (count, count > 0 && self.is_empty())
    }

    pub fn read_one(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.stor[self.read_index];
        self.inc_read_index(1);
        Some(value)
    }

    /// Oldest entry without consuming it
    pub fn peek(&self) -> Option<T> {
        self.get(0)
    }

    /// Entry `offset` positions after the read index, if used.
    pub fn get(&self, offset: usize) -> Option<T> {
        if offset < self.used_count() {
            Some(self.stor[(self.read_index + offset) & Self::MASK])
        } else {
            None
        }
    }

    /// Remove the entry `offset` positions after the read index.
    ///
    /// Entries between the removed one and the nearer end are shifted by
    /// one slot. The shift toward the write end also moves the slot at the
    /// write index so a scratch entry staged there survives the delete.
    pub fn delete(&mut self, offset: usize) -> Option<T> {
        let used = self.used_count();
        if offset >= used {
            return None;
        }
        let mut index = (self.read_index + offset) & Self::MASK;
        let removed = self.stor[index];
        let mut next = index;
        if offset <= (used >> 1) {
            for _ in 0..offset {
                next = next.wrapping_sub(1) & Self::MASK;
                self.stor[index] = self.stor[next];
                index = next;
            }
            self.inc_read_index(1);
        } else {
            for _ in offset..used {
                next = (next + 1) & Self::MASK;
                self.stor[index] = self.stor[next];
                index = next;
            }
            self.write_index = self.write_index.wrapping_sub(1) & Self::MASK;
        }
        Some(removed)
    }

    /// Slot at the write index. It is never part of the used range, so a
    /// producer may stage an entry there before committing it with
    /// [`Pipe::inc_write_index`].
    pub fn staged(&self) -> &T {
        &self.stor[self.write_index]
    }

    pub fn staged_mut(&mut self) -> &mut T {
        &mut self.stor[self.write_index]
    }

    /// Contiguous used slots at the read index, for zero-copy consumers.
    /// Call [`Pipe::inc_read_index`] after consuming.
    pub fn read_block(&self) -> &[T] {
        let count = self.used_block_count();
        &self.stor[self.read_index..self.read_index + count]
    }

    /// Contiguous free slots at the write index, for zero-copy producers
    /// such as DMA. Call [`Pipe::inc_write_index`] to commit.
    pub fn write_block(&mut self) -> &mut [T] {
        let count = self.avail_block_count();
        &mut self.stor[self.write_index..self.write_index + count]
    }

    pub fn inc_write_index(&mut self, count: usize) {
        debug_assert!(count <= N);
        self.write_index = (self.write_index + count) & Self::MASK;
    }

    pub fn inc_read_index(&mut self, count: usize) {
        debug_assert!(count <= N);
        self.read_index = (self.read_index + count) & Self::MASK;
    }
}

/// Byte pipe used by serial drivers
pub type Fifo<const N: usize> = Pipe<u8, N>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_one_less_than_storage() {
        let mut pipe: Pipe<u8, 8> = Pipe::new();
        assert_eq!(pipe.capacity(), 7);
        assert_eq!(pipe.write(&[0; 7]), 7);
        assert!(pipe.is_full());
        assert!(!pipe.write_one(1));
    }

    #[test]
    fn test_write_wraps_around_end() {
        let mut pipe: Pipe<u8, 8> = Pipe::new();
        pipe.write(&[1, 2, 3, 4, 5]);
        let mut out = [0u8; 4];
        assert_eq!(pipe.read(&mut out), 4);
        assert_eq!(pipe.write(&[6, 7, 8, 9, 10]), 5);
        assert_eq!(pipe.write_index(), 2);

        let mut out = [0u8; 8];
        assert_eq!(pipe.read(&mut out), 6);
        assert_eq!(&out[..6], &[5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_block_counts_stop_at_storage_end() {
        let mut pipe: Pipe<u8, 8> = Pipe::new();
        pipe.inc_write_index(6);
        pipe.inc_read_index(6);
        pipe.write(&[1, 2, 3, 4]);
        assert_eq!(pipe.used_count(), 4);
        assert_eq!(pipe.used_block_count(), 2);
        assert_eq!(pipe.read_block(), &[1, 2]);
        assert_eq!(pipe.avail_count(), 3);
        assert_eq!(pipe.avail_block_count(), 3);
    }

    #[test]
    fn test_delete_near_read_end_moves_read_index() {
        let mut pipe: Pipe<u8, 8> = Pipe::new();
        pipe.write(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(pipe.delete(1), Some(2));
        assert_eq!(pipe.read_index(), 1);
        assert_eq!(pipe.write_index(), 6);

        let mut out = [0u8; 8];
        let n = pipe.read(&mut out);
        assert_eq!(&out[..n], &[1, 3, 4, 5, 6]);
    }

    #[test]
    fn test_delete_near_write_end_moves_write_index() {
        let mut pipe: Pipe<u8, 8> = Pipe::new();
        pipe.write(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(pipe.delete(4), Some(5));
        assert_eq!(pipe.read_index(), 0);
        assert_eq!(pipe.write_index(), 5);

        let mut out = [0u8; 8];
        let n = pipe.read(&mut out);
        assert_eq!(&out[..n], &[1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_delete_keeps_staged_entry() {
        let mut pipe: Pipe<u8, 8> = Pipe::new();
        pipe.write(&[1, 2, 3, 4, 5]);
        *pipe.staged_mut() = 9;
        assert_eq!(pipe.delete(3), Some(4));
        assert_eq!(pipe.write_index(), 4);
        assert_eq!(*pipe.staged(), 9);

        assert_eq!(pipe.delete(0), Some(1));
        assert_eq!(*pipe.staged(), 9);
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut pipe: Pipe<u8, 4> = Pipe::new();
        pipe.write(&[1]);
        assert_eq!(pipe.delete(1), None);
        assert_eq!(pipe.used_count(), 1);
    }
}
