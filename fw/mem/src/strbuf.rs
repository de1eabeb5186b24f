//! Fixed-capacity ASCII line buffer
//!
//! Used by console line editing where a heap string is not available.

use core::fmt;

/// Up to `N` ASCII characters held inline.
#[derive(Clone, Copy)]
pub struct StrBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> StrBuf<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append one character. Returns false if the buffer is full or `ch`
    /// is not ASCII.
    pub fn push(&mut self, ch: char) -> bool {
        if self.is_full() || !ch.is_ascii() {
            return false;
        }
        self.buf[self.len] = ch as u8;
        self.len += 1;
        true
    }

    /// Append as much of `s` as fits; returns the number of characters
    /// taken. Stops at the first non-ASCII character.
    pub fn push_str(&mut self, s: &str) -> usize {
        s.chars().take_while(|&ch| self.push(ch)).count()
    }

    /// Remove the last character, as a backspace does.
    pub fn pop(&mut self) -> Option<char> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.buf[self.len] as char)
    }

    pub const fn max_len(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII is ever stored.
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl<const N: usize> Default for StrBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PartialEq for StrBuf<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for StrBuf<N> {}

impl<const N: usize> From<&str> for StrBuf<N> {
    /// Truncates to the first `N` characters.
    fn from(s: &str) -> Self {
        let mut buf = Self::new();
        buf.push_str(s);
        buf
    }
}

impl<const N: usize> fmt::Display for StrBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for StrBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_stops_when_full() {
        let mut buf: StrBuf<4> = StrBuf::new();
        assert_eq!(buf.push_str("status"), 4);
        assert!(buf.is_full());
        assert!(!buf.push('x'));
        assert_eq!(buf.as_str(), "stat");
    }

    #[test]
    fn test_pop_and_compare_ignore_stale_bytes() {
        let mut a: StrBuf<8> = StrBuf::from("led");
        assert_eq!(a.pop(), Some('d'));
        a.push('g');
        assert_eq!(a, StrBuf::from("leg"));
        assert_ne!(a, StrBuf::from("le"));

        let mut b: StrBuf<8> = StrBuf::from("ab");
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.pop(), None);
        assert_eq!(b, StrBuf::default());
    }

    #[test]
    fn test_non_ascii_rejected() {
        let mut buf: StrBuf<8> = StrBuf::new();
        assert_eq!(buf.push_str("ok\u{e9}x"), 2);
        assert_eq!(buf.len(), 2);
    }
}
