//! Command line history
//!
//! Committed lines live in a [`Pipe`]; the line being edited is staged in
//! the pipe's write slot so committing it is just an index increment.
//! A browse index walks the history for up/down recall.

use crate::pipe::Pipe;
use crate::strbuf::StrBuf;

/// History of up to `DEPTH - 1` lines of `N` characters each.
#[derive(Debug, Clone)]
pub struct HistBuf<const N: usize, const DEPTH: usize> {
    pipe: Pipe<StrBuf<N>, DEPTH>,
    browse_index: usize,
}

impl<const N: usize, const DEPTH: usize> Default for HistBuf<N, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const DEPTH: usize> HistBuf<N, DEPTH> {
    const MASK: usize = Pipe::<StrBuf<N>, DEPTH>::MASK;

    pub fn new() -> Self {
        Self {
            pipe: Pipe::new(),
            browse_index: 0,
        }
    }

    /// Drop all history and the line being edited.
    pub fn reset(&mut self) {
        self.pipe.reset();
        self.pipe.staged_mut().clear();
        self.browse_index = self.pipe.write_index();
    }

    pub fn len(&self) -> usize {
        self.pipe.used_count()
    }

    pub fn is_empty(&self) -> bool {
        self.pipe.is_empty()
    }

    /// Committed lines, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = StrBuf<N>> + '_ {
        (0..self.pipe.used_count()).filter_map(move |offset| self.pipe.get(offset))
    }

    pub fn edit_buf(&self) -> &StrBuf<N> {
        self.pipe.staged()
    }

    pub fn edit_buf_mut(&mut self) -> &mut StrBuf<N> {
        self.pipe.staged_mut()
    }

    /// Line under the browse index. The edit line when not browsing.
    pub fn browse_buf(&self) -> StrBuf<N> {
        if self.is_browsing() {
            let offset = self.browse_index.wrapping_sub(self.pipe.read_index()) & Self::MASK;
            self.pipe.get(offset).unwrap_or_default()
        } else {
            *self.pipe.staged()
        }
    }

    pub fn is_browsing(&self) -> bool {
        self.browse_index != self.pipe.write_index()
    }

    /// Step to the previous line. False at the oldest one.
    pub fn up(&mut self) -> bool {
        if self.browse_index == self.pipe.read_index() {
            return false;
        }
        self.browse_index = self.browse_index.wrapping_sub(1) & Self::MASK;
        true
    }

    /// Step to the next line. False once back at the edit line.
    pub fn down(&mut self) -> bool {
        if !self.is_browsing() {
            return false;
        }
        self.browse_index = (self.browse_index + 1) & Self::MASK;
        true
    }

    pub fn reset_browse(&mut self) {
        self.browse_index = self.pipe.write_index();
    }

    /// Replace the edit line with the browsed one and stop browsing.
    pub fn copy_browse_to_edit(&mut self) {
        if self.is_browsing() {
            *self.pipe.staged_mut() = self.browse_buf();
            self.reset_browse();
        }
    }

    /// Append the edit line to the history and start a fresh one.
    ///
    /// An earlier identical line is removed first. When the history is
    /// full the oldest line is dropped. Empty lines are not recorded.
    pub fn commit_edit(&mut self) {
        let edit = *self.pipe.staged();
        if edit.is_empty() {
            return;
        }
        let duplicate = self.entries().position(|line| line == edit);
        if let Some(offset) = duplicate {
            self.pipe.delete(offset);
        }
        if self.pipe.is_full() {
            self.pipe.inc_read_index(1);
        }
        self.pipe.inc_write_index(1);
        self.pipe.staged_mut().clear();
        self.reset_browse();
    }
}
