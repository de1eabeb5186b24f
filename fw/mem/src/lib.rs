#![no_std]
#![forbid(unsafe_code)]

//! # FW Memory
//!
//! Fixed-size containers used by drivers and components: the [`Pipe`] ring
//! buffer, the [`Map`] associative store, the [`SeqRec`] record of
//! outstanding requests, the [`Shared`] critical-section guard, and the
//! [`StrBuf`]/[`HistBuf`] pair behind console line editing.
//! None of them allocate.

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod histbuf;
pub mod map;
pub mod pipe;
pub mod seqrec;
pub mod shared;
pub mod strbuf;

pub use histbuf::*;
pub use map::*;
pub use pipe::*;
pub use seqrec::*;
pub use shared::*;
pub use strbuf::*;
