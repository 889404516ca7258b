//! reassemblahtml — normalizes HTML-ish markup whose tags were split
//! across physical lines.
//!
//! The interesting part is [`reassemble`]: a single-pass state machine
//! that trims each line, counts open/close tokens, merges an unfinished
//! fragment into the following line, and emits one logical tag group per
//! output line. [`outfile`] is the surrounding plumbing: timestamped
//! output names and create-only writes.

pub mod outfile;
pub mod reassemble;

pub use outfile::{timestamped_name, write_cleaned, WriteError};
pub use reassemble::{Action, LineEvent, LogTrace, Reassembler, TagMode, Trace};
