// Shared primitives for the sift analyzer: source spans, line lookup,
// content hashing.

pub mod hash;
pub mod span;

pub use hash::sha1_hex;
pub use span::{LineIndex, Span};
