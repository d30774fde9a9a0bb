//! # Cambrium
//!
//! Turns a block's nonce into a reproducible population of organisms and
//! evolves their traits as the block gathers confirmations.
//!
//! The engine lives in [`cambrium_core`]; the plain records it exchanges
//! with renderers and persistence layers live in [`cambrium_data`]. This
//! crate adds the command-line front end.

pub mod cli;

pub use cambrium_core;
pub use cambrium_data;
