//! Core data structures for the Cambrium engine.

pub mod chain;
pub mod event;
pub mod formation;
pub mod role;
pub mod taxonomy;
