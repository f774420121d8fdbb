//! Adapters that live in-process. Network backends are in `harvest-adapters`.

pub mod memory;

pub use memory::{MemoryDatabase, MemoryStorage};
