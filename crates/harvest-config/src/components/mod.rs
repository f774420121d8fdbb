//! Settings sections

pub mod backend;
pub mod logging;
pub mod storage;
pub mod store;

pub use backend::*;
pub use logging::*;
pub use storage::*;
pub use store::*;
