pub mod asset;
pub mod generation;
pub mod storage;

pub use asset::*;
pub use generation::*;
pub use storage::*;
