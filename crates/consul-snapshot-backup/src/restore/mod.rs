//! Restore path: version detection, loading and replay

pub mod compatibility;
pub mod inspect;
pub mod loader;
pub mod replay;

pub use compatibility::Compatibility;
pub use inspect::{inspect, ArchiveVersion};
pub use loader::load;
pub use replay::{RestoreReport, Restorer};
