//! Object stores the bundle pipelines persist into.

#[cfg(feature = "disk-storage")]
pub mod disk;
pub mod memory;
pub mod traits;

#[cfg(feature = "disk-storage")]
pub use disk::FileObjectStore;
pub use memory::MemoryObjectStore;
pub use traits::ObjectStore;
