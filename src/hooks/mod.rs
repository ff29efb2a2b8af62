//! Bundled hook implementations

pub mod memory;
pub mod writer;

pub use memory::MemoryHook;
pub use writer::WriterHook;
