// Media sink implementations.

mod process;

pub use process::ProcessSink;
