//! Logging abstractions for runtime-agnostic logging

mod traits;
mod noop;
mod console;
mod memory;
mod tracing_sink;

pub use traits::{Logger, LogLevel};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
pub use tracing_sink::TracingLogger;
