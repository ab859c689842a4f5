mod jsonl;
mod memory;
mod sink;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use sink::{MetricsSink, Scalar};
