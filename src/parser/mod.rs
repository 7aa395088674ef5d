pub mod graph_builder;
pub(crate) mod recursion;
pub mod trace_reader;

// Re-export key types from the parser module
pub use graph_builder::GraphBuilder;
pub use trace_reader::{TraceReader, TraceRecord, TraceWriter};
