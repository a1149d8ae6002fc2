pub mod mocks;

pub use mocks::{MockSink, accepting_sink};
