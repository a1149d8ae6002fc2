//! Mock sinks standing in for files and sockets.
use mockall::mock;

use std::io::{self, Write};

mock! {
    pub Sink {}
    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }
}

/// A sink accepting every write and expecting exactly `flushes` flushes.
pub fn accepting_sink(flushes: usize) -> MockSink {
    let mut sink = MockSink::new();
    sink.expect_write().returning(|buf| Ok(buf.len()));
    sink.expect_flush().times(flushes).returning(|| Ok(()));
    sink
}
