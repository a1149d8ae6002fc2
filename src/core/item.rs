use crate::error::TabularError;

/// Destination for records, written a slice at a time.
///
/// `open` is called before the first `write` and `close` after the last one.
/// `flush` pushes buffered output to the sink without ending the table.
pub trait ItemWriter<R> {
    fn write(&self, items: &[R]) -> Result<(), TabularError>;
    fn flush(&self) -> Result<(), TabularError>;
    fn open(&self) -> Result<(), TabularError> {
        Ok(())
    }
    fn close(&self) -> Result<(), TabularError> {
        Ok(())
    }
}
