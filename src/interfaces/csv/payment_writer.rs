use super::quota_writer::csv_error;
use crate::domain::payment::PaymentTransaction;
use crate::error::Result;
use std::io::Write;

/// Streams `payment,attempt,status` lines, one per observed status, flushing
/// after each so a watcher sees progress live. `attempt` is the poll attempt
/// that observed the status, so attempts lost to failed fetches leave gaps.
pub struct PaymentStatusWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentStatusWriter<W> {
    pub fn new(sink: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(sink);
        writer
            .write_record(["payment", "attempt", "status"])
            .map_err(csv_error)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn write_status(&mut self, attempt: u32, payment: &PaymentTransaction) -> Result<()> {
        self.writer
            .write_record([
                payment.id.as_str(),
                &attempt.to_string(),
                payment.status.as_str(),
            ])
            .map_err(csv_error)?;
        self.writer.flush()?;
        Ok(())
    }
}
