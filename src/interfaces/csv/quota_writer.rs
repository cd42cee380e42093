use crate::domain::quota::QuotaSummary;
use crate::error::{ClientError, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct QuotaRow<'a> {
    quota: &'a str,
    unit: &'a str,
    limit: f64,
    used: f64,
    remaining: f64,
    percentage: f64,
}

/// Writes quota summaries as `quota,unit,limit,used,remaining,percentage`.
pub struct QuotaWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> QuotaWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header even when `summaries` is empty.
    pub fn write_summaries(&mut self, summaries: &[QuotaSummary]) -> Result<()> {
        if summaries.is_empty() {
            self.writer
                .write_record(["quota", "unit", "limit", "used", "remaining", "percentage"])
                .map_err(csv_error)?;
        }
        for summary in summaries {
            self.writer
                .serialize(QuotaRow {
                    quota: &summary.quota_type.name,
                    unit: &summary.quota_type.unit,
                    limit: summary.limit,
                    used: summary.used,
                    remaining: summary.remaining,
                    percentage: summary.percentage,
                })
                .map_err(csv_error)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

pub(crate) fn csv_error(e: csv::Error) -> ClientError {
    ClientError::IoError(std::io::Error::other(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quota::{QuotaType, TimeWindow};

    fn summary(name: &str, used: f64) -> QuotaSummary {
        QuotaSummary {
            quota_type: QuotaType {
                id: format!("qt-{name}"),
                application_id: "app".to_string(),
                name: name.to_string(),
                description: None,
                unit: "calls".to_string(),
                time_window: TimeWindow::Month,
                created_at: "2024-01-01T00:00:00".to_string(),
            },
            limit: 100.0,
            used,
            remaining: 100.0 - used,
            percentage: used,
            time_window: TimeWindow::Month,
            window_start: "2024-01-01T00:00:00".to_string(),
            window_end: "2024-02-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_writes_one_row_per_summary() {
        let mut out = Vec::new();
        QuotaWriter::new(&mut out)
            .write_summaries(&[summary("segmentation", 25.0), summary("processing", 0.5)])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "quota,unit,limit,used,remaining,percentage");
        assert_eq!(lines[1], "segmentation,calls,100.0,25.0,75.0,25.0");
        assert_eq!(lines[2], "processing,calls,100.0,0.5,99.5,0.5");
    }

    #[test]
    fn test_empty_summary_still_has_header() {
        let mut out = Vec::new();
        QuotaWriter::new(&mut out).write_summaries(&[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "quota,unit,limit,used,remaining,percentage\n"
        );
    }
}
