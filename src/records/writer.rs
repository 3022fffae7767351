use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use log::debug;

use super::RoundRecord;
use crate::error::Result;

/// Appends records to any writer, one line each.
#[derive(Debug)]
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes `record` followed by a newline.
    pub fn write(&mut self, record: &RoundRecord) -> Result<()> {
        let line = record.to_line()?;
        writeln!(self.inner, "{line}")?;
        Ok(())
    }

    /// Writes every record of `batch`, or none of them if one can't be rendered.
    pub fn write_all(&mut self, batch: &[RoundRecord]) -> Result<()> {
        let lines = batch
            .iter()
            .map(RoundRecord::to_line)
            .collect::<Result<Vec<_>>>()?;

        for line in lines {
            writeln!(self.inner, "{line}")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads every record from `reader`, skipping lines that aren't records.
///
/// # Errors
/// `Io` on a read failure, `MalformedRecord` for a record line that doesn't
/// parse. Line numbers are 1-based.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<RoundRecord>> {
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if !RoundRecord::is_record_line(&line) {
            if !line.trim().is_empty() {
                debug!(line = i + 1; "skipping non record line");
            }
            continue;
        }
        records.push(RoundRecord::parse(&line, i + 1)?);
    }

    Ok(records)
}

pub fn read_records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RoundRecord>> {
    let file = File::open(path)?;
    read_records(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::{aggregation::Metrics, error::FedAvgError, records::Phase};

    #[test]
    fn written_records_read_back_among_log_noise() {
        let mut writer = RecordWriter::new(Vec::new());
        let records: Vec<_> = (1..=3)
            .map(|r| {
                RoundRecord::new(
                    NonZeroU32::new(r).unwrap(),
                    Phase::Evaluate,
                    Some(1.0 / r as f64),
                    Metrics::from([("accuracy".to_string(), 0.3 * r as f64)]),
                )
            })
            .collect();

        for record in &records {
            writer.write(record).unwrap();
        }

        let mut log = b"INFO starting simulation\n\n".to_vec();
        log.extend(writer.into_inner());
        log.extend(b"INFO done\n");

        assert_eq!(read_records(log.as_slice()).unwrap(), records);
    }

    #[test]
    fn malformed_record_reports_its_line() {
        let log = "noise\nv=1 round=1 phase=fit\nv=1 round=x phase=fit\n";
        match read_records(log.as_bytes()) {
            Err(FedAvgError::MalformedRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }
}
