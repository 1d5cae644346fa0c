//! JSON output for analysis records.

use anyhow::Result;
use neuroscreen_core::{AnalysisRecord, ResultOutput};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// JSON output adapter.
///
/// Writes JSON Lines by default. In array mode records are held until
/// [`ResultOutput::flush`] and written as one JSON array.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    array: Option<ArrayMode>,
}

struct ArrayMode {
    pretty: bool,
    records: Mutex<Vec<AnalysisRecord>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            array: None,
        }
    }

    /// Switches to array mode.
    #[must_use]
    pub fn array(mut self, pretty: bool) -> Self {
        self.array = Some(ArrayMode {
            pretty,
            records: Mutex::new(Vec::new()),
        });
        self
    }

    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, record: &AnalysisRecord) -> Result<()> {
        if let Some(array) = &self.array {
            array
                .records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record.clone());
            return Ok(());
        }
        self.write_line(&serde_json::to_string(record)?)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        if let Some(array) = &self.array {
            let records =
                std::mem::take(&mut *array.records.lock().unwrap_or_else(PoisonError::into_inner));
            let json = if array.pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            self.write_line(&json)?;
        }
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
