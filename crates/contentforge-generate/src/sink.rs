use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::GenerationError;

/// Append-only per-table CSV writer.
///
/// One handle per logical table, opened lazily on first write. Records are
/// comma-separated, double-quote enclosed, and newline-terminated so the
/// destination bulk loader's literal parsing rules round-trip exactly; a
/// synthetic header line is written on open and skipped at import time.
pub struct TableSink {
    dir: PathBuf,
    writers: HashMap<String, csv::Writer<BufWriter<File>>>,
    row_counts: BTreeMap<String, u64>,
}

impl TableSink {
    /// Create the sink directory and an empty writer set.
    pub fn create(dir: PathBuf) -> Result<Self, GenerationError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            writers: HashMap::new(),
            row_counts: BTreeMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one row to a table file, opening it (with its header) on the
    /// first write.
    pub fn write(
        &mut self,
        table: &str,
        columns: &[String],
        record: &[String],
    ) -> Result<(), GenerationError> {
        if !self.writers.contains_key(table) {
            let path = self.dir.join(format!("{table}.csv"));
            let file = BufWriter::new(File::create(path)?);
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .quote_style(csv::QuoteStyle::Always)
                .terminator(csv::Terminator::Any(b'\n'))
                .double_quote(true)
                .from_writer(file);
            writer.write_record(columns)?;
            self.writers.insert(table.to_string(), writer);
        }

        let writer = self
            .writers
            .get_mut(table)
            .ok_or_else(|| GenerationError::Model(format!("missing writer for '{table}'")))?;
        writer.write_record(record)?;
        *self.row_counts.entry(table.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// Flush and close every open handle.
    pub fn flush_all(&mut self) -> Result<(), GenerationError> {
        for (_, mut writer) in self.writers.drain() {
            writer.flush()?;
            writer
                .into_inner()
                .map_err(|err| err.into_error())?
                .flush()?;
        }
        Ok(())
    }

    /// Rows written per table so far.
    pub fn row_counts(&self) -> &BTreeMap<String, u64> {
        &self.row_counts
    }

    /// Delete every table file and the containing directory.
    ///
    /// Safe to call even if no file was ever opened.
    pub fn purge(mut self) -> Result<(), GenerationError> {
        self.flush_all()?;
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
