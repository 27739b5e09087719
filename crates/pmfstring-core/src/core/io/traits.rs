use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error at record {record}: {source}")]
    Csv { record: usize, source: csv::Error },
}

/// Defines the interface for reading and writing a headed CSV table.
///
/// Each implementor names the record type of one table layout. Reading
/// requires a header row whose column names match the record's field names;
/// writing always emits that header.
pub trait CsvTable {
    /// The row type of the table.
    type Record: Serialize + DeserializeOwned;

    /// Reads every record from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Csv`] with the 1-based record number of the first
    /// row that cannot be parsed.
    fn read_from(reader: impl Read) -> Result<Vec<Self::Record>, IoError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        csv_reader
            .deserialize::<Self::Record>()
            .enumerate()
            .map(|(i, row)| row.map_err(|source| IoError::Csv { record: i + 1, source }))
            .collect()
    }

    /// Writes the header and every record to a writer.
    fn write_to(records: &[Self::Record], writer: impl Write) -> Result<(), IoError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (i, record) in records.iter().enumerate() {
            csv_writer
                .serialize(record)
                .map_err(|source| IoError::Csv { record: i + 1, source })?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Reads every record from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Self::Record>, IoError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Writes the header and every record to a file path.
    fn write_to_path<P: AsRef<Path>>(records: &[Self::Record], path: P) -> Result<(), IoError> {
        let file = File::create(path)?;
        Self::write_to(records, BufWriter::new(file))
    }
}
