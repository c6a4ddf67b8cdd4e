//! CSV output in the ISEE/Dynarev column layout.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::types::{FormType, MetadataBlock, Row, SourceContext};

/// Output columns, in order. This is the contract with the ISEE load job.
pub const ISEE_COLUMNS: [&str; 7] = [
    "SKJEMA_ID",
    "DELREG_NR",
    "IDENT_NR",
    "ENHETS_TYPE",
    "FELTNAVN",
    "FELTVERDI",
    "VERSION_NR",
];

/// Optional trailing column with the nesting level of each field.
pub const LEVEL_COLUMN: &str = "LEVEL";

/// Write rows as CSV with the ISEE header.
///
/// The header is written even when there are no rows. Missing values are
/// written as empty cells. A [`LEVEL_COLUMN`] is appended when the rows
/// carry levels; rows must then all carry one.
pub fn write_csv<W: Write>(writer: W, rows: &[Row]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if rows.iter().any(|row| row.level.is_some()) {
        csv_writer.write_record(ISEE_COLUMNS.iter().chain([&LEVEL_COLUMN]))?;
    } else {
        csv_writer.write_record(ISEE_COLUMNS)?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Write rows to a CSV file, replacing it if it exists.
pub fn write_csv_file(path: &Path, rows: &[Row]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, rows)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "Wrote CSV");
    Ok(())
}

/// ISEE file name for a form: `RA<number>A3_<version>.csv`.
///
/// Hyphens are dropped and an `RS` prefix is written as `RA`.
///
/// # Examples
/// ```
/// use altinn_isee::output::isee_filename;
///
/// assert_eq!(isee_filename("RA-0297", "a9b867d4a91c"), "RA0297A3_a9b867d4a91c.csv");
/// assert_eq!(isee_filename("RS345", "12345"), "RA345A3_12345.csv");
/// ```
pub fn isee_filename(ra_number: &str, version_number: &str) -> String {
    let code = ra_number.trim().replace('-', "");
    let number = code
        .strip_prefix("RA")
        .or_else(|| code.strip_prefix("RS"))
        .unwrap_or(&code);
    format!("RA{number}A3_{version_number}.csv")
}

/// Output file name for a converted form.
///
/// Uses [`isee_filename`] when the form carries a `raNummer`, otherwise
/// `<form id>.csv`.
pub fn output_filename(metadata: &MetadataBlock, source: &SourceContext) -> String {
    match &metadata.ra_number {
        Some(ra_number) => isee_filename(ra_number, &source.version_number),
        None => format!("{}.csv", source.form_id),
    }
}
