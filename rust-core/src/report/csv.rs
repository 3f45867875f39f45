//! CSV export of the normalized spectrum pair

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::ReportError;
use crate::spectrum::Spectrum;

/// Quote a header field if it contains a delimiter, quote or newline
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write `frequency,<label1>_dB,<label2>_dB` rows to any writer
///
/// Rows follow the first spectrum's frequency axis; both spectra must have
/// the same number of bins.
pub fn write_spectrum_table<W: Write>(
    mut out: W,
    first: (&str, &Spectrum),
    second: (&str, &Spectrum),
) -> Result<usize, ReportError> {
    let (label1, spectrum1) = first;
    let (label2, spectrum2) = second;

    if spectrum1.len() != spectrum2.len() {
        return Err(ReportError::LengthMismatch {
            first: spectrum1.len(),
            second: spectrum2.len(),
        });
    }

    writeln!(
        out,
        "frequency,{},{}",
        escape_field(&format!("{}_dB", label1)),
        escape_field(&format!("{}_dB", label2))
    )?;

    for ((freq, db1), db2) in spectrum1
        .frequencies
        .iter()
        .zip(spectrum1.magnitudes_db.iter())
        .zip(spectrum2.magnitudes_db.iter())
    {
        writeln!(out, "{:?},{:?},{:?}", freq, db1, db2)?;
    }

    out.flush()?;
    Ok(spectrum1.len())
}

/// Write the comparison CSV, overwriting `path`
///
/// # Returns
/// Number of data rows written
pub fn write_spectrum_csv(
    path: &Path,
    first: (&str, &Spectrum),
    second: (&str, &Spectrum),
) -> Result<usize, ReportError> {
    let file = File::create(path)?;
    let rows = write_spectrum_table(BufWriter::new(file), first, second)?;
    log::info!("Saved spectrum data to '{}' ({} rows)", path.display(), rows);
    Ok(rows)
}
