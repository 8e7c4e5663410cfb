//! CSV export of chart series.

use crate::series::SeriesMap;
use crate::Result;
use std::io::Write;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    exercise: &'a str,
    date: String,
    max_weight: f64,
    avg_weight: f64,
}

/// Write one row per data point, series in map order.
pub fn write_series_csv<W: Write>(writer: W, series: &SeriesMap) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    let mut rows = 0;
    for (exercise, s) in series.iter() {
        for i in 0..s.len() {
            writer.serialize(CsvRow {
                exercise,
                date: s.dates[i].to_string(),
                max_weight: s.max_weights[i],
                avg_weight: s.avg_weights[i],
            })?;
            rows += 1;
        }
    }

    // Header row only appears with the first record; write it for empty output too.
    if rows == 0 {
        writer.write_record(["exercise", "date", "max_weight", "avg_weight"])?;
    }

    writer.flush()?;
    tracing::debug!("Wrote {} CSV rows", rows);
    Ok(())
}
