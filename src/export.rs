//! Flat CSV export of an augmented series.
//!
//! The first column is `Date` (`YYYY-MM-DD`), followed by every column of the
//! series in its own order. Undefined cells are written as empty fields and
//! read back as `None`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt, bail};

use crate::error::ExportError;
use crate::model::{Column, Series};

const DATE_HEADER: &str = "Date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name used when the caller does not choose one, e.g.
/// `AAPL_1mo_stock_data.csv`.
pub fn default_file_name(symbol: &str, period_label: &str) -> String {
    format!("{symbol}_{period_label}_stock_data.csv")
}

pub fn write_csv<W: Write>(series: &Series, writer: W) -> Result<(), Report<ExportError>> {
    let mut writer = csv::Writer::from_writer(writer);

    let header: Vec<&str> = std::iter::once(DATE_HEADER)
        .chain(series.columns().map(|(c, _)| c.as_str()))
        .collect();
    writer
        .write_record(&header)
        .change_context(ExportError::Write)?;

    let columns: Vec<&[Option<f64>]> = series.columns().map(|(_, values)| values).collect();
    for (row, date) in series.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(date.format(DATE_FORMAT).to_string());
        for values in &columns {
            record.push(values[row].map(|v| v.to_string()).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .change_context(ExportError::Write)
            .attach_with(|| format!("date: {date}"))?;
    }

    writer.flush().change_context(ExportError::Write)?;
    Ok(())
}

/// Write `series` to `path`, creating parent directories as needed.
pub fn save_csv(series: &Series, path: &Path) -> Result<(), Report<ExportError>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .change_context(ExportError::Write)
            .attach_with(|| format!("cannot create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .change_context(ExportError::Write)
        .attach_with(|| format!("path: {}", path.display()))?;
    write_csv(series, file).attach_with(|| format!("path: {}", path.display()))
}

pub fn read_csv<R: Read>(symbol: &str, reader: R) -> Result<Series, Report<ExportError>> {
    let mut reader = csv::ReaderBuilder::new().from_reader(reader);

    let headers = reader.headers().change_context(ExportError::Read)?.clone();
    let mut fields = headers.iter().map(str::trim);
    if fields.next() != Some(DATE_HEADER) {
        bail!(ExportError::Parse {
            reason: format!("first column must be {DATE_HEADER}"),
        });
    }
    let columns = fields
        .map(|name| {
            Column::from_str(name).ok_or_else(|| {
                Report::new(ExportError::Parse {
                    reason: format!("unknown column \"{name}\""),
                })
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut dates = Vec::new();
    let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record
            .change_context(ExportError::Read)
            .attach_with(|| format!("record: {}", line + 1))?;

        dates.push(parse_date(record.get(0).unwrap_or_default())?);
        for (values, field) in cells.iter_mut().zip(record.iter().skip(1)) {
            values.push(parse_cell(field)?);
        }
    }

    Series::new(symbol, dates, columns.into_iter().zip(cells).collect()).change_context(
        ExportError::Parse {
            reason: "rows do not form a valid series".into(),
        },
    )
}

pub fn load_csv(symbol: &str, path: &Path) -> Result<Series, Report<ExportError>> {
    let file = File::open(path)
        .change_context(ExportError::Read)
        .attach_with(|| format!("path: {}", path.display()))?;
    read_csv(symbol, file).attach_with(|| format!("path: {}", path.display()))
}

/// Accepts plain dates as well as timestamps such as
/// `2024-01-02 00:00:00-05:00`, keeping only the calendar date.
fn parse_date(field: &str) -> Result<NaiveDate, Report<ExportError>> {
    let field = field.trim();
    let day = field.split([' ', 'T']).next().unwrap_or(field);
    NaiveDate::parse_from_str(day, DATE_FORMAT).change_context(ExportError::Parse {
        reason: format!("invalid date \"{field}\""),
    })
}

fn parse_cell(field: &str) -> Result<Option<f64>, Report<ExportError>> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .change_context(ExportError::Parse {
            reason: format!("invalid number \"{field}\""),
        })
}
