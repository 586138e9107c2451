//! CSV rendering of tabular results for tool output.

#[cfg(test)]
mod tests;

use csv::{QuoteStyle, WriterBuilder};

use crate::connector::QueryResult;
use crate::{Result, ServerError};

/// Render column names plus rows as CSV text, header line first.
///
/// Every field is quoted, embedded quotes are doubled, and NULL cells render
/// as empty fields. The output parses back to the input with any standard
/// CSV reader.
#[inline]
pub fn to_csv(columns: &[String], rows: &[Vec<Option<String>>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(columns)
        .map_err(|e| ServerError::Query(format!("CSV encoding failed: {e}")))?;

    for row in rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or_default()))
            .map_err(|e| ServerError::Query(format!("CSV encoding failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServerError::Query(format!("CSV encoding failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ServerError::Query(format!("CSV encoding failed: {e}")))
}

/// Render a full query result as CSV text.
#[inline]
pub fn query_result_to_csv(result: &QueryResult) -> Result<String> {
    to_csv(&result.columns, &result.rows)
}
