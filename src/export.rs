// 📤 Export - history as CSV (one row per record) or the raw persisted JSON array

use crate::record::Record;
use crate::summary::history_rows;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "#")]
    number: usize,

    #[serde(rename = "Type")]
    record_type: &'a str,

    #[serde(rename = "Main Info")]
    primary_info: &'a str,

    #[serde(rename = "Date")]
    date: &'a str,

    #[serde(rename = "Details")]
    details: String,
}

pub fn export<W: Write>(records: &[Record], format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(records, writer),
        ExportFormat::Json => write_json(records, writer),
    }
}

pub fn write_csv<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for (row, record) in history_rows(records).iter().zip(records) {
        let details = record
            .details()
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");

        wtr.serialize(ExportRow {
            number: row.number,
            record_type: &row.record_type,
            primary_info: &row.primary_info,
            date: &row.date,
            details,
        })
        .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[Record], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records).context("Failed to write JSON")?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;
    use crate::store::parse_records;

    fn sample() -> Vec<Record> {
        vec![
            Record::new(RecordType::Expense, "2024-01-01")
                .with_field("amount", 20)
                .with_field("category", "Food")
                .with_field("method", "Cash")
                .with_field("note", "Tacos"),
            Record::new(RecordType::Work, "2024-01-02")
                .with_field("task", "Report")
                .with_field("category", "Work")
                .with_field("focus", 4)
                .with_field("hours", 3),
        ]
    }

    #[test]
    fn test_csv_export() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "#,Type,Main Info,Date,Details");
        assert_eq!(
            lines[1],
            "1,expense,$20 • Food,2024-01-01,Amount: $20; Category: Food; Method: Cash; Note: Tacos"
        );
        assert!(lines[2].starts_with("2,work,Report • 3 hrs,2024-01-02,"));
    }

    #[test]
    fn test_csv_export_empty_has_no_rows() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_export_parses_back() {
        let mut out = Vec::new();
        export(&sample(), ExportFormat::Json, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(parse_records(&text).unwrap(), sample());
    }
}
