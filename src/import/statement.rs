//! Card statement CSV parsing.
//!
//! Statements are `;`-separated with decimal-comma amounts. Header spelling
//! drifts between exports (quoted or not, `Posteringsdato` vs
//! `posteringsdato`), so headers are mapped onto [`Column`] through a fixed
//! alias table and everything else is ignored.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::models::{AmountError, Milliunits};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    PurchaseDate,
    PostingDate,
    Description,
    Amount,
}

impl Column {
    const REQUIRED: [Column; 3] = [Column::PostingDate, Column::Description, Column::Amount];

    /// Recognise a header cell. Quotes, surrounding whitespace and a UTF-8
    /// byte order mark are ignored, as is case.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = header
            .trim_start_matches('\u{feff}')
            .replace('"', "")
            .trim()
            .to_lowercase();
        match normalized.as_str() {
            "kjøpsdato" | "purchase date" => Some(Column::PurchaseDate),
            "posteringsdato" | "booking date" | "posting date" => Some(Column::PostingDate),
            "beskrivelse" | "description" => Some(Column::Description),
            "beløp" | "amount" => Some(Column::Amount),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Column::PurchaseDate => "Kjøpsdato",
            Column::PostingDate => "Posteringsdato",
            Column::Description => "Beskrivelse",
            Column::Amount => "Beløp",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CsvRowError {
    #[error("line {line}: missing {column}")]
    MissingField { line: u64, column: &'static str },
    #[error("line {line}: invalid date {value:?}")]
    InvalidDate { line: u64, value: String },
    #[error("line {line}: {source}")]
    InvalidAmount {
        line: u64,
        #[source]
        source: AmountError,
    },
    #[error("line {line}: {message}")]
    Malformed { line: u64, message: String },
}

/// One purchase from the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRow {
    pub purchase_date: Option<NaiveDate>,
    /// Settlement date; this is the date written to the ledger.
    pub posting_date: NaiveDate,
    pub description: String,
    pub amount: Milliunits,
}

#[derive(Debug, Default)]
pub struct ParsedStatement {
    pub rows: Vec<StatementRow>,
    pub rejected: Vec<CsvRowError>,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().trim_matches('"').trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cleaned, format).ok())
}

fn cell<'r>(record: &'r StringRecord, columns: &HashMap<Column, usize>, column: Column) -> Option<&'r str> {
    columns
        .get(&column)
        .and_then(|&index| record.get(index))
        .map(|value| value.trim().trim_matches('"').trim())
        .filter(|value| !value.is_empty())
}

fn parse_row(
    record: &StringRecord,
    columns: &HashMap<Column, usize>,
    line: u64,
) -> Result<StatementRow, CsvRowError> {
    let required = |column: Column| {
        cell(record, columns, column).ok_or(CsvRowError::MissingField {
            line,
            column: column.label(),
        })
    };

    let raw_posting = required(Column::PostingDate)?;
    let posting_date = parse_date(raw_posting).ok_or_else(|| CsvRowError::InvalidDate {
        line,
        value: raw_posting.to_string(),
    })?;
    let description = required(Column::Description)?.to_string();
    let amount = Milliunits::parse_localized(required(Column::Amount)?)
        .map_err(|source| CsvRowError::InvalidAmount { line, source })?;
    let purchase_date = cell(record, columns, Column::PurchaseDate).and_then(parse_date);

    Ok(StatementRow {
        purchase_date,
        posting_date,
        description,
        amount,
    })
}

/// Parse a statement. A file without the required columns is an error; a bad
/// row is collected in [`ParsedStatement::rejected`] and parsing carries on.
pub fn parse_statement(content: &str) -> Result<ParsedStatement> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();
    let mut columns: HashMap<Column, usize> = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        if let Some(column) = Column::from_header(header) {
            columns.entry(column).or_insert(index);
        }
    }
    for column in Column::REQUIRED {
        if !columns.contains_key(&column) {
            anyhow::bail!("CSV is missing the {} column", column.label());
        }
    }

    let mut parsed = ParsedStatement::default();
    for (index, record) in reader.records().enumerate() {
        // Fallback when the reader has no position: header is line 1.
        let fallback_line = index as u64 + 2;
        let outcome = match record {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                parse_row(&record, &columns, line)
            }
            Err(e) => Err(CsvRowError::Malformed {
                line: e.position().map_or(fallback_line, |p| p.line()),
                message: e.to_string(),
            }),
        };
        match outcome {
            Ok(row) => parsed.rows.push(row),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping CSV row");
                parsed.rejected.push(e);
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_header_aliases() {
        assert_eq!(Column::from_header("\"Posteringsdato\""), Some(Column::PostingDate));
        assert_eq!(Column::from_header("posteringsdato"), Some(Column::PostingDate));
        assert_eq!(Column::from_header("\u{feff}Kjøpsdato"), Some(Column::PurchaseDate));
        assert_eq!(Column::from_header(" BELØP "), Some(Column::Amount));
        assert_eq!(Column::from_header("Valuta"), None);
    }

    #[test]
    fn test_parse_norwegian_statement() -> Result<()> {
        let content = "\"Kjøpsdato\";\"Posteringsdato\";\"Beskrivelse\";\"Beløp\"\n\
                       2025-01-02;2025-01-04;\"REMA 1000 SANDNES\";-123,45\n\
                       2025-01-03;2025-01-05;Spotify;-119\n";
        let parsed = parse_statement(content)?;

        assert!(parsed.rejected.is_empty());
        assert_eq!(
            parsed.rows,
            vec![
                StatementRow {
                    purchase_date: Some(date("2025-01-02")),
                    posting_date: date("2025-01-04"),
                    description: "REMA 1000 SANDNES".to_string(),
                    amount: Milliunits::new(-123_450),
                },
                StatementRow {
                    purchase_date: Some(date("2025-01-03")),
                    posting_date: date("2025-01-05"),
                    description: "Spotify".to_string(),
                    amount: Milliunits::new(-119_000),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_bad_rows_are_skipped_individually() -> Result<()> {
        let content = "Posteringsdato;Beskrivelse;Beløp\n\
                       2025-01-04;Kiwi;-50,00\n\
                       not-a-date;Kiwi;-50,00\n\
                       2025-01-05;;-10,00\n\
                       2025-01-06;Coop;abc\n\
                       \n\
                       06.01.2025;Coop;-20,5\n";
        let parsed = parse_statement(content)?;

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].posting_date, date("2025-01-06"));
        assert_eq!(parsed.rows[1].amount, Milliunits::new(-20_500));
        assert_eq!(parsed.rejected.len(), 3);
        assert!(matches!(parsed.rejected[0], CsvRowError::InvalidDate { line: 3, .. }));
        assert!(matches!(
            parsed.rejected[1],
            CsvRowError::MissingField { column: "Beskrivelse", .. }
        ));
        assert!(matches!(parsed.rejected[2], CsvRowError::InvalidAmount { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_column_fails_whole_file() {
        let err = parse_statement("Dato;Tekst;Beløp\n2025-01-01;x;1\n").unwrap_err();
        assert!(err.to_string().contains("Posteringsdato"));
    }
}
