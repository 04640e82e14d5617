//! Typed decoding of Bulk API result CSVs.
//!
//! The first row of every result set is a header. Salesforce puts its own
//! metadata columns (`sf__Id`, `sf__Created`, `sf__Error`) first; every column
//! after them is a user field and is kept in header order.
//!
//! A parse is all or nothing: a malformed row, a row whose width differs from
//! the header, a missing reserved column or a created flag that is not a
//! boolean literal fails the whole call. An empty input yields no records.

use std::io::Read;

use crate::error::{Error, ErrorKind, Result};
use crate::types::ColumnDelimiter;

pub const ID_COLUMN: &str = "sf__Id";
pub const CREATED_COLUMN: &str = "sf__Created";
pub const ERROR_COLUMN: &str = "sf__Error";

/// Column offset where user fields start in successful and failed results.
const JOB_FIELD_OFFSET: usize = 2;

/// Header-keyed field values of one row, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    /// Value of the column named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A record the job never processed, as it was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprocessedRecord {
    pub fields: Fields,
}

/// A processed record: its Salesforce ID plus its field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessfulRecord {
    /// True when the operation created the record rather than updating it.
    pub created: bool,
    pub record: JobRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    pub error: String,
    pub record: JobRecord,
}

impl SuccessfulRecord {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn fields(&self) -> &Fields {
        &self.record.fields
    }
}

impl FailedRecord {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn fields(&self) -> &Fields {
        &self.record.fields
    }
}

/// Parse a `successfulResults` CSV.
pub fn parse_successful<R: Read>(reader: R, delimiter: ColumnDelimiter) -> Result<Vec<SuccessfulRecord>> {
    let Some(table) = Table::read(reader, delimiter)? else {
        return Ok(Vec::new());
    };
    let id = table.column(ID_COLUMN)?;
    let created = table.column(CREATED_COLUMN)?;

    table
        .rows
        .iter()
        .map(|row| -> Result<SuccessfulRecord> {
            Ok(SuccessfulRecord {
                created: parse_bool(&row[created])?,
                record: JobRecord {
                    id: row[id].clone(),
                    fields: table.fields(row, JOB_FIELD_OFFSET),
                },
            })
        })
        .collect()
}

/// Parse a `failedResults` CSV.
pub fn parse_failed<R: Read>(reader: R, delimiter: ColumnDelimiter) -> Result<Vec<FailedRecord>> {
    let Some(table) = Table::read(reader, delimiter)? else {
        return Ok(Vec::new());
    };
    let id = table.column(ID_COLUMN)?;
    let error = table.column(ERROR_COLUMN)?;

    Ok(table
        .rows
        .iter()
        .map(|row| FailedRecord {
            error: row[error].clone(),
            record: JobRecord {
                id: row[id].clone(),
                fields: table.fields(row, JOB_FIELD_OFFSET),
            },
        })
        .collect())
}

/// Parse an `unprocessedrecords` CSV.
pub fn parse_unprocessed<R: Read>(reader: R, delimiter: ColumnDelimiter) -> Result<Vec<UnprocessedRecord>> {
    Ok(parse_rows(reader, delimiter)?
        .into_iter()
        .map(|fields| UnprocessedRecord { fields })
        .collect())
}

/// Parse a CSV with no reserved columns, such as a query result page.
pub fn parse_rows<R: Read>(reader: R, delimiter: ColumnDelimiter) -> Result<Vec<Fields>> {
    let Some(table) = Table::read(reader, delimiter)? else {
        return Ok(Vec::new());
    };
    Ok(table.rows.iter().map(|row| table.fields(row, 0)).collect())
}

/// Accepts exactly the literals `1 t T TRUE true True 0 f F FALSE false False`.
pub(crate) fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(Error::new(ErrorKind::InvalidBool(other.to_string()))),
    }
}

struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// `None` when the input holds no header row.
    fn read<R: Read>(reader: R, delimiter: ColumnDelimiter) -> Result<Option<Table>> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .delimiter(delimiter.byte())
            .from_reader(reader);

        let mut records = csv.records();
        let header: Vec<String> = match records.next() {
            Some(header) => header?.iter().map(str::to_string).collect(),
            None => return Ok(None),
        };

        let rows = records
            .map(|record| -> Result<Vec<String>> {
                Ok(record?.iter().map(str::to_string).collect())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Table { header, rows }))
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| Error::new(ErrorKind::MissingColumn(name.to_string())))
    }

    fn fields(&self, row: &[String], offset: usize) -> Fields {
        self.header
            .iter()
            .zip(row)
            .skip(offset)
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect()
    }
}
