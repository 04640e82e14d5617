//! Safe query builder with automatic SOQL injection prevention.
//!
//! # Example
//!
//! ```rust
//! use sfdc_soql::{QueryBuilder, QueryFormatter};
//!
//! let query = QueryBuilder::new("Account")?
//!     .select(&["Id", "Name", "Industry"])
//!     .where_eq("Name", "O'Brien's Company")?
//!     .limit(10);
//!
//! assert_eq!(
//!     query.format()?,
//!     "SELECT Id, Name, Industry FROM Account WHERE Name = 'O\\'Brien\\'s Company' LIMIT 10"
//! );
//! # Ok::<(), sfdc_soql::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::escape;
use crate::formatter::QueryFormatter;

/// Fluent SOQL builder. Identifiers are validated, values are escaped.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    sobject: String,
    fields: Vec<String>,
    conditions: Vec<String>,
    order_by: Vec<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl QueryBuilder {
    /// Start a query against `sobject`.
    pub fn new(sobject: impl AsRef<str>) -> Result<Self> {
        let sobject = sobject.as_ref();
        if !escape::is_safe_identifier(sobject) {
            return Err(Error::invalid_query(format!(
                "invalid SObject name: {sobject}"
            )));
        }

        Ok(Self {
            sobject: sobject.to_string(),
            fields: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    /// Select fields to retrieve. Unsafe names are dropped.
    pub fn select(mut self, fields: &[impl AsRef<str>]) -> Self {
        for field in fields {
            let field: &str = field.as_ref();
            if escape::is_safe_identifier(field) {
                self.fields.push(field.to_string());
            }
        }
        self
    }

    /// `field = 'value'`
    pub fn where_eq(self, field: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let value = escape::escape_string(value.as_ref());
        self.condition(field.as_ref(), |field| format!("{field} = '{value}'"))
    }

    /// `field != 'value'`
    pub fn where_ne(self, field: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let value = escape::escape_string(value.as_ref());
        self.condition(field.as_ref(), |field| format!("{field} != '{value}'"))
    }

    /// `field LIKE '%pattern%'` with wildcards in `pattern` escaped.
    pub fn where_like(self, field: impl AsRef<str>, pattern: impl AsRef<str>) -> Result<Self> {
        let pattern = escape::escape_like(pattern.as_ref());
        self.condition(field.as_ref(), |field| format!("{field} LIKE '%{pattern}%'"))
    }

    /// `field IN ('a', 'b')`
    pub fn where_in(self, field: impl AsRef<str>, values: &[impl AsRef<str>]) -> Result<Self> {
        let values = values
            .iter()
            .map(|v| format!("'{}'", escape::escape_string(v.as_ref())))
            .collect::<Vec<_>>()
            .join(", ");
        self.condition(field.as_ref(), |field| format!("{field} IN ({values})"))
    }

    /// Add a raw WHERE condition.
    ///
    /// **WARNING**: This does NOT escape anything. Only use with trusted input.
    pub fn where_raw(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Add an ORDER BY term.
    pub fn order_by(mut self, field: impl AsRef<str>, ascending: bool) -> Result<Self> {
        let field = checked_identifier(field.as_ref())?;
        let direction = if ascending { "ASC" } else { "DESC" };
        self.order_by.push(format!("{field} {direction}"));
        Ok(self)
    }

    /// Set LIMIT clause.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET clause.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    fn condition(mut self, field: &str, render: impl FnOnce(&str) -> String) -> Result<Self> {
        let field = checked_identifier(field)?;
        self.conditions.push(render(field));
        Ok(self)
    }
}

fn checked_identifier(field: &str) -> Result<&str> {
    if escape::is_safe_identifier(field) {
        Ok(field)
    } else {
        Err(Error::invalid_query(format!("invalid field name: {field}")))
    }
}

impl QueryFormatter for QueryBuilder {
    fn format(&self) -> Result<String> {
        if self.fields.is_empty() {
            return Err(Error::invalid_query("no fields selected"));
        }

        let mut query = format!("SELECT {} FROM {}", self.fields.join(", "), self.sobject);

        if !self.conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.conditions.join(" AND "));
        }

        if !self.order_by.is_empty() {
            query.push_str(" ORDER BY ");
            query.push_str(&self.order_by.join(", "));
        }

        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            query.push_str(&format!(" OFFSET {offset}"));
        }

        Ok(query)
    }
}
