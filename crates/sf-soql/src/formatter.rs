use crate::error::{Error, Result};

/// Anything that can produce SOQL query text.
///
/// Plain strings are passed through as-is; [`QueryBuilder`](crate::QueryBuilder)
/// assembles and escapes its query. An empty query is rejected before any
/// request is made.
pub trait QueryFormatter {
    fn format(&self) -> Result<String>;
}

impl QueryFormatter for str {
    fn format(&self) -> Result<String> {
        let query = self.trim();
        if query.is_empty() {
            return Err(Error::invalid_query("query can not be empty"));
        }
        Ok(query.to_string())
    }
}

impl QueryFormatter for String {
    fn format(&self) -> Result<String> {
        self.as_str().format()
    }
}

impl<F: QueryFormatter + ?Sized> QueryFormatter for &F {
    fn format(&self) -> Result<String> {
        (**self).format()
    }
}
