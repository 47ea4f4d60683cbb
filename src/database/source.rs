use serde_json::Value;
use thiserror::Error;

/// Errors from the collection data source
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Resource '{0}' is not a collection")]
    NotACollection(String),

    #[error("Record '{id}' already exists in '{resource}'")]
    DuplicateId { resource: String, id: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Data source lock poisoned")]
    Poisoned,

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read/write access to the named resources of the mock backend.
///
/// Collections are ordered arrays of records keyed by their `id` field; any
/// other top-level value is a singular document (e.g. `health`). Reads hand
/// out owned copies so callers can never mutate stored values.
pub trait DataSource: Send + Sync {
    /// Names of every top-level resource, collections and documents alike
    fn resources(&self) -> Vec<String>;

    /// Raw top-level value, whatever its shape
    fn document(&self, name: &str) -> Result<Option<Value>, DataSourceError>;

    fn list(&self, resource: &str) -> Result<Vec<Value>, DataSourceError>;

    fn get_by_id(&self, resource: &str, id: &str) -> Result<Option<Value>, DataSourceError>;

    fn filter_by(
        &self,
        resource: &str,
        predicate: &dyn Fn(&Value) -> bool,
    ) -> Result<Vec<Value>, DataSourceError>;

    /// Insert a record, returning it as stored (with its id)
    fn insert(&self, resource: &str, record: Value) -> Result<Value, DataSourceError>;

    /// Replace a record wholesale; the id is preserved. `None` when missing.
    fn replace(&self, resource: &str, id: &str, record: Value) -> Result<Option<Value>, DataSourceError>;

    /// Shallow-merge fields into a record. `None` when missing.
    fn merge(&self, resource: &str, id: &str, patch: Value) -> Result<Option<Value>, DataSourceError>;

    /// Remove a record, returning it. `None` when missing.
    fn remove(&self, resource: &str, id: &str) -> Result<Option<Value>, DataSourceError>;
}
