use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;
use uuid::Uuid;

use super::record::{has_present_id, id_matches, id_text};
use super::source::{DataSource, DataSourceError};

/// In-memory data source seeded from a JSON document such as `db.json`.
///
/// The document must be an object; each top-level key is a resource. Writes
/// only live for the lifetime of the process.
#[derive(Debug)]
pub struct JsonStore {
    entries: RwLock<Map<String, Value>>,
}

impl JsonStore {
    pub fn from_value(document: Value) -> Result<Self, DataSourceError> {
        match document {
            Value::Object(entries) => Ok(Self {
                entries: RwLock::new(entries),
            }),
            other => Err(DataSourceError::InvalidDocument(format!(
                "expected a top-level object, found {}",
                kind(&other)
            ))),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DataSourceError> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    /// Load the document from disk once at startup
    pub fn load(path: &Path) -> Result<Self, DataSourceError> {
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&raw)?;
        info!(
            "Loaded {} resources from {}",
            store.resources().len(),
            path.display()
        );
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Map<String, Value>>, DataSourceError> {
        self.entries.read().map_err(|_| DataSourceError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Map<String, Value>>, DataSourceError> {
        self.entries.write().map_err(|_| DataSourceError::Poisoned)
    }

    fn with_collection<R>(
        &self,
        resource: &str,
        f: impl FnOnce(&Vec<Value>) -> R,
    ) -> Result<R, DataSourceError> {
        let entries = self.read()?;
        match entries.get(resource) {
            Some(Value::Array(items)) => Ok(f(items)),
            Some(_) => Err(DataSourceError::NotACollection(resource.to_string())),
            None => Err(DataSourceError::UnknownResource(resource.to_string())),
        }
    }

    fn with_collection_mut<R>(
        &self,
        resource: &str,
        f: impl FnOnce(&mut Vec<Value>) -> Result<R, DataSourceError>,
    ) -> Result<R, DataSourceError> {
        let mut entries = self.write()?;
        match entries.get_mut(resource) {
            Some(Value::Array(items)) => f(items),
            Some(_) => Err(DataSourceError::NotACollection(resource.to_string())),
            None => Err(DataSourceError::UnknownResource(resource.to_string())),
        }
    }
}

impl DataSource for JsonStore {
    fn resources(&self) -> Vec<String> {
        self.read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn document(&self, name: &str) -> Result<Option<Value>, DataSourceError> {
        Ok(self.read()?.get(name).cloned())
    }

    fn list(&self, resource: &str) -> Result<Vec<Value>, DataSourceError> {
        self.with_collection(resource, |items| items.clone())
    }

    fn get_by_id(&self, resource: &str, id: &str) -> Result<Option<Value>, DataSourceError> {
        self.with_collection(resource, |items| {
            items.iter().find(|record| id_matches(record, id)).cloned()
        })
    }

    fn filter_by(
        &self,
        resource: &str,
        predicate: &dyn Fn(&Value) -> bool,
    ) -> Result<Vec<Value>, DataSourceError> {
        self.with_collection(resource, |items| {
            items.iter().filter(|record| predicate(record)).cloned().collect()
        })
    }

    fn insert(&self, resource: &str, record: Value) -> Result<Value, DataSourceError> {
        let mut fields = match record {
            Value::Object(fields) => fields,
            other => {
                return Err(DataSourceError::InvalidDocument(format!(
                    "records must be objects, found {}",
                    kind(&other)
                )))
            }
        };

        self.with_collection_mut(resource, |items| {
            let candidate = Value::Object(fields.clone());
            let id = if has_present_id(&candidate) {
                id_text(&fields["id"]).ok_or_else(|| {
                    DataSourceError::InvalidDocument("id must be a string or a number".to_string())
                })?
            } else {
                let generated = Uuid::new_v4().to_string();
                fields.insert("id".to_string(), Value::String(generated.clone()));
                generated
            };

            if items.iter().any(|existing| id_matches(existing, &id)) {
                return Err(DataSourceError::DuplicateId {
                    resource: resource.to_string(),
                    id,
                });
            }

            let stored = Value::Object(fields);
            items.push(stored.clone());
            Ok(stored)
        })
    }

    fn replace(&self, resource: &str, id: &str, record: Value) -> Result<Option<Value>, DataSourceError> {
        let mut fields = match record {
            Value::Object(fields) => fields,
            other => {
                return Err(DataSourceError::InvalidDocument(format!(
                    "records must be objects, found {}",
                    kind(&other)
                )))
            }
        };

        self.with_collection_mut(resource, |items| {
            let Some(slot) = items.iter_mut().find(|existing| id_matches(existing, id)) else {
                return Ok(None);
            };
            if let Some(existing_id) = slot.get("id").cloned() {
                fields.insert("id".to_string(), existing_id);
            }
            *slot = Value::Object(fields);
            Ok(Some(slot.clone()))
        })
    }

    fn merge(&self, resource: &str, id: &str, patch: Value) -> Result<Option<Value>, DataSourceError> {
        let patch = match patch {
            Value::Object(patch) => patch,
            other => {
                return Err(DataSourceError::InvalidDocument(format!(
                    "patches must be objects, found {}",
                    kind(&other)
                )))
            }
        };

        self.with_collection_mut(resource, |items| {
            let Some(slot) = items.iter_mut().find(|existing| id_matches(existing, id)) else {
                return Ok(None);
            };
            if let Value::Object(fields) = slot {
                for (key, value) in patch {
                    if key != "id" {
                        fields.insert(key, value);
                    }
                }
            }
            Ok(Some(slot.clone()))
        })
    }

    fn remove(&self, resource: &str, id: &str) -> Result<Option<Value>, DataSourceError> {
        self.with_collection_mut(resource, |items| {
            Ok(items
                .iter()
                .position(|existing| id_matches(existing, id))
                .map(|index| items.remove(index)))
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
