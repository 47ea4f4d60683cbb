use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::JsonStore;

/// `n` users with string ids "1".."n", alternating `internal`/`mitra` types
pub fn sample_users(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "id": i.to_string(),
                "full_name": format!("User {:02}", i),
                "email": format!("user{:02}@example.com", i),
                "type": if i % 2 == 0 { "mitra" } else { "internal" },
            })
        })
        .collect()
}

/// Store holding `n` sample users plus the dashboard's auxiliary documents
pub fn sample_store(n: usize) -> Arc<JsonStore> {
    let store = JsonStore::from_value(json!({
        "users": sample_users(n),
        "mitra_list": [{"id": "m1", "name": "Mitra Satu"}],
        "roles": [{"id": "r1", "name": "Admin"}],
        "health": {"status": "ok"}
    }))
    .expect("sample document is an object");
    Arc::new(store)
}

/// Development defaults pinned to the dashboard's routes; ignores the
/// process environment
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.routes.alias_prefix = "/backoffice/api/v1".to_string();
    config.routes.resource = "users".to_string();
    config.routes.health_path = "/health".to_string();
    config.pagination.default_page_size = 10;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::database::DataSource;

    #[test]
    fn test_config_starts_from_development_defaults() {
        let config = test_config();
        assert!(matches!(config.environment, Environment::Development));
        assert_eq!(config.api.max_body_bytes, 10 * 1024 * 1024);
        assert!(config.security.enable_cors);
        assert_eq!(
            config.security.cors_origins,
            vec!["http://localhost:5173", "http://localhost:4173"]
        );
        assert_eq!(config.routes.alias_prefix, "/backoffice/api/v1");
    }

    #[test]
    fn sample_store_has_expected_resources() {
        let store = sample_store(3);
        let mut resources = store.resources();
        resources.sort();
        assert_eq!(resources, vec!["health", "mitra_list", "roles", "users"]);
        assert_eq!(store.list("users").unwrap().len(), 3);
    }
}
