// handlers/mod.rs - Route handlers
//
// Two layers share the data source:
// - resource: generic REST surface over every top-level entry (/:resource[/:id])
// - users + health: explicit dashboard endpoints that take precedence
pub mod health;
pub mod resource;
pub mod users;
