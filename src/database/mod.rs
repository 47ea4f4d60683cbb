pub mod record;
pub mod source;
pub mod store;

pub use source::{DataSource, DataSourceError};
pub use store::JsonStore;
