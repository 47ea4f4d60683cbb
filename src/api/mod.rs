pub mod format;
pub mod pagination;

pub use format::{timestamp, Envelope};
pub use pagination::{paginate, Dialect, Page, PageMeta, PageParams};
