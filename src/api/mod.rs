pub mod format;
pub mod pagination;

pub use pagination::{PageParams, PageRequest, Paginated, Pagination};
