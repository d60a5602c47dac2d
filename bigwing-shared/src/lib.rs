pub mod envelope;
pub mod pagination;
pub mod pii;

pub use envelope::ApiResponse;
pub use pagination::{PageRequest, PaginatedResponse, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use pii::Masked;
