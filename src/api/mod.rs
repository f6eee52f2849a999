pub mod pagination;

pub use pagination::{window, Pagination};
