pub mod expr;
pub mod query;
pub mod sort;

pub use expr::{DisplayResolver, Expr, FieldRef, NoLinks};
pub use query::{parse_date_param, PageParams, ScopedQuery};
pub use sort::{SortDirection, SortSpec};
