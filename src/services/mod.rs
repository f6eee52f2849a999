pub mod linking;
pub mod names;
pub mod scope;
pub mod tokens;

pub use linking::{ensure_linked, ensure_linked_all};
pub use scope::{resolve_scope, CallerScope};
pub use tokens::resolve_token;
