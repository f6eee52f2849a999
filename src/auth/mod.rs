use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Caller role derived from the collaborator record. The admin string
/// comparison lives here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Franchise,
}

impl Role {
    /// The base stores the role as free text; both "admin" and
    /// "administrateur" (any casing) mean admin.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "admin" | "administrateur" => Role::Admin,
            _ => Role::Franchise,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Identity attached to the request by the access-token middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Collaborator record id the token is linked to.
    pub user_id: String,
}

/// Injectable time source so token expiry is testable with a pinned clock.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Self(Arc::new(Utc::now))
    }

    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self(Arc::new(move || at))
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clock").field(&self.now()).finish()
    }
}
