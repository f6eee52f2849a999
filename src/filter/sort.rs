/// Sort direction, serialized as `asc`/`desc` in pagination blocks and as
/// Airtable sort directions on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_lowercase).as_deref() {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Resolve a caller-supplied `orderBy`/`order` pair against the route's
    /// allowed-field set. Unknown fields silently fall back to the default
    /// instead of erroring; the frontend relies on this.
    pub fn resolve(
        requested_field: Option<&str>,
        requested_dir: Option<&str>,
        allowed: &[&str],
        default_field: &str,
    ) -> Self {
        let field = requested_field
            .filter(|f| allowed.contains(f))
            .unwrap_or(default_field)
            .to_string();
        Self { field, direction: SortDirection::parse(requested_dir) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["Nom", "Date de prise de contact"];

    #[test]
    fn whitelisted_field_is_kept() {
        let spec = SortSpec::resolve(Some("Nom"), Some("desc"), ALLOWED, "Date de prise de contact");
        assert_eq!(spec.field, "Nom");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn unknown_field_falls_back_to_default() {
        let spec = SortSpec::resolve(Some("Rôle"), None, ALLOWED, "Nom");
        assert_eq!(spec.field, "Nom");
        assert_eq!(spec.direction, SortDirection::Asc);
    }

    #[test]
    fn direction_defaults_to_asc() {
        assert_eq!(SortDirection::parse(None), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("DESC")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("banana")), SortDirection::Asc);
    }
}
