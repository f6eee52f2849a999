use chrono::NaiveDate;

use crate::config;
use crate::error::ApiError;
use crate::store::ListOptions;

use super::expr::Expr;
use super::sort::SortSpec;

/// Validated pagination and ordering parameters for a list route.
#[derive(Debug, Clone)]
pub struct PageParams {
    pub limit: usize,
    pub offset: usize,
    pub sort: SortSpec,
}

impl PageParams {
    /// Clamp caller input: `limit` into [1, max page size], `offset` to ≥ 0,
    /// `orderBy` against the route's whitelist.
    pub fn from_query(
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<&str>,
        order: Option<&str>,
        default_limit: usize,
        allowed_sorts: &[&str],
        default_sort: &str,
    ) -> Self {
        let max = config::config().api.max_page_size;
        let limit = limit
            .map(|l| l.clamp(1, max as i64) as usize)
            .unwrap_or(default_limit);
        let offset = offset.map(|o| o.max(0) as usize).unwrap_or(0);
        let sort = SortSpec::resolve(order_by, order, allowed_sorts, default_sort);
        Self { limit, offset, sort }
    }

    /// Fetch window for fetch-then-slice pagination. Every page refetches
    /// from record zero (an O(offset) cost per request) because the store
    /// has no usable cursor for arbitrary offsets.
    pub fn window_size(&self) -> usize {
        self.offset + self.limit
    }
}

/// Accumulates filter clauses for one list request. City scoping is applied
/// at construction time and ANDed with everything added afterwards, so no
/// later clause can widen a non-admin's visibility.
#[derive(Debug, Clone)]
pub struct ScopedQuery {
    clauses: Vec<Expr>,
    empty_scope: bool,
}

impl ScopedQuery {
    /// For resources without city partitioning (e.g. resource links).
    pub fn unscoped() -> Self {
        Self { clauses: Vec::new(), empty_scope: false }
    }

    /// Admins bypass the city clause entirely. A non-admin with no linked
    /// cities must see zero rows; the query is marked empty and handlers
    /// short-circuit to an empty page instead of querying the store.
    pub fn scoped(is_admin: bool, city_names: &[String], city_link_field: &str) -> Self {
        if is_admin {
            return Self::unscoped();
        }
        if city_names.is_empty() {
            return Self { clauses: vec![Expr::False], empty_scope: true };
        }
        let clause = Expr::or(
            city_names
                .iter()
                .map(|city| Expr::contains_in_links(city.as_str(), city_link_field))
                .collect(),
        );
        Self { clauses: vec![clause], empty_scope: false }
    }

    pub fn is_empty_scope(&self) -> bool {
        self.empty_scope
    }

    pub fn push(&mut self, expr: Expr) {
        self.clauses.push(expr);
    }

    /// Free-text search: OR of substring matches across the given fields.
    pub fn search(&mut self, q: Option<&str>, fields: &[&str]) {
        let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) else {
            return;
        };
        self.clauses.push(Expr::or(
            fields.iter().map(|f| Expr::contains(q, *f)).collect(),
        ));
    }

    /// Filter on a linked-record field by display name.
    pub fn link_filter(&mut self, value: Option<&str>, field: &str) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.clauses.push(Expr::contains_in_links(v, field));
        }
    }

    /// Case-insensitive exact match on a scalar field.
    pub fn eq_filter(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.clauses.push(Expr::case_eq(field, v));
        }
    }

    pub fn date_window(&mut self, field: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let Some(start) = start {
            self.clauses.push(Expr::OnOrAfter { field: field.to_string(), date: start });
        }
        if let Some(end) = end {
            self.clauses.push(Expr::OnOrBefore { field: field.to_string(), date: end });
        }
    }

    pub fn build(&self) -> Option<Expr> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(Expr::and(self.clauses.clone()))
        }
    }

    pub fn into_options(self, params: &PageParams) -> ListOptions {
        ListOptions {
            filter: self.build(),
            sort: vec![params.sort.clone()],
            max_records: Some(params.window_size()),
            fields: Vec::new(),
        }
    }
}

/// Parse a `YYYY-MM-DD` query parameter, turning garbage into a 400.
pub fn parse_date_param(raw: Option<&str>, label: &str) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("Paramètre {} invalide", label))),
    }
}
