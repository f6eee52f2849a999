use serde::Serialize;

use crate::filter::PageParams;
use crate::store::Record;

/// Pagination block returned with every list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
    pub order_by: String,
    pub order: String,
    pub has_more: bool,
    pub next_offset: Option<usize>,
    pub prev_offset: Option<usize>,
}

impl Pagination {
    pub fn new(params: &PageParams, has_more: bool) -> Self {
        Self {
            limit: params.limit,
            offset: params.offset,
            order_by: params.sort.field.clone(),
            order: params.sort.direction.as_str().to_string(),
            has_more,
            next_offset: has_more.then(|| params.offset + params.limit),
            prev_offset: (params.offset > 0)
                .then(|| params.offset.saturating_sub(params.limit)),
        }
    }

    pub fn empty(params: &PageParams) -> Self {
        Self::new(params, false)
    }
}

/// Slice the fetched window `[0, offset+limit)` down to the requested page.
/// A full window means the store may hold more rows; that is the only
/// `hasMore` signal fetch-then-slice pagination has.
pub fn window(records: Vec<Record>, params: &PageParams) -> (Vec<Record>, Pagination) {
    let has_more = records.len() >= params.window_size();
    let page: Vec<Record> = records.into_iter().skip(params.offset).collect();
    (page, Pagination::new(params, has_more))
}
