use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Keyset page request: users strictly after `cursor`, ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub cursor: Option<Uuid>,
}

impl PageRequest {
    /// `0` selects the default size. Sizes above the maximum are rejected.
    pub fn new(page_size: u32, cursor: Option<Uuid>) -> Option<Self> {
        let limit = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            n if n > MAX_PAGE_SIZE => return None,
            n => n,
        };
        Some(Self { limit, cursor })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleUsersPage {
    pub user_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
    pub total_count: i64,
}

impl RoleUsersPage {
    /// Build a page from up to `limit + 1` ordered ids.
    pub fn from_probe(mut user_ids: Vec<Uuid>, limit: u32, total_count: i64) -> Self {
        let limit = limit as usize;
        let next_cursor = if user_ids.len() > limit {
            user_ids.truncate(limit);
            user_ids.last().copied()
        } else {
            None
        };

        Self {
            user_ids,
            next_cursor,
            total_count,
        }
    }
}
