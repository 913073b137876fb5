use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use hyperskill_common::{AppError, VerificationStatus};

use crate::models::TeacherRecord;

pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    Pending,
    Verified,
    Rejected,
}

impl StatusFilter {
    pub fn as_status(&self) -> Option<VerificationStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(VerificationStatus::Pending),
            StatusFilter::Verified => Some(VerificationStatus::Verified),
            StatusFilter::Rejected => Some(VerificationStatus::Rejected),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    Name,
    Qualification,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Name => "name",
            SortField::Qualification => "qualification",
        }
    }

    pub fn key_of(&self, record: &TeacherRecord) -> SortKey {
        match self {
            SortField::CreatedAt => SortKey::Time(record.created_at),
            SortField::Name => SortKey::Text(record.name.clone()),
            SortField::Qualification => SortKey::Text(record.qualification.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

// Sort keys are homogeneous per query; the cross-variant ordering is only
// there to keep cmp total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Time(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    pub fn encode(&self) -> String {
        match self {
            SortKey::Time(t) => t.to_rfc3339_opts(SecondsFormat::Micros, true),
            SortKey::Text(s) => s.clone(),
        }
    }

    pub fn decode(field: SortField, raw: &str) -> Result<SortKey, AppError> {
        match field {
            SortField::CreatedAt => DateTime::parse_from_rfc3339(raw)
                .map(|t| SortKey::Time(t.with_timezone(&Utc)))
                .map_err(|_| AppError::Validation("Malformed pagination cursor".to_string())),
            SortField::Name | SortField::Qualification => Ok(SortKey::Text(raw.to_string())),
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Time(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Time(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct TeacherListQuery {
    pub filter: StatusFilter,
    pub sort_field: SortField,
    pub sort_dir: SortDir,
    pub search: Option<String>,
    pub cursor: Option<String>,
}

impl Default for TeacherListQuery {
    fn default() -> Self {
        Self {
            filter: StatusFilter::All,
            sort_field: SortField::CreatedAt,
            sort_dir: SortDir::Desc,
            search: None,
            cursor: None,
        }
    }
}

// Opaque pagination token. It records the listing parameters it was minted
// under so a cursor presented with different filter/sort/search parameters
// can be rejected instead of silently paging through the wrong sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCursor {
    pub filter: StatusFilter,
    pub sort_field: SortField,
    pub sort_dir: SortDir,
    pub search: Option<String>,
    pub last_key: String,
    pub last_id: Uuid,
}

impl PageCursor {
    pub fn mint(query: &TeacherListQuery, last: &TeacherRecord) -> String {
        let cursor = PageCursor {
            filter: query.filter,
            sort_field: query.sort_field,
            sort_dir: query.sort_dir,
            search: query.search.clone(),
            last_key: query.sort_field.key_of(last).encode(),
            last_id: last.account_id,
        };
        let bytes = serde_json::to_vec(&cursor).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(token: &str) -> Result<PageCursor, AppError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::Validation("Malformed pagination cursor".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::Validation("Malformed pagination cursor".to_string()))
    }

    // Decodes the query's cursor, if any, and rejects one minted under
    // different listing parameters.
    pub fn for_query(query: &TeacherListQuery) -> Result<Option<PageCursor>, AppError> {
        let Some(token) = &query.cursor else {
            return Ok(None);
        };
        let cursor = PageCursor::decode(token)?;
        if cursor.filter != query.filter
            || cursor.sort_field != query.sort_field
            || cursor.sort_dir != query.sort_dir
            || cursor.search != query.search
        {
            return Err(AppError::Validation(
                "Pagination cursor does not match the current filter, sort, or search".to_string(),
            ));
        }
        Ok(Some(cursor))
    }

    pub fn last_sort_key(&self) -> Result<SortKey, AppError> {
        SortKey::decode(self.sort_field, &self.last_key)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationStats {
    pub total: i64,
    pub pending: i64,
    pub verified: i64,
    pub rejected: i64,
}
