use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use hyperskill_common::{Role, VerificationStatus};
use hyperskill_database::{
    AvailabilitySlot, SessionRequest, SortDir, SortField, StatusFilter, TeacherListQuery,
    TeacherRecord,
};

// Request/Response DTOs

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    pub phone: Option<String>,

    #[validate(length(min = 1))]
    pub password: String,

    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub role: Option<Role>,
    pub user: UserInfo,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub account_id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleSelectRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TeacherRegisterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,

    pub age: Option<i32>,

    #[validate(length(min = 1, max = 200))]
    pub qualification: String,

    pub work_experience: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub teaching_field: String,

    #[serde(default)]
    pub subjects: Vec<String>,

    #[serde(default)]
    pub languages: Vec<String>,

    pub hourly_rate: Option<Decimal>,

    pub certificate_link: Option<String>,

    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeacherResponse {
    pub account_id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub qualification: String,
    pub work_experience: Option<String>,
    pub teaching_field: String,
    pub subjects: Vec<String>,
    pub languages: Vec<String>,
    pub hourly_rate: Option<Decimal>,
    pub certificate_link: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<TeacherRecord> for TeacherResponse {
    fn from(record: TeacherRecord) -> Self {
        let availability = record.availability_slots();
        Self {
            account_id: record.account_id,
            name: record.name,
            email: record.email,
            age: record.age,
            qualification: record.qualification,
            work_experience: record.work_experience,
            teaching_field: record.teaching_field,
            subjects: record.subjects,
            languages: record.languages,
            hourly_rate: record.hourly_rate,
            certificate_link: record.certificate_link,
            availability,
            verification_status: VerificationStatus::parse(&record.verification_status)
                .unwrap_or(VerificationStatus::Pending),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeacherPageResponse {
    pub teachers: Vec<TeacherResponse>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminTeachersParams {
    pub filter: Option<StatusFilter>,
    pub sort_by: Option<SortField>,
    pub sort_dir: Option<SortDir>,
    pub search: Option<String>,
    pub cursor: Option<String>,
}

impl AdminTeachersParams {
    pub fn into_query(self) -> TeacherListQuery {
        TeacherListQuery {
            filter: self.filter.unwrap_or(StatusFilter::All),
            sort_field: self.sort_by.unwrap_or(SortField::CreatedAt),
            sort_dir: self.sort_dir.unwrap_or(SortDir::Desc),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            cursor: self.cursor,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseTeachersParams {
    pub field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BookSessionRequest {
    pub teacher_id: Uuid,

    pub date: NaiveDate,

    // "HH:MM" from a form time input; parsed server-side
    #[validate(length(min = 1))]
    pub time: String,

    pub topic: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionRequestResponse {
    pub request_id: Uuid,
    pub teacher_id: Uuid,
    pub learner_id: Uuid,
    pub learner_email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub topic: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRequest> for SessionRequestResponse {
    fn from(record: SessionRequest) -> Self {
        Self {
            request_id: record.request_id,
            teacher_id: record.teacher_id,
            learner_id: record.learner_id,
            learner_email: record.learner_email,
            date: record.requested_date,
            time: record.requested_time,
            topic: record.topic,
            status: record.status,
            created_at: record.created_at,
        }
    }
}
