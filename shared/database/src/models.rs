use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub account_id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRecord {
    pub account_id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

// One {day, time} availability slot; stored as a JSONB array on the teacher row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub day: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherRecord {
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
    pub availability: serde_json::Value,
    pub verification_status: String,
    pub created_at: DateTime<Utc>,
}

impl TeacherRecord {
    pub fn availability_slots(&self) -> Vec<AvailabilitySlot> {
        serde_json::from_value(self.availability.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearnerRecord {
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRequest {
    pub request_id: Uuid,
    pub teacher_id: Uuid,
    pub learner_id: Uuid,
    pub learner_email: String,
    pub requested_date: NaiveDate,
    pub requested_time: NaiveTime,
    pub topic: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningCategory {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub teacher_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningField {
    pub field_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub teacher_count: i32,
}
