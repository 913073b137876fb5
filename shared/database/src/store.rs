use async_trait::async_trait;
use uuid::Uuid;

use hyperskill_common::{AppError, VerificationStatus};

use crate::models::{
    Account, LearnerRecord, LearningCategory, LearningField, ProfileRecord, SessionRequest,
    TeacherRecord,
};
use crate::query::{Page, TeacherListQuery, VerificationStats};

// Outcome of an atomic create-if-absent. Callers get a first-class
// already-exists signal instead of racing a read against a write.
#[derive(Debug)]
pub enum CreateOutcome<T> {
    Created(T),
    AlreadyExists,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_if_absent(&self, account: Account) -> Result<CreateOutcome<Account>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, AppError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create(&self, profile: ProfileRecord) -> Result<(), AppError>;
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<ProfileRecord>, AppError>;
    // Returns false when the profile already carries a role.
    async fn set_role_if_unset(&self, account_id: Uuid, role: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn create_if_absent(
        &self,
        record: TeacherRecord,
    ) -> Result<CreateOutcome<TeacherRecord>, AppError>;
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<TeacherRecord>, AppError>;
    async fn list_page(&self, query: &TeacherListQuery) -> Result<Page<TeacherRecord>, AppError>;
    async fn list_verified_by_field(&self, field: &str) -> Result<Vec<TeacherRecord>, AppError>;
    async fn set_verification_status(
        &self,
        account_id: Uuid,
        status: VerificationStatus,
    ) -> Result<TeacherRecord, AppError>;
    async fn status_counts(&self) -> Result<VerificationStats, AppError>;
}

#[async_trait]
pub trait LearnerRepository: Send + Sync {
    async fn create_if_absent(
        &self,
        record: LearnerRecord,
    ) -> Result<CreateOutcome<LearnerRecord>, AppError>;
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<LearnerRecord>, AppError>;
}

#[async_trait]
pub trait SessionRequestRepository: Send + Sync {
    async fn create(&self, request: SessionRequest) -> Result<SessionRequest, AppError>;
    async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<SessionRequest>, AppError>;
    async fn list_for_learner(&self, learner_id: Uuid) -> Result<Vec<SessionRequest>, AppError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<LearningCategory>, AppError>;
    async fn list_fields(&self) -> Result<Vec<LearningField>, AppError>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn is_admin(&self, account_id: Uuid) -> Result<bool, AppError>;
    async fn add(&self, account_id: Uuid) -> Result<(), AppError>;
}

// The canonical storage surface: one repository per collection. Backends
// implement every repository trait and hand out themselves.
pub trait Store: Send + Sync {
    fn accounts(&self) -> &dyn AccountRepository;
    fn profiles(&self) -> &dyn ProfileRepository;
    fn teachers(&self) -> &dyn TeacherRepository;
    fn learners(&self) -> &dyn LearnerRepository;
    fn session_requests(&self) -> &dyn SessionRequestRepository;
    fn catalog(&self) -> &dyn CatalogRepository;
    fn admins(&self) -> &dyn AdminRepository;
}
