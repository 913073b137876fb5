use std::sync::Arc;

use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use hyperskill_auth::{Claims, JwtService, PasswordService};
use hyperskill_common::{AppError, Role, SessionRequestStatus, VerificationStatus};
use hyperskill_database::{
    Account, AccountRepository, AdminRepository, CatalogRepository, CreateOutcome, LearnerRecord,
    LearnerRepository, LearningCategory, LearningField, ProfileRecord, ProfileRepository,
    SessionRequest, SessionRequestRepository, Store, TeacherListQuery, TeacherRecord,
    TeacherRepository, VerificationStats,
};

use crate::config::AppConfig;
use crate::models::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt_service: JwtService,
    pub config: AppConfig,
}

pub struct AccountService {
    store: Arc<dyn Store>,
    jwt_service: JwtService,
    config: AppConfig,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            jwt_service: state.jwt_service.clone(),
            config: state.config.clone(),
        }
    }

    // Account registration
    pub async fn register(&self, request: RegisterRequest) -> Result<String, AppError> {
        if request.role == Some(Role::Admin) {
            return Err(AppError::Validation(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_password(&request.password)?;

        let account = Account {
            account_id: Uuid::new_v4(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        let account = match self.store.accounts().create_if_absent(account).await? {
            CreateOutcome::Created(account) => account,
            CreateOutcome::AlreadyExists => {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
        };

        self.store
            .profiles()
            .create(ProfileRecord {
                account_id: account.account_id,
                email: account.email.clone(),
                phone: account.phone.clone(),
                role: request.role.map(|role| role.as_str().to_string()),
                created_at: account.created_at,
            })
            .await?;

        if request.role == Some(Role::Learner) {
            let _ = self
                .store
                .learners()
                .create_if_absent(LearnerRecord {
                    account_id: account.account_id,
                    created_at: account.created_at,
                })
                .await?;
        }

        tracing::info!("Account registered: {}", account.email);

        Ok(match request.role {
            Some(role) => format!("{} registered successfully", role.as_str()),
            None => "account registered successfully".to_string(),
        })
    }

    // Login with role detection
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let account = self
            .store
            .accounts()
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !PasswordService::verify_password(&request.password, &account.password_hash)? {
            return Err(AppError::Authentication("Invalid password".to_string()));
        }

        let role = self.detect_role(account.account_id).await?;

        tracing::info!("Login: {} ({:?})", account.email, role);
        self.issue_token(&account, role)
    }

    // Admin login: same credential check plus allow-list membership. A
    // correct password on a non-admin account is still denied.
    pub async fn admin_login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let account = self
            .store
            .accounts()
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid admin credentials".to_string()))?;

        if !PasswordService::verify_password(&request.password, &account.password_hash)? {
            return Err(AppError::Authentication("Invalid admin credentials".to_string()));
        }

        if !self.store.admins().is_admin(account.account_id).await? {
            return Err(AppError::Authentication("Not authorized as admin".to_string()));
        }

        tracing::info!("Admin login: {}", account.email);
        self.issue_token(&account, Some(Role::Admin))
    }

    // One-shot role selection for accounts registered without a role
    pub async fn select_role(&self, account_id: Uuid, role: Role) -> Result<String, AppError> {
        if role == Role::Admin {
            return Err(AppError::Validation(
                "Admin is not a selectable role".to_string(),
            ));
        }

        if self.store.profiles().find_by_id(account_id).await?.is_none() {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }

        if !self
            .store
            .profiles()
            .set_role_if_unset(account_id, role.as_str())
            .await?
        {
            return Err(AppError::Conflict("Role already selected".to_string()));
        }

        if role == Role::Learner {
            let _ = self
                .store
                .learners()
                .create_if_absent(LearnerRecord {
                    account_id,
                    created_at: Utc::now(),
                })
                .await?;
        }

        tracing::info!("Account {} selected role {}", account_id, role.as_str());
        Ok(format!("Welcome as a {}", role.as_str()))
    }

    // Teacher lookup wins over learner lookup; the profile role is the
    // fallback for accounts that picked a role but created no record yet.
    async fn detect_role(&self, account_id: Uuid) -> Result<Option<Role>, AppError> {
        if self.store.teachers().find_by_id(account_id).await?.is_some() {
            return Ok(Some(Role::Teacher));
        }
        if self.store.learners().find_by_id(account_id).await?.is_some() {
            return Ok(Some(Role::Learner));
        }
        let profile = self.store.profiles().find_by_id(account_id).await?;
        Ok(profile.and_then(|p| p.role.as_deref().and_then(Role::parse)))
    }

    fn issue_token(&self, account: &Account, role: Option<Role>) -> Result<AuthResponse, AppError> {
        let claims = Claims::new(
            account.account_id,
            account.email.clone(),
            role,
            &self.config.jwt,
        );
        let token = self.jwt_service.generate_token(&claims)?;

        Ok(AuthResponse {
            token,
            role,
            user: UserInfo {
                account_id: account.account_id,
                email: account.email.clone(),
                phone: account.phone.clone(),
                role,
                created_at: account.created_at,
            },
            expires_at: Utc::now() + Duration::hours(self.config.jwt.expiration_hours as i64),
        })
    }
}

pub struct TeacherService {
    store: Arc<dyn Store>,
}

impl TeacherService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn register_teacher(
        &self,
        claims: &Claims,
        request: TeacherRegisterRequest,
    ) -> Result<TeacherResponse, AppError> {
        let account_id = claims.account_id()?;
        let availability = serde_json::to_value(&request.availability)
            .map_err(|e| AppError::Internal(format!("Failed to encode availability: {}", e)))?;

        let record = TeacherRecord {
            account_id,
            name: request.name,
            email: claims.email.clone(),
            age: request.age,
            qualification: request.qualification,
            work_experience: request.work_experience,
            teaching_field: request.teaching_field,
            subjects: request.subjects,
            languages: request.languages,
            hourly_rate: request.hourly_rate,
            certificate_link: request.certificate_link,
            availability,
            verification_status: VerificationStatus::Pending.as_str().to_string(),
            created_at: Utc::now(),
        };

        match self.store.teachers().create_if_absent(record).await? {
            CreateOutcome::Created(created) => {
                tracing::info!("Teacher registration submitted: {}", created.email);
                Ok(created.into())
            }
            CreateOutcome::AlreadyExists => {
                Err(AppError::Conflict("You have already registered".to_string()))
            }
        }
    }

    pub async fn own_record(&self, claims: &Claims) -> Result<TeacherResponse, AppError> {
        let account_id = claims.account_id()?;
        self.store
            .teachers()
            .find_by_id(account_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Teacher record not found".to_string()))
    }

    // Public browse: only verified teachers are listed
    pub async fn browse_by_field(
        &self,
        field: Option<&str>,
    ) -> Result<Vec<TeacherResponse>, AppError> {
        match field.filter(|f| !f.is_empty()) {
            None => Ok(Vec::new()),
            Some(field) => {
                let records = self.store.teachers().list_verified_by_field(field).await?;
                Ok(records.into_iter().map(Into::into).collect())
            }
        }
    }
}

pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn list_teachers(
        &self,
        query: TeacherListQuery,
    ) -> Result<TeacherPageResponse, AppError> {
        let page = self.store.teachers().list_page(&query).await?;
        Ok(TeacherPageResponse {
            teachers: page.items.into_iter().map(Into::into).collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    pub async fn stats(&self) -> Result<VerificationStats, AppError> {
        self.store.teachers().status_counts().await
    }

    pub async fn approve(&self, account_id: Uuid) -> Result<TeacherResponse, AppError> {
        let record = self
            .store
            .teachers()
            .set_verification_status(account_id, VerificationStatus::Verified)
            .await?;
        tracing::info!("Teacher {} verified", account_id);
        Ok(record.into())
    }

    pub async fn reject(&self, account_id: Uuid) -> Result<TeacherResponse, AppError> {
        let record = self
            .store
            .teachers()
            .set_verification_status(account_id, VerificationStatus::Rejected)
            .await?;
        tracing::info!("Teacher {} rejected", account_id);
        Ok(record.into())
    }
}

pub struct BookingService {
    store: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn create_request(
        &self,
        claims: &Claims,
        request: BookSessionRequest,
    ) -> Result<SessionRequestResponse, AppError> {
        let learner_id = claims.account_id()?;

        if self
            .store
            .teachers()
            .find_by_id(request.teacher_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Teacher not found".to_string()));
        }

        let record = SessionRequest {
            request_id: Uuid::new_v4(),
            teacher_id: request.teacher_id,
            learner_id,
            learner_email: claims.email.clone(),
            requested_date: request.date,
            requested_time: parse_time(&request.time)?,
            topic: request.topic,
            status: SessionRequestStatus::Pending.as_str().to_string(),
            created_at: Utc::now(),
        };

        let created = self.store.session_requests().create(record).await?;
        tracing::info!(
            "Session request {} created for teacher {}",
            created.request_id,
            created.teacher_id
        );
        Ok(created.into())
    }

    pub async fn incoming(&self, claims: &Claims) -> Result<Vec<SessionRequestResponse>, AppError> {
        let teacher_id = claims.account_id()?;
        let requests = self
            .store
            .session_requests()
            .list_for_teacher(teacher_id)
            .await?;
        Ok(requests.into_iter().map(Into::into).collect())
    }

    pub async fn mine(&self, claims: &Claims) -> Result<Vec<SessionRequestResponse>, AppError> {
        let learner_id = claims.account_id()?;
        let requests = self
            .store
            .session_requests()
            .list_for_learner(learner_id)
            .await?;
        Ok(requests.into_iter().map(Into::into).collect())
    }
}

pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn categories(&self) -> Result<Vec<LearningCategory>, AppError> {
        self.store.catalog().list_categories().await
    }

    pub async fn fields(&self) -> Result<Vec<LearningField>, AppError> {
        self.store.catalog().list_fields().await
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::Validation("Invalid time, expected HH:MM".to_string()))
}
