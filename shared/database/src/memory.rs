use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use hyperskill_common::{AppError, VerificationStatus};

use crate::models::{
    Account, LearnerRecord, LearningCategory, LearningField, ProfileRecord, SessionRequest,
    TeacherRecord,
};
use crate::query::{Page, PageCursor, SortDir, TeacherListQuery, VerificationStats, PAGE_SIZE};
use crate::store::{
    AccountRepository, AdminRepository, CatalogRepository, CreateOutcome, LearnerRepository,
    ProfileRepository, SessionRequestRepository, Store, TeacherRepository,
};

// In-memory backend. Same contract as the Postgres backend, no database
// required; it backs the test suite and doubles as the swap-in proof for
// the repository seam.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, ProfileRecord>,
    teachers: HashMap<Uuid, TeacherRecord>,
    learners: HashMap<Uuid, LearnerRecord>,
    session_requests: Vec<SessionRequest>,
    categories: Vec<LearningCategory>,
    fields: Vec<LearningField>,
    admins: HashSet<Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_catalog(
        &self,
        categories: Vec<LearningCategory>,
        fields: Vec<LearningField>,
    ) -> Result<(), AppError> {
        let mut inner = self.write()?;
        inner.categories = categories;
        inner.fields = fields;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryInner>, AppError> {
        self.inner
            .read()
            .map_err(|_| AppError::Internal("Storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryInner>, AppError> {
        self.inner
            .write()
            .map_err(|_| AppError::Internal("Storage lock poisoned".to_string()))
    }
}

fn directed(dir: SortDir, ordering: Ordering) -> Ordering {
    match dir {
        SortDir::Asc => ordering,
        SortDir::Desc => ordering.reverse(),
    }
}

fn matches_search(record: &TeacherRecord, search: Option<&str>) -> bool {
    let Some(term) = search else {
        return true;
    };
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record.name.to_lowercase().contains(&needle)
        || record.email.to_lowercase().contains(&needle)
        || record.teaching_field.to_lowercase().contains(&needle)
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create_if_absent(&self, account: Account) -> Result<CreateOutcome<Account>, AppError> {
        let mut inner = self.write()?;
        let email_taken = inner
            .accounts
            .values()
            .any(|existing| existing.email == account.email);
        if email_taken || inner.accounts.contains_key(&account.account_id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        inner.accounts.insert(account.account_id, account.clone());
        Ok(CreateOutcome::Created(account))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let inner = self.read()?;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        let inner = self.read()?;
        Ok(inner.accounts.get(&account_id).cloned())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn create(&self, profile: ProfileRecord) -> Result<(), AppError> {
        let mut inner = self.write()?;
        inner.profiles.insert(profile.account_id, profile);
        Ok(())
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<ProfileRecord>, AppError> {
        let inner = self.read()?;
        Ok(inner.profiles.get(&account_id).cloned())
    }

    async fn set_role_if_unset(&self, account_id: Uuid, role: &str) -> Result<bool, AppError> {
        let mut inner = self.write()?;
        match inner.profiles.get_mut(&account_id) {
            Some(profile) if profile.role.is_none() => {
                profile.role = Some(role.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TeacherRepository for MemoryStore {
    async fn create_if_absent(
        &self,
        record: TeacherRecord,
    ) -> Result<CreateOutcome<TeacherRecord>, AppError> {
        let mut inner = self.write()?;
        if inner.teachers.contains_key(&record.account_id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        inner.teachers.insert(record.account_id, record.clone());
        Ok(CreateOutcome::Created(record))
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<TeacherRecord>, AppError> {
        let inner = self.read()?;
        Ok(inner.teachers.get(&account_id).cloned())
    }

    async fn list_page(&self, query: &TeacherListQuery) -> Result<Page<TeacherRecord>, AppError> {
        let cursor = PageCursor::for_query(query)?;
        let cursor_position = match &cursor {
            Some(c) => Some((c.last_sort_key()?, c.last_id)),
            None => None,
        };

        let inner = self.read()?;
        let mut rows: Vec<TeacherRecord> = inner
            .teachers
            .values()
            .filter(|record| match query.filter.as_status() {
                None => true,
                Some(status) => record.verification_status == status.as_str(),
            })
            .filter(|record| matches_search(record, query.search.as_deref()))
            .cloned()
            .collect();
        drop(inner);

        let field = query.sort_field;
        let dir = query.sort_dir;
        rows.sort_by(|a, b| {
            directed(
                dir,
                (field.key_of(a), a.account_id).cmp(&(field.key_of(b), b.account_id)),
            )
        });

        if let Some((last_key, last_id)) = cursor_position {
            rows.retain(|record| {
                directed(
                    dir,
                    (field.key_of(record), record.account_id).cmp(&(last_key.clone(), last_id)),
                ) == Ordering::Greater
            });
        }

        let items: Vec<TeacherRecord> = rows.into_iter().take(PAGE_SIZE as usize).collect();
        let has_more = items.len() == PAGE_SIZE as usize;
        let next_cursor = if has_more {
            items.last().map(|last| PageCursor::mint(query, last))
        } else {
            None
        };

        Ok(Page {
            items,
            next_cursor,
            has_more,
        })
    }

    async fn list_verified_by_field(&self, field: &str) -> Result<Vec<TeacherRecord>, AppError> {
        let inner = self.read()?;
        let mut rows: Vec<TeacherRecord> = inner
            .teachers
            .values()
            .filter(|record| {
                record.verification_status == VerificationStatus::Verified.as_str()
                    && record.teaching_field == field
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn set_verification_status(
        &self,
        account_id: Uuid,
        status: VerificationStatus,
    ) -> Result<TeacherRecord, AppError> {
        let mut inner = self.write()?;
        let record = inner
            .teachers
            .get_mut(&account_id)
            .ok_or_else(|| AppError::NotFound("Teacher record not found".to_string()))?;
        record.verification_status = status.as_str().to_string();
        Ok(record.clone())
    }

    async fn status_counts(&self) -> Result<VerificationStats, AppError> {
        let inner = self.read()?;
        let mut stats = VerificationStats::default();
        for record in inner.teachers.values() {
            match VerificationStatus::parse(&record.verification_status) {
                Some(VerificationStatus::Pending) => stats.pending += 1,
                Some(VerificationStatus::Verified) => stats.verified += 1,
                Some(VerificationStatus::Rejected) => stats.rejected += 1,
                None => {}
            }
        }
        stats.total = stats.pending + stats.verified + stats.rejected;
        Ok(stats)
    }
}

#[async_trait]
impl LearnerRepository for MemoryStore {
    async fn create_if_absent(
        &self,
        record: LearnerRecord,
    ) -> Result<CreateOutcome<LearnerRecord>, AppError> {
        let mut inner = self.write()?;
        if inner.learners.contains_key(&record.account_id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        inner.learners.insert(record.account_id, record.clone());
        Ok(CreateOutcome::Created(record))
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<LearnerRecord>, AppError> {
        let inner = self.read()?;
        Ok(inner.learners.get(&account_id).cloned())
    }
}

#[async_trait]
impl SessionRequestRepository for MemoryStore {
    async fn create(&self, request: SessionRequest) -> Result<SessionRequest, AppError> {
        let mut inner = self.write()?;
        inner.session_requests.push(request.clone());
        Ok(request)
    }

    async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<SessionRequest>, AppError> {
        let inner = self.read()?;
        let mut rows: Vec<SessionRequest> = inner
            .session_requests
            .iter()
            .filter(|request| request.teacher_id == teacher_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_for_learner(&self, learner_id: Uuid) -> Result<Vec<SessionRequest>, AppError> {
        let inner = self.read()?;
        let mut rows: Vec<SessionRequest> = inner
            .session_requests
            .iter()
            .filter(|request| request.learner_id == learner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<LearningCategory>, AppError> {
        let inner = self.read()?;
        let mut rows = inner.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_fields(&self) -> Result<Vec<LearningField>, AppError> {
        let inner = self.read()?;
        let mut rows = inner.fields.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn is_admin(&self, account_id: Uuid) -> Result<bool, AppError> {
        let inner = self.read()?;
        Ok(inner.admins.contains(&account_id))
    }

    async fn add(&self, account_id: Uuid) -> Result<(), AppError> {
        let mut inner = self.write()?;
        inner.admins.insert(account_id);
        Ok(())
    }
}

impl Store for MemoryStore {
    fn accounts(&self) -> &dyn AccountRepository {
        self
    }

    fn profiles(&self) -> &dyn ProfileRepository {
        self
    }

    fn teachers(&self) -> &dyn TeacherRepository {
        self
    }

    fn learners(&self) -> &dyn LearnerRepository {
        self
    }

    fn session_requests(&self) -> &dyn SessionRequestRepository {
        self
    }

    fn catalog(&self) -> &dyn CatalogRepository {
        self
    }

    fn admins(&self) -> &dyn AdminRepository {
        self
    }
}
