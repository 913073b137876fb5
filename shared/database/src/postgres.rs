use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use hyperskill_common::{AppError, VerificationStatus};

use crate::models::{
    Account, LearnerRecord, LearningCategory, LearningField, ProfileRecord, SessionRequest,
    TeacherRecord,
};
use crate::query::{Page, PageCursor, SortKey, TeacherListQuery, VerificationStats, PAGE_SIZE};
use crate::store::{
    AccountRepository, AdminRepository, CatalogRepository, CreateOutcome, LearnerRepository,
    ProfileRepository, SessionRequestRepository, Store, TeacherRepository,
};

// Production backend over Postgres.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn create_if_absent(&self, account: Account) -> Result<CreateOutcome<Account>, AppError> {
        let inserted = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (account_id, email, phone, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(account.account_id)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(match inserted {
            Some(created) => CreateOutcome::Created(created),
            None => CreateOutcome::AlreadyExists,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn create(&self, profile: ProfileRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (account_id, email, phone, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(profile.account_id)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.role)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<ProfileRecord>, AppError> {
        sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_role_if_unset(&self, account_id: Uuid, role: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE profiles SET role = $2 WHERE account_id = $1 AND role IS NULL")
                .bind(account_id)
                .bind(role)
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TeacherRepository for PgStore {
    async fn create_if_absent(
        &self,
        record: TeacherRecord,
    ) -> Result<CreateOutcome<TeacherRecord>, AppError> {
        let inserted = sqlx::query_as::<_, TeacherRecord>(
            r#"
            INSERT INTO teachers (
                account_id, name, email, age, qualification, work_experience,
                teaching_field, subjects, languages, hourly_rate, certificate_link,
                availability, verification_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(record.account_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.age)
        .bind(&record.qualification)
        .bind(&record.work_experience)
        .bind(&record.teaching_field)
        .bind(&record.subjects)
        .bind(&record.languages)
        .bind(record.hourly_rate)
        .bind(&record.certificate_link)
        .bind(&record.availability)
        .bind(&record.verification_status)
        .bind(record.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(match inserted {
            Some(created) => CreateOutcome::Created(created),
            None => CreateOutcome::AlreadyExists,
        })
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<TeacherRecord>, AppError> {
        sqlx::query_as::<_, TeacherRecord>("SELECT * FROM teachers WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_page(&self, query: &TeacherListQuery) -> Result<Page<TeacherRecord>, AppError> {
        let cursor = PageCursor::for_query(query)?;
        let column = query.sort_field.column();
        let dir = query.sort_dir.sql();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM teachers");
        let mut has_where = false;

        if let Some(status) = query.filter.as_status() {
            builder.push(" WHERE verification_status = ");
            builder.push_bind(status.as_str());
            has_where = true;
        }

        if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term);
            builder.push(if has_where { " AND " } else { " WHERE " });
            builder.push("(name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR teaching_field ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
            has_where = true;
        }

        if let Some(cursor) = &cursor {
            // Keyset predicate: strictly after the cursor row in sort order,
            // with account_id as the tiebreak.
            let comparison = match query.sort_dir {
                crate::query::SortDir::Asc => ">",
                crate::query::SortDir::Desc => "<",
            };
            builder.push(if has_where { " AND " } else { " WHERE " });
            builder.push(format!("({}, account_id) {} (", column, comparison));
            match cursor.last_sort_key()? {
                SortKey::Time(value) => {
                    builder.push_bind(value);
                }
                SortKey::Text(value) => {
                    builder.push_bind(value);
                }
            }
            builder.push(", ");
            builder.push_bind(cursor.last_id);
            builder.push(")");
        }

        builder.push(format!(
            " ORDER BY {} {}, account_id {} LIMIT ",
            column, dir, dir
        ));
        builder.push_bind(PAGE_SIZE);

        let items: Vec<TeacherRecord> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

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
        sqlx::query_as::<_, TeacherRecord>(
            r#"
            SELECT * FROM teachers
            WHERE verification_status = 'verified' AND teaching_field = $1
            ORDER BY name
            "#,
        )
        .bind(field)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn set_verification_status(
        &self,
        account_id: Uuid,
        status: VerificationStatus,
    ) -> Result<TeacherRecord, AppError> {
        sqlx::query_as::<_, TeacherRecord>(
            "UPDATE teachers SET verification_status = $2 WHERE account_id = $1 RETURNING *",
        )
        .bind(account_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Teacher record not found".to_string()))
    }

    async fn status_counts(&self) -> Result<VerificationStats, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT verification_status, COUNT(*) FROM teachers GROUP BY verification_status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let mut stats = VerificationStats::default();
        for (status, count) in rows {
            match VerificationStatus::parse(&status) {
                Some(VerificationStatus::Pending) => stats.pending = count,
                Some(VerificationStatus::Verified) => stats.verified = count,
                Some(VerificationStatus::Rejected) => stats.rejected = count,
                None => {}
            }
        }
        stats.total = stats.pending + stats.verified + stats.rejected;
        Ok(stats)
    }
}

#[async_trait]
impl LearnerRepository for PgStore {
    async fn create_if_absent(
        &self,
        record: LearnerRecord,
    ) -> Result<CreateOutcome<LearnerRecord>, AppError> {
        let inserted = sqlx::query_as::<_, LearnerRecord>(
            r#"
            INSERT INTO learners (account_id, created_at)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(record.account_id)
        .bind(record.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(match inserted {
            Some(created) => CreateOutcome::Created(created),
            None => CreateOutcome::AlreadyExists,
        })
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<LearnerRecord>, AppError> {
        sqlx::query_as::<_, LearnerRecord>("SELECT * FROM learners WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl SessionRequestRepository for PgStore {
    async fn create(&self, request: SessionRequest) -> Result<SessionRequest, AppError> {
        sqlx::query_as::<_, SessionRequest>(
            r#"
            INSERT INTO session_requests (
                request_id, teacher_id, learner_id, learner_email,
                requested_date, requested_time, topic, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(request.request_id)
        .bind(request.teacher_id)
        .bind(request.learner_id)
        .bind(&request.learner_email)
        .bind(request.requested_date)
        .bind(request.requested_time)
        .bind(&request.topic)
        .bind(&request.status)
        .bind(request.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<SessionRequest>, AppError> {
        sqlx::query_as::<_, SessionRequest>(
            "SELECT * FROM session_requests WHERE teacher_id = $1 ORDER BY created_at DESC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_for_learner(&self, learner_id: Uuid) -> Result<Vec<SessionRequest>, AppError> {
        sqlx::query_as::<_, SessionRequest>(
            "SELECT * FROM session_requests WHERE learner_id = $1 ORDER BY created_at DESC",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn list_categories(&self) -> Result<Vec<LearningCategory>, AppError> {
        sqlx::query_as::<_, LearningCategory>("SELECT * FROM learning_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_fields(&self) -> Result<Vec<LearningField>, AppError> {
        sqlx::query_as::<_, LearningField>("SELECT * FROM learning_fields ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl AdminRepository for PgStore {
    async fn is_admin(&self, account_id: Uuid) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE account_id = $1)",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn add(&self, account_id: Uuid) -> Result<(), AppError> {
        sqlx::query("INSERT INTO admins (account_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

impl Store for PgStore {
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
