//! PostgreSQL Repository Implementations

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use kernel::error::conversions::unique_violation_constraint;
use kernel::id::{CertificateId, UserId};
use kernel::validation::{
    Criteria, CustomValue, DEFAULT_MESSAGE, EntityCatalog, EntityMetadata, EntityRef, FieldKind,
    FieldSpec, FieldValue, ObjectGateway, Record,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, TypeInfo, ValueRef};

use crate::domain::entity::{Certificate, User};
use crate::domain::repository::{CertificateRepository, UserRepository};
use crate::domain::schema;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, role::Role, user_password::UserPassword,
};
use crate::error::{UserError, UserResult};

/// PostgreSQL-backed users and certificates store
///
/// Also serves as the uniqueness validator's gateway, answering queries
/// for every entity in [`schema::catalog`].
#[derive(Clone)]
pub struct PgUsersRepository {
    pool: PgPool,
    catalog: Arc<EntityCatalog>,
}

impl PgUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            catalog: Arc::new(schema::catalog()),
        }
    }

    fn entity(&self, entity: &str) -> Result<&EntityMetadata, sqlx::Error> {
        self.catalog
            .get(entity)
            .ok_or_else(|| sqlx::Error::Protocol(format!("no table mapped for entity `{entity}`")))
    }
}

/// Input field guarded by a unique constraint in `database/migrations`
fn constraint_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "uniq_users_name" => Some("name"),
        "uniq_users_surname" => Some("surname"),
        "uniq_users_email" => Some("email"),
        "uniq_certificate_user_name" => Some("name"),
        _ => None,
    }
}

/// Turn a violated unique index into the field error a pre-check would give
fn map_unique_violation(err: sqlx::Error) -> UserError {
    let path = unique_violation_constraint(&err).and_then(constraint_field);
    match path {
        Some(path) => {
            tracing::debug!(path, "Unique index rejected write");
            UserError::field(path, DEFAULT_MESSAGE)
        }
        None => UserError::Database(err),
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgUsersRepository {
    async fn create(&self, user: &User) -> UserResult<User> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, surname, password, email, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user.name.as_str())
        .bind(user.surname.as_str())
        .bind(user.password.as_str())
        .bind(user.email.as_str())
        .bind(user.role.code())
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        let mut created = user.clone();
        created.id = Some(UserId::new(id));
        Ok(created)
    }

    async fn find_by_id(&self, user_id: UserId) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, password, email, role, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> UserResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, password, email, role, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn update(&self, user: &User) -> UserResult<()> {
        let user_id = user
            .id
            .ok_or_else(|| UserError::Internal("cannot update an unsaved user".to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                surname = $3,
                password = $4,
                email = $5,
                role = $6,
                is_active = $7
            WHERE id = $1
            "#,
        )
        .bind(user_id.get())
        .bind(user.name.as_str())
        .bind(user.surname.as_str())
        .bind(user.password.as_str())
        .bind(user.email.as_str())
        .bind(user.role.code())
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        Ok(())
    }
}

// ============================================================================
// Certificate Repository Implementation
// ============================================================================

impl CertificateRepository for PgUsersRepository {
    async fn create(&self, certificate: &Certificate) -> UserResult<Certificate> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO certificate (user_id, name, price)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(certificate.user_id.map(|id| id.get()))
        .bind(certificate.name.as_str())
        .bind(certificate.price)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        let mut created = certificate.clone();
        created.id = Some(CertificateId::new(id));
        Ok(created)
    }

    async fn find_by_id(&self, certificate_id: CertificateId) -> UserResult<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(
            "SELECT id, user_id, name, price FROM certificate WHERE id = $1",
        )
        .bind(certificate_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CertificateRow::into_certificate))
    }

    async fn find_by_user_id(&self, user_id: UserId) -> UserResult<Vec<Certificate>> {
        let rows = sqlx::query_as::<_, CertificateRow>(
            "SELECT id, user_id, name, price FROM certificate WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(CertificateRow::into_certificate)
            .collect())
    }

    async fn delete(&self, certificate_id: CertificateId) -> UserResult<()> {
        let result = sqlx::query("DELETE FROM certificate WHERE id = $1")
            .bind(certificate_id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::CertificateNotFound);
        }

        Ok(())
    }
}

// ============================================================================
// Uniqueness Gateway Implementation
// ============================================================================

impl ObjectGateway for PgUsersRepository {
    type Error = sqlx::Error;

    fn metadata(&self, entity: &str) -> Option<&EntityMetadata> {
        self.catalog.get(entity)
    }

    async fn find_matching(
        &self,
        entity: &str,
        criteria: &Criteria,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, sqlx::Error> {
        let metadata = self.entity(entity)?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        let mut columns = query.separated(", ");
        for spec in metadata.fields() {
            columns.push(quote(&spec.column));
        }
        query.push(" FROM ");
        query.push(quote(metadata.table()));
        query.push(" WHERE TRUE");

        for (field, value) in criteria.iter() {
            let spec = metadata.get(field).ok_or_else(|| {
                sqlx::Error::Protocol(format!("`{entity}` has no mapped field `{field}`"))
            })?;

            query.push(" AND ");
            query.push(quote(&spec.column));
            if value.is_null() {
                query.push(" IS NULL");
            } else {
                query.push(" = ");
                push_value(&mut query, value)?;
            }
        }

        if let Some(limit) = limit {
            query.push(" LIMIT ");
            query.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = query.build().fetch_all(&self.pool).await?;

        tracing::debug!(entity, matches = rows.len(), "Uniqueness query");

        rows.iter()
            .map(|row| {
                metadata
                    .fields()
                    .iter()
                    .try_fold(Record::new(entity), |record, spec| {
                        Ok::<_, sqlx::Error>(record.with(spec.name.as_str(), decode(row, spec)?))
                    })
            })
            .collect()
    }

    async fn resolve(&self, reference: &mut EntityRef) -> Result<(), sqlx::Error> {
        if reference.is_loaded() {
            return Ok(());
        }

        let metadata = self.entity(reference.entity())?;
        let display = metadata
            .display_field_name()
            .and_then(|field| metadata.get(field));

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        match display {
            Some(spec) => query.push(quote(&spec.column)),
            None => query.push("NULL::TEXT"),
        };
        query.push(" FROM ");
        query.push(quote(metadata.table()));
        query.push(" WHERE TRUE");

        for (field, value) in reference.identifiers() {
            let column = metadata
                .get(field)
                .map_or(field.as_str(), |spec| spec.column.as_str());
            query.push(" AND ");
            query.push(quote(column));
            query.push(" = ");
            push_value(&mut query, value)?;
        }
        query.push(" LIMIT 1");

        // A dangling reference resolves to nothing to display
        let display = match query.build().fetch_optional(&self.pool).await? {
            Some(row) => row.try_get::<Option<String>, _>(0)?,
            None => None,
        };
        reference.mark_loaded(display);

        Ok(())
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Bind a criteria value; a reference binds its single identifier value
fn push_value(query: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) -> Result<(), sqlx::Error> {
    match value {
        FieldValue::Null => {
            query.push("NULL");
        }
        FieldValue::Bool(b) => {
            query.push_bind(*b);
        }
        FieldValue::Int(n) => {
            query.push_bind(*n);
        }
        FieldValue::Float(x) => {
            query.push_bind(*x);
        }
        FieldValue::Text(s) => {
            query.push_bind(s.clone());
        }
        FieldValue::Timestamp(t) => {
            query.push_bind(*t);
        }
        FieldValue::Custom(custom) => {
            query.push_bind(custom.stored().to_string());
        }
        FieldValue::Ref(reference) => match reference.identifiers() {
            [(_, id)] => return push_value(query, id),
            _ => {
                return Err(sqlx::Error::Protocol(format!(
                    "reference to `{}` needs exactly one identifier value",
                    reference.entity()
                )));
            }
        },
    }
    Ok(())
}

/// Read a column into a [`FieldValue`] by its SQL type
fn decode(row: &PgRow, spec: &FieldSpec) -> Result<FieldValue, sqlx::Error> {
    let column = spec.column.as_str();
    let raw = row.try_get_raw(column)?;
    if raw.is_null() {
        return Ok(FieldValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INT8" => FieldValue::Int(row.try_get::<i64, _>(column)?),
        "INT4" => FieldValue::Int(row.try_get::<i32, _>(column)?.into()),
        "INT2" => FieldValue::Int(row.try_get::<i16, _>(column)?.into()),
        "BOOL" => FieldValue::Bool(row.try_get(column)?),
        "FLOAT8" => FieldValue::Float(row.try_get(column)?),
        "FLOAT4" => FieldValue::Float(row.try_get::<f32, _>(column)?.into()),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => FieldValue::Text(row.try_get(column)?),
        "TIMESTAMPTZ" => FieldValue::Timestamp(row.try_get::<DateTime<Utc>, _>(column)?),
        "TIMESTAMP" => FieldValue::Timestamp(row.try_get::<NaiveDateTime, _>(column)?.and_utc()),
        other => {
            return Err(sqlx::Error::Decode(
                format!("column `{column}` has unsupported type {other}").into(),
            ));
        }
    };

    Ok(match (&spec.kind, value) {
        (FieldKind::Association { target }, FieldValue::Int(id)) => {
            FieldValue::Ref(EntityRef::by_id(target.as_str(), id))
        }
        (FieldKind::Custom { type_name }, FieldValue::Text(stored)) => {
            FieldValue::Custom(CustomValue::new(type_name.as_str(), stored))
        }
        (_, value) => value,
    })
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    surname: String,
    password: String,
    email: String,
    role: String,
    is_active: bool,
}

impl UserRow {
    fn into_user(self) -> UserResult<User> {
        let role = Role::from_code(&self.role)
            .ok_or_else(|| UserError::Internal(format!("Unknown role code: {}", self.role)))?;

        Ok(User {
            id: Some(UserId::new(self.id)),
            name: PersonName::from_db(self.name),
            surname: PersonName::from_db(self.surname),
            password: UserPassword::from_db(self.password)?,
            email: Email::from_db(self.email),
            role,
            is_active: self.is_active,
            certificates: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: i64,
    user_id: Option<i64>,
    name: String,
    price: i32,
}

impl CertificateRow {
    fn into_certificate(self) -> Certificate {
        Certificate {
            id: Some(CertificateId::new(self.id)),
            user_id: self.user_id.map(UserId::new),
            name: self.name,
            price: self.price,
        }
    }
}
