use argon2::{password_hash::{PasswordHasher, SaltString}, Argon2};
use chrono::Utc;
use rand::rngs::OsRng;
use sea_orm::{entity::prelude::*, sea_query::SimpleExpr, ActiveModelTrait, ActiveValue, DatabaseConnection, QueryOrder, SqlErr};
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

use crate::coach;
use crate::errors::{FieldErrors, ModelError};

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const MUST_EXIST: &str = "must exist";
pub const INVALID: &str = "is invalid";

/// Flags applied when a create request omits them.
pub const DEFAULT_IS_ACTIVE: bool = false;
pub const DEFAULT_IS_PENDING: bool = true;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub mail_address: String,
    #[serde(skip_serializing, default)]
    pub password_digest: String,
    pub name: String,
    pub last_name: String,
    pub coach_id: i32,
    pub is_active: bool,
    pub is_pending: bool,
    pub diet_plan: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Coach }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Coach => Entity::belongs_to(coach::Entity)
                .from(Column::CoachId)
                .to(coach::Column::Id)
                .into(),
        }
    }
}

impl Related<coach::Entity> for Entity {
    fn to() -> RelationDef { Relation::Coach.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// The writable client fields. Anything else a caller submits is dropped
/// during deserialization. Create requires the five identity fields; update
/// accepts any subset.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ClientFields {
    pub mail_address: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub coach_id: Option<i32>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_pending: Option<bool>,
    pub diet_plan: Option<String>,
}

/// Optional equality filters for listing. Parsing never fails: values are
/// cast the way form input is cast to a boolean column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClientFilter {
    #[serde(default, deserialize_with = "filter_flag")]
    pub is_active: Option<FlagMatch>,
    #[serde(default, deserialize_with = "filter_flag")]
    pub is_pending: Option<FlagMatch>,
}

/// A cast filter value. `Blank` compares against NULL, which no stored flag is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagMatch {
    Is(bool),
    Blank,
}

impl FlagMatch {
    fn accepts(self, value: bool) -> bool {
        self == FlagMatch::Is(value)
    }

    fn condition(self, column: Column) -> SimpleExpr {
        match self {
            FlagMatch::Is(b) => column.eq(b),
            FlagMatch::Blank => column.is_null(),
        }
    }
}

impl From<bool> for FlagMatch {
    fn from(b: bool) -> Self { FlagMatch::Is(b) }
}

/// Spellings that cast to `false`; every other non-empty value is `true`.
const FALSE_SPELLINGS: [&str; 7] = ["0", "f", "F", "false", "FALSE", "off", "OFF"];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilterValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Other(IgnoredAny),
}

fn filter_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<FlagMatch>, D::Error> {
    let cast = match Option::<RawFilterValue>::deserialize(d)? {
        None => None,
        Some(RawFilterValue::Bool(b)) => Some(FlagMatch::Is(b)),
        Some(RawFilterValue::Int(n)) => Some(FlagMatch::Is(n != 0)),
        Some(RawFilterValue::Text(s)) if s.is_empty() => Some(FlagMatch::Blank),
        Some(RawFilterValue::Text(s)) => Some(FlagMatch::Is(!FALSE_SPELLINGS.contains(&s.as_str()))),
        Some(RawFilterValue::Other(_)) => Some(FlagMatch::Is(true)),
    };
    Ok(cast)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Booleans as JSON `true`/`false` or the usual form spellings (`"1"`, `"t"`, `"false"`, ...).
fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    use serde::de::Error;
    let parsed = match Option::<RawScalar>::deserialize(d)? {
        None => None,
        Some(RawScalar::Bool(b)) => Some(b),
        Some(RawScalar::Int(1)) => Some(true),
        Some(RawScalar::Int(0)) => Some(false),
        Some(RawScalar::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Some(true),
            "false" | "f" | "0" | "no" | "off" => Some(false),
            other => return Err(D::Error::custom(format!("invalid boolean `{other}`"))),
        },
        Some(RawScalar::Int(n)) => return Err(D::Error::custom(format!("invalid boolean `{n}`"))),
    };
    Ok(parsed)
}

/// Record ids as JSON numbers or numeric strings.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    use serde::de::Error;
    match Option::<RawScalar>::deserialize(d)? {
        None => Ok(None),
        Some(RawScalar::Int(n)) => i32::try_from(n).map(Some).map_err(D::Error::custom),
        Some(RawScalar::Text(s)) => s.trim().parse::<i32>().map(Some).map_err(D::Error::custom),
        Some(RawScalar::Bool(_)) => Err(D::Error::custom("invalid id `bool`")),
    }
}

impl ClientFilter {
    pub fn matches(&self, m: &Model) -> bool {
        self.is_active.map_or(true, |f| f.accepts(m.is_active))
            && self.is_pending.map_or(true, |f| f.accepts(m.is_pending))
    }
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Attachment names are stored as a single path segment.
pub fn valid_diet_plan_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

impl ClientFields {
    /// Presence checks for a new record.
    pub fn validate_new(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if is_blank(&self.mail_address) { errors.add("mail_address", BLANK); }
        if is_blank(&self.password) { errors.add("password", BLANK); }
        if is_blank(&self.name) { errors.add("name", BLANK); }
        if is_blank(&self.last_name) { errors.add("last_name", BLANK); }
        if self.coach_id.is_none() { errors.add("coach_id", BLANK); }
        errors.merge(self.validate_attachment());
        errors
    }

    /// Checks for a partial update: fields that are present must not be blank.
    pub fn validate_changes(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let present = [
            ("mail_address", &self.mail_address),
            ("password", &self.password),
            ("name", &self.name),
            ("last_name", &self.last_name),
        ];
        for (field, value) in present {
            if value.is_some() && is_blank(value) {
                errors.add(field, BLANK);
            }
        }
        errors.merge(self.validate_attachment());
        errors
    }

    fn validate_attachment(&self) -> FieldErrors {
        match self.diet_plan.as_deref() {
            Some(name) if !valid_diet_plan_name(name) => FieldErrors::single("diet_plan", INVALID),
            _ => FieldErrors::new(),
        }
    }

    /// Argon2 digest of the submitted password, computed on the blocking pool.
    pub async fn password_digest(&self) -> Result<Option<String>, ModelError> {
        match self.password.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(plain) => digest_password(plain).await.map(Some),
            None => Ok(None),
        }
    }

    /// Materialize a new record. Call after `validate_new` passed; `digest`
    /// comes from `password_digest`.
    pub fn build(&self, id: i32, digest: String, now: DateTimeWithTimeZone) -> Model {
        Model {
            id,
            mail_address: self.mail_address.clone().unwrap_or_default(),
            password_digest: digest,
            name: self.name.clone().unwrap_or_default(),
            last_name: self.last_name.clone().unwrap_or_default(),
            coach_id: self.coach_id.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(DEFAULT_IS_ACTIVE),
            is_pending: self.is_pending.unwrap_or(DEFAULT_IS_PENDING),
            diet_plan: self.diet_plan.as_deref().map(|s| s.trim().to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the fields that are present; everything else stays as is.
    /// A new `digest` replaces the stored one.
    pub fn apply_to(&self, model: &mut Model, digest: Option<String>, now: DateTimeWithTimeZone) {
        if let Some(v) = &self.mail_address { model.mail_address = v.clone(); }
        if let Some(v) = digest { model.password_digest = v; }
        if let Some(v) = &self.name { model.name = v.clone(); }
        if let Some(v) = &self.last_name { model.last_name = v.clone(); }
        if let Some(v) = self.coach_id { model.coach_id = v; }
        if let Some(v) = self.is_active { model.is_active = v; }
        if let Some(v) = self.is_pending { model.is_pending = v; }
        if let Some(v) = &self.diet_plan { model.diet_plan = Some(v.trim().to_string()); }
        model.updated_at = now;
    }
}

fn hash_password(plain: &str) -> Result<String, ModelError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ModelError::Hash(e.to_string()))
}

/// `hash_password` on tokio's blocking pool so argon2 never stalls a worker.
pub async fn digest_password(plain: &str) -> Result<String, ModelError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| ModelError::Hash(e.to_string()))?
}

fn map_write_err(e: DbErr) -> ModelError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ModelError::Validation(FieldErrors::single("mail_address", TAKEN)),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => ModelError::Validation(FieldErrors::single("coach", MUST_EXIST)),
        _ => ModelError::Db(e.to_string()),
    }
}

async fn mail_taken(db: &DatabaseConnection, mail: &str, except: Option<i32>) -> Result<bool, ModelError> {
    let mut finder = Entity::find().filter(Column::MailAddress.eq(mail));
    if let Some(id) = except { finder = finder.filter(Column::Id.ne(id)); }
    Ok(finder.one(db).await?.is_some())
}

/// Uniqueness and coach reference checks that need the database.
async fn check_references(db: &DatabaseConnection, fields: &ClientFields, except: Option<i32>) -> Result<FieldErrors, ModelError> {
    let mut errors = FieldErrors::new();
    if let Some(mail) = fields.mail_address.as_deref().filter(|m| !m.trim().is_empty()) {
        if mail_taken(db, mail, except).await? { errors.add("mail_address", TAKEN); }
    }
    if let Some(coach_id) = fields.coach_id {
        if !coach::exists(db, coach_id).await? { errors.add("coach", MUST_EXIST); }
    }
    Ok(errors)
}

/// All clients, newest `updated_at` first, narrowed by the filter.
pub async fn scan(db: &DatabaseConnection, filter: ClientFilter) -> Result<Vec<Model>, ModelError> {
    let mut finder = Entity::find();
    if let Some(f) = filter.is_active { finder = finder.filter(f.condition(Column::IsActive)); }
    if let Some(f) = filter.is_pending { finder = finder.filter(f.condition(Column::IsPending)); }
    let rows = finder
        .order_by_desc(Column::UpdatedAt)
        .order_by_desc(Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn find(db: &DatabaseConnection, id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn insert(db: &DatabaseConnection, fields: &ClientFields) -> Result<Model, ModelError> {
    let mut errors = fields.validate_new();
    errors.merge(check_references(db, fields, None).await?);
    errors.into_result()?;

    let digest = fields.password_digest().await?.unwrap_or_default();
    let model = fields.build(0, digest, Utc::now().into());
    let mut am = ActiveModel::from(model).reset_all();
    am.id = ActiveValue::NotSet;
    am.insert(db).await.map_err(map_write_err)
}

pub async fn update(db: &DatabaseConnection, existing: Model, fields: &ClientFields) -> Result<Model, ModelError> {
    let mut errors = fields.validate_changes();
    errors.merge(check_references(db, fields, Some(existing.id)).await?);
    errors.into_result()?;

    let digest = fields.password_digest().await?;
    let mut changed = existing;
    fields.apply_to(&mut changed, digest, Utc::now().into());
    let am = ActiveModel::from(changed).reset_all();
    am.update(db).await.map_err(map_write_err)
}

/// Returns whether a row was removed.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
