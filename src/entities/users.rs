use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct CreateUserArgs {
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub name: String,
    pub avatar: String,
    pub country: String,
    pub date_of_birth: NaiveDate,
    pub codeforces_handle: Option<String>,
    /// Comma separated.
    pub skills: String,
    pub bio: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Loaded separately from `profile_education`, newest entry first.
    #[sqlx(skip)]
    pub education: Vec<Education>,
}

pub struct UpsertProfileArgs {
    pub country: String,
    pub date_of_birth: NaiveDate,
    pub codeforces_handle: Option<String>,
    pub skills: String,
    pub bio: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Education {
    pub id: i64,
    pub user_id: i64,
    pub school: String,
    pub field_of_study: String,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub current: bool,
}

pub struct EducationArgs {
    pub school: String,
    pub field_of_study: String,
    pub from_date: NaiveDate,
    pub to_date: Option<NaiveDate>,
    pub current: bool,
}
