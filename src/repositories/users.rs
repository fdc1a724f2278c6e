use crate::entities::users::{
    CreateUserArgs, Education, EducationArgs, Profile, UpsertProfileArgs, User,
};
use async_trait::async_trait;
use chrono::Utc;
use hashbrown::HashMap;
use sqlx::{MySql, Pool, QueryBuilder};

const TABLE_NAME: &str = "users";
const READ_FIELDS: &str = "id, name, email, avatar, password_hash, created_at";
const PROFILE_READ_FIELDS: &str = r#"
p.user_id, u.name, u.avatar, p.country, p.date_of_birth, p.codeforces_handle,
p.skills, p.bio, p.youtube, p.twitter, p.facebook, p.linkedin, p.instagram,
p.updated_at"#;
const EDUCATION_READ_FIELDS: &str =
    "id, user_id, school, field_of_study, from_date, to_date, is_current AS current";

#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn fetch_one(&self, user_id: i64) -> anyhow::Result<Option<User>>;

    async fn fetch_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Returns `None` when the email is already registered.
    async fn create(&self, args: CreateUserArgs) -> anyhow::Result<Option<User>>;

    async fn fetch_profile(&self, user_id: i64) -> anyhow::Result<Option<Profile>>;

    async fn fetch_all_profiles(&self) -> anyhow::Result<Vec<Profile>>;

    async fn upsert_profile(&self, user_id: i64, args: UpsertProfileArgs)
    -> anyhow::Result<Profile>;

    async fn add_education(&self, user_id: i64, args: EducationArgs) -> anyhow::Result<i64>;

    /// Returns `false` when `user_id` has no such education entry.
    async fn update_education(
        &self,
        user_id: i64,
        education_id: i64,
        args: EducationArgs,
    ) -> anyhow::Result<bool>;

    async fn delete_education(&self, user_id: i64, education_id: i64) -> anyhow::Result<bool>;

    /// Removes the user together with their profile and education.
    async fn delete(&self, user_id: i64) -> anyhow::Result<bool>;
}

pub struct MySqlUsers {
    db: Pool<MySql>,
}

impl MySqlUsers {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }

    async fn load_education(&self, mut profiles: Vec<Profile>) -> anyhow::Result<Vec<Profile>> {
        if profiles.is_empty() {
            return Ok(profiles);
        }

        let mut query = QueryBuilder::<MySql>::new(const_str::concat!(
            "SELECT ",
            EDUCATION_READ_FIELDS,
            " FROM profile_education WHERE user_id IN ("
        ));
        let mut ids = query.separated(", ");
        for profile in &profiles {
            ids.push_bind(profile.user_id);
        }
        ids.push_unseparated(") ORDER BY id DESC");
        let education: Vec<Education> = query.build_query_as().fetch_all(&self.db).await?;

        let mut education_by_user: HashMap<i64, Vec<Education>> = HashMap::new();
        for entry in education {
            education_by_user.entry(entry.user_id).or_default().push(entry);
        }
        for profile in &mut profiles {
            profile.education = education_by_user
                .remove(&profile.user_id)
                .unwrap_or_default();
        }
        Ok(profiles)
    }
}

#[async_trait]
impl UsersRepository for MySqlUsers {
    async fn fetch_one(&self, user_id: i64) -> anyhow::Result<Option<User>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE id = ?"
        );
        let user = sqlx::query_as(QUERY)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn fetch_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE email = ?"
        );
        let user = sqlx::query_as(QUERY)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn create(&self, args: CreateUserArgs) -> anyhow::Result<Option<User>> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO ",
            TABLE_NAME,
            " (name, email, avatar, password_hash, created_at) VALUES (?, ?, ?, ?, ?)"
        );
        let result = sqlx::query(QUERY)
            .bind(args.name)
            .bind(args.email)
            .bind(args.avatar)
            .bind(args.password_hash)
            .bind(Utc::now())
            .execute(&self.db)
            .await;
        match result {
            Ok(result) => self.fetch_one(result.last_insert_id() as i64).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_profile(&self, user_id: i64) -> anyhow::Result<Option<Profile>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            PROFILE_READ_FIELDS,
            " FROM profiles p INNER JOIN users u ON u.id = p.user_id WHERE p.user_id = ?"
        );
        let profile: Option<Profile> = sqlx::query_as(QUERY)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        match profile {
            Some(profile) => Ok(self.load_education(vec![profile]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_all_profiles(&self) -> anyhow::Result<Vec<Profile>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            PROFILE_READ_FIELDS,
            " FROM profiles p INNER JOIN users u ON u.id = p.user_id ORDER BY p.user_id"
        );
        let profiles = sqlx::query_as(QUERY).fetch_all(&self.db).await?;
        self.load_education(profiles).await
    }

    async fn upsert_profile(
        &self,
        user_id: i64,
        args: UpsertProfileArgs,
    ) -> anyhow::Result<Profile> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO profiles (user_id, country, date_of_birth, codeforces_handle, skills,",
            " bio, youtube, twitter, facebook, linkedin, instagram, updated_at)",
            " VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            " ON DUPLICATE KEY UPDATE country = VALUES(country),",
            " date_of_birth = VALUES(date_of_birth),",
            " codeforces_handle = VALUES(codeforces_handle), skills = VALUES(skills),",
            " bio = VALUES(bio), youtube = VALUES(youtube), twitter = VALUES(twitter),",
            " facebook = VALUES(facebook), linkedin = VALUES(linkedin),",
            " instagram = VALUES(instagram), updated_at = VALUES(updated_at)"
        );
        sqlx::query(QUERY)
            .bind(user_id)
            .bind(args.country)
            .bind(args.date_of_birth)
            .bind(args.codeforces_handle)
            .bind(args.skills)
            .bind(args.bio)
            .bind(args.youtube)
            .bind(args.twitter)
            .bind(args.facebook)
            .bind(args.linkedin)
            .bind(args.instagram)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        match self.fetch_profile(user_id).await? {
            Some(profile) => Ok(profile),
            None => anyhow::bail!("profile of user {user_id} vanished after upsert"),
        }
    }

    async fn add_education(&self, user_id: i64, args: EducationArgs) -> anyhow::Result<i64> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO profile_education",
            " (user_id, school, field_of_study, from_date, to_date, is_current)",
            " VALUES (?, ?, ?, ?, ?, ?)"
        );
        let result = sqlx::query(QUERY)
            .bind(user_id)
            .bind(args.school)
            .bind(args.field_of_study)
            .bind(args.from_date)
            .bind(args.to_date)
            .bind(args.current)
            .execute(&self.db)
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update_education(
        &self,
        user_id: i64,
        education_id: i64,
        args: EducationArgs,
    ) -> anyhow::Result<bool> {
        const QUERY: &str = const_str::concat!(
            "UPDATE profile_education SET school = ?, field_of_study = ?,",
            " from_date = ?, to_date = ?, is_current = ? WHERE id = ? AND user_id = ?"
        );
        let result = sqlx::query(QUERY)
            .bind(args.school)
            .bind(args.field_of_study)
            .bind(args.from_date)
            .bind(args.to_date)
            .bind(args.current)
            .bind(education_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        // An update that changes nothing reports zero affected rows.
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        const EXISTS: &str = "SELECT COUNT(*) FROM profile_education WHERE id = ? AND user_id = ?";
        let count: i64 = sqlx::query_scalar(EXISTS)
            .bind(education_id)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn delete_education(&self, user_id: i64, education_id: i64) -> anyhow::Result<bool> {
        const QUERY: &str = "DELETE FROM profile_education WHERE id = ? AND user_id = ?";
        let result = sqlx::query(QUERY)
            .bind(education_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: i64) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM profile_education WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(const_str::concat!("DELETE FROM ", TABLE_NAME, " WHERE id = ?"))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
