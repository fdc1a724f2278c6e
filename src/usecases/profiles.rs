use crate::adapters::codeforces;
use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::users::{EducationArgs as EducationEntityArgs, UpsertProfileArgs};
use crate::models::users::{EducationArgs, Profile, ProfileArgs, split_skills};
use serde_json::Value;
use tracing::{info, warn};

pub async fn fetch_one<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Profile> {
    match ctx.users().fetch_profile(user_id).await {
        Ok(Some(profile)) => Ok(Profile::from(profile)),
        Ok(None) => Err(AppError::ProfilesNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn ensure_exists<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<()> {
    fetch_one(ctx, user_id).await.map(|_| ())
}

pub async fn fetch_all<C: Context>(ctx: &C) -> ServiceResult<Vec<Profile>> {
    match ctx.users().fetch_all_profiles().await {
        Ok(profiles) => Ok(profiles.into_iter().map(Profile::from).collect()),
        Err(e) => unexpected(e),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Creates the profile of `user_id`, or replaces every field of an
/// existing one.
pub async fn upsert<C: Context>(ctx: &C, user_id: i64, args: ProfileArgs) -> ServiceResult<Profile> {
    let country = args.country.trim().to_string();
    let skills = split_skills(&args.skills);
    if country.is_empty() || skills.is_empty() {
        return Err(AppError::ProfilesInvalidFields);
    }
    let args = UpsertProfileArgs {
        country,
        date_of_birth: args.date_of_birth,
        codeforces_handle: non_blank(args.codeforces_handle),
        skills: skills.join(","),
        bio: non_blank(args.bio),
        youtube: non_blank(args.youtube),
        twitter: non_blank(args.twitter),
        facebook: non_blank(args.facebook),
        linkedin: non_blank(args.linkedin),
        instagram: non_blank(args.instagram),
    };
    match ctx.users().upsert_profile(user_id, args).await {
        Ok(profile) => {
            info!(user_id, "Profile saved");
            Ok(Profile::from(profile))
        }
        Err(e) => unexpected(e),
    }
}

fn validate_education(args: EducationArgs) -> ServiceResult<EducationEntityArgs> {
    let school = args.school.trim().to_string();
    let field_of_study = args.field_of_study.trim().to_string();
    if school.is_empty() || field_of_study.is_empty() {
        return Err(AppError::ProfilesInvalidEducation);
    }
    Ok(EducationEntityArgs {
        school,
        field_of_study,
        from_date: args.from,
        to_date: args.to,
        current: args.current,
    })
}

/// Adds an education entry. An entry with the same school, field, start
/// and end date is rejected; entries without an end date never collide.
pub async fn add_education<C: Context>(
    ctx: &C,
    user_id: i64,
    args: EducationArgs,
) -> ServiceResult<Profile> {
    let args = validate_education(args)?;
    let profile = fetch_one(ctx, user_id).await?;
    let duplicate = profile.education.iter().any(|entry| {
        entry.school == args.school
            && entry.field_of_study == args.field_of_study
            && entry.from == args.from_date
            && entry.to.is_some()
            && entry.to == args.to_date
    });
    if duplicate {
        return Err(AppError::ProfilesEducationExists);
    }
    match ctx.users().add_education(user_id, args).await {
        Ok(education_id) => info!(user_id, education_id, "Education added"),
        Err(e) => return unexpected(e),
    }
    fetch_one(ctx, user_id).await
}

pub async fn update_education<C: Context>(
    ctx: &C,
    user_id: i64,
    education_id: i64,
    args: EducationArgs,
) -> ServiceResult<Profile> {
    let args = validate_education(args)?;
    ensure_exists(ctx, user_id).await?;
    match ctx.users().update_education(user_id, education_id, args).await {
        Ok(true) => fetch_one(ctx, user_id).await,
        Ok(false) => Err(AppError::ProfilesEducationNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn delete_education<C: Context>(
    ctx: &C,
    user_id: i64,
    education_id: i64,
) -> ServiceResult<Profile> {
    ensure_exists(ctx, user_id).await?;
    match ctx.users().delete_education(user_id, education_id).await {
        Ok(true) => fetch_one(ctx, user_id).await,
        Ok(false) => Err(AppError::ProfilesEducationNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_codeforces<C: Context>(ctx: &C, handle: &str) -> ServiceResult<Value> {
    let base_url = &ctx.config().codeforces_api_url;
    match codeforces::fetch_user_info(base_url, handle).await {
        Ok(Some(info)) => Ok(info),
        Ok(None) => Err(AppError::ProfilesCodeforcesNotFound),
        Err(e) => {
            warn!(handle, "Failed fetching codeforces user info: {e:?}");
            Err(AppError::ProfilesCodeforcesNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::state::{AppState, ServiceConfig};
    use crate::entities::users::CreateUserArgs;
    use crate::repositories::memory::InMemoryStore;
    use crate::repositories::users::UsersRepository;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn args(country: &str, skills: &str) -> ProfileArgs {
        ProfileArgs {
            country: country.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(),
            codeforces_handle: Some("  ".to_string()),
            skills: skills.to_string(),
            bio: Some("greedy enjoyer".to_string()),
            youtube: None,
            twitter: None,
            facebook: None,
            linkedin: None,
            instagram: Some("cp".to_string()),
        }
    }

    async fn setup() -> (AppState, i64) {
        let store = Arc::new(InMemoryStore::new());
        let user = UsersRepository::create(
            store.as_ref(),
            CreateUserArgs {
                name: "carol".to_string(),
                email: "carol@example.com".to_string(),
                avatar: "a.png".to_string(),
                password_hash: String::new(),
            },
        )
        .await
        .unwrap()
        .unwrap();
        (AppState::in_memory(store, ServiceConfig::default()), user.id)
    }

    #[tokio::test]
    async fn upsert_normalizes_fields_and_replaces() {
        let (ctx, user_id) = setup().await;
        assert_eq!(
            fetch_one(&ctx, user_id).await.unwrap_err(),
            AppError::ProfilesNotFound
        );

        let profile = upsert(&ctx, user_id, args("PL", "dp, graphs ,"))
            .await
            .unwrap();
        assert_eq!(profile.skills, vec!["dp", "graphs"]);
        assert_eq!(profile.codeforces_handle, None);
        assert_eq!(profile.user.name, "carol");
        assert_eq!(profile.social.instagram.as_deref(), Some("cp"));

        upsert(&ctx, user_id, args("DE", "math")).await.unwrap();
        let profile = fetch_one(&ctx, user_id).await.unwrap();
        assert_eq!(profile.country, "DE");
        assert_eq!(fetch_all(&ctx).await.unwrap().len(), 1);
    }

    fn education(school: &str, to: Option<NaiveDate>) -> EducationArgs {
        EducationArgs {
            school: school.to_string(),
            field_of_study: "Computer Science".to_string(),
            from: NaiveDate::from_ymd_opt(2018, 10, 1).unwrap(),
            to,
            current: to.is_none(),
        }
    }

    #[tokio::test]
    async fn education_needs_a_profile_and_rejects_duplicates() {
        let (ctx, user_id) = setup().await;
        assert_eq!(
            add_education(&ctx, user_id, education("MIT", None))
                .await
                .unwrap_err(),
            AppError::ProfilesNotFound
        );
        upsert(&ctx, user_id, args("PL", "dp")).await.unwrap();

        let graduated = NaiveDate::from_ymd_opt(2022, 6, 30);
        add_education(&ctx, user_id, education("Warsaw", graduated))
            .await
            .unwrap();
        let profile = add_education(&ctx, user_id, education("  MIT ", None))
            .await
            .unwrap();
        let schools: Vec<&str> = profile.education.iter().map(|e| e.school.as_str()).collect();
        assert_eq!(schools, vec!["MIT", "Warsaw"]);

        assert_eq!(
            add_education(&ctx, user_id, education("Warsaw", graduated))
                .await
                .unwrap_err(),
            AppError::ProfilesEducationExists
        );
        // Open-ended entries never count as duplicates.
        add_education(&ctx, user_id, education("MIT", None))
            .await
            .unwrap();
        assert_eq!(
            add_education(&ctx, user_id, education(" ", None))
                .await
                .unwrap_err(),
            AppError::ProfilesInvalidEducation
        );
    }

    #[tokio::test]
    async fn education_is_edited_and_removed_by_its_owner_only() {
        let (ctx, user_id) = setup().await;
        upsert(&ctx, user_id, args("PL", "dp")).await.unwrap();
        let profile = add_education(&ctx, user_id, education("MIT", None))
            .await
            .unwrap();
        let education_id = profile.education[0].id;

        let graduated = NaiveDate::from_ymd_opt(2022, 6, 30);
        let profile = update_education(&ctx, user_id, education_id, education("MIT", graduated))
            .await
            .unwrap();
        assert_eq!(profile.education[0].to, graduated);
        assert!(!profile.education[0].current);

        assert_eq!(
            update_education(&ctx, user_id, education_id + 100, education("MIT", None))
                .await
                .unwrap_err(),
            AppError::ProfilesEducationNotFound
        );

        let profile = delete_education(&ctx, user_id, education_id).await.unwrap();
        assert!(profile.education.is_empty());
        assert_eq!(
            delete_education(&ctx, user_id, education_id)
                .await
                .unwrap_err(),
            AppError::ProfilesEducationNotFound
        );
    }

    #[tokio::test]
    async fn upsert_requires_country_and_skills() {
        let (ctx, user_id) = setup().await;
        assert_eq!(
            upsert(&ctx, user_id, args(" ", "dp")).await.unwrap_err(),
            AppError::ProfilesInvalidFields
        );
        assert_eq!(
            upsert(&ctx, user_id, args("PL", " , ")).await.unwrap_err(),
            AppError::ProfilesInvalidFields
        );
    }
}
