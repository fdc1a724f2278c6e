use crate::entities::users::{
    Education as EducationEntity, Profile as ProfileEntity, User as UserEntity,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(value: UserEntity) -> Self {
        Self {
            user_id: value.id,
            name: value.name,
            email: value.email,
            avatar: value.avatar,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Social {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUser {
    pub id: i64,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: ProfileUser,
    pub country: String,
    pub date_of_birth: NaiveDate,
    pub codeforces_handle: Option<String>,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub social: Social,
    pub education: Vec<Education>,
    pub date: DateTime<Utc>,
}

impl From<ProfileEntity> for Profile {
    fn from(value: ProfileEntity) -> Self {
        Self {
            user: ProfileUser {
                id: value.user_id,
                name: value.name,
                avatar: value.avatar,
            },
            country: value.country,
            date_of_birth: value.date_of_birth,
            codeforces_handle: value.codeforces_handle,
            skills: split_skills(&value.skills),
            bio: value.bio,
            social: Social {
                youtube: value.youtube,
                twitter: value.twitter,
                facebook: value.facebook,
                linkedin: value.linkedin,
                instagram: value.instagram,
            },
            education: value.education.into_iter().map(Education::from).collect(),
            date: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: i64,
    pub school: String,
    pub field_of_study: String,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub current: bool,
}

impl From<EducationEntity> for Education {
    fn from(value: EducationEntity) -> Self {
        Self {
            id: value.id,
            school: value.school,
            field_of_study: value.field_of_study,
            from: value.from_date,
            to: value.to_date,
            current: value.current,
        }
    }
}

pub fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileArgs {
    pub country: String,
    pub date_of_birth: NaiveDate,
    pub codeforces_handle: Option<String>,
    /// Comma separated, e.g. `"dp, graphs"`.
    pub skills: String,
    pub bio: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationArgs {
    pub school: String,
    pub field_of_study: String,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterArgs {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(split_skills(" dp,graphs , ,math"), vec!["dp", "graphs", "math"]);
        assert!(split_skills("  ").is_empty());
    }
}
