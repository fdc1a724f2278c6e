//! In-process backend for every repository trait.
//!
//! Used by the test suites and for running the API without MySQL/Redis.
//! All tables live behind one lock, so every write is serialized the same
//! way the MySQL unique keys and conditional updates serialize them.

use crate::entities::posts::{
    Comment, CreateCommentArgs, CreatePostArgs, Post, PostThread, Reaction,
};
use crate::entities::relationships::{
    CreateOutcome, CreateRelationshipArgs, Relationship, STATUS_PENDING, pair_key,
};
use crate::entities::sessions::Session;
use crate::entities::users::{
    CreateUserArgs, Education, EducationArgs, Profile, UpsertProfileArgs, User,
};
use crate::repositories::posts::PostsRepository;
use crate::repositories::relationships::RelationshipsRepository;
use crate::repositories::sessions::SessionsRepository;
use crate::repositories::users::UsersRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: HashMap<i64, User>,
    profiles: HashMap<i64, Profile>,
    education: HashMap<i64, Education>,
    relationships: HashMap<i64, Relationship>,
    relationship_pairs: HashMap<(i64, i64), i64>,
    posts: HashMap<i64, PostThread>,
    sessions: HashMap<Uuid, Session>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn profile_with_user(&self, profile: &Profile) -> Profile {
        let mut profile = profile.clone();
        if let Some(user) = self.users.get(&profile.user_id) {
            profile.name = user.name.clone();
            profile.avatar = user.avatar.clone();
        }
        profile.education = self
            .education
            .values()
            .filter(|entry| entry.user_id == profile.user_id)
            .cloned()
            .collect();
        profile.education.sort_by(|a, b| b.id.cmp(&a.id));
        profile
    }
}

fn newest_first(threads: &mut [PostThread]) {
    threads.sort_by(|a, b| {
        b.post
            .created_at
            .cmp(&a.post.created_at)
            .then(b.post.id.cmp(&a.post.id))
    });
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a post with an explicit creation time.
    pub async fn insert_post_at(&self, args: CreatePostArgs, created_at: DateTime<Utc>) -> i64 {
        let mut tables = self.tables.lock().await;
        let post_id = tables.next_id();
        let post = Post {
            id: post_id,
            user_id: args.user_id,
            name: args.name,
            avatar: args.avatar,
            title: args.title,
            text: args.text,
            created_at,
        };
        let thread = PostThread {
            post,
            comments: vec![],
            reactions: vec![],
        };
        tables.posts.insert(post_id, thread);
        post_id
    }

    /// Inserts a comment with an explicit creation time. Returns `None` if
    /// the post does not exist.
    pub async fn insert_comment_at(
        &self,
        post_id: i64,
        args: CreateCommentArgs,
        created_at: DateTime<Utc>,
    ) -> Option<i64> {
        let mut tables = self.tables.lock().await;
        let comment_id = tables.next_id();
        let thread = tables.posts.get_mut(&post_id)?;
        thread.comments.insert(
            0,
            Comment {
                id: comment_id,
                post_id,
                user_id: args.user_id,
                name: args.name,
                avatar: args.avatar,
                text: args.text,
                created_at,
            },
        );
        Some(comment_id)
    }

    /// Inserts or replaces a reaction with an explicit creation time.
    pub async fn insert_reaction_at(
        &self,
        post_id: i64,
        user_id: i64,
        kind: &str,
        created_at: DateTime<Utc>,
    ) -> bool {
        let mut tables = self.tables.lock().await;
        let Some(thread) = tables.posts.get_mut(&post_id) else {
            return false;
        };
        thread.reactions.retain(|r| r.user_id != user_id);
        thread.reactions.insert(
            0,
            Reaction {
                post_id,
                user_id,
                kind: kind.to_string(),
                created_at,
            },
        );
        true
    }
}

#[async_trait]
impl RelationshipsRepository for InMemoryStore {
    async fn fetch_one(&self, relationship_id: i64) -> anyhow::Result<Option<Relationship>> {
        let tables = self.tables.lock().await;
        Ok(tables.relationships.get(&relationship_id).cloned())
    }

    async fn fetch_between(
        &self,
        user_id: i64,
        other_user_id: i64,
    ) -> anyhow::Result<Option<Relationship>> {
        let tables = self.tables.lock().await;
        let relationship = tables
            .relationship_pairs
            .get(&pair_key(user_id, other_user_id))
            .and_then(|id| tables.relationships.get(id))
            .cloned();
        Ok(relationship)
    }

    async fn fetch_all(&self, user_id: i64) -> anyhow::Result<Vec<Relationship>> {
        let tables = self.tables.lock().await;
        let mut relationships: Vec<Relationship> = tables
            .relationships
            .values()
            .filter(|r| r.initiator_id == user_id || r.acceptor_id == user_id)
            .cloned()
            .collect();
        relationships.sort_by_key(|r| r.id);
        Ok(relationships)
    }

    async fn create(&self, args: CreateRelationshipArgs) -> anyhow::Result<CreateOutcome> {
        let mut tables = self.tables.lock().await;
        let key = pair_key(args.initiator_id, args.acceptor_id);
        if tables.relationship_pairs.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let relationship_id = tables.next_id();
        let now = Utc::now();
        let relationship = Relationship {
            id: relationship_id,
            initiator_id: args.initiator_id,
            initiator_name: args.initiator_name,
            initiator_avatar: args.initiator_avatar,
            acceptor_id: args.acceptor_id,
            acceptor_name: args.acceptor_name,
            acceptor_avatar: args.acceptor_avatar,
            status: STATUS_PENDING.to_string(),
            initiator_checked_at: now,
            acceptor_checked_at: now,
            created_at: now,
        };
        tables.relationship_pairs.insert(key, relationship_id);
        tables
            .relationships
            .insert(relationship_id, relationship.clone());
        Ok(CreateOutcome::Created(relationship))
    }

    async fn resolve(
        &self,
        relationship_id: i64,
        status: &'static str,
    ) -> anyhow::Result<Option<Relationship>> {
        let mut tables = self.tables.lock().await;
        match tables.relationships.get_mut(&relationship_id) {
            Some(relationship) if relationship.status == STATUS_PENDING => {
                relationship.status = status.to_string();
                Ok(Some(relationship.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_by_user(&self, user_id: i64) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .relationships
            .retain(|_, r| r.initiator_id != user_id && r.acceptor_id != user_id);
        tables
            .relationship_pairs
            .retain(|(low, high), _| *low != user_id && *high != user_id);
        Ok(())
    }
}

#[async_trait]
impl PostsRepository for InMemoryStore {
    async fn fetch_all(&self) -> anyhow::Result<Vec<PostThread>> {
        let tables = self.tables.lock().await;
        let mut threads: Vec<PostThread> = tables.posts.values().cloned().collect();
        newest_first(&mut threads);
        Ok(threads)
    }

    async fn fetch_one(&self, post_id: i64) -> anyhow::Result<Option<PostThread>> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.get(&post_id).cloned())
    }

    async fn fetch_active_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PostThread>> {
        let tables = self.tables.lock().await;
        let mut threads: Vec<PostThread> = tables
            .posts
            .values()
            .filter(|thread| thread.has_activity_since(user_id, since))
            .cloned()
            .collect();
        newest_first(&mut threads);
        Ok(threads)
    }

    async fn create(&self, args: CreatePostArgs) -> anyhow::Result<PostThread> {
        let post_id = self.insert_post_at(args, Utc::now()).await;
        let tables = self.tables.lock().await;
        match tables.posts.get(&post_id) {
            Some(thread) => Ok(thread.clone()),
            None => anyhow::bail!("post {post_id} vanished after insert"),
        }
    }

    async fn update(
        &self,
        post_id: i64,
        title: Option<String>,
        text: String,
    ) -> anyhow::Result<Option<PostThread>> {
        let mut tables = self.tables.lock().await;
        let Some(thread) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        if title.is_some() {
            thread.post.title = title;
        }
        thread.post.text = text;
        Ok(Some(thread.clone()))
    }

    async fn delete(&self, post_id: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables.posts.remove(&post_id).is_some())
    }

    async fn set_reaction(
        &self,
        post_id: i64,
        user_id: i64,
        kind: &'static str,
    ) -> anyhow::Result<()> {
        if !self
            .insert_reaction_at(post_id, user_id, kind, Utc::now())
            .await
        {
            anyhow::bail!("cannot react to missing post {post_id}");
        }
        Ok(())
    }

    async fn remove_reaction(&self, post_id: i64, user_id: i64) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(thread) = tables.posts.get_mut(&post_id) {
            thread.reactions.retain(|r| r.user_id != user_id);
        }
        Ok(())
    }

    async fn add_comment(&self, post_id: i64, args: CreateCommentArgs) -> anyhow::Result<i64> {
        match self.insert_comment_at(post_id, args, Utc::now()).await {
            Some(comment_id) => Ok(comment_id),
            None => anyhow::bail!("cannot comment on missing post {post_id}"),
        }
    }

    async fn delete_comment(&self, comment_id: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        for thread in tables.posts.values_mut() {
            let before = thread.comments.len();
            thread.comments.retain(|c| c.id != comment_id);
            if thread.comments.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_by_user(&self, user_id: i64) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        tables.posts.retain(|_, thread| thread.post.user_id != user_id);
        for thread in tables.posts.values_mut() {
            thread.comments.retain(|c| c.user_id != user_id);
            thread.reactions.retain(|r| r.user_id != user_id);
        }
        Ok(())
    }
}

#[async_trait]
impl UsersRepository for InMemoryStore {
    async fn fetch_one(&self, user_id: i64) -> anyhow::Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn fetch_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.lock().await;
        let user = tables.users.values().find(|u| u.email == email).cloned();
        Ok(user)
    }

    async fn create(&self, args: CreateUserArgs) -> anyhow::Result<Option<User>> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == args.email) {
            return Ok(None);
        }
        let user_id = tables.next_id();
        let user = User {
            id: user_id,
            name: args.name,
            email: args.email,
            avatar: args.avatar,
            password_hash: args.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user_id, user.clone());
        Ok(Some(user))
    }

    async fn fetch_profile(&self, user_id: i64) -> anyhow::Result<Option<Profile>> {
        let tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .get(&user_id)
            .map(|profile| tables.profile_with_user(profile));
        Ok(profile)
    }

    async fn fetch_all_profiles(&self) -> anyhow::Result<Vec<Profile>> {
        let tables = self.tables.lock().await;
        let mut profiles: Vec<Profile> = tables
            .profiles
            .values()
            .map(|profile| tables.profile_with_user(profile))
            .collect();
        profiles.sort_by_key(|p| p.user_id);
        Ok(profiles)
    }

    async fn upsert_profile(
        &self,
        user_id: i64,
        args: UpsertProfileArgs,
    ) -> anyhow::Result<Profile> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&user_id) {
            anyhow::bail!("cannot create a profile for missing user {user_id}");
        }
        let profile = Profile {
            user_id,
            name: String::new(),
            avatar: String::new(),
            country: args.country,
            date_of_birth: args.date_of_birth,
            codeforces_handle: args.codeforces_handle,
            skills: args.skills,
            bio: args.bio,
            youtube: args.youtube,
            twitter: args.twitter,
            facebook: args.facebook,
            linkedin: args.linkedin,
            instagram: args.instagram,
            updated_at: Utc::now(),
            education: vec![],
        };
        let profile = tables.profile_with_user(&profile);
        tables.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn add_education(&self, user_id: i64, args: EducationArgs) -> anyhow::Result<i64> {
        let mut tables = self.tables.lock().await;
        if !tables.profiles.contains_key(&user_id) {
            anyhow::bail!("cannot add education to missing profile {user_id}");
        }
        let education_id = tables.next_id();
        let entry = Education {
            id: education_id,
            user_id,
            school: args.school,
            field_of_study: args.field_of_study,
            from_date: args.from_date,
            to_date: args.to_date,
            current: args.current,
        };
        tables.education.insert(education_id, entry);
        Ok(education_id)
    }

    async fn update_education(
        &self,
        user_id: i64,
        education_id: i64,
        args: EducationArgs,
    ) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.education.get_mut(&education_id) {
            Some(entry) if entry.user_id == user_id => {
                entry.school = args.school;
                entry.field_of_study = args.field_of_study;
                entry.from_date = args.from_date;
                entry.to_date = args.to_date;
                entry.current = args.current;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_education(&self, user_id: i64, education_id: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        let owned = tables
            .education
            .get(&education_id)
            .is_some_and(|entry| entry.user_id == user_id);
        if owned {
            tables.education.remove(&education_id);
        }
        Ok(owned)
    }

    async fn delete(&self, user_id: i64) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        tables.education.retain(|_, entry| entry.user_id != user_id);
        tables.profiles.remove(&user_id);
        Ok(tables.users.remove(&user_id).is_some())
    }
}

#[async_trait]
impl SessionsRepository for InMemoryStore {
    async fn create(&self, user_id: i64) -> anyhow::Result<Session> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let session = Session {
            session_id: Uuid::new_v4(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        tables.sessions.insert(session.session_id, session.clone());
        Ok(session)
    }

    async fn fetch_one(&self, session_id: Uuid) -> anyhow::Result<Option<Session>> {
        let tables = self.tables.lock().await;
        Ok(tables.sessions.get(&session_id).cloned())
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<Session>> {
        let tables = self.tables.lock().await;
        Ok(tables.sessions.values().cloned().collect())
    }

    async fn update(&self, session: &Session) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        tables.sessions.remove(&session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::posts::REACTION_LIKE;

    #[tokio::test]
    async fn reactions_need_an_existing_post() {
        let store = InMemoryStore::new();
        assert!(
            PostsRepository::set_reaction(&store, 999, 1, REACTION_LIKE)
                .await
                .is_err()
        );

        let args = CreatePostArgs {
            user_id: 1,
            name: "anna".to_string(),
            avatar: String::new(),
            title: None,
            text: "hello".to_string(),
        };
        let post_id = store.insert_post_at(args, Utc::now()).await;
        PostsRepository::set_reaction(&store, post_id, 2, REACTION_LIKE)
            .await
            .unwrap();
        let thread = PostsRepository::fetch_one(&store, post_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.reactions.len(), 1);
    }
}
