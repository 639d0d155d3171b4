use crate::models::{Post, User};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("user not found")]
    UserNotFound,
    #[error("post not found")]
    PostNotFound,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub image_file: Option<String>,
}

#[derive(Debug)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct PostChanges {
    pub user_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// In-memory storage engine.
///
/// `DashMap` gives lock-free reads per entry. Every write goes through
/// `write_lock`, so uniqueness checks, foreign-key checks and the user → posts
/// cascade never interleave with another write. Post reads join each post to
/// its author and take the same lock, so a listing never sees half a cascade.
#[derive(Clone, Default)]
pub struct Database {
    users: Arc<DashMap<Uuid, User>>,
    posts: Arc<DashMap<Uuid, Post>>,
    username_index: Arc<DashMap<String, Uuid>>, // lower-cased username -> id
    email_index: Arc<DashMap<String, Uuid>>,    // lower-cased email -> id
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock holds nothing to repair.
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn claimed_by_other(index: &DashMap<String, Uuid>, key: &str, id: Uuid) -> bool {
        index.get(key).is_some_and(|owner| *owner != id)
    }

    // ------------------------------------------------------------------ users

    pub fn create_user(&self, new: NewUser) -> Result<User, DbError> {
        let _guard = self.lock();

        let username_key = new.username.to_lowercase();
        let email = new.email.to_lowercase();

        if self.username_index.contains_key(&username_key) {
            return Err(DbError::UsernameTaken);
        }
        if self.email_index.contains_key(&email) {
            return Err(DbError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email,
            password_hash: new.password_hash,
            image_file: None,
        };

        self.username_index.insert(username_key, user.id);
        self.email_index.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());

        Ok(user)
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|entry| entry.clone())
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let id = *self.email_index.get(&email.to_lowercase())?;
        self.user(id)
    }

    pub fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<User, DbError> {
        let _guard = self.lock();

        let mut user = self.user(id).ok_or(DbError::UserNotFound)?;

        let username_key = changes.username.as_deref().map(str::to_lowercase);
        let email = changes.email.as_deref().map(str::to_lowercase);

        if let Some(key) = &username_key {
            if Self::claimed_by_other(&self.username_index, key, id) {
                return Err(DbError::UsernameTaken);
            }
        }
        if let Some(email) = &email {
            if Self::claimed_by_other(&self.email_index, email, id) {
                return Err(DbError::EmailTaken);
            }
        }

        if let (Some(username), Some(key)) = (changes.username, username_key) {
            self.username_index.remove(&user.username.to_lowercase());
            self.username_index.insert(key, id);
            user.username = username;
        }
        if let Some(email) = email {
            self.email_index.remove(&user.email);
            self.email_index.insert(email.clone(), id);
            user.email = email;
        }
        if let Some(image_file) = changes.image_file {
            user.image_file = Some(image_file);
        }

        self.users.insert(id, user.clone());
        Ok(user)
    }

    /// Removes the user and every post it owns. Returns how many posts went
    /// with it.
    pub fn delete_user(&self, id: Uuid) -> Result<usize, DbError> {
        let _guard = self.lock();

        let (_, user) = self.users.remove(&id).ok_or(DbError::UserNotFound)?;
        self.username_index.remove(&user.username.to_lowercase());
        self.email_index.remove(&user.email);

        let before = self.posts.len();
        self.posts.retain(|_, post| post.user_id != id);

        Ok(before - self.posts.len())
    }

    // ------------------------------------------------------------------ posts

    pub fn create_post(&self, new: NewPost) -> Result<(Post, User), DbError> {
        let _guard = self.lock();

        let author = self.user(new.user_id).ok_or(DbError::UserNotFound)?;

        let post = Post {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            content: new.content,
            date_posted: Utc::now(),
        };

        self.posts.insert(post.id, post.clone());
        Ok((post, author))
    }

    /// Joins a post with its author. Callers hold the write lock.
    fn with_author(&self, post: Post) -> Option<(Post, User)> {
        let author = self.user(post.user_id)?;
        Some((post, author))
    }

    pub fn post(&self, id: Uuid) -> Option<(Post, User)> {
        let _guard = self.lock();

        let post = self.posts.get(&id).map(|entry| entry.clone())?;
        self.with_author(post)
    }

    /// All posts with their authors, newest first, taken as one snapshot.
    pub fn posts(&self) -> Vec<(Post, User)> {
        let _guard = self.lock();

        self.snapshot(|_| true)
    }

    /// Posts owned by `user_id` with their author, newest first.
    pub fn posts_by_user(&self, user_id: Uuid) -> Result<Vec<(Post, User)>, DbError> {
        let _guard = self.lock();

        if !self.users.contains_key(&user_id) {
            return Err(DbError::UserNotFound);
        }
        Ok(self.snapshot(|post| post.user_id == user_id))
    }

    fn snapshot(&self, keep: impl Fn(&Post) -> bool) -> Vec<(Post, User)> {
        let posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        let mut joined: Vec<(Post, User)> = posts
            .into_iter()
            .filter_map(|post| self.with_author(post))
            .collect();
        joined.sort_by(|(a, _), (b, _)| {
            b.date_posted
                .cmp(&a.date_posted)
                .then_with(|| a.id.cmp(&b.id))
        });
        joined
    }

    /// `date_posted` is left alone whatever the changes are.
    pub fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<(Post, User), DbError> {
        let _guard = self.lock();

        let mut post = self
            .posts
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(DbError::PostNotFound)?;

        let owner = changes.user_id.unwrap_or(post.user_id);
        let author = self.user(owner).ok_or(DbError::UserNotFound)?;

        post.user_id = owner;
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }

        self.posts.insert(id, post.clone());
        Ok((post, author))
    }

    pub fn delete_post(&self, id: Uuid) -> Result<(), DbError> {
        let _guard = self.lock();

        self.posts
            .remove(&id)
            .map(|_| ())
            .ok_or(DbError::PostNotFound)
    }
}
