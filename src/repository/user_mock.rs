#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::OrganizerError;

use super::user::{User, UserId, UserRepository};

#[derive(Clone, Default)]
pub struct MockUserRepository {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, OrganizerError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, OrganizerError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, name: &str, email: &str) -> Result<User, OrganizerError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(OrganizerError::DatabaseError(
                "UNIQUE constraint failed: users.email".to_owned(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: UserId(users.len() as i64 + 1),
            name: name.to_owned(),
            display: None,
            email: email.to_owned(),
            icon: None,
            created_at: now,
            changed_at: now,
        };
        users.push(user.clone());
        drop(users);

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = MockUserRepository::new();
        let user = repo.create_user("Ada", "ada@example.com").await.unwrap();

        assert_eq!(user.id, UserId(1));
        assert_eq!(
            repo.find_user_by_email("ada@example.com").await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(repo.find_user_by_id(UserId(1)).await.unwrap(), Some(user));
        assert!(repo.find_user_by_id(UserId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = MockUserRepository::new();
        repo.create_user("Ada", "ada@example.com").await.unwrap();

        let result = repo.create_user("Other", "ada@example.com").await;
        assert!(matches!(result, Err(OrganizerError::DatabaseError(_))));
    }
}
