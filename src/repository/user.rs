use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::OrganizerError;

row_id!(
    /// Primary key of a user account.
    UserId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Optional display name chosen by the user.
    pub display: Option<String>,
    pub email: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.display
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.name)
    }
}

#[cfg(any(test, feature = "mocks"))]
impl User {
    pub fn mock() -> Self {
        Self::mock_from_email("test@example.com")
    }

    pub fn mock_from_email(email: &str) -> Self {
        let now = Utc::now();
        User {
            id: UserId(1),
            name: "Test User".to_owned(),
            display: None,
            email: email.to_owned(),
            icon: None,
            created_at: now,
            changed_at: now,
        }
    }
}

#[async_trait]
pub trait UserRepository {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, OrganizerError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, OrganizerError>;

    /// # Errors
    ///
    /// Returns `OrganizerError::DatabaseError` if the email is already taken.
    async fn create_user(&self, name: &str, email: &str) -> Result<User, OrganizerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_display() {
        let mut user = User::mock();
        assert_eq!(user.display_name(), "Test User");

        user.display = Some("Tess".to_owned());
        assert_eq!(user.display_name(), "Tess");

        user.display = Some(String::new());
        assert_eq!(user.display_name(), "Test User");
    }
}
