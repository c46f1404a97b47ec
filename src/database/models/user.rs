use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub manager_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub failed_login_attempts: i32,
    #[serde(skip_serializing)]
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_manager(&self) -> bool {
        self.role == "manager"
    }

    /// Locked while a lockout window set by repeated failed logins is open
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user_with_lock(locked_until: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "agent@agency.test".to_string(),
            password_hash: String::new(),
            name: "Agent".to_string(),
            role: "agent".to_string(),
            is_active: true,
            manager_id: None,
            failed_login_attempts: 0,
            locked_until,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn lock_window_is_time_bound() {
        let now = Utc::now();
        assert!(!user_with_lock(None).is_locked(now));
        assert!(user_with_lock(Some(now + Duration::minutes(10))).is_locked(now));
        assert!(!user_with_lock(Some(now - Duration::seconds(1))).is_locked(now));
    }
}
