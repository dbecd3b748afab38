use chrono::{DateTime, Utc};
use serde::Serialize;

use registrar_core::{NotificationId, UserId};

/// A message addressed to one user. Read-only through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "isRead")]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn into_notification(self, id: NotificationId) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            read: false,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_notifications_start_unread() {
        let n = NewNotification {
            user_id: UserId::new(),
            title: "Request approved".to_string(),
            message: "Your transcript is ready".to_string(),
            kind: Some("document".to_string()),
            created_at: Utc::now(),
        }
        .into_notification(NotificationId::new(1));

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["isRead"], false);
        assert_eq!(json["type"], "document");
        assert!(json.get("userId").is_some());
    }
}
