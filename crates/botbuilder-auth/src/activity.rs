//! Activity fields read by the authentication core
//!
//! The full activity schema lives elsewhere; this view deserializes the few
//! fields authentication needs and ignores the rest.

use serde::{Deserialize, Serialize};

/// Conversation reference carried by an activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    /// Conversation id
    #[serde(default)]
    pub id: String,
}

/// Minimal view of an inbound activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity id
    #[serde(default)]
    pub id: String,
    /// Endpoint of the channel service that sent the activity
    #[serde(rename = "serviceUrl", default)]
    pub service_url: String,
    /// Conversation the activity belongs to
    #[serde(default)]
    pub conversation: ConversationAccount,
    /// Id of the activity this one replies to
    #[serde(rename = "replyToId", default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

impl Activity {
    /// Activity claiming to come from `service_url`
    pub fn with_service_url(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let activity: Activity = serde_json::from_str(
            r#"{
                "type": "message",
                "id": "act-1",
                "serviceUrl": "https://smba.trafficmanager.net/emea/",
                "conversation": { "id": "conv-9", "isGroup": false },
                "replyToId": "act-0",
                "text": "hello"
            }"#,
        )
        .unwrap();

        assert_eq!(activity.id, "act-1");
        assert_eq!(activity.service_url, "https://smba.trafficmanager.net/emea/");
        assert_eq!(activity.conversation.id, "conv-9");
        assert_eq!(activity.reply_to_id.as_deref(), Some("act-0"));
    }

    #[test]
    fn test_missing_fields_default() {
        let activity: Activity = serde_json::from_str("{}").unwrap();
        assert!(activity.service_url.is_empty());
        assert!(activity.reply_to_id.is_none());
    }
}
