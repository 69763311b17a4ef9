//! User profile, reputation and actor payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Follower/following/post counters shown on a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
}

/// A user profile as read from the system of record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub reputation_points: i64,
    pub is_actor: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub stats: ProfileStats,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Profile accessor payload; `user` is `None` when unknown or on failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub user: Option<UserProfile>,
}

/// Aggregated reputation for a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationData {
    pub reputation_points: i64,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub win_rate: f64,
    pub rank: Option<u64>,
}

/// Static information about an actor (a platform-run persona)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub profile_image_url: Option<String>,
    pub domain: Vec<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorData {
    pub actor: Option<ActorInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_profile_has_null_user() {
        let value = serde_json::to_value(ProfileData::default()).unwrap();
        assert_eq!(value, json!({ "user": null }));
    }

    #[test]
    fn test_profile_round_trip_uses_camel_case() {
        let data = ProfileData {
            user: Some(UserProfile::new("user123").with_display_name("Old")),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["user"]["displayName"], "Old");
        assert_eq!(value["user"]["reputationPoints"], 0);
    }
}
