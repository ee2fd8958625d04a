//! 客服列表模型

use crate::agent::session::AgentUserType;
use crate::agent::types::null_as_default;
use serde::{Deserialize, Serialize};

/// 客服在线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Available,
    Away,
    #[default]
    Offline,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Available => "AVAILABLE",
            AgentStatus::Away => "AWAY",
            AgentStatus::Offline => "OFFLINE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AVAILABLE" => Some(AgentStatus::Available),
            "AWAY" => Some(AgentStatus::Away),
            "OFFLINE" => Some(AgentStatus::Offline),
            _ => None,
        }
    }
}

/// 同一业务下的客服
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(alias = "agent_id")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub online_status: AgentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub agent_type: AgentUserType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_parses_server_payload() {
        let agent: Agent = serde_json::from_value(json!({
            "user_id": 8,
            "full_name": "Ann",
            "email": "ann@example.com",
            "online_status": "AWAY",
            "agent_type": 1
        }))
        .unwrap();
        assert_eq!(agent.online_status, AgentStatus::Away);
        assert_eq!(agent.agent_type, AgentUserType::Admin);

        let agent: Agent = serde_json::from_value(json!({
            "agent_id": 9,
            "full_name": null,
            "online_status": null,
            "agent_type": null
        }))
        .unwrap();
        assert_eq!(agent.user_id, 9);
        assert_eq!(agent.online_status, AgentStatus::Offline);
        assert_eq!(agent.agent_type, AgentUserType::Agent);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [AgentStatus::Available, AgentStatus::Away, AgentStatus::Offline] {
            assert_eq!(AgentStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AgentStatus::parse("available"), Some(AgentStatus::Available));
        assert_eq!(AgentStatus::parse("busy"), None);
    }
}
