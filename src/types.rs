/// Shared domain enums used across the codebase
///
/// All of these are stored as plain text columns; the enums are the
/// application-side vocabulary with string round-trips at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Agent,
}

impl Role {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "manager" => Ok(Role::Manager),
            "agent" => Ok(Role::Agent),
            other => Err(ApiError::validation_error(
                format!("Unknown role: {}", other),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Agent => "agent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Prospect,
    Client,
}

impl ClientStatus {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "prospect" => Ok(ClientStatus::Prospect),
            "client" => Ok(ClientStatus::Client),
            other => Err(ApiError::validation_error(
                format!("Unknown client status: {}", other),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Prospect => "prospect",
            ClientStatus::Client => "client",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Active,
    Cancelled,
    Expired,
}

impl SaleStatus {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "active" => Ok(SaleStatus::Active),
            "cancelled" => Ok(SaleStatus::Cancelled),
            "expired" => Ok(SaleStatus::Expired),
            other => Err(ApiError::validation_error(
                format!("Unknown sale status: {}", other),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Expired => "expired",
        }
    }
}

/// Period granularity a goal is tracked over. Only validated at the boundary;
/// the engine itself works off the explicit start/end window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl GoalType {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "weekly" => Ok(GoalType::Weekly),
            "monthly" => Ok(GoalType::Monthly),
            "quarterly" => Ok(GoalType::Quarterly),
            "yearly" => Ok(GoalType::Yearly),
            "custom" => Ok(GoalType::Custom),
            other => Err(ApiError::validation_error(
                format!("Unknown goal type: {}", other),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Weekly => "weekly",
            GoalType::Monthly => "monthly",
            GoalType::Quarterly => "quarterly",
            GoalType::Yearly => "yearly",
            GoalType::Custom => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        assert_eq!(Role::parse("manager").unwrap(), Role::Manager);
        assert_eq!(Role::parse("agent").unwrap().as_str(), "agent");
        assert!(Role::parse("admin").is_err());
    }

    #[test]
    fn sale_status_rejects_unknown() {
        assert!(SaleStatus::parse("active").is_ok());
        assert!(SaleStatus::parse("pending").is_err());
    }
}
