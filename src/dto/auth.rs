//! Principal handed over by the external auth gateway. The core trusts
//! these headers without re-verifying credentials; authenticating them is
//! the gateway's job.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::{AppError, ServiceError};

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";
const USER_TEAM_HEADER: &str = "x-user-team";

/// Role assigned to the authenticated user by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Contest administrator; may validate, reject, and delete scores.
    Admin,
    /// Team leader.
    Leader,
    /// Regular team member.
    Member,
}

impl Role {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "leader" => Some(Role::Leader),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// Authenticated caller identity extracted from gateway headers.
#[derive(Debug, Clone)]
pub struct Principal {
    /// User identifier.
    pub user_id: Uuid,
    /// Gateway-assigned role.
    pub role: Role,
    /// Team the user belongs to, if any.
    pub team_id: Option<Uuid>,
}

impl Principal {
    /// Fail with `Forbidden` unless the principal is an administrator.
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "administrator role required".into(),
            ))
        }
    }

    /// Return the principal's team or fail with `Forbidden`.
    pub fn require_team(&self) -> Result<Uuid, ServiceError> {
        self.team_id.ok_or_else(|| {
            ServiceError::Forbidden("you must belong to a team to submit a score".into())
        })
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?
            .ok_or_else(|| AppError::Unauthorized("missing principal headers".into()))?;
        let user_id = Uuid::parse_str(&user_id)
            .map_err(|_| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;

        let role = header_value(parts, USER_ROLE_HEADER)?
            .ok_or_else(|| AppError::Unauthorized("missing principal headers".into()))?;
        let role = Role::parse(&role)
            .ok_or_else(|| AppError::Unauthorized(format!("unknown role `{role}`")))?;

        let team_id = match header_value(parts, USER_TEAM_HEADER)? {
            Some(raw) => Some(Uuid::parse_str(&raw).map_err(|_| {
                AppError::Unauthorized(format!("malformed {USER_TEAM_HEADER} header"))
            })?),
            None => None,
        };

        Ok(Principal {
            user_id,
            role,
            team_id,
        })
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<Option<String>, AppError> {
    match parts.headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|raw| Some(raw.trim().to_owned()).filter(|raw| !raw.is_empty()))
            .map_err(|_| AppError::Unauthorized(format!("malformed {name} header"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_exact() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("leader"), Some(Role::Leader));
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn admin_gate() {
        let admin = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
            team_id: None,
        };
        let member = Principal {
            user_id: Uuid::new_v4(),
            role: Role::Member,
            team_id: Some(Uuid::new_v4()),
        };

        assert!(admin.require_admin().is_ok());
        assert!(matches!(
            member.require_admin(),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(member.require_team().is_ok());
        assert!(matches!(
            admin.require_team(),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
