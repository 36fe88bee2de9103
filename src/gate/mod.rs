// Authorization seam for write operations.
//
// The source system has no real access control: the "user" and "admin"
// checks always pass. That seam is kept explicit here so real
// implementations can be swapped in per resource without touching the
// handlers. Reads are public and never pass through a gate.

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::resource::ResourceDef;

/// Write operation being authorized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),
}

/// Authorization checkpoint consulted before every write. Request headers
/// are passed through so a real implementation can inspect credentials.
#[async_trait]
pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authorize(
        &self,
        headers: &HeaderMap,
        resource: &ResourceDef,
        action: Action,
    ) -> Result<(), GateError>;
}

/// Placeholder for "any authenticated user may write". Allows everything.
pub struct AuthenticatedUserGate;

#[async_trait]
impl Gate for AuthenticatedUserGate {
    fn name(&self) -> &'static str {
        "user"
    }

    async fn authorize(
        &self,
        _headers: &HeaderMap,
        resource: &ResourceDef,
        action: Action,
    ) -> Result<(), GateError> {
        tracing::debug!(gate = self.name(), resource = resource.name, action = action.as_str(), "gate passed");
        Ok(())
    }
}

/// Placeholder for "administrators only". Allows everything.
pub struct AdministratorGate;

#[async_trait]
impl Gate for AdministratorGate {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn authorize(
        &self,
        _headers: &HeaderMap,
        resource: &ResourceDef,
        action: Action,
    ) -> Result<(), GateError> {
        tracing::debug!(gate = self.name(), resource = resource.name, action = action.as_str(), "gate passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Registry;

    #[tokio::test]
    async fn placeholder_gates_allow_all_actions() {
        let registry = Registry::builtin().unwrap();
        let stories = registry.get("stories").unwrap();
        let podcasts = registry.get("podcasts").unwrap();
        let headers = HeaderMap::new();

        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(AuthenticatedUserGate.authorize(&headers, stories, action).await.is_ok());
            assert!(AdministratorGate.authorize(&headers, podcasts, action).await.is_ok());
        }
    }
}
