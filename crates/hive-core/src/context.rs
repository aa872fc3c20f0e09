//! Session identity inside a shared space.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one agent session.
///
/// `agent_id` is unique per connection (e.g. `armand-a3f2`); `user_id` is
/// the base name grouping all of one human's sessions (e.g. `armand`).
/// Injections may target either, or `"all"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Shared space the session participates in.
    pub space_id: String,
    /// Connection-unique agent id.
    pub agent_id: String,
    /// Base user name for user-level targeting.
    pub user_id: String,
    /// This session's id.
    pub session_id: String,
}

impl SessionContext {
    /// Create a context with a freshly generated `sess_` id.
    #[must_use]
    pub fn new(
        space_id: impl Into<String>,
        agent_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            space_id: space_id.into(),
            agent_id: agent_id.into(),
            user_id: user_id.into(),
            session_id: format!("sess_{}", Uuid::now_v7()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_session_id() {
        let ctx = SessionContext::new("space_1", "armand-a3f2", "armand");
        assert!(ctx.session_id.starts_with("sess_"));
        assert_eq!(ctx.agent_id, "armand-a3f2");
        assert_eq!(ctx.user_id, "armand");
    }

    #[test]
    fn new_ids_are_unique() {
        let a = SessionContext::new("s", "a", "u");
        let b = SessionContext::new("s", "a", "u");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn serde_camel_case() {
        let ctx = SessionContext::new("space_1", "alpha", "alpha");
        let json = serde_json::to_value(&ctx).unwrap();
        assert!(json.get("spaceId").is_some());
        assert!(json.get("sessionId").is_some());
    }
}
