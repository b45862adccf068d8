use serde::{Deserialize, Serialize};

use stratus_core::grant::PermissionGrant;

/// Desired role state submitted by an editor surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDraft {
    pub name: String,
    #[serde(default)]
    pub grants: Vec<PermissionGrant>,
}

/// Desired role-name set for a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDraft {
    pub group: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Desired role-name set for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub user: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Messages a UI surface sends to the engine. Closed union: unknown tags
/// fail deserialization instead of being silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceMessage {
    /// The surface's message listener is attached; buffered init data may
    /// now be delivered.
    Ready,
    SaveRole { role_data: RoleDraft },
    SaveGroup { group_data: GroupDraft },
    SaveUser { user_data: UserDraft },
    Cancel,
}

/// Messages the engine sends to a UI surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineMessage {
    /// Buffered initial payload, delivered once after `ready`.
    InitData { payload: serde_json::Value },
    /// Fresh data for an already-live surface; bypasses the ready gate.
    UpdateData { payload: serde_json::Value },
    RoleSaved,
    GroupSaved,
    UserSaved,
    /// Broadcast push after the connection's role-name list changed.
    RolesUpdated { available_roles: Vec<String> },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn surface_messages_are_tagged() {
        let msg: SurfaceMessage = serde_json::from_value(json!({"type": "ready"})).unwrap();
        assert_eq!(msg, SurfaceMessage::Ready);

        let msg: SurfaceMessage = serde_json::from_value(json!({
            "type": "saveRole",
            "roleData": {"name": "editor", "grants": []}
        }))
        .unwrap();
        assert_eq!(
            msg,
            SurfaceMessage::SaveRole {
                role_data: RoleDraft {
                    name: "editor".into(),
                    grants: vec![],
                }
            }
        );
    }

    #[test]
    fn unknown_surface_tags_are_rejected() {
        let result: Result<SurfaceMessage, _> =
            serde_json::from_value(json!({"type": "reload"}));
        assert!(result.is_err());
    }

    #[test]
    fn engine_messages_use_camel_case_fields() {
        let json = serde_json::to_value(EngineMessage::RolesUpdated {
            available_roles: vec!["editor".into()],
        })
        .unwrap();
        assert_eq!(json["type"], "rolesUpdated");
        assert_eq!(json["availableRoles"], json!(["editor"]));
    }
}
