use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one configured remote connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of UI surface a panel key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    RoleEditor,
    UserManager,
    GroupManager,
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelKind::RoleEditor => write!(f, "role_editor"),
            PanelKind::UserManager => write!(f, "user_manager"),
            PanelKind::GroupManager => write!(f, "group_manager"),
        }
    }
}

/// Composite identity of a logical UI surface. At most one live panel
/// instance exists per key at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelKey {
    pub connection: ConnectionId,
    pub kind: PanelKind,
    /// Role, user or group name the surface displays.
    pub resource: String,
    /// Distinguishes multiple logical surfaces over the same resource
    /// (e.g. a comparison view). Almost always absent.
    #[serde(default)]
    pub discriminator: Option<u32>,
}

impl PanelKey {
    pub fn new(connection: ConnectionId, kind: PanelKind, resource: impl Into<String>) -> Self {
        Self {
            connection,
            kind,
            resource: resource.into(),
            discriminator: None,
        }
    }

    pub fn with_discriminator(mut self, discriminator: u32) -> Self {
        self.discriminator = Some(discriminator);
        self
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.connection, self.kind, self.resource)?;
        if let Some(d) = self.discriminator {
            write!(f, "#{d}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_every_component() {
        let base = PanelKey::new("prod".into(), PanelKind::RoleEditor, "editor");
        assert_eq!(
            base,
            PanelKey::new("prod".into(), PanelKind::RoleEditor, "editor")
        );
        assert_ne!(
            base,
            PanelKey::new("staging".into(), PanelKind::RoleEditor, "editor")
        );
        assert_ne!(
            base,
            PanelKey::new("prod".into(), PanelKind::UserManager, "editor")
        );
        assert_ne!(
            base,
            PanelKey::new("prod".into(), PanelKind::RoleEditor, "auditor")
        );
        assert_ne!(base, base.clone().with_discriminator(1));
    }

    #[test]
    fn display_is_path_like() {
        let key = PanelKey::new("prod".into(), PanelKind::RoleEditor, "editor")
            .with_discriminator(2);
        assert_eq!(key.to_string(), "prod/role_editor/editor#2");
    }
}
