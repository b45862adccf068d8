pub mod broadcast;
pub mod commands;
pub mod key;
pub mod messages;
pub mod panel;
pub mod registry;
pub mod session;

pub use broadcast::RoleListBroadcaster;
pub use commands::CommandContext;
pub use key::{ConnectionId, PanelKey, PanelKind};
pub use messages::{EngineMessage, GroupDraft, RoleDraft, SurfaceMessage, UserDraft};
pub use panel::{PanelInstance, PanelTransport};
pub use registry::{ViewInstance, ViewRegistry};
pub use session::PanelSession;
