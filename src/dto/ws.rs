use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::preview::GamePreview, state::state_machine::HandoffPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
/// Page visibility as reported by the browser.
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
/// Messages accepted from a handoff page.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandoffInbound {
    /// First message: claim the ticket minted when the page was rendered.
    Hello { ticket: Uuid },
    /// The page was hidden or shown again.
    Visibility { state: VisibilityState },
    /// "Try opening again" was pressed.
    Retry,
    /// The store action was pressed.
    Store,
    #[serde(other)]
    Unknown,
}

impl HandoffInbound {
    /// Parse a text frame.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
/// Progress of the preview slot.
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
/// Messages pushed to a handoff page.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandoffOutbound {
    /// Current handoff phase.
    Phase { phase: HandoffPhase },
    /// Navigate to the app deep link.
    OpenApp { url: String },
    /// Navigate to the store page.
    Redirect { url: String },
    /// Preview slot update.
    Preview {
        status: PreviewStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<GamePreview>,
    },
}
