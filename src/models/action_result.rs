use serde::{Deserialize, Serialize};

/// Outcome shape returned by the lifecycle actions
/// (start, stop, shutdown, reconfigure).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub action: String,
}

impl ActionResult {
    pub fn new(action: &str, state: Option<&str>) -> Self {
        ActionResult {
            success: true,
            state: state.map(str::to_string),
            action: action.to_string(),
        }
    }
}
