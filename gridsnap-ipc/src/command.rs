use serde::{Deserialize, Serialize};

use crate::layout::LayoutRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    ApplyLayout(LayoutRequest),
    #[serde(rename_all = "camelCase")]
    ApplySaved {
        id: String,
        #[serde(default)]
        current_window_id: Option<u32>,
    },
    Ping,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
}
