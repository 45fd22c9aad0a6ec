use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Attempt, PlayerId};

/// Player data as seen by one viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub total_score: u32,
    pub attempts: Vec<Attempt>,
}
