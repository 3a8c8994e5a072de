use serde::{Deserialize, Serialize};

/// Snapshot returned by the stats endpoint. Fields stay at zero when their query fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub games_played_all_time: i64,
    pub games_played_today: i64,
    pub high_score: i64,
}
