use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned battle id. The backend sends either a number or a string;
/// both are normalised to a string here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BattleId(pub String);

impl BattleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BattleId {
    fn from(id: &str) -> Self {
        BattleId(id.to_string())
    }
}

impl From<i64> for BattleId {
    fn from(id: i64) -> Self {
        BattleId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for BattleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => BattleId(n.to_string()),
            RawId::Text(s) => BattleId(s),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    Waiting,
    InProgress,
    Finished,
    Cancelled,
}

/// Result of a battle from one participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleOutcome {
    Win,
    Lose,
    Draw,
}

impl BattleOutcome {
    /// Compares two scores from the perspective of the owner of `mine`.
    pub fn from_scores(mine: u32, theirs: u32) -> Self {
        match mine.cmp(&theirs) {
            std::cmp::Ordering::Greater => BattleOutcome::Win,
            std::cmp::Ordering::Less => BattleOutcome::Lose,
            std::cmp::Ordering::Equal => BattleOutcome::Draw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BattleOutcome::Win => "win",
            BattleOutcome::Lose => "lose",
            BattleOutcome::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub first_opponent: String,
    #[serde(default)]
    pub second_opponent: Option<String>,
    pub sport: String,
    #[serde(default)]
    pub first_opponent_score: u32,
    #[serde(default)]
    pub second_opponent_score: u32,
    #[serde(default = "default_status")]
    pub status: BattleStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_status() -> BattleStatus {
    BattleStatus::Waiting
}

impl Battle {
    pub fn new(id: impl Into<BattleId>, first_opponent: &str, sport: &str) -> Self {
        Battle {
            id: id.into(),
            first_opponent: first_opponent.to_string(),
            second_opponent: None,
            sport: sport.to_string(),
            first_opponent_score: 0,
            second_opponent_score: 0,
            status: BattleStatus::Waiting,
            created_at: Some(Utc::now()),
        }
    }

    pub fn involves(&self, username: &str) -> bool {
        self.first_opponent == username || self.second_opponent.as_deref() == Some(username)
    }

    pub fn opponent_of(&self, username: &str) -> Option<&str> {
        if self.first_opponent == username {
            self.second_opponent.as_deref()
        } else if self.second_opponent.as_deref() == Some(username) {
            Some(self.first_opponent.as_str())
        } else {
            None
        }
    }

    /// `(own score, opponent score)` for a participant.
    pub fn scores_for(&self, username: &str) -> Option<(u32, u32)> {
        if self.first_opponent == username {
            Some((self.first_opponent_score, self.second_opponent_score))
        } else if self.second_opponent.as_deref() == Some(username) {
            Some((self.second_opponent_score, self.first_opponent_score))
        } else {
            None
        }
    }

    /// The single place where a score pair becomes win/lose/draw.
    /// `None` when `username` did not take part.
    pub fn outcome_for(&self, username: &str) -> Option<BattleOutcome> {
        self.scores_for(username)
            .map(|(mine, theirs)| BattleOutcome::from_scores(mine, theirs))
    }

    pub fn summary_for(&self, username: &str) -> Option<BattleSummary> {
        let (my_score, opponent_score) = self.scores_for(username)?;
        Some(BattleSummary {
            battle_id: self.id.clone(),
            opponent: self.opponent_of(username).map(str::to_string),
            sport: self.sport.clone(),
            my_score,
            opponent_score,
            outcome: BattleOutcome::from_scores(my_score, opponent_score),
        })
    }
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub battle_id: BattleId,
    pub opponent: Option<String>,
    pub sport: String,
    pub my_score: u32,
    pub opponent_score: u32,
    pub outcome: BattleOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl BattleRecord {
    pub fn add(&mut self, outcome: BattleOutcome) {
        match outcome {
            BattleOutcome::Win => self.wins += 1,
            BattleOutcome::Lose => self.losses += 1,
            BattleOutcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.wins as f64 / self.total() as f64 * 100.0
        }
    }
}

impl FromIterator<BattleOutcome> for BattleRecord {
    fn from_iter<I: IntoIterator<Item = BattleOutcome>>(iter: I) -> Self {
        let mut record = BattleRecord::default();
        for outcome in iter {
            record.add(outcome);
        }
        record
    }
}
