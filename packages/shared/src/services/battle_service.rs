use std::sync::Arc;

use tracing::debug;

use crate::models::battle::{Battle, BattleRecord, BattleStatus, BattleSummary};
use crate::repositories::battle_repository::BattleRepository;
use crate::repositories::errors::api_errors::ApiError;

pub struct BattleService {
    repository: Arc<dyn BattleRepository>,
}

impl BattleService {
    pub fn new(repository: Arc<dyn BattleRepository>) -> Self {
        BattleService { repository }
    }

    /// Dashboard rows for `username`, newest first. Battles the user did not
    /// take part in, and battles that never started, are left out.
    pub async fn history(&self, username: &str) -> Result<Vec<BattleSummary>, ApiError> {
        let mut battles = self.repository.battles_for(username).await?;
        battles.retain(|b| !matches!(b.status, BattleStatus::Waiting | BattleStatus::Cancelled));
        battles.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let summaries: Vec<BattleSummary> = battles
            .iter()
            .filter_map(|b| b.summary_for(username))
            .collect();
        debug!("{} battles in history of {}", summaries.len(), username);
        Ok(summaries)
    }

    pub async fn record(&self, username: &str) -> Result<BattleRecord, ApiError> {
        Ok(self
            .history(username)
            .await?
            .into_iter()
            .map(|s| s.outcome)
            .collect())
    }

    pub async fn waiting_battles(&self) -> Result<Vec<Battle>, ApiError> {
        self.repository.waiting_battles().await
    }

    /// Waiting battles `username` could join: not their own, still open.
    pub async fn joinable_battles(&self, username: &str) -> Result<Vec<Battle>, ApiError> {
        Ok(self
            .waiting_battles()
            .await?
            .into_iter()
            .filter(|b| b.first_opponent != username && b.second_opponent.is_none())
            .collect())
    }
}
