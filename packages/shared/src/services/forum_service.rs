use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::forum::{
    thread_comments, Comment, CommentThread, Debate, Likeable, NewComment, NewsArticle, Transfer,
    VoteSide,
};
use crate::repositories::forum_repository::ForumRepository;
use crate::services::errors::forum_service_errors::ForumServiceError;
use crate::services::preferences_service::PreferencesService;

pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Default)]
struct ForumState {
    debates: Vec<Debate>,
    comments: HashMap<i64, Vec<Comment>>,
    transfers: Vec<Transfer>,
}

/// News article paired with the locally persisted like flag.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub article: NewsArticle,
    pub liked: bool,
}

/// Forum, transfers and news. Likes and votes are applied to the loaded
/// lists immediately and rolled back when the backend rejects them.
pub struct ForumService {
    repository: Arc<dyn ForumRepository>,
    preferences: PreferencesService,
    state: RwLock<ForumState>,
}

impl ForumService {
    pub fn new(repository: Arc<dyn ForumRepository>, preferences: PreferencesService) -> Self {
        ForumService {
            repository,
            preferences,
            state: RwLock::new(ForumState::default()),
        }
    }

    pub async fn load_debates(&self) -> Result<Vec<Debate>, ForumServiceError> {
        let debates = self.repository.debates().await?;
        self.state.write().await.debates = debates.clone();
        Ok(debates)
    }

    pub async fn debates(&self) -> Vec<Debate> {
        self.state.read().await.debates.clone()
    }

    pub async fn like_debate(
        &self,
        debate_id: i64,
        username: &str,
    ) -> Result<Debate, ForumServiceError> {
        let previous = self
            .update_debate(debate_id, |d| d.toggle_like())
            .await?;

        match self.repository.like_debate(debate_id, username).await {
            Ok(()) => self.debate(debate_id).await,
            Err(e) => {
                warn!("Like on debate {} failed, reverting: {}", debate_id, e);
                self.restore_debate(previous).await;
                Err(e.into())
            }
        }
    }

    pub async fn vote_debate(
        &self,
        debate_id: i64,
        username: &str,
        side: VoteSide,
    ) -> Result<Debate, ForumServiceError> {
        let previous = self
            .update_debate(debate_id, |d| d.cast_vote(side))
            .await?;
        if previous.my_vote == Some(side) {
            return Ok(previous);
        }

        match self.repository.vote_debate(debate_id, username, side).await {
            Ok(()) => self.debate(debate_id).await,
            Err(e) => {
                warn!("Vote on debate {} failed, reverting: {}", debate_id, e);
                self.restore_debate(previous).await;
                Err(e.into())
            }
        }
    }

    /// Applies `change` to a loaded debate and returns its prior state.
    async fn update_debate<F>(&self, debate_id: i64, change: F) -> Result<Debate, ForumServiceError>
    where
        F: FnOnce(&mut Debate),
    {
        let mut state = self.state.write().await;
        let debate = state
            .debates
            .iter_mut()
            .find(|d| d.id == debate_id)
            .ok_or(ForumServiceError::NotLoaded(debate_id))?;
        let previous = debate.clone();
        change(debate);
        Ok(previous)
    }

    async fn restore_debate(&self, previous: Debate) {
        let mut state = self.state.write().await;
        if let Some(debate) = state.debates.iter_mut().find(|d| d.id == previous.id) {
            *debate = previous;
        }
    }

    async fn debate(&self, debate_id: i64) -> Result<Debate, ForumServiceError> {
        self.state
            .read()
            .await
            .debates
            .iter()
            .find(|d| d.id == debate_id)
            .cloned()
            .ok_or(ForumServiceError::NotLoaded(debate_id))
    }

    pub async fn load_comments(
        &self,
        debate_id: i64,
    ) -> Result<Vec<CommentThread>, ForumServiceError> {
        let comments = self.repository.comments(debate_id).await?;
        self.state
            .write()
            .await
            .comments
            .insert(debate_id, comments.clone());
        Ok(thread_comments(comments))
    }

    pub async fn comment_threads(&self, debate_id: i64) -> Vec<CommentThread> {
        let comments = self
            .state
            .read()
            .await
            .comments
            .get(&debate_id)
            .cloned()
            .unwrap_or_default();
        thread_comments(comments)
    }

    /// Posts a top-level comment, or a reply when `parent_id` is set.
    pub async fn add_comment(
        &self,
        debate_id: i64,
        author: &str,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment, ForumServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ForumServiceError::ValidationError(
                "Comment cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(ForumServiceError::ValidationError(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let new_comment = NewComment {
            author: author.to_string(),
            content: content.to_string(),
            parent_id,
        };
        let comment = self.repository.add_comment(debate_id, &new_comment).await?;
        self.state
            .write()
            .await
            .comments
            .entry(debate_id)
            .or_default()
            .push(comment.clone());
        info!("{} commented on debate {}", author, debate_id);
        Ok(comment)
    }

    pub async fn like_comment(
        &self,
        debate_id: i64,
        comment_id: i64,
        username: &str,
    ) -> Result<Comment, ForumServiceError> {
        let toggle = |state: &mut ForumState| -> Option<Comment> {
            let comment = state
                .comments
                .get_mut(&debate_id)?
                .iter_mut()
                .find(|c| c.id == comment_id)?;
            comment.toggle_like();
            Some(comment.clone())
        };

        let liked = toggle(&mut *self.state.write().await)
            .ok_or(ForumServiceError::NotLoaded(comment_id))?;

        match self.repository.like_comment(comment_id, username).await {
            Ok(()) => Ok(liked),
            Err(e) => {
                warn!("Like on comment {} failed, reverting: {}", comment_id, e);
                toggle(&mut *self.state.write().await);
                Err(e.into())
            }
        }
    }

    pub async fn load_transfers(&self) -> Result<Vec<Transfer>, ForumServiceError> {
        let transfers = self.repository.transfers().await?;
        self.state.write().await.transfers = transfers.clone();
        Ok(transfers)
    }

    pub async fn like_transfer(
        &self,
        transfer_id: i64,
        username: &str,
    ) -> Result<Transfer, ForumServiceError> {
        let toggle = |state: &mut ForumState| -> Option<Transfer> {
            let transfer = state.transfers.iter_mut().find(|t| t.id == transfer_id)?;
            transfer.toggle_like();
            Some(transfer.clone())
        };

        let liked = toggle(&mut *self.state.write().await)
            .ok_or(ForumServiceError::NotLoaded(transfer_id))?;

        match self.repository.like_transfer(transfer_id, username).await {
            Ok(()) => Ok(liked),
            Err(e) => {
                warn!("Like on transfer {} failed, reverting: {}", transfer_id, e);
                toggle(&mut *self.state.write().await);
                Err(e.into())
            }
        }
    }

    pub async fn news(&self) -> Result<Vec<NewsItem>, ForumServiceError> {
        let articles = self.repository.news().await?;
        let liked = self.preferences.liked_articles().await?;
        Ok(articles
            .into_iter()
            .map(|article| NewsItem {
                liked: liked.contains(&article.id),
                article,
            })
            .collect())
    }

    /// News likes never reach the backend; they live in the client store.
    pub async fn toggle_news_like(&self, article_id: i64) -> Result<bool, ForumServiceError> {
        Ok(self.preferences.toggle_liked_article(article_id).await?)
    }
}
