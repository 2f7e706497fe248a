use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteSide {
    Agree,
    Disagree,
}

/// Anything carrying a like counter plus this user's like flag.
pub trait Likeable {
    fn like_state(&mut self) -> (&mut u32, &mut bool);

    /// Flips the like flag and adjusts the counter.
    fn toggle_like(&mut self) {
        let (likes, liked) = self.like_state();
        if *liked {
            *likes = likes.saturating_sub(1);
        } else {
            *likes += 1;
        }
        *liked = !*liked;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debate {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub agree_votes: u32,
    #[serde(default)]
    pub disagree_votes: u32,
    #[serde(default)]
    pub my_vote: Option<VoteSide>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Likeable for Debate {
    fn like_state(&mut self) -> (&mut u32, &mut bool) {
        (&mut self.likes, &mut self.liked)
    }
}

impl Debate {
    /// Casts or moves a vote. Voting the same side twice is a no-op.
    pub fn cast_vote(&mut self, side: VoteSide) {
        if self.my_vote == Some(side) {
            return;
        }
        match self.my_vote {
            Some(VoteSide::Agree) => self.agree_votes = self.agree_votes.saturating_sub(1),
            Some(VoteSide::Disagree) => {
                self.disagree_votes = self.disagree_votes.saturating_sub(1)
            }
            None => {}
        }
        match side {
            VoteSide::Agree => self.agree_votes += 1,
            VoteSide::Disagree => self.disagree_votes += 1,
        }
        self.my_vote = Some(side);
    }

    pub fn agree_percentage(&self) -> f64 {
        let total = self.agree_votes + self.disagree_votes;
        if total == 0 {
            0.0
        } else {
            self.agree_votes as f64 / total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub debate_id: i64,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Likeable for Comment {
    fn like_state(&mut self) -> (&mut u32, &mut bool) {
        (&mut self.likes, &mut self.liked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub author: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// A comment with its replies, one level deep.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Groups a flat comment list into threads. Replies whose parent is missing
/// are promoted to top level so nothing is dropped.
pub fn thread_comments(comments: Vec<Comment>) -> Vec<CommentThread> {
    let (roots, replies): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());
    let mut threads: Vec<CommentThread> = roots
        .into_iter()
        .map(|comment| CommentThread {
            comment,
            replies: vec![],
        })
        .collect();

    for reply in replies {
        let parent = reply.parent_id;
        match threads.iter_mut().find(|t| Some(t.comment.id) == parent) {
            Some(thread) => thread.replies.push(reply),
            None => threads.push(CommentThread {
                comment: reply,
                replies: vec![],
            }),
        }
    }
    threads
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub player: String,
    pub from_club: String,
    pub to_club: String,
    #[serde(default)]
    pub fee: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked: bool,
}

impl Likeable for Transfer {
    fn like_state(&mut self) -> (&mut u32, &mut bool) {
        (&mut self.likes, &mut self.liked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}
