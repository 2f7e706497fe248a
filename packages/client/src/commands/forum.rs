use shared::models::forum::{CommentThread, Debate, VoteSide};

use crate::state::AppState;

pub async fn debates(
    state: &AppState,
    like: Option<i64>,
    vote: Option<(i64, VoteSide)>,
    comments: Option<i64>,
    reply: Option<&str>,
) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    let forum = &state.forum_service;
    forum.load_debates().await?;

    if let Some(id) = like {
        let debate = forum.like_debate(id, &user.username).await?;
        println!("{} debate {}", if debate.liked { "Liked" } else { "Unliked" }, id);
    }
    if let Some((id, side)) = vote {
        forum.vote_debate(id, &user.username, side).await?;
        println!("Voted on debate {}", id);
    }

    match comments {
        Some(id) => {
            forum.load_comments(id).await?;
            if let Some(text) = reply {
                forum.add_comment(id, &user.username, text, None).await?;
            }
            print_threads(&forum.comment_threads(id).await);
        }
        None => {
            for debate in forum.debates().await {
                print_debate(&debate);
            }
        }
    }
    Ok(())
}

pub async fn news(state: &AppState, like: Option<i64>) -> anyhow::Result<()> {
    let forum = &state.forum_service;
    if let Some(id) = like {
        let liked = forum.toggle_news_like(id).await?;
        println!("{} article {}", if liked { "Liked" } else { "Unliked" }, id);
    }

    for item in forum.news().await? {
        let heart = if item.liked { "*" } else { " " };
        println!("{} {:>4}  {}", heart, item.article.id, item.article.title);
        if !item.article.summary.is_empty() {
            println!("        {}", item.article.summary);
        }
    }

    let transfers = forum.load_transfers().await?;
    if !transfers.is_empty() {
        println!();
        println!("Transfers");
    }
    for transfer in transfers {
        println!(
            "  {:<20} {} -> {}  {}{}",
            transfer.player,
            transfer.from_club,
            transfer.to_club,
            transfer.fee.as_deref().unwrap_or("undisclosed"),
            if transfer.confirmed { "" } else { " (rumour)" }
        );
    }
    Ok(())
}

fn print_debate(debate: &Debate) {
    println!("{:>4}  {} (by {})", debate.id, debate.title, debate.author);
    println!(
        "      {} likes, {:.0}% agree of {} votes",
        debate.likes,
        debate.agree_percentage(),
        debate.agree_votes + debate.disagree_votes
    );
}

fn print_threads(threads: &[CommentThread]) {
    if threads.is_empty() {
        println!("No comments yet");
    }
    for thread in threads {
        println!("{}: {}", thread.comment.author, thread.comment.content);
        for reply in &thread.replies {
            println!("    {}: {}", reply.author, reply.content);
        }
    }
}
