use tracing::warn;

use shared::models::social::ChatMessage;
use shared::models::user::User;

use crate::state::AppState;

pub async fn friends(state: &AppState) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    let friends = state.friend_service.friends(&user.username).await?;

    if friends.is_empty() {
        println!("No friends yet");
    }
    for friend in friends {
        let status = if friend.online { "online" } else { "offline" };
        match friend.rank {
            Some(rank) => println!("  {:<15} #{:<5} {}", friend.username, rank, status),
            None => println!("  {:<15} {:<6} {}", friend.username, "", status),
        }
    }
    if !user.friend_requests.is_empty() {
        println!("Pending requests from {}", user.friend_requests.join(", "));
    }
    Ok(())
}

pub async fn chat(state: &AppState, friend: &str, message: Option<&str>) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    state.friend_service.lookup(&user.username, friend).await?;

    let chat = state.chat_service(&user.username);
    chat.load_history(friend).await?;

    if let Some(text) = message {
        let outgoing = chat.compose(friend, text).await?;
        if !send(state, user.clone(), outgoing).await {
            println!("Message not delivered");
        }
    }

    for line in chat.conversation(friend).await {
        print_line(&line, &user.username);
    }
    Ok(())
}

/// Chat goes over the socket only; a failed send is logged and reported.
async fn send(state: &AppState, user: User, message: ChatMessage) -> bool {
    match state.start_session(user).await {
        Ok(session) => {
            let sent = session.dispatcher().await.chat_message(&message).await;
            session.end().await;
            sent
        }
        Err(e) => {
            warn!("Chat message {} not sent: {}", message.id, e);
            false
        }
    }
}

fn print_line(message: &ChatMessage, me: &str) {
    let who = if message.from == me { "you" } else { message.from.as_str() };
    println!(
        "[{}] {}: {}",
        message.timestamp.format("%Y-%m-%d %H:%M"),
        who,
        message.message
    );
}
