use tracing::warn;

use shared::models::user::{ProfileUpdate, User};
use shared::username::generate_username;
use shared::validation::SignUpForm;

use crate::state::AppState;

pub struct ProfileEdit {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub reset_stats: bool,
    pub delete: bool,
}

pub async fn sign_in(state: &AppState, identifier: &str, password: &str) -> anyhow::Result<()> {
    let user = state.auth_service.sign_in(identifier, password).await?;
    println!("Signed in as {}", user.username);
    Ok(())
}

pub async fn sign_up(
    state: &AppState,
    email: &str,
    password: &str,
    username: Option<String>,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let username = username.unwrap_or_else(|| {
        let suggested = generate_username(name.unwrap_or(""));
        println!("Using username {}", suggested);
        suggested
    });
    let form = SignUpForm::new(&username, email, password);
    let user = state.auth_service.sign_up(&form).await?;
    println!("Welcome to FanBattle, {}!", user.username);
    Ok(())
}

pub async fn sign_out(state: &AppState) -> anyhow::Result<()> {
    state.auth_service.sign_out().await?;
    println!("Signed out");
    Ok(())
}

pub async fn profile(state: &AppState, edit: ProfileEdit) -> anyhow::Result<()> {
    let mut user = state.require_user().await?;

    if edit.delete {
        state.user_service.delete_account(&user.username).await?;
        notify(state, &user, |dispatcher, user| async move {
            dispatcher.delete_user(&user.username).await
        })
        .await;
        println!("Account {} deleted", user.username);
        return Ok(());
    }

    if edit.reset_stats {
        user = state.user_service.reset_stats(&user.username).await?;
        println!("Stats reset");
    }

    let update = ProfileUpdate {
        username: edit.username,
        email: edit.email,
        avatar: edit.avatar,
    };
    if !update.is_empty() {
        user = state.user_service.update_profile(&user, &update).await?;
        notify(state, &user, |dispatcher, user| async move {
            dispatcher.user_update(&user).await
        })
        .await;
    }

    print_user(&user);
    Ok(())
}

/// Tells the realtime backend about a change. The REST call has already
/// succeeded, so a socket failure only gets logged.
async fn notify<F, Fut>(state: &AppState, user: &User, send: F)
where
    F: FnOnce(realtime::dispatch::Dispatcher, User) -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    match state.start_session(user.clone()).await {
        Ok(session) => {
            send(session.dispatcher().await, user.clone()).await;
            session.end().await;
        }
        Err(e) => warn!("Realtime update for {} skipped: {}", user.username, e),
    }
}

fn print_user(user: &User) {
    println!("{} <{}>", user.username, user.email);
    if let Some(rank) = user.rank {
        println!("  rank        #{}", rank);
    }
    println!("  battles     {}", user.total_battles);
    println!("  wins        {}", user.wins);
    println!("  win rate    {:.1}%", user.winrate);
    println!("  streak      {}", user.streak);
    println!("  friends     {}", user.friends.len());
    if !user.friend_requests.is_empty() {
        println!("  requests    {}", user.friend_requests.join(", "));
    }
}
