use std::time::Duration;

use anyhow::bail;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use battle::machine::{BattleConclusion, BattlePhase, BattleTimings};
use battle::runner::{BattleHandle, BattleRunner};
use realtime::lobby::Lobby;
use shared::models::battle::{Battle, BattleId, BattleOutcome};
use shared::models::question::Question;

use crate::state::AppState;

const LOBBY_POLL: Duration = Duration::from_secs(2);

pub async fn history(state: &AppState) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    let summaries = state.battle_service.history(&user.username).await?;
    let record = state.battle_service.record(&user.username).await?;

    println!(
        "{} wins, {} losses, {} draws ({:.1}% won)",
        record.wins,
        record.losses,
        record.draws,
        record.win_rate()
    );
    for summary in summaries {
        println!(
            "  {:>5}  {:<10} vs {:<15} {}-{}  {}",
            summary.battle_id.as_str(),
            summary.sport,
            summary.opponent.as_deref().unwrap_or("-"),
            summary.my_score,
            summary.opponent_score,
            summary.outcome.as_str()
        );
    }
    Ok(())
}

pub async fn play(state: &AppState, join: Option<&str>, watch: bool) -> anyhow::Result<()> {
    match join {
        Some(id) => run_battle(state, BattleId::from(id)).await,
        None => lobby(state, watch).await,
    }
}

async fn lobby(state: &AppState, watch: bool) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    let joinable = state.battle_service.joinable_battles(&user.username).await?;
    print_battles(&joinable);
    if !watch {
        return Ok(());
    }

    let session = state.start_session(user.clone()).await?;
    let lobby = Lobby::new(session.dispatcher().await);
    lobby.set_waiting_battles(joinable.clone()).await;
    let listener = lobby.spawn(session.subscribe().await);
    lobby.refresh().await;

    let mut shown = joinable;
    let mut poll = tokio::time::interval(LOBBY_POLL);
    loop {
        tokio::select! {
            _ = poll.tick() => {
                let current: Vec<Battle> = lobby
                    .waiting_battles()
                    .await
                    .into_iter()
                    .filter(|b| b.first_opponent != user.username)
                    .collect();
                if current != shown {
                    print_battles(&current);
                    shown = current;
                }
                for invitation in lobby.invitations().await {
                    println!("{} invited you to a {} battle", invitation.from, invitation.sport);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    listener.abort();
    session.end().await;
    Ok(())
}

async fn run_battle(state: &AppState, battle_id: BattleId) -> anyhow::Result<()> {
    let user = state.require_user().await?;
    let session = state.start_session(user.clone()).await?;
    let sync = session.spawn_user_sync().await;
    let dispatcher = session.dispatcher().await;
    let events = session.subscribe().await;

    if !dispatcher.join_battle(&battle_id, &user.username).await {
        session.end().await;
        bail!("Could not join battle {}", battle_id);
    }
    info!("Joined battle {}", battle_id);

    let (runner, handle) = BattleRunner::new(
        dispatcher,
        events,
        battle_id,
        &user.username,
        BattleTimings::default(),
    );
    let display = tokio::spawn(show_phases(handle.watch()));
    let input = tokio::spawn(read_answers(handle));

    let result = runner.run().await;
    input.abort();
    display.abort();
    sync.abort();

    let outcome = match result {
        Ok(conclusion) => {
            print_conclusion(&conclusion);
            let mut latest = session.user().await;
            latest.record_outcome(conclusion.outcome);
            if let Err(e) = state.preferences.save_user(&latest).await {
                warn!("Could not cache updated stats: {}", e);
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    };
    session.end().await;
    outcome
}

async fn show_phases(mut phases: watch::Receiver<BattlePhase>) {
    loop {
        let phase = phases.borrow_and_update().clone();
        match phase {
            BattlePhase::CountingDown { remaining } => println!("Starting in {}...", remaining),
            BattlePhase::AwaitingQuestion { attempt: 0 } => println!("Waiting for the next question"),
            BattlePhase::InQuestion { index, question } => print_question(index, &question),
            BattlePhase::BetweenQuestions { answer, .. } if answer.is_empty() => {
                println!("Time's up!")
            }
            BattlePhase::AwaitingResult { attempt: 0 } => println!("Waiting for the result"),
            _ => {}
        }
        if phases.changed().await.is_err() {
            break;
        }
    }
}

async fn read_answers(handle: BattleHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let answer = match handle.phase() {
            BattlePhase::InQuestion { question, .. } => choose(&question, &line),
            _ => continue,
        };
        if !handle.answer(&answer).await {
            break;
        }
    }
}

/// A number picks from the listed answers; anything else is taken as typed.
fn choose(question: &Question, input: &str) -> String {
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(n) if (1..=question.answers.len()).contains(&n) => question.answers[n - 1].clone(),
        _ => input.to_string(),
    }
}

fn print_question(index: usize, question: &Question) {
    println!();
    println!("Q{}: {}", index + 1, question.question);
    for (i, answer) in question.answers.iter().enumerate() {
        println!("  {}) {}", i + 1, answer);
    }
}

fn print_conclusion(conclusion: &BattleConclusion) {
    let headline = match conclusion.outcome {
        BattleOutcome::Win => "You won!",
        BattleOutcome::Lose => "You lost.",
        BattleOutcome::Draw => "It's a draw.",
    };
    match conclusion.opponent_score {
        Some(theirs) => println!("{} {} - {}", headline, conclusion.my_score, theirs),
        None => println!("{} You scored {}", headline, conclusion.my_score),
    }
}

fn print_battles(battles: &[Battle]) {
    if battles.is_empty() {
        println!("No battles waiting for an opponent");
        return;
    }
    for battle in battles {
        println!(
            "  {:>5}  {:<10} by {}",
            battle.id.as_str(),
            battle.sport,
            battle.first_opponent
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::question::Difficulty;
    use test_case::test_case;

    fn question() -> Question {
        Question {
            question: "Who won the 2010 World Cup?".to_string(),
            answers: vec!["Spain".to_string(), "Netherlands".to_string()],
            correct_answer: "Spain".to_string(),
            difficulty: Difficulty::Easy,
        }
    }

    #[test_case("1", "Spain")]
    #[test_case(" 2 ", "Netherlands")]
    #[test_case("3", "3")]
    #[test_case("0", "0")]
    #[test_case("spain", "spain")]
    fn test_choose(input: &str, expected: &str) {
        assert_eq!(choose(&question(), input), expected);
    }
}
