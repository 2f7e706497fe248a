use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use realtime::dispatch::Dispatcher;
use shared::models::battle::BattleId;
use shared::models::messages::ServerMessage;

use crate::countdown::Countdown;
use crate::errors::BattleError;
use crate::machine::{
    BattleConclusion, BattleEvent, BattleMachine, BattlePhase, BattleTimings, Effect, Timer,
};

const ANSWER_BUFFER: usize = 8;

/// What the player side holds while a battle runs.
pub struct BattleHandle {
    answers: mpsc::Sender<String>,
    phase: watch::Receiver<BattlePhase>,
}

impl BattleHandle {
    /// Picks an answer for the current question. Returns false once the
    /// battle is over.
    pub async fn answer(&self, answer: &str) -> bool {
        self.answers.send(answer.to_string()).await.is_ok()
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<BattlePhase> {
        self.phase.clone()
    }
}

/// Drives a [`BattleMachine`] from socket pushes, player answers and
/// `tokio::time` timers.
///
/// A socket that drops after the countdown gets one reconnect attempt; if
/// that fails the battle ends with [`BattleError::ConnectionLost`].
pub struct BattleRunner {
    dispatcher: Dispatcher,
    events: broadcast::Receiver<ServerMessage>,
    link: watch::Receiver<bool>,
    answers: mpsc::Receiver<String>,
    phase: watch::Sender<BattlePhase>,
    machine: BattleMachine,
    username: String,
    timings: BattleTimings,
    deadline: Option<(Instant, Timer)>,
}

impl BattleRunner {
    /// `events` should be subscribed before the battle is joined so no push
    /// is missed.
    pub fn new(
        dispatcher: Dispatcher,
        events: broadcast::Receiver<ServerMessage>,
        battle_id: BattleId,
        username: &str,
        timings: BattleTimings,
    ) -> (BattleRunner, BattleHandle) {
        let (answers_tx, answers) = mpsc::channel(ANSWER_BUFFER);
        let (phase, phase_rx) = watch::channel(BattlePhase::Waiting);
        let link = dispatcher.connection().link_state();
        let runner = BattleRunner {
            dispatcher,
            events,
            link,
            answers,
            phase,
            machine: BattleMachine::new(battle_id, username, timings),
            username: username.to_string(),
            timings,
            deadline: None,
        };
        let handle = BattleHandle {
            answers: answers_tx,
            phase: phase_rx,
        };
        (runner, handle)
    }

    pub async fn run(mut self) -> Result<BattleConclusion, BattleError> {
        let battle_id = self.machine.battle_id().clone();
        info!("Battle {} countdown started for {}", battle_id, self.username);

        let mut countdown = Some(Countdown::new(Instant::now(), self.timings.countdown));
        self.step(BattleEvent::CountdownStarted).await;

        while !self.machine.phase().is_terminal() {
            let tick_at = countdown.map(|c| c.next_tick_after(Instant::now()));
            let deadline = self.deadline;

            tokio::select! {
                received = self.events.recv() => match received {
                    Ok(message) => {
                        if let Some(event) = translate(&battle_id, message) {
                            self.step(event).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Battle {} missed {} pushes", battle_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        self.step(BattleEvent::ConnectionLost).await;
                    }
                },
                // A drop during the countdown is only noticed once it ends.
                changed = self.link.changed(), if countdown.is_none() => match changed {
                    Ok(()) => {
                        let up = *self.link.borrow_and_update();
                        if !up {
                            self.recover_link().await;
                        }
                    }
                    Err(_) => self.step(BattleEvent::ConnectionLost).await,
                },
                Some(answer) = self.answers.recv() => {
                    self.step(BattleEvent::AnswerSelected(answer)).await;
                }
                _ = sleep_until(tick_at.unwrap_or_else(Instant::now)), if tick_at.is_some() => {
                    if let Some(current) = countdown {
                        let remaining = current.remaining_at(Instant::now());
                        self.step(BattleEvent::CountdownTick(remaining)).await;
                        if remaining == 0 {
                            countdown = None;
                            let effects = self.machine.take_pending_on_start();
                            self.perform(effects).await;
                            self.publish();
                        }
                    }
                }
                _ = sleep_until(deadline.map(|(at, _)| at).unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((_, timer)) = self.deadline.take() {
                        self.step(expiry_event(timer)).await;
                    }
                }
            }
        }

        match self.machine.phase().clone() {
            BattlePhase::Finished(conclusion) => Ok(conclusion),
            BattlePhase::Failed(error) => {
                warn!("Battle {} failed: {}", battle_id, error);
                Err(error)
            }
            other => {
                debug!("Battle {} stopped during {}", battle_id, other.name());
                Err(BattleError::ConnectionLost)
            }
        }
    }

    async fn recover_link(&mut self) {
        let battle_id = self.machine.battle_id().clone();
        warn!("Socket dropped during battle {}, reconnecting once", battle_id);
        match self.dispatcher.connection().reconnect().await {
            Ok(()) => info!("Battle {} back online", battle_id),
            Err(e) => {
                warn!("Battle {} could not reconnect: {}", battle_id, e);
                self.step(BattleEvent::ConnectionLost).await;
            }
        }
    }

    async fn step(&mut self, event: BattleEvent) {
        let effects = self.machine.apply(event);
        self.perform(effects).await;
        self.publish();
    }

    fn publish(&self) {
        let phase = self.machine.phase().clone();
        self.phase.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                *current = phase;
                true
            }
        });
    }

    async fn perform(&mut self, effects: Vec<Effect>) {
        let battle_id = self.machine.battle_id().clone();
        for effect in effects {
            match effect {
                Effect::StartBattle => {
                    // No reconnect here: a closed socket means the battle is not started.
                    if self.dispatcher.connection().is_open().await {
                        self.dispatcher.start_battle(&battle_id).await;
                    } else {
                        warn!("Socket closed at countdown end, not starting {}", battle_id);
                    }
                }
                Effect::SubmitAnswer(answer) => {
                    self.dispatcher
                        .submit_answer(&battle_id, &self.username, &answer)
                        .await;
                }
                Effect::CheckForWinner => {
                    self.dispatcher.check_for_winner(&battle_id).await;
                }
                Effect::Schedule(timer, delay) => {
                    self.deadline = Some((Instant::now() + delay, timer));
                }
                Effect::CancelTimer => self.deadline = None,
            }
        }
    }
}

fn expiry_event(timer: Timer) -> BattleEvent {
    match timer {
        Timer::QuestionTimeout => BattleEvent::QuestionTimedOut,
        Timer::InterQuestion => BattleEvent::InterQuestionElapsed,
        Timer::Wait(attempt) => BattleEvent::WaitExpired(attempt),
    }
}

/// Pushes for other battles are dropped. Question pushes without an id are
/// taken to be for the current battle.
fn translate(battle_id: &BattleId, message: ServerMessage) -> Option<BattleEvent> {
    let ours = |id: &Option<BattleId>| id.as_ref().map_or(true, |id| id == battle_id);
    match message {
        ServerMessage::CurrentQuestion {
            battle_id: id,
            question,
        } if ours(&id) => Some(BattleEvent::QuestionArrived(question)),
        ServerMessage::QuestionsExhausted { battle_id: id } if ours(&id) => {
            Some(BattleEvent::QuestionsExhausted)
        }
        ServerMessage::BattleResult {
            battle_id: id,
            winner,
            loser,
            winner_score,
            loser_score,
        } if &id == battle_id => Some(BattleEvent::ResultAnnounced {
            winner,
            loser,
            winner_score,
            loser_score,
        }),
        ServerMessage::BattleDrawResult {
            battle_id: id,
            score,
        } if &id == battle_id => Some(BattleEvent::DrawAnnounced { score }),
        ServerMessage::BattleCancelled { battle_id: id } if &id == battle_id => {
            Some(BattleEvent::Cancelled)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realtime::connection::Connection;
    use realtime::testing::{FakeConnector, FakeServer};
    use serde_json::json;
    use shared::models::battle::BattleOutcome;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    struct Harness {
        connector: FakeConnector,
        server: FakeServer,
        handle: BattleHandle,
        task: JoinHandle<Result<BattleConclusion, BattleError>>,
    }

    async fn start() -> Harness {
        let connector = FakeConnector::new();
        let connection = Connection::open(
            "ws://test/pele",
            Arc::new(connector.clone()),
            Duration::from_secs(3),
        )
        .await
        .unwrap();
        let server = connector.server(0).await;
        let events = connection.subscribe();
        let (runner, handle) = BattleRunner::new(
            Dispatcher::new(connection),
            events,
            BattleId::from("42"),
            "pele",
            BattleTimings::default(),
        );
        let task = tokio::spawn(runner.run());
        Harness {
            connector,
            server,
            handle,
            task,
        }
    }

    fn question(text: &str) -> serde_json::Value {
        json!({
            "type": "current_question",
            "battle_id": 42,
            "question": {
                "question": text,
                "answers": ["Brazil", "Germany"],
                "correctAnswer": "Brazil",
            }
        })
    }

    async fn wait_for(handle: &BattleHandle, name: &str) {
        let mut watch = handle.watch();
        while watch.borrow_and_update().name() != name {
            if watch.changed().await.is_err() {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_counts_down_to_zero_then_starts() {
        let mut harness = start().await;
        let mut watch = harness.handle.watch();

        let mut seen = Vec::new();
        loop {
            watch.changed().await.unwrap();
            match &*watch.borrow_and_update() {
                BattlePhase::CountingDown { remaining } => seen.push(*remaining),
                BattlePhase::AwaitingQuestion { .. } => break,
                other => panic!("unexpected phase {:?}", other),
            }
        }

        assert_eq!(seen, (1..=10).rev().collect::<Vec<u64>>());
        let start = harness.server.frame_of_type("start_battle").await.unwrap();
        assert_eq!(start["battle_id"], "42");
        assert!(harness
            .server
            .drain()
            .iter()
            .all(|frame| frame["type"] != "start_battle"));
        harness.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_socket_skips_start_then_fails_once_reconnect_refused() {
        let Harness {
            connector,
            server,
            handle,
            task,
        } = start().await;
        connector.refuse_connections(true).await;
        server.disconnect();

        wait_for(&handle, "failed").await;

        assert_eq!(task.await.unwrap(), Err(BattleError::ConnectionLost));
        // The start is not retried; only the single recovery attempt dials.
        assert_eq!(connector.connect_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_mid_question_fails_when_reconnect_refused() {
        let harness = start().await;
        wait_for(&harness.handle, "awaiting_question").await;
        harness.server.push(&question("Who won 2002?")).await;
        wait_for(&harness.handle, "in_question").await;

        harness.connector.refuse_connections(true).await;
        harness.server.disconnect();
        let started = Instant::now();

        assert_eq!(harness.task.await.unwrap(), Err(BattleError::ConnectionLost));
        assert!(Instant::now() - started < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_mid_battle_recovers_on_fresh_socket() {
        let harness = start().await;
        wait_for(&harness.handle, "awaiting_question").await;
        let connector = harness.connector.clone();
        harness.server.disconnect();

        let mut fresh = loop {
            if connector.connect_count().await == 2 {
                break connector.server(1).await;
            }
            tokio::task::yield_now().await;
        };
        fresh.push(&question("Who won 2002?")).await;
        wait_for(&harness.handle, "in_question").await;
        assert!(harness.handle.answer("Brazil").await);

        let submit = fresh.frame_of_type("submit_answer").await.unwrap();
        assert_eq!(submit["answer"], "Brazil");
        harness.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_marker_during_countdown_awaits_result() {
        let mut harness = start().await;
        harness
            .server
            .push(&json!({"type": "current_question", "battle_id": 42, "question": "No more questions"}))
            .await;

        wait_for(&harness.handle, "awaiting_result").await;

        assert_eq!(harness.handle.phase(), BattlePhase::AwaitingResult { attempt: 0 });
        assert!(harness.server.frame_of_type("check_for_winner").await.is_some());
        harness.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_sends_submit_then_check() {
        let mut harness = start().await;
        wait_for(&harness.handle, "awaiting_question").await;
        harness.server.push(&question("Who won 2002?")).await;
        wait_for(&harness.handle, "in_question").await;

        assert!(harness.handle.answer("Brazil").await);

        let submit = harness.server.frame_of_type("submit_answer").await.unwrap();
        assert_eq!(submit["answer"], "Brazil");
        assert_eq!(submit["username"], "pele");
        let check = harness.server.next_frame().await.unwrap();
        assert_eq!(check["type"], "check_for_winner");
        harness.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_submits_empty_answer_once() {
        let mut harness = start().await;
        wait_for(&harness.handle, "awaiting_question").await;
        harness.server.push(&question("Who won 2002?")).await;
        wait_for(&harness.handle, "in_question").await;

        wait_for(&harness.handle, "between_questions").await;
        // Past the inter-question delay and into the next wait.
        wait_for(&harness.handle, "awaiting_question").await;

        let submits: Vec<_> = harness
            .server
            .drain()
            .into_iter()
            .filter(|frame| frame["type"] == "submit_answer")
            .collect();
        assert_eq!(submits.len(), 1);
        assert_eq!(submits[0]["answer"], "");
        harness.task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_question_fails_after_backoff() {
        let harness = start().await;
        let started = Instant::now();

        let result = harness.task.await.unwrap();

        assert_eq!(
            result,
            Err(BattleError::QuestionNeverArrived { attempts: 3 })
        );
        assert_eq!(
            Instant::now() - started,
            Duration::from_secs(10) + Duration::from_secs(14)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_push_finishes_battle() {
        let harness = start().await;
        wait_for(&harness.handle, "awaiting_question").await;
        harness.server.push(&question("Who won 2002?")).await;
        wait_for(&harness.handle, "in_question").await;
        harness.handle.answer("brazil").await;
        wait_for(&harness.handle, "between_questions").await;

        harness
            .server
            .push(&json!({"type": "battle_result", "battle_id": "7", "winner": "kaka", "loser": "pele"}))
            .await;
        harness
            .server
            .push(&json!({
                "type": "battle_result",
                "battle_id": 42,
                "winner": "pele",
                "loser": "kaka",
                "winner_score": 1,
                "loser_score": 0,
            }))
            .await;

        let conclusion = harness.task.await.unwrap().unwrap();
        assert_eq!(conclusion.outcome, BattleOutcome::Win);
        assert_eq!(conclusion.my_score, 1);
        assert_eq!(conclusion.opponent_score, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_push_ends_battle() {
        let harness = start().await;

        harness
            .server
            .push(&json!({"type": "battle_cancelled", "battle_id": "42"}))
            .await;

        assert_eq!(
            harness.task.await.unwrap(),
            Err(BattleError::Cancelled(BattleId::from("42")))
        );
    }
}
