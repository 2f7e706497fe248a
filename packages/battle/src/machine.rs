//! Battle phases as an explicit state machine.
//!
//! The machine is pure: it takes [`BattleEvent`]s and answers with
//! [`Effect`]s for the runner to carry out (frames to send, timers to arm).
//! Events that make no sense in the current phase are ignored.

use std::time::Duration;

use tracing::{debug, info, warn};

use shared::models::battle::{Battle, BattleId, BattleOutcome, BattleStatus};
use shared::models::question::Question;

use crate::errors::BattleError;

pub const QUESTION_TIME: Duration = Duration::from_secs(10);
pub const BETWEEN_QUESTIONS: Duration = Duration::from_secs(3);

/// How long to wait for a question (or result) that should already be on its
/// way: an initial wait, then each wait `factor` times longer, for at most
/// `max_attempts` waits in total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionWaitPolicy {
    pub initial: Duration,
    pub factor: u32,
    pub max_attempts: u32,
}

impl Default for QuestionWaitPolicy {
    fn default() -> Self {
        QuestionWaitPolicy {
            initial: Duration::from_secs(2),
            factor: 2,
            max_attempts: 3,
        }
    }
}

impl QuestionWaitPolicy {
    /// Length of wait number `attempt` (zero based), or `None` once the
    /// attempts are used up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.initial * self.factor.saturating_pow(attempt))
    }

    pub fn total(&self) -> Duration {
        (0..self.max_attempts).filter_map(|a| self.delay(a)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleTimings {
    pub countdown: Duration,
    pub question: Duration,
    pub between_questions: Duration,
    pub wait: QuestionWaitPolicy,
}

impl Default for BattleTimings {
    fn default() -> Self {
        BattleTimings {
            countdown: crate::countdown::COUNTDOWN_WINDOW,
            question: QUESTION_TIME,
            between_questions: BETWEEN_QUESTIONS,
            wait: QuestionWaitPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleConclusion {
    pub outcome: BattleOutcome,
    pub my_score: u32,
    pub opponent_score: Option<u32>,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BattlePhase {
    Waiting,
    CountingDown {
        remaining: u64,
    },
    AwaitingQuestion {
        attempt: u32,
    },
    InQuestion {
        index: usize,
        question: Question,
    },
    /// `answer` is what was submitted; empty after a timeout.
    BetweenQuestions {
        index: usize,
        answer: String,
    },
    AwaitingResult {
        attempt: u32,
    },
    Finished(BattleConclusion),
    Failed(BattleError),
}

impl BattlePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BattlePhase::Finished(_) | BattlePhase::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            BattlePhase::Waiting => "waiting",
            BattlePhase::CountingDown { .. } => "counting_down",
            BattlePhase::AwaitingQuestion { .. } => "awaiting_question",
            BattlePhase::InQuestion { .. } => "in_question",
            BattlePhase::BetweenQuestions { .. } => "between_questions",
            BattlePhase::AwaitingResult { .. } => "awaiting_result",
            BattlePhase::Finished(_) => "finished",
            BattlePhase::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    CountdownStarted,
    CountdownTick(u64),
    QuestionArrived(Question),
    AnswerSelected(String),
    QuestionTimedOut,
    InterQuestionElapsed,
    QuestionsExhausted,
    WaitExpired(u32),
    ResultAnnounced {
        winner: String,
        loser: String,
        winner_score: Option<u32>,
        loser_score: Option<u32>,
    },
    DrawAnnounced {
        score: Option<u32>,
    },
    Cancelled,
    ConnectionLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    QuestionTimeout,
    InterQuestion,
    Wait(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartBattle,
    SubmitAnswer(String),
    CheckForWinner,
    Schedule(Timer, Duration),
    CancelTimer,
}

pub struct BattleMachine {
    battle_id: BattleId,
    username: String,
    timings: BattleTimings,
    phase: BattlePhase,
    score: u32,
    questions_seen: usize,
    pending: Option<Question>,
    exhausted: bool,
}

impl BattleMachine {
    pub fn new(battle_id: BattleId, username: &str, timings: BattleTimings) -> Self {
        BattleMachine {
            battle_id,
            username: username.to_string(),
            timings,
            phase: BattlePhase::Waiting,
            score: 0,
            questions_seen: 0,
            pending: None,
            exhausted: false,
        }
    }

    pub fn battle_id(&self) -> &BattleId {
        &self.battle_id
    }

    pub fn phase(&self) -> &BattlePhase {
        &self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn apply(&mut self, event: BattleEvent) -> Vec<Effect> {
        if self.phase.is_terminal() {
            debug!("Battle {} already over, ignoring {:?}", self.battle_id, event);
            return vec![];
        }

        match event {
            BattleEvent::ResultAnnounced {
                winner,
                loser,
                winner_score,
                loser_score,
            } => {
                let conclusion = self.conclude(&winner, &loser, winner_score, loser_score);
                info!(
                    "Battle {} finished: {} {}",
                    self.battle_id,
                    self.username,
                    conclusion.outcome.as_str()
                );
                self.phase = BattlePhase::Finished(conclusion);
                return vec![Effect::CancelTimer];
            }
            BattleEvent::DrawAnnounced { score } => {
                info!("Battle {} finished in a draw", self.battle_id);
                self.phase = BattlePhase::Finished(BattleConclusion {
                    outcome: BattleOutcome::Draw,
                    my_score: self.score,
                    opponent_score: score,
                    winner: None,
                });
                return vec![Effect::CancelTimer];
            }
            BattleEvent::Cancelled => {
                self.phase = BattlePhase::Failed(BattleError::Cancelled(self.battle_id.clone()));
                return vec![Effect::CancelTimer];
            }
            BattleEvent::ConnectionLost => {
                self.phase = BattlePhase::Failed(BattleError::ConnectionLost);
                return vec![Effect::CancelTimer];
            }
            _ => {}
        }

        let phase = std::mem::replace(&mut self.phase, BattlePhase::Waiting);
        let (next, effects) = self.transition(phase, event);
        self.phase = next;
        effects
    }

    fn transition(&mut self, phase: BattlePhase, event: BattleEvent) -> (BattlePhase, Vec<Effect>) {
        use BattleEvent as E;
        use BattlePhase as P;

        match (phase, event) {
            (P::Waiting, E::CountdownStarted) => (
                P::CountingDown {
                    remaining: self.timings.countdown.as_secs(),
                },
                vec![],
            ),

            (P::CountingDown { remaining }, E::CountdownTick(next)) if next < remaining => {
                if next == 0 {
                    let effects = vec![Effect::StartBattle, self.arm_wait(0)];
                    (P::AwaitingQuestion { attempt: 0 }, effects)
                } else {
                    (P::CountingDown { remaining: next }, vec![])
                }
            }

            // A question that beats the countdown is held until it ends.
            (P::CountingDown { remaining }, E::QuestionArrived(question)) => {
                self.pending = Some(question);
                (P::CountingDown { remaining }, vec![])
            }

            // So is the end marker; the battle goes straight to the result once it starts.
            (phase @ P::Waiting, E::QuestionsExhausted)
            | (phase @ P::CountingDown { .. }, E::QuestionsExhausted) => {
                self.exhausted = true;
                (phase, vec![])
            }

            (P::AwaitingQuestion { .. }, E::QuestionArrived(question)) => self.ask(question),

            (P::AwaitingQuestion { attempt }, E::WaitExpired(expired)) if expired == attempt => {
                let next = attempt + 1;
                match self.timings.wait.delay(next) {
                    Some(_) => {
                        warn!(
                            "No question for battle {} after wait {}, waiting longer",
                            self.battle_id, next
                        );
                        (P::AwaitingQuestion { attempt: next }, vec![self.arm_wait(next)])
                    }
                    None => {
                        warn!("Giving up on questions for battle {}", self.battle_id);
                        (
                            P::Failed(BattleError::QuestionNeverArrived { attempts: next }),
                            vec![Effect::CancelTimer],
                        )
                    }
                }
            }

            (P::AwaitingQuestion { .. }, E::QuestionsExhausted) => self.await_result(),

            (P::InQuestion { index, question }, E::AnswerSelected(answer)) => {
                if question.is_correct(&answer) {
                    self.score += 1;
                }
                debug!(
                    "{} answered question {} of battle {}",
                    self.username, index, self.battle_id
                );
                let effects = self.submit(answer.clone());
                (P::BetweenQuestions { index, answer }, effects)
            }

            (P::InQuestion { index, .. }, E::QuestionTimedOut) => {
                debug!("Question {} of battle {} timed out", index, self.battle_id);
                let answer = String::new();
                let effects = self.submit(answer.clone());
                (P::BetweenQuestions { index, answer }, effects)
            }

            (phase @ P::InQuestion { .. }, E::QuestionsExhausted)
            | (phase @ P::BetweenQuestions { .. }, E::QuestionsExhausted) => {
                self.exhausted = true;
                (phase, vec![])
            }

            (phase @ P::BetweenQuestions { .. }, E::QuestionArrived(question)) => {
                self.pending = Some(question);
                (phase, vec![])
            }

            (P::BetweenQuestions { .. }, E::InterQuestionElapsed) => {
                if let Some(question) = self.pending.take() {
                    self.ask(question)
                } else if self.exhausted {
                    self.await_result()
                } else {
                    (P::AwaitingQuestion { attempt: 0 }, vec![self.arm_wait(0)])
                }
            }

            (P::AwaitingResult { attempt }, E::WaitExpired(expired)) if expired == attempt => {
                let next = attempt + 1;
                match self.timings.wait.delay(next) {
                    Some(_) => (
                        P::AwaitingResult { attempt: next },
                        vec![Effect::CheckForWinner, self.arm_wait(next)],
                    ),
                    None => (
                        P::Failed(BattleError::ResultNeverArrived { attempts: next }),
                        vec![Effect::CancelTimer],
                    ),
                }
            }

            (phase, event) => {
                debug!("Ignoring {:?} during {}", event, phase.name());
                (phase, vec![])
            }
        }
    }

    /// Called when the countdown has ended, to play out whatever arrived
    /// during it: a held question, or the end marker.
    pub fn take_pending_on_start(&mut self) -> Vec<Effect> {
        match (&self.phase, self.pending.take()) {
            (BattlePhase::AwaitingQuestion { .. }, Some(question)) => {
                let (next, effects) = self.ask(question);
                self.phase = next;
                effects
            }
            (BattlePhase::AwaitingQuestion { .. }, None) if self.exhausted => {
                let (next, effects) = self.await_result();
                self.phase = next;
                effects
            }
            (_, pending) => {
                self.pending = pending;
                vec![]
            }
        }
    }

    fn ask(&mut self, question: Question) -> (BattlePhase, Vec<Effect>) {
        let index = self.questions_seen;
        self.questions_seen += 1;
        (
            BattlePhase::InQuestion { index, question },
            vec![Effect::Schedule(Timer::QuestionTimeout, self.timings.question)],
        )
    }

    fn submit(&self, answer: String) -> Vec<Effect> {
        vec![
            Effect::SubmitAnswer(answer),
            Effect::CheckForWinner,
            Effect::Schedule(Timer::InterQuestion, self.timings.between_questions),
        ]
    }

    fn await_result(&self) -> (BattlePhase, Vec<Effect>) {
        (
            BattlePhase::AwaitingResult { attempt: 0 },
            vec![Effect::CheckForWinner, self.arm_wait(0)],
        )
    }

    fn arm_wait(&self, attempt: u32) -> Effect {
        match self.timings.wait.delay(attempt) {
            Some(delay) => Effect::Schedule(Timer::Wait(attempt), delay),
            None => Effect::CancelTimer,
        }
    }

    /// Maps the announced result onto this user through the shared battle
    /// mapping when both scores are known, by name otherwise.
    fn conclude(
        &self,
        winner: &str,
        loser: &str,
        winner_score: Option<u32>,
        loser_score: Option<u32>,
    ) -> BattleConclusion {
        let me = self.username.as_str();
        let snapshot = match (winner_score, loser_score) {
            (Some(ws), Some(ls)) => Some(Battle {
                id: self.battle_id.clone(),
                first_opponent: winner.to_string(),
                second_opponent: Some(loser.to_string()),
                sport: String::new(),
                first_opponent_score: ws,
                second_opponent_score: ls,
                status: BattleStatus::Finished,
                created_at: None,
            }),
            _ => None,
        };

        let outcome = snapshot
            .as_ref()
            .and_then(|battle| battle.outcome_for(me))
            .unwrap_or(if me == winner {
                BattleOutcome::Win
            } else {
                BattleOutcome::Lose
            });
        let opponent_score = if me == winner { loser_score } else { winner_score };

        BattleConclusion {
            outcome,
            my_score: self.score,
            opponent_score,
            winner: Some(winner.to_string()),
        }
    }
}
