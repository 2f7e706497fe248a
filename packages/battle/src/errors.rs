use std::fmt;

use shared::models::battle::BattleId;

/// Named ways a battle can end without a result.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleError {
    QuestionNeverArrived { attempts: u32 },
    ResultNeverArrived { attempts: u32 },
    Cancelled(BattleId),
    ConnectionLost,
}

impl fmt::Display for BattleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BattleError::QuestionNeverArrived { attempts } => {
                write!(f, "No question arrived after {} waits", attempts)
            }
            BattleError::ResultNeverArrived { attempts } => {
                write!(f, "No result arrived after {} waits", attempts)
            }
            BattleError::Cancelled(id) => write!(f, "Battle {} was cancelled", id),
            BattleError::ConnectionLost => write!(f, "Connection lost during battle"),
        }
    }
}

impl std::error::Error for BattleError {}
