//! `fanbattle`: terminal client for the FanBattle backend.
//!
//! Wires configuration, logging, the client store, the REST services and the
//! realtime session, then routes to one command.

use clap::{Parser, Subcommand};

use shared::config::ClientConfig;
use shared::models::forum::VoteSide;

mod commands;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "fanbattle")]
#[command(about = "Sports trivia battles from the terminal", long_about = None)]
struct Cli {
    /// Use production endpoints instead of the local backend
    #[arg(long, global = true)]
    production: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a username or email
    Signin {
        identifier: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Username; generated from --name when omitted
        #[arg(long)]
        username: Option<String>,
        /// Full name used to suggest a username
        #[arg(long)]
        name: Option<String>,
    },

    /// Forget the stored session
    Signout,

    /// Show or edit the signed-in profile
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        reset_stats: bool,
        #[arg(long)]
        delete: bool,
    },

    /// Battle history and record
    History,

    /// Friends, online first
    Friends,

    /// Chat history with a friend, optionally sending a message
    Chat {
        friend: String,
        message: Option<String>,
    },

    /// Debates, with optional like, vote or comment actions
    Debates {
        #[arg(long)]
        like: Option<i64>,
        #[arg(long, num_args = 2, value_names = ["ID", "SIDE"])]
        vote: Option<Vec<String>>,
        /// Show the comments of one debate
        #[arg(long)]
        comments: Option<i64>,
        /// Comment on the debate given by --comments
        #[arg(long, requires = "comments")]
        reply: Option<String>,
    },

    /// Latest news and transfers
    News {
        #[arg(long)]
        like: Option<i64>,
    },

    /// Join a waiting battle, or list the joinable ones
    Play {
        #[arg(long)]
        join: Option<String>,
        /// Keep listing battles and invitations as they change
        #[arg(long, conflicts_with = "join")]
        watch: bool,
    },
}

fn parse_side(side: &str) -> anyhow::Result<VoteSide> {
    match side.to_ascii_lowercase().as_str() {
        "agree" => Ok(VoteSide::Agree),
        "disagree" => Ok(VoteSide::Disagree),
        other => Err(anyhow::anyhow!("Unknown side '{}', use agree or disagree", other)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = if cli.production {
        ClientConfig::production()
    } else {
        ClientConfig::from_env()
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let state = AppState::build(config).await?;

    match cli.command {
        Commands::Signin {
            identifier,
            password,
        } => commands::account::sign_in(&state, &identifier, &password).await,
        Commands::Signup {
            email,
            password,
            username,
            name,
        } => {
            commands::account::sign_up(&state, &email, &password, username, name.as_deref()).await
        }
        Commands::Signout => commands::account::sign_out(&state).await,
        Commands::Profile {
            username,
            email,
            avatar,
            reset_stats,
            delete,
        } => {
            let edit = commands::account::ProfileEdit {
                username,
                email,
                avatar,
                reset_stats,
                delete,
            };
            commands::account::profile(&state, edit).await
        }
        Commands::History => commands::dashboard::history(&state).await,
        Commands::Friends => commands::social::friends(&state).await,
        Commands::Chat { friend, message } => {
            commands::social::chat(&state, &friend, message.as_deref()).await
        }
        Commands::Debates {
            like,
            vote,
            comments,
            reply,
        } => {
            let vote = match vote.as_deref() {
                Some([id, side]) => Some((id.parse::<i64>()?, parse_side(side)?)),
                _ => None,
            };
            commands::forum::debates(&state, like, vote, comments, reply.as_deref()).await
        }
        Commands::News { like } => commands::forum::news(&state, like).await,
        Commands::Play { join, watch } => {
            commands::dashboard::play(&state, join.as_deref(), watch).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_vote_takes_id_and_side() {
        let cli = Cli::try_parse_from(["fanbattle", "debates", "--vote", "3", "agree"]).unwrap();

        match cli.command {
            Commands::Debates { vote, .. } => {
                assert_eq!(vote, Some(vec!["3".to_string(), "agree".to_string()]))
            }
            _ => panic!("expected debates"),
        }
    }

    #[test]
    fn test_reply_requires_comments() {
        assert!(Cli::try_parse_from(["fanbattle", "debates", "--reply", "hi"]).is_err());
    }

    #[test_case("agree", Some(VoteSide::Agree))]
    #[test_case("Disagree", Some(VoteSide::Disagree))]
    #[test_case("maybe", None)]
    fn test_parse_side(input: &str, expected: Option<VoteSide>) {
        assert_eq!(parse_side(input).ok(), expected);
    }
}
