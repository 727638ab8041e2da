//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `moodtune` binary.
//!
//! ## Commands
//!
//! - `run`: Detect moods (replay file or synthetic) and play matching music
//! - `recommend`: One-shot recommendation for a named emotion
//! - `moods`: Show the mood profile for every emotion
//! - `auth` / `logout`: Store or forget the catalog access token
//! - `history`: Show recent mood changes
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! moodtune run --seconds 20
//! moodtune run --replay faces.jsonl --token "$TOKEN"
//! moodtune recommend sad
//! ```

use crate::emotion::EmotionLabel;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "moodtune")]
#[command(about = "MoodTune: music that follows your mood")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect moods and play matching music
    ///
    /// Starts the detection loop. With `--replay`, frames come from a
    /// JSON-lines file of emotion scores; without it there is no camera and
    /// the session runs on synthetic emotions. Every mood change loads a new
    /// track list, and playback progress is simulated so tracks advance on
    /// their own.
    Run {
        /// Stop after this many seconds
        #[arg(short, long, default_value = "30")]
        seconds: u64,

        /// JSON-lines file of score maps, one frame per line
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        replay: Option<PathBuf>,

        /// Catalog access token for this run (overrides the stored one)
        #[arg(long, env = "MOODTUNE_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Recommend tracks for an emotion
    ///
    /// Queries the catalog when a token is available, otherwise (or on any
    /// catalog failure) prints the curated fallback list.
    Recommend {
        /// Emotion to recommend for
        #[arg(value_enum)]
        emotion: EmotionLabel,

        /// Use a random genre search instead of feature targets
        #[arg(long)]
        search: bool,

        /// Catalog access token for this call (overrides the stored one)
        #[arg(long, env = "MOODTUNE_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Show genres and audio-feature targets for every emotion
    Moods,

    /// Store a catalog access token for later sessions
    Auth {
        /// The access token
        token: String,
    },

    /// Forget the stored access token
    Logout,

    /// Show recent mood changes
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Generate shell completions
    ///
    /// Usage: moodtune completion bash > ~/.local/share/bash-completion/completions/moodtune
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_recommend_emotion() {
        let args = Args::try_parse_from(["moodtune", "recommend", "surprised"]).unwrap();
        match args.command {
            Command::Recommend { emotion, search, .. } => {
                assert_eq!(emotion, EmotionLabel::Surprised);
                assert!(!search);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["moodtune", "recommend", "bored"]).is_err());
    }

    #[test]
    fn test_run_defaults() {
        let args = Args::try_parse_from(["moodtune", "run", "--replay", "faces.jsonl"]).unwrap();
        match args.command {
            Command::Run { seconds, replay, .. } => {
                assert_eq!(seconds, 30);
                assert_eq!(replay, Some(PathBuf::from("faces.jsonl")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_history_limit_flag() {
        let args = Args::try_parse_from(["moodtune", "history", "-n", "5"]).unwrap();
        assert!(matches!(args.command, Command::History { limit: 5 }));
    }
}
