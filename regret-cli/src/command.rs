//! Console input parsing.

use std::fmt;

use regret_core::NodeId;

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A prompt for the assistant.
    Prompt(String),
    /// Run causal forgetting with the configured thresholds.
    Forget,
    /// Print the cluster report.
    Clusters,
    /// Print the graph export as JSON.
    Graph,
    /// Rate a stored interaction.
    Feedback {
        /// Node to adjust.
        id: NodeId,
        /// Rating, validated by the engine.
        rating: u8,
    },
    /// Print the current mood.
    Mood,
    /// Recompute residual regret.
    Decay,
    /// Print engine counters.
    Stats,
    /// Write a snapshot now.
    Save,
    /// Print the command list.
    Help,
    /// Leave the console.
    Exit,
    /// Blank line.
    Empty,
}

/// Input that looked like a command but was not one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type :help for commands)", self.0)
    }
}

/// Console help text.
pub const HELP: &str = "\
Commands:
  <text>                  ask the assistant
  :forget                 run causal forgetting
  :clusters               show memory clusters
  :graph                  print the graph as JSON
  :feedback <id> <1-10>   rate a past answer
  :mood                   show current mood
  :decay                  recompute residual regret
  :stats                  show counters
  :save                   write a snapshot
  :help                   this list
  exit                    save (if enabled) and quit";

impl Command {
    /// Parse one input line.
    ///
    /// # Errors
    /// [`ParseError`] for unknown `:` commands or malformed arguments.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Ok(Self::Exit);
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Self::Prompt(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let command = match name.as_str() {
            "forget" => Self::Forget,
            "clusters" => Self::Clusters,
            "graph" => Self::Graph,
            "mood" => Self::Mood,
            "decay" => Self::Decay,
            "stats" => Self::Stats,
            "save" => Self::Save,
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            "feedback" => {
                let usage = || ParseError("usage: :feedback <id> <rating 1-10>".into());
                let id = parts.next().and_then(|s| s.parse().ok()).ok_or_else(usage)?;
                let rating = parts.next().and_then(|s| s.parse().ok()).ok_or_else(usage)?;
                Self::Feedback { id: NodeId(id), rating }
            }
            other => return Err(ParseError(format!("unknown command ':{other}'"))),
        };
        if parts.next().is_some() {
            return Err(ParseError(format!("unexpected arguments to ':{name}'")));
        }
        Ok(command)
    }
}
