//! Operator subcommands of the gateway binary
//!
//! `graphql-gateway` with no arguments serves HTTP.
//! `graphql-gateway reconcile-counters [LIMIT]` repairs drifted post
//! counters against live rows and exits.

use anyhow::{bail, Context, Result};

/// Posts repaired per `reconcile-counters` run when no limit is given
pub const DEFAULT_RECONCILE_LIMIT: i64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    ReconcileCounters { limit: i64 },
}

impl Command {
    /// Parse from process arguments, binary name excluded
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let Some(cmd) = args.next() else {
            return Ok(Command::Serve);
        };

        let command = match cmd.as_str() {
            "serve" => Command::Serve,
            "reconcile-counters" => {
                let limit = match args.next() {
                    Some(raw) => raw
                        .parse::<i64>()
                        .with_context(|| format!("invalid reconcile limit: {}", raw))?,
                    None => DEFAULT_RECONCILE_LIMIT,
                };
                if limit < 1 {
                    bail!("reconcile limit must be positive, got {}", limit);
                }
                Command::ReconcileCounters { limit }
            }
            other => bail!("unknown command: {}", other),
        };

        if let Some(extra) = args.next() {
            bail!("unexpected argument: {}", extra);
        }

        Ok(command)
    }
}
