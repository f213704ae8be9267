//! Global CLI options and their translation into core inputs.

use anyhow::{Context, Result};
use clap::Args;
use roster_core::{Actor, ActorContext};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GlobalOptions {
    /// SQLite database file; created and migrated when missing.
    #[arg(long, global = true, env = "ROSTER_DB", default_value = "roster.sqlite3")]
    pub db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "ROSTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rolling log files. Logging stays off when unset.
    #[arg(long, global = true, env = "ROSTER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Acting user recorded in audit fields, as "First Last".
    #[arg(long, global = true, env = "ROSTER_ACTOR")]
    pub actor: Option<String>,
}

impl GlobalOptions {
    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<()> {
        let Some(log_dir) = self.log_dir.as_ref() else {
            return Ok(());
        };
        let log_dir = if log_dir.is_absolute() {
            log_dir.clone()
        } else {
            std::env::current_dir()
                .context("failed to resolve current directory")?
                .join(log_dir)
        };
        roster_core::init_logging(self.log_level(), &log_dir)
            .with_context(|| format!("failed to initialize logging in '{}'", log_dir.display()))
    }

    /// Configured level, or the build-mode default when unset.
    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(roster_core::default_log_level())
    }

    pub fn actor_context(&self) -> ActorContext {
        match self.actor.as_deref().map(str::trim) {
            None | Some("") => ActorContext::system(),
            Some(raw) => {
                let actor = match raw.split_once(char::is_whitespace) {
                    Some((first, last)) => Actor::new(first, last),
                    None => Actor::named(raw),
                };
                ActorContext::authenticated(actor)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GlobalOptions;
    use std::path::PathBuf;

    fn options(actor: Option<&str>) -> GlobalOptions {
        GlobalOptions {
            db: PathBuf::from("roster.sqlite3"),
            log_level: None,
            log_dir: None,
            actor: actor.map(str::to_string),
        }
    }

    #[test]
    fn log_level_prefers_configured_value() {
        let mut opts = options(None);
        assert_eq!(opts.log_level(), roster_core::default_log_level());

        opts.log_level = Some("warn".to_string());
        assert_eq!(opts.log_level(), "warn");
    }

    #[test]
    fn logging_stays_off_without_a_directory() {
        assert!(options(None).init_logging().is_ok());
        assert!(roster_core::logging_status().is_none());
    }

    #[test]
    fn actor_context_falls_back_to_system() {
        assert_eq!(options(None).actor_context().display_name(), "System");
        assert_eq!(options(Some("   ")).actor_context().display_name(), "System");
    }

    #[test]
    fn actor_context_joins_first_and_last_name() {
        let ctx = options(Some("Ada   Lovelace")).actor_context();
        assert_eq!(ctx.display_name(), "Ada Lovelace");
        assert_eq!(options(Some("ops")).actor_context().display_name(), "ops");
    }
}
