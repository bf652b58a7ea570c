//! A small hand-rolled [`log::Log`] implementation, colorizing level tags
//! with `owo-colors` rather than pulling in a subscriber crate.
//!
//! `RUST_LOG` (one of `error`/`warn`/`info`/`debug`/`trace`, case
//! insensitive) selects the max level; unset or unrecognized falls back to
//! `Info`. Output goes to stderr so it never interleaves with a program's
//! own stdout.

use std::sync::Once;

use owo_colors::OwoColorize;

struct Logger;

impl log::Log for Logger
{
    #[inline]
    fn enabled(&self, metadata: &log::Metadata) -> bool
    {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record)
    {
        if !self.enabled(record.metadata())
        {
            return;
        }

        let level_str = match record.level()
        {
            log::Level::Error => "ERROR".red().to_string(),
            log::Level::Warn => "WARN".yellow().to_string(),
            log::Level::Info => "INFO".green().to_string(),
            log::Level::Debug => "DEBUG".blue().to_string(),
            log::Level::Trace => "TRACE".purple().to_string(),
        };

        eprintln!(
            "[{}] ({}) {}",
            level_str,
            record.module_path().unwrap_or("unknown"),
            record.args()
        );
    }

    #[inline]
    fn flush(&self) {}
}

static LOGGER: Logger = Logger;
static INIT: Once = Once::new();

fn level_from_env() -> log::LevelFilter
{
    match std::env::var("RUST_LOG")
    {
        Ok(val) => val.parse().unwrap_or(log::LevelFilter::Info),
        Err(_) => log::LevelFilter::Info,
    }
}

/// Installs the crate's logger as the global `log` backend. Safe to call
/// more than once (from multiple `#[test]` functions, for instance) — only
/// the first call takes effect, matching `log::set_logger`'s one-shot
/// contract.
pub fn init()
{
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already installed by someone other than us");
        log::set_max_level(level_from_env());
    });
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn init_is_idempotent()
    {
        init();
        init();
        log::info!("logger smoke test");
    }
}
