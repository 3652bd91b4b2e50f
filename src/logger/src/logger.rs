use std::{io::Write, time::Duration};

use env_logger::{fmt::Color, Builder, Env};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter};
use once_cell::sync::OnceCell;

static INSTANCE: OnceCell<Logger> = OnceCell::new();

/// Environment variable allowing users to override the verbosity filter (e.g. `PEDSELECT_LOG=kinship=trace`)
pub const LOG_ENV_VAR: &str = "PEDSELECT_LOG";

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {msg:<24} [{bar:40.cyan/blue}] {pos:>9}/{len:9} ({eta})";

#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

impl Logger {

    /// Install the global logger. Must be called once, at the very start of the program.
    ///
    /// # Panics
    /// - if a global logger was already installed.
    pub fn init(verbosity: u8) {
        let log_level = Self::u8_to_loglevel(verbosity);
        let env = Env::default().filter(LOG_ENV_VAR);

        let logger = Builder::new().filter_level(log_level)
            .format(|buf, record| {
                // ---- Errors get a traceback and an intense message.
                let (traceback, set_intensity) = match record.level() {
                    Level::Error => (format!("(@ {}:{}) ", record.file().unwrap_or("unknown"), record.line().unwrap_or(0)), true),
                    _            => (String::new(), false),
                };

                let mut arg_style = buf.style();
                arg_style.set_intense(set_intensity);

                let mut level_style = buf.style();
                let color = match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan
                };
                level_style.set_color(color).set_bold(true);

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    arg_style.value(record.args())
                )
            })
            .parse_env(env)
            .build();

        // ---- Route log lines through the multiprogress, so that bars are not clobbered.
        let multi_pg = MultiProgress::new();
        LogWrapper::new(multi_pg.clone(), logger)
            .try_init()
            .expect("Failed to wrap logger with multiprogress");
        INSTANCE.set(Self{multi_pg}).expect("Logger was initialized twice");
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0            => LevelFilter::Error,
            1            => LevelFilter::Warn,
            2            => LevelFilter::Info,
            3            => LevelFilter::Debug,
            4..= u8::MAX => LevelFilter::Trace
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }

    /// Access the global multiprogress, if the logger was initialized.
    pub fn multi() -> Option<&'static MultiProgress> {
        INSTANCE.get().map(|logger| &logger.multi_pg)
    }

    /// Create a progress bar of length `len`, attached to the global multiprogress.
    ///
    /// Returns a hidden bar whenever the logger was never initialized (library use, unit tests)
    /// or when the current verbosity is lower than `Info`.
    pub fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
        let multi = match Self::multi() {
            Some(multi) if log::max_level() >= LevelFilter::Info => multi,
            _ => return ProgressBar::hidden(),
        };

        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        let bar = multi.add(ProgressBar::new(len).with_style(style).with_message(message));
        bar.enable_steady_tick(Duration::from_millis(250));
        bar
    }
}
