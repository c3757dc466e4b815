use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

#[derive(Parser, Debug)]
#[command(name = "catpack")]
#[command(version)]
#[command(about = "Convert resource packs between the CATS and ZIP formats", long_about = None)]
#[command(after_help = "Examples:\n  \
  catpack pack.zip                 convert pack.zip into pack.cats\n  \
  catpack -d out pack.cats         write pack.zip into the out directory\n  \
  catpack -l https://example.com/pack.cats.zip   list files of a remote pack")]
pub struct Cli {
    /// Pack file path or HTTP URL (.zip, .cats or .cats.zip)
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Write the converted pack into DIR
    #[arg(short = 'd', value_name = "DIR", conflicts_with = "output")]
    pub output_dir: Option<String>,

    /// Write the converted pack to FILE
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// List files instead of converting
    #[arg(short = 'l')]
    pub list: bool,

    /// Overwrite an existing output file
    #[arg(short = 'f')]
    pub force: bool,

    /// More log output (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, errors only
    #[arg(short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        crate::io::is_http_url(&self.input)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Writes log records to stderr as `level: message`.
pub struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl StderrLogger {
    /// Install the logger for the whole process. Only the first call has an effect.
    pub fn init(level: LevelFilter) {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{}: {}",
                record.level().as_str().to_lowercase(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
