use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "efiling-extract")]
#[command(version)]
#[command(about = "Extract files from patent office e-filing archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  efiling-extract NNF20240115093000_A1631.JWX           extract into ./NNF20240115093000_A1631/\n  \
  efiling-extract -v inbox/*.JWS                         list entries with size and SHA-256\n  \
  efiling-extract -d out -o AAA20240115093000_A1631.JPC  extract into out/, overwriting\n  \
  efiling-extract --check inbox/*                        check archive names only")]
pub struct Cli {
    /// Archive files to process
    #[arg(value_name = "ARCHIVE", required = true)]
    pub archives: Vec<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (size and SHA-256 of each entry)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir (one subdirectory per archive)
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Only validate archive names and report their variant; no file is read
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            "off"
        } else if self.quiet > 0 {
            "error"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}
