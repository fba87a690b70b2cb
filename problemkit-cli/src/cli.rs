use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "problemkit")]
#[command(about = "Render a constraint violation list as an RFC 7807 problem document")]
#[command(version)]
pub struct CliArgs {
    /// Path to configuration file (overrides PROBLEMKIT_CONFIG_PATH env var)
    #[arg(short = 'c', long = "config-path", env = "PROBLEMKIT_CONFIG_PATH")]
    pub config_path: Option<String>,

    /// JSON file holding the violation list; reads stdin when omitted or `-`
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output format
    #[arg(long, default_value = problemkit_normalizer::FORMAT)]
    pub format: String,

    /// Pretty-print the document
    #[arg(long)]
    pub pretty: bool,
}

impl CliArgs {
    /// Input path, `None` meaning stdin.
    pub fn input_path(&self) -> Option<&str> {
        self.input.as_deref().filter(|p| *p != "-")
    }
}
