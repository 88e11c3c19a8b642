use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "pulse")]
#[command(author, version, about = "Company reputation pulse from public web commentary", long_about = None)]
#[command(after_help = r#"Examples:
  pulse run "Acme Corp"                                  Discover pages and score them
  pulse run "Acme Corp" --hint "rocket skates" --max-pages 20
  pulse run "Acme Corp" --url https://... --url https://...   Use your own pages
  pulse run "Acme Corp" --export acme.txt --recommend    Save report, get actions
  pulse extract "https://example.com/reviews"            See what a page yields
  pulse score reviews.txt                                Score a local text file

Logging:
  -v / -vv raise log verbosity; PULSE_LOG=debug overrides it (tracing filter syntax)
"#)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a reputation scan for a company
    #[command(after_help = r#"Examples:
  pulse run "Acme Corp"
  pulse run "Acme Corp" --hint "airline, Europe"
  pulse run "Acme Corp" --url https://www.reddit.com/r/acme/comments/x --max-pages 5
  pulse run "Acme Corp" --json > scan.json
  pulse run "Acme Corp" --export acme.txt --recommend
"#)]
    Run {
        /// Company to scan
        #[arg(value_name = "COMPANY")]
        company: String,

        /// Extra context for discovery (industry, region, product)
        #[arg(long)]
        hint: Option<String>,

        /// Maximum number of pages to fetch (default 12)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Candidate page to scan; repeat for several. Skips discovery.
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,

        /// Print the final status snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Write the combined text report to a file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,

        /// Ask for recommended actions once the scan is done
        #[arg(long)]
        recommend: bool,
    },

    /// Fetch one page and show the extracted text
    #[command(after_help = r#"Examples:
  pulse extract "https://example.com/reviews"
  pulse extract "https://example.com/reviews" --limit 500
  pulse extract "https://example.com/reviews" --json
"#)]
    Extract {
        /// URL to extract
        #[arg(value_name = "URL")]
        url: String,

        /// Maximum characters to display
        #[arg(long, default_value = "2000")]
        limit: usize,

        /// Print the extraction outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score text from a file (or stdin) without fetching anything
    #[command(after_help = r#"Examples:
  pulse score reviews.txt
  cat reviews.txt | pulse score
  pulse score reviews.txt --json
"#)]
    Score {
        /// Text file to score; reads stdin when omitted
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Name shown as the company in the output
        #[arg(long, default_value = "input")]
        name: String,

        /// Print the dashboard payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },

    /// Check dependencies and configuration
    Doctor,

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  pulse completions bash >> ~/.bashrc           Add bash completions
  pulse completions zsh >> ~/.zshrc             Add zsh completions
  pulse completions fish > ~/.config/fish/completions/pulse.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "pulse", "-vv", "run", "Acme", "--url", "https://a.com", "--url", "https://b.com",
            "--max-pages", "5", "--recommend",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run { company, urls, max_pages, recommend, json, export, hint } => {
                assert_eq!(company, "Acme");
                assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
                assert_eq!(max_pages, Some(5));
                assert!(recommend);
                assert!(!json);
                assert!(export.is_none());
                assert!(hint.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_requires_company() {
        assert!(Cli::try_parse_from(["pulse", "run"]).is_err());
    }
}
