//! pandoc-embedz: render data-driven templates inside Pandoc documents
//!
//! Without `-s` the binary runs as a Pandoc JSON filter
//! (`pandoc --filter pandoc-embedz`). With `-s` it renders whole template
//! files, or an inline `-t` template, to stdout.

use clap::Parser;
use embedz_pipeline::{Embedz, EmbedzState};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod filter;
mod standalone;

use filter::PandocHost;
use standalone::StandaloneRequest;

/// Environment variable that turns on debug logging
const DEBUG_ENV: &str = "PANDOC_EMBEDZ_DEBUG";

#[derive(Parser, Debug)]
#[command(name = "pandoc-embedz", version)]
#[command(about = "Pandoc filter and renderer for data-driven templates")]
struct Args {
    /// Render template files instead of filtering a Pandoc document
    #[arg(short = 's', long = "standalone")]
    standalone: bool,

    /// Inline template text (standalone only)
    #[arg(short = 't', long = "template", value_name = "TEXT")]
    template: Option<String>,

    /// Format of data read from stdin with -t
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    format: Option<String>,

    /// External config file (can be specified multiple times)
    #[arg(short = 'c', long = "config", value_name = "FILE", action = clap::ArgAction::Append)]
    configs: Vec<String>,

    /// Write standalone output to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log debug information to stderr
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Template files in standalone mode. As a filter, Pandoc passes the
    /// target format here and it is ignored.
    files: Vec<String>,
}

impl Args {
    fn standalone_request(&self) -> StandaloneRequest {
        StandaloneRequest {
            files: self.files.clone(),
            template: self.template.clone(),
            format: self.format.clone(),
            configs: self.configs.clone(),
            output: self.output.clone(),
        }
    }

    /// `-t` and `-f` only make sense when rendering standalone
    fn wants_standalone(&self) -> bool {
        self.standalone || self.template.is_some()
    }
}

fn debug_requested(flag: bool) -> bool {
    flag || std::env::var(DEBUG_ENV)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Log to stderr at `warn`, or `debug` when asked. `RUST_LOG` wins over both.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let stdin_is_terminal = std::io::stdin().is_terminal();
    let mut embedz = Embedz::new(EmbedzState::new());

    if args.wants_standalone() {
        tracing::debug!(files = args.files.len(), "standalone mode");
        return standalone::run(&mut embedz, &args.standalone_request(), stdin_is_terminal);
    }

    tracing::debug!("filter mode");
    // The document arrives on stdin, so no block can read data from it
    embedz.state_mut().mark_stdin_consumed();
    filter::run_with(
        &mut embedz,
        &mut PandocHost::default(),
        std::io::stdin().lock(),
        std::io::stdout().lock(),
    )
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(debug_requested(args.debug));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pandoc-embedz: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_repeatable_config() {
        let args = Args::parse_from([
            "pandoc-embedz",
            "-s",
            "-c",
            "a.yaml",
            "--config",
            "b.yaml",
            "report.md",
        ]);
        assert!(args.standalone);
        assert_eq!(args.configs, vec!["a.yaml", "b.yaml"]);
        assert_eq!(args.files, vec!["report.md"]);
    }

    #[test]
    fn test_filter_mode_ignores_target_format() {
        let args = Args::parse_from(["pandoc-embedz", "html"]);
        assert!(!args.wants_standalone());
        assert_eq!(args.files, vec!["html"]);
    }

    #[test]
    fn test_inline_template_implies_standalone() {
        let args = Args::parse_from(["pandoc-embedz", "-t", "{{ data | length }}", "-f", "csv"]);
        assert!(args.wants_standalone());
        let request = args.standalone_request();
        assert_eq!(request.template.as_deref(), Some("{{ data | length }}"));
        assert_eq!(request.format.as_deref(), Some("csv"));
    }

    #[test]
    fn test_debug_flag() {
        assert!(debug_requested(true));
    }
}
