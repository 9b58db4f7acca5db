use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use clap::Parser;
use jstack_tree::config::{ColorChoice, Config};
use jstack_tree::report::{self, Section};
use jstack_tree::styling::{ERROR, ERROR_EMOJI, WARNING, WARNING_EMOJI, eprintln};

/// Show which threads of a `jstack` dump are blocked behind which others.
#[derive(Parser)]
#[command(name = "jstree", version, about)]
struct Cli {
    /// Thread dump to read; `-` or omitted reads stdin
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// When to color output
    #[arg(long, value_enum)]
    color: Option<ColorChoice>,

    /// Entries per ranked section
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Report section to print; repeat for several, in order
    #[arg(long = "section", value_enum, value_name = "NAME", action = clap::ArgAction::Append)]
    sections: Vec<Section>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Config file (default: <config dir>/jstree/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// Report sections
    Text,
    /// The reconciled dump as JSON
    Json,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{ERROR_EMOJI} {ERROR}{e:#}{ERROR:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(color) = cli.color {
        config.color = color;
    }
    if let Some(top) = cli.top {
        config.top = top;
    }
    if !cli.sections.is_empty() {
        config.sections = cli.sections;
    }

    let input = read_input(cli.file.as_deref())?;
    let dump = jstack_tree::analyze(&input).context("Failed to parse thread dump")?;
    log::debug!("Parsed {} threads", dump.threads.len());
    if dump.threads.is_empty() {
        eprintln!("{WARNING_EMOJI} {WARNING}No thread blocks found in input; is this jstack output?{WARNING:#}");
    }

    let output = match cli.format {
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&dump).context("Failed to serialize dump")?;
            json.push('\n');
            json
        }
        Format::Text => report::render(&dump, &config.report_options()),
    };

    // Color was already decided by `ColorChoice::resolve`; write the bytes as-is.
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write output")?;
    Ok(())
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                bail!("No input: pass a dump file or pipe one on stdin (jstack <pid> | jstree)");
            }
            let mut content = String::new();
            stdin
                .lock()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            Ok(content)
        }
    }
}
