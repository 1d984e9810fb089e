use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::sync::Once;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tether_core::{ClassInfo, MemberKind, Vm};
use tether_stdlib::Console;
use tether_stdlib::demo::{DEMO_SCRIPT, register_demo};
use tracing::debug;

mod config;

use config::Config;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "tether::bind=debug,tether::cli=debug,tether::dispatch=info,tether::console=warn";

#[derive(Debug, Parser)]
#[command(name = "tether", author, version, about = "Run scripts against natively bound Rust types", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to execute; runs the built-in demo when omitted
    #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
    file: Option<PathBuf>,

    /// TOML settings file (`max_call_depth`, `trace`)
    #[arg(long, value_name = "FILE", global = true, value_parser = parse_sanitized_path)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the native classes registered in a fresh VM.
    Classes {
        /// Print the class table as JSON
        #[arg(long)]
        json: bool,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `TETHER_TRACE` wins over the config file's `trace` key.
fn maybe_init_tracing(config_filter: Option<&str>) {
    let filter_expr = match std::env::var("TETHER_TRACE") {
        Ok(raw) if !env_toggle_enabled(&raw) => return,
        Ok(raw) => filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok()),
        Err(_) => match config_filter {
            Some(expr) => Some(expr.to_string()),
            None => return,
        },
    };

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn build_vm(config: &Config, console: Rc<Console>) -> anyhow::Result<Vm> {
    let mut vm = Vm::with_options(config.vm_options());
    tether_stdlib::register_builtins(&mut vm, console.clone()).context("Failed to register builtins")?;
    register_demo(&mut vm, console).context("Failed to register demo bindings")?;
    Ok(vm)
}

fn kind_label(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Field => "field",
        MemberKind::Method => "method",
        MemberKind::Operator => "operator",
        MemberKind::Constructor => "constructor",
        MemberKind::Constant => "constant",
    }
}

fn render_classes(classes: &[ClassInfo]) -> String {
    let mut out = String::new();
    for class in classes {
        out.push_str(&format!("{}.{} ({})\n", class.module, class.name, class.rust_type));
        for member in &class.members {
            let shown = member.signature.as_deref().unwrap_or(&member.name);
            out.push_str(&format!("  {:<12}{}\n", kind_label(member.kind), shown));
        }
    }
    out
}

fn main() -> anyhow::Result<()> {
    let CliArgs { command, file, config } = CliArgs::parse();

    let config = match config {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    maybe_init_tracing(config.trace.as_deref());

    let console = Console::stdio();
    let mut vm = build_vm(&config, console)?;

    if let Some(Commands::Classes { json }) = command {
        let classes = vm.registry().describe();
        if json {
            println!("{}", serde_json::to_string_pretty(&classes)?);
        } else {
            print!("{}", render_classes(&classes));
        }
        return Ok(());
    }

    let (source, filename) = match file {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(source) => (source, path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!("Error: file '{}' not found", path.display());
                std::process::exit(2);
            }
            Err(e) => {
                eprintln!("Error: failed to open file '{}': {}", path.display(), e);
                std::process::exit(3);
            }
        },
        None => (DEMO_SCRIPT.to_string(), "<demo>".to_string()),
    };

    debug!(target: "tether::cli", filename = %filename, bytes = source.len(), "running script");
    if let Err(err) = vm.exec(&source, &filename) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}
