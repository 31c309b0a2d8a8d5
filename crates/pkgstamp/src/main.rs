use clap::{ArgAction, Parser, Subcommand};
use pkgstamp::{Descriptor, Report, StampConfig, Stamper};
use pkgstamp_registry::{Sources, UreqFetcher};
use pkgstamp_render::Placeholder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Look up live package metadata the way a page stamp would.
#[derive(Parser)]
#[command(name = "pkgstamp", version, about)]
struct Cli {
    /// Config file (overrides global and project config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and render a stamp attribute, e.g. "flask,,pypi,{%name %version}"
    Query {
        attribute: String,

        /// Print metadata and report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a stamp attribute and print the descriptor
    Parse { attribute: String },

    /// List available sources
    Sources,

    /// List template placeholders
    Placeholders,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PKGSTAMP_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<StampConfig, String> {
    let config = StampConfig::load(std::path::Path::new("."));
    match path {
        Some(path) => {
            let explicit = StampConfig::load_file(path).map_err(|e| e.to_string())?;
            Ok(config.merge(explicit))
        }
        None => Ok(config),
    }
}

fn cmd_query(config: &StampConfig, attribute: &str, json: bool) -> i32 {
    let descriptor = match Descriptor::parse(attribute) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: cannot start runtime: {}", e);
            return 1;
        }
    };

    let sources = Sources::builtin(&config.endpoints());
    let http = UreqFetcher::new(config.user_agent(), config.timeout());
    let stamper = Stamper::new(&sources, &http, config.page_settings());

    let report = match runtime.block_on(stamper.lookup(&descriptor)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("error: {}", e);
                return 1;
            }
        }
    } else if report.metadata.is_some() {
        println!("{}", report.text);
    }

    query_exit_code(&report, &descriptor)
}

/// No data is a failed query in every output mode.
fn query_exit_code(report: &Report, descriptor: &Descriptor) -> i32 {
    if report.metadata.is_some() {
        return 0;
    }
    eprintln!("no data for {} from {}", descriptor.package, descriptor.source);
    1
}

fn cmd_parse(attribute: &str) -> i32 {
    match Descriptor::parse(attribute).map(|d| serde_json::to_string_pretty(&d)) {
        Ok(Ok(out)) => {
            println!("{}", out);
            0
        }
        Ok(Err(e)) => {
            eprintln!("error: {}", e);
            1
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn cmd_sources(config: &StampConfig) -> i32 {
    let sources = Sources::builtin(&config.endpoints());
    for name in sources.names() {
        let display = sources.get(name).map(|r| r.display_name()).unwrap_or(name);
        println!("{:<8} {}", name, display);
    }
    0
}

fn cmd_placeholders() -> i32 {
    for placeholder in Placeholder::ALL {
        println!("%{:<14} {}", placeholder.token(), placeholder.describe());
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Command::Query { attribute, json } => cmd_query(&config, &attribute, json),
        Command::Parse { attribute } => cmd_parse(&attribute),
        Command::Sources => cmd_sources(&config),
        Command::Placeholders => cmd_placeholders(),
    };
    std::process::exit(code);
}
