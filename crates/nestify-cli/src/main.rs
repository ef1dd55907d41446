//! # nestify
//!
//! Migrates Express handler-style routes into a NestJS Service/Controller
//! pair, one step at a time.
//!
//! ```bash
//! nestify --key users --mode move
//! nestify --key users --mode req
//! nestify --key users --mode res
//! nestify --key users --mode todo
//! nestify --mode parse-express --json
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use nestify_core::config::{CliOverrides, MigrationOptions, ModuleConfig, NestifyConfig};
use nestify_core::errors::NestifyErrorCode;
use nestify_engine::{MigrationContext, MigrationStep, Migrator, StepReport};

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_CONFIG_ERROR: i32 = 2;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Generate the Service and the Controller from the handler file
    Move,
    /// Replace request accesses with explicit parameters
    Req,
    /// Replace response calls with returns and exceptions
    Res,
    /// Mark remaining req/res uses for review
    Todo,
    /// Print the route table of the bootstrap file
    ParseExpress,
}

impl From<Mode> for MigrationStep {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Move => MigrationStep::Move,
            Mode::Req => MigrationStep::Request,
            Mode::Res => MigrationStep::Response,
            Mode::Todo => MigrationStep::Annotate,
            Mode::ParseExpress => MigrationStep::ParseExpress,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "nestify")]
#[command(about = "Migrate Express route handlers to NestJS services and controllers", long_about = None)]
#[command(version)]
struct Cli {
    /// Resource key, e.g. `users`
    #[arg(long, short = 'k', value_name = "KEY")]
    key: Option<String>,
    /// Module directory name (defaults to the key)
    #[arg(long, value_name = "MODULE")]
    module_key: Option<String>,
    /// Handler file relative to the routes directory (defaults to `<key>.ts`)
    #[arg(long, value_name = "PATH")]
    route_path: Option<String>,
    /// Comma-separated handler names to migrate (defaults to all)
    #[arg(long, short = 'f', value_name = "NAMES")]
    functions: Option<String>,
    /// Generate the admin flavour
    #[arg(long)]
    admin: bool,
    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,
    /// Step to run
    #[arg(long, short = 'm', value_enum)]
    mode: Mode,
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Print the step report as JSON
    #[arg(long)]
    json: bool,
    #[arg(long, value_name = "DIR")]
    routes_dir: Option<String>,
    #[arg(long, value_name = "DIR")]
    modules_dir: Option<String>,
    #[arg(long, value_name = "FILE")]
    server_file: Option<String>,
    #[arg(long, value_name = "PREFIX")]
    api_prefix: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    nestify_core::tracing::init_tracing(cli.debug);
    process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let root = match cli.root.clone().map(Ok).unwrap_or_else(std::env::current_dir) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Cannot determine project root: {e}");
            return EXIT_ERROR;
        }
    };
    let step = MigrationStep::from(cli.mode);

    let overrides = CliOverrides {
        routes_dir: cli.routes_dir.clone(),
        modules_dir: cli.modules_dir.clone(),
        server_file: cli.server_file.clone(),
        api_prefix: cli.api_prefix.clone(),
    };
    let config = match NestifyConfig::load(&root, Some(&overrides)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.coded_string());
            return EXIT_CONFIG_ERROR;
        }
    };

    let options = MigrationOptions {
        key: cli.key.clone(),
        module_key: cli.module_key.clone(),
        route_path: cli.route_path.clone(),
        functions: cli
            .functions
            .as_deref()
            .map(MigrationOptions::parse_function_filter)
            .unwrap_or_default(),
        admin: cli.admin,
    };
    let module = if step.requires_module() || options.key.is_some() {
        match ModuleConfig::resolve(&root, &options, &config) {
            Ok(module) => Some(module),
            Err(e) => {
                eprintln!("{}", e.coded_string());
                return EXIT_CONFIG_ERROR;
            }
        }
    } else {
        None
    };

    tracing::debug!(root = %root.display(), %step, "invocation resolved");
    let context = MigrationContext::new(root, config, module).with_debug(cli.debug);
    match Migrator::new(context).run(step) {
        Ok(report) => {
            print_report(&report, cli.json);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.coded_string());
            if e.is_config() {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_ERROR
            }
        }
    }
}

fn print_report(report: &StepReport, json: bool) {
    if json {
        match report.to_json() {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("Cannot serialize report: {e}"),
        }
        return;
    }

    for route in &report.routes {
        let middlewares = if route.middlewares.is_empty() {
            String::new()
        } else {
            format!(" [{}]", route.middlewares.join(", "))
        };
        println!(
            "{:<6} {} -> {}{middlewares}",
            route.http_method.as_str(),
            route.path,
            route.handler_ref
        );
    }
    for method in &report.methods_added {
        println!("migrated {method}");
    }
    for method in &report.methods_skipped {
        println!("skipped {method} (already present)");
    }
    for method in &report.methods_rewritten {
        println!("rewrote {method}");
    }
    if report.rewrites > 0 {
        println!("{} rewrite(s)", report.rewrites);
    }
    for file in &report.files_written {
        println!("wrote {file}");
    }
    for diagnostic in &report.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
}
