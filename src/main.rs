use clap::Parser;
use std::process;

use workpilot::cli::commands::{Cli, Commands};
use workpilot::cli::{self, Context};
use workpilot::config::Config;
use workpilot::db::Workspace;
use workpilot::logging;

fn main() {
    let cli_args = Cli::parse();
    let ctx = Context {
        home: cli_args.home.clone(),
        json: cli_args.json,
    };

    let config_level = Workspace::locate(ctx.home.as_deref())
        .ok()
        .and_then(|ws| Config::load(&ws.config_path()).ok())
        .and_then(|config| config.log_level);
    if let Err(e) = logging::init(config_level.as_deref()) {
        eprintln!("warning: {e:#}");
    }

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(&ctx),
        Commands::Auth(cmd) => cli::auth::run(cmd, &ctx),
        Commands::Profile(cmd) => cli::profile::run(cmd, &ctx),
        Commands::Stage(cmd) => cli::stage::run(cmd, &ctx),
        Commands::Task(cmd) => cli::task::run(cmd, &ctx),
        Commands::Customer(cmd) => cli::customer::run(cmd, &ctx),
        Commands::Order(cmd) => cli::order::run(cmd, &ctx),
        Commands::Track { token } => cli::track::run(&token, &ctx),
        Commands::Dashboard => cli::dashboard::run(&ctx),
    };

    process::exit(exit_code);
}
