use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use prefsync_cli::{format_groups, logging, parse_assignment, run_simulator, SimulatorConfig};
use prefsync_engine::{AppConfig, SyncEngine};
use prefsync_model::{render_groups, PreferenceSet, Role};
use prefsync_service::HttpPreferencesService;
use std::path::PathBuf;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("prefsync")
        .version(prefsync_engine::VERSION)
        .about("Role-scoped notification preference sync")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("groups")
                .about("List notification groups visible to a role")
                .arg(
                    Arg::new("role")
                        .long("role")
                        .default_value("MEMBER")
                        .help("ADMIN, PM, MEMBER or NO_ACCESS"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run randomized sync sessions against an in-memory backend")
                .arg(
                    Arg::new("users")
                        .long("users")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Concurrent simulated users"),
                )
                .arg(
                    Arg::new("edits")
                        .long("edits")
                        .default_value("40")
                        .value_parser(value_parser!(usize))
                        .help("Edits per user"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("settle-ms")
                        .long("settle-ms")
                        .default_value("25")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Settle window in milliseconds"),
                )
                .arg(
                    Arg::new("fail-every")
                        .long("fail-every")
                        .value_parser(value_parser!(usize))
                        .help("Fail every n-th write"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Load preferences from the REST backend and apply edits")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML config file (defaults apply when omitted)"),
                )
                .arg(
                    Arg::new("set")
                        .long("set")
                        .action(ArgAction::Append)
                        .help("key=value edit, repeatable"),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .default_value("MEMBER")
                        .help("Role used to render the result"),
                ),
        )
}

fn role_arg(args: &clap::ArgMatches) -> Role {
    args.get_one::<String>("role")
        .map_or(Role::NoAccess, |raw| Role::parse_lenient(raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"), "warn,prefsync=info")
        .context("failed to install log subscriber")?;

    match matches.subcommand() {
        Some(("groups", args)) => {
            let role = role_arg(args);
            let groups = render_groups(role, &PreferenceSet::uniform(false));
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                print!("{}", format_groups(&groups));
            }
        }
        Some(("simulate", args)) => {
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
                users: args.get_one::<usize>("users").copied().unwrap_or(4),
                edits_per_user: args.get_one::<usize>("edits").copied().unwrap_or(40),
                settle_ms: args.get_one::<u64>("settle-ms").copied().unwrap_or(25),
                fail_every: args.get_one::<usize>("fail-every").copied(),
                ..SimulatorConfig::default()
            };

            let report = run_simulator(config).await;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.generate_text());
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("sync", args)) => {
            let config = match args.get_one::<PathBuf>("config") {
                Some(path) => AppConfig::load(path)?,
                None => AppConfig::default(),
            };
            let edits = args
                .get_many::<String>("set")
                .into_iter()
                .flatten()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<PreferenceSet, _>>()?;

            let service = HttpPreferencesService::new(&config.client)?;
            tracing::info!(url = service.url(), keys = edits.len(), "syncing preferences");

            let engine = SyncEngine::spawn(Arc::new(service), config.engine)?;
            engine.load().await?;
            if !edits.is_empty() {
                engine.on_edit(edits)?;
            }
            let rendered = engine.render(role_arg(args));
            engine.shutdown().await?;

            print!("{}", format_groups(&rendered));
        }
        _ => {}
    }

    Ok(())
}
