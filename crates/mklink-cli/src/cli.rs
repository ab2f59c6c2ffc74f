//! Argument parsing, configuration and command dispatch for the `mklink` binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mklink_config::{
    AppConfig, CollisionPolicy, ConfigLoader, ConfigOverrides, LogFormatKind, LoggingSettings,
};
use mklink_core::{CancellationToken, PrivilegeGate, SymlinkManager};
use mklink_fsops::{FsLinkBackend, privilege_service_for};
use mklink_telemetry::{
    LogFormat, LoggingConfig, Metrics, build_sha, init_logging, new_correlation_id,
    with_correlation,
};
use tracing::{debug, warn};

use crate::commands::{link, privilege};
use crate::error::{CliError, CliResult};
use crate::output;

/// Parses CLI arguments, executes the requested command and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<i32> {
    let config = load_config(&cli)?;
    init_telemetry(&config.logging);

    let metrics = if cli.metrics {
        Some(Metrics::new().map_err(CliError::failure)?)
    } else {
        None
    };
    let ctx = AppContext {
        manager: build_manager(&config, metrics.clone()),
        output: cli.output,
        cancel: cancel_on_ctrl_c(),
    };
    debug!(
        collision_policy = %config.symlink.collision_policy(),
        batch_max = config.symlink.batch_max(),
        privilege_source = config.privilege.source.as_str(),
        "configuration resolved"
    );

    let code = with_correlation(new_correlation_id(), dispatch(cli.command, &ctx)).await?;

    if let Some(metrics) = &metrics {
        output::render_metrics(metrics, cli.output)?;
    }
    Ok(code)
}

async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<i32> {
    match command {
        Command::File(args) => link::handle_file(ctx, args).await,
        Command::Files(args) => link::handle_files(ctx, args).await,
        Command::Dirs(args) => link::handle_dirs(ctx, args).await,
        Command::Privilege(args) => privilege::handle_privilege(ctx, args).await,
    }
}

fn load_config(cli: &Cli) -> CliResult<AppConfig> {
    let mut loader = ConfigLoader::from_env().with_overrides(cli.overrides());
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    Ok(loader.load()?)
}

fn init_telemetry(settings: &LoggingSettings) {
    let format = match settings.format {
        Some(LogFormatKind::Json) => LogFormat::Json,
        Some(LogFormatKind::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    };
    let config = LoggingConfig {
        level: &settings.level,
        format,
        build_sha: build_sha(),
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn build_manager(config: &AppConfig, metrics: Option<Metrics>) -> SymlinkManager {
    let backend = Arc::new(FsLinkBackend::new(config.symlink.collision_policy()));
    let gate = PrivilegeGate::new(privilege_service_for(config.privilege.source))
        .with_max_age(config.privilege.cache_ttl);
    let manager = SymlinkManager::new(config.symlink, backend, gate);
    match metrics {
        Some(metrics) => manager.with_metrics(metrics),
        None => manager,
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received; cancelling remaining links");
                token.cancel();
            }
            Err(err) => warn!(error = %err, "failed to listen for interrupt"),
        }
    });
    cancel
}

/// Dependencies shared by command handlers.
pub(crate) struct AppContext {
    pub(crate) manager: SymlinkManager,
    pub(crate) output: OutputFormat,
    pub(crate) cancel: CancellationToken,
}

#[derive(Parser, Debug)]
#[command(name = "mklink", about = "Create symbolic links in batches")]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "MKLINK_CONFIG")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_enum,
        help = "Behaviour when a link path already exists"
    )]
    collision: Option<CollisionArg>,
    #[arg(long = "batch-max", global = true)]
    batch_max: Option<i64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    output: OutputFormat,
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Print link counters after the command")]
    metrics: bool,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            collision_policy: self.collision.map(CollisionPolicy::from),
            batch_max: self.batch_max,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Link one file into a destination folder.
    File(FileArgs),
    /// Link one or more files into a destination folder.
    Files(BatchArgs),
    /// Link one or more directories into a destination folder.
    Dirs(BatchArgs),
    /// Report whether this process may create symbolic links.
    Privilege(PrivilegeArgs),
}

#[derive(Args, Debug)]
pub(crate) struct FileArgs {
    pub(crate) source: PathBuf,
    pub(crate) destination: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    pub(crate) destination: PathBuf,
    #[arg(required = true, num_args = 1..)]
    pub(crate) sources: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PrivilegeArgs {
    #[arg(long, help = "Discard any cached answer before checking")]
    pub(crate) refresh: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CollisionArg {
    Skip,
    Overwrite,
    Rename,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(value: CollisionArg) -> Self {
        match value {
            CollisionArg::Skip => Self::Skip,
            CollisionArg::Overwrite => Self::Overwrite,
            CollisionArg::Rename => Self::Rename,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments parse")
    }

    #[test]
    fn dirs_requires_at_least_one_source() {
        assert!(Cli::try_parse_from(["mklink", "dirs", "/dest"]).is_err());
        let cli = parse(&["mklink", "dirs", "/dest", "/a", "/b"]);
        match cli.command {
            Command::Dirs(args) => {
                assert_eq!(args.destination, PathBuf::from("/dest"));
                assert_eq!(args.sources.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn files_takes_destination_then_sources() {
        assert!(Cli::try_parse_from(["mklink", "files", "/dest"]).is_err());
        let cli = parse(&["mklink", "files", "/dest", "/src/a.txt", "/src/b.txt"]);
        match cli.command {
            Command::Files(args) => {
                assert_eq!(args.destination, PathBuf::from("/dest"));
                assert_eq!(
                    args.sources,
                    vec![PathBuf::from("/src/a.txt"), PathBuf::from("/src/b.txt")]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_become_overrides() {
        let cli = parse(&[
            "mklink",
            "file",
            "/src/a",
            "/dest",
            "--collision",
            "rename",
            "--batch-max",
            "5",
            "--log-level",
            "debug",
            "--output",
            "json",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.collision_policy, Some(CollisionPolicy::Rename));
        assert_eq!(overrides.batch_max, Some(5));
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn config_file_and_flags_resolve_together() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("mklink.json");
        fs::write(
            &path,
            r#"{ "symlink": { "collision_policy": "overwrite", "batch_max": 7 } }"#,
        )?;
        let path_arg = path.to_string_lossy().into_owned();
        let cli = parse(&["mklink", "--config", &path_arg, "--batch-max", "3", "privilege"]);

        let config = load_config(&cli).map_err(|err| err.display_message())?;
        assert_eq!(config.symlink.collision_policy(), CollisionPolicy::Overwrite);
        assert_eq!(config.symlink.batch_max(), 3);
        Ok(())
    }

    #[test]
    fn zero_batch_max_is_a_validation_error() {
        let cli = parse(&["mklink", "--batch-max", "0", "privilege"]);
        let err = load_config(&cli).expect_err("zero rejected");
        assert_eq!(err.exit_code(), 2);
    }
}
