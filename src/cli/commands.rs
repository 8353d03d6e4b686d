use crate::cli::args::{Args, Command, ConfigCommand, VarCommand};
use crate::cli::output::{ConsoleWriter, OutputWriter, VariableReading};
use crate::core::session::Session;
use crate::core::terminal::Terminal;
use crate::core::variables::format_value;
use crate::domain::config::{KhiTermConfig, VariablePreset};
use crate::domain::error::{KhiTermError, KhiTermResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const SKIPPED_AFTER_DISCONNECT: &str = "skipped, connection to controller lost";

/// Execute CLI command
pub async fn execute_command(args: Args) -> Result<(), KhiTermError> {
    let writer = ConsoleWriter::new(args.output.clone());

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let mut config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    // Initialize logging
    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose).map_err(|e| KhiTermError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;
    }

    match args.command {
        Command::Terminal => run_terminal(&config, &writer).await,
        Command::Var(var_args) => execute_var_command(var_args.command, &writer, &config).await,
        Command::Config(config_args) => {
            execute_config_command(config_args.command, &writer, &config, &config_manager)
        }
        Command::Version => {
            writer.write_message(&format!("khiterm {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

/// Command-line `--host` / `--port` win over the files
pub fn apply_overrides(config: &mut KhiTermConfig, args: &Args) {
    if let Some(host) = &args.host {
        config.controller.host = host.clone();
    }
    if let Some(port) = args.port {
        config.controller.port = port;
    }
}

async fn run_terminal(config: &KhiTermConfig, writer: &ConsoleWriter) -> KhiTermResult<()> {
    let sink = |text: &str| {
        let mut stdout = std::io::stdout().lock();
        if stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()).is_err() {
            warn!("Failed to write controller output to stdout");
        }
    };

    let mut terminal = Terminal::connect(&config.controller, sink).await?;

    // Blocking stdin on its own thread; it must not hold up runtime shutdown
    let sender = terminal.sender();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(command) => sender.submit(command),
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    });

    let period = Duration::from_millis(config.global.poll_interval_ms);
    terminal
        .run_until(period, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    terminal.close().await;
    writer.write_message("\nConnection closed")?;
    Ok(())
}

async fn execute_var_command(
    command: VarCommand,
    writer: &ConsoleWriter,
    config: &KhiTermConfig,
) -> KhiTermResult<()> {
    if matches!(command, VarCommand::List) && config.variables.is_empty() {
        writer.write_message("No variables configured; run `khiterm config init` first")?;
        return Ok(());
    }

    let mut session = Session::connect(&config.controller).await?;
    let result = run_var_command(command, &mut session, writer, config).await;
    session.close().await;
    result
}

async fn run_var_command(
    command: VarCommand,
    session: &mut Session,
    writer: &ConsoleWriter,
    config: &KhiTermConfig,
) -> KhiTermResult<()> {
    match command {
        VarCommand::Get { name } => {
            let value = session.read_variable(&name).await?;
            writer.write_variables(&[VariableReading::ok(name, value)])?;
        }
        VarCommand::Set { name, value } => {
            session.write_variable(&name, value).await?;
            let confirmed = session.read_variable(&name).await?;
            if confirmed != value {
                warn!(
                    "Controller holds {} = {} after writing {}",
                    name,
                    format_value(confirmed),
                    format_value(value)
                );
            }
            writer.write_variables(&[VariableReading::ok(name, confirmed)])?;
        }
        VarCommand::Adjust { name, by, down } => {
            let step = by
                .or_else(|| config.preset(&name).map(|preset| preset.step))
                .unwrap_or(1.0);
            let delta = if down { -step } else { step };

            let value = session.adjust_variable(&name, delta).await?;
            info!("Adjusted {} by {}", name, format_value(delta));
            writer.write_variables(&[VariableReading::ok(name, value)])?;
        }
        VarCommand::List => {
            let readings = read_presets(session, &config.variables).await;
            writer.write_variables(&readings)?;
        }
    }
    Ok(())
}

/// Read every preset in order. Once the connection is lost the remaining
/// presets are reported as skipped rather than attempted.
async fn read_presets(session: &mut Session, presets: &[VariablePreset]) -> Vec<VariableReading> {
    let mut readings = Vec::with_capacity(presets.len());
    for preset in presets {
        if !session.is_ready() {
            readings.push(VariableReading::failed(&preset.name, SKIPPED_AFTER_DISCONNECT));
            continue;
        }

        let reading = match session.read_variable(&preset.name).await {
            Ok(value) => VariableReading::ok(&preset.name, value),
            Err(e) => {
                warn!("Failed to read {}: {}", preset.name, e);
                VariableReading::failed(&preset.name, e)
            }
        };
        readings.push(reading);
    }
    readings
}

fn execute_config_command(
    command: ConfigCommand,
    writer: &ConsoleWriter,
    config: &KhiTermConfig,
    config_manager: &ConfigManager,
) -> Result<(), KhiTermError> {
    match command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
            Ok(())
        }
        ConfigCommand::Validate { file } => {
            let result = match &file {
                Some(config_path) => config_manager.load_config_from_path(config_path.as_ref()),
                None => config_manager.load_config(),
            };
            match result {
                Ok(_) => writer.write_message(&format!(
                    "Configuration '{}' is valid",
                    file.as_deref().unwrap_or("current")
                ))?,
                Err(e) => writer.write_error(&format!("Configuration validation failed: {}", e))?,
            }
            Ok(())
        }
        ConfigCommand::Init { dir, global } => {
            if global {
                let global_path = config_manager.get_global_config_path_ref();
                let default_config = KhiTermConfig {
                    variables: KhiTermConfig::compensation_presets(),
                    ..KhiTermConfig::default()
                };
                config_manager.save_config_to_path(global_path, &default_config)?;
                writer.write_message(&format!("Global configuration initialized at '{}'", global_path.display()))?;
            } else {
                let base: PathBuf = match dir {
                    Some(dir) => dir.into(),
                    None => std::env::current_dir().map_err(|e| KhiTermError::Config {
                        message: format!("Failed to get current directory: {}", e),
                    })?,
                };
                let path = config_manager.init_project_config(&base)?;
                writer.write_message(&format!("Project configuration initialized at '{}'", path.display()))?;
            }
            Ok(())
        }
    }
}
