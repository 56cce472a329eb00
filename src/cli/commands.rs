use crate::cli::args::Args;
use crate::core::interrupt::Interrupt;
use crate::core::output::OutputSink;
use crate::core::reconnect::{ConnectError, ReconnectPolicy};
use crate::core::session::{Pacing, Session, SessionConfig, SessionEnd};
use crate::domain::config::{ConnectionConfig, LinkTermConfig};
use crate::domain::error::{ExitStatus, LinkTermError, LinkTermResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::Endpoint;
use crate::tui::{History, TerminalEditor};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

/// Run one interactive session as described by `args` and report how it ended.
pub async fn execute_command(args: Args) -> ExitStatus {
    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitStatus::Usage;
        }
    };

    // Load configuration using ConfigManager
    let config = match &args.config {
        Some(path) => manager.load_config_from_path(path),
        None => manager.load_config(),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitStatus::Usage;
        }
    };
    apply_overrides(&mut config, &args);

    if !args.quiet {
        let level = if args.verbose {
            "debug"
        } else {
            config.global.log_level.as_str()
        };
        if let Err(e) = init_logging(level, args.verbose) {
            eprintln!("Warning: {}", e);
        }
    }

    match run_session(&args, &config, &manager).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitStatus::Fault
        }
    }
}

async fn run_session(
    args: &Args,
    config: &LinkTermConfig,
    manager: &ConfigManager,
) -> LinkTermResult<ExitStatus> {
    let endpoint = Endpoint::from_config(&connection_config(args, config)?)?;
    let interrupt = Interrupt::ctrl_c();

    let console = OutputSink::new(Box::new(io::stdout()));
    let sink = match log_file(args, config, manager) {
        Some(path) => console.with_log_file(&path)?,
        None => console,
    };

    let history_path = config
        .global
        .history_file
        .clone()
        .unwrap_or_else(|| manager.default_history_file());
    let history = History::load(&history_path, config.global.history_limit).unwrap_or_else(|e| {
        warn!(error = %e, "Starting with empty history");
        History::new(config.global.history_limit)
    });

    let mut session = Session::new(
        TerminalEditor::new(history),
        endpoint,
        sink,
        session_config(config),
    )
    .with_interrupt(interrupt);

    match session.connect().await {
        Ok(report) => info!(attempts = report.attempts, elapsed = ?report.elapsed, "Link up"),
        Err(ConnectError::TimedOut { .. }) => {
            eprintln!("Error: could not connect to {}", session.transport());
            return Ok(ExitStatus::InitialConnectTimeout);
        }
        Err(ConnectError::Cancelled { .. }) => return Ok(ExitStatus::InitialConnectInterrupted),
    }

    let end = session.run().await?;
    let history = session.into_editor().into_history();
    if !history.is_empty() {
        if let Err(e) = history.save(&history_path) {
            warn!(error = %e, "Failed to save command history");
        }
    }

    Ok(match end {
        SessionEnd::Eof | SessionEnd::Interrupted => ExitStatus::Success,
        SessionEnd::LaterConnectTimeout => {
            eprintln!("Error: connection lost and not re-established");
            ExitStatus::LaterConnectTimeout
        }
    })
}

/// Fold command line options over the loaded configuration.
pub fn apply_overrides(config: &mut LinkTermConfig, args: &Args) {
    let connect = &mut config.connect;
    if let Some(baud_rate) = args.baudrate {
        connect.baud_rate = baud_rate;
    }
    if let Some(timeout) = args.timeout_first {
        connect.timeout_first = timeout;
    }
    if let Some(timeout) = args.timeout_later {
        connect.timeout_later = timeout;
    }
    if let Some(eol) = args.eol {
        connect.eol = eol.into();
    }
    if let Some(delimiter) = args.rx_delimiter {
        connect.rx_delimiter = delimiter.into();
    }

    let pacing = &mut config.pacing;
    if let Some(ms) = args.byte_delay {
        pacing.byte_delay_ms = ms;
    }
    if let Some(ms) = args.eol_delay {
        pacing.eol_delay_ms = ms;
    }
    if let Some(ms) = args.post_delay {
        pacing.post_delay_ms = ms;
    }

    let global = &mut config.global;
    if let Some(path) = &args.log_file {
        global.log_file = Some(path.clone());
    }
    if let Some(path) = &args.history_file {
        global.history_file = Some(path.clone());
    }
    if let Some(size) = args.history_size {
        global.history_limit = size;
    }
    if let Some(prompt) = &args.prompt {
        global.prompt = prompt.clone();
    }
}

pub fn connection_config(args: &Args, config: &LinkTermConfig) -> LinkTermResult<ConnectionConfig> {
    match (&args.serial, &args.socket) {
        (Some(port), None) => Ok(ConnectionConfig::Serial {
            port: port.clone(),
            baud_rate: config.connect.baud_rate,
        }),
        (None, Some(target)) => Ok(ConnectionConfig::Tcp {
            host: target.host.clone(),
            port: target.port,
            timeout_ms: config.connect.tcp_connect_timeout_ms,
        }),
        _ => Err(LinkTermError::InvalidInput(
            "exactly one of --serial or --socket is required".to_string(),
        )),
    }
}

pub fn session_config(config: &LinkTermConfig) -> SessionConfig {
    SessionConfig {
        prompt: config.global.prompt.clone(),
        eol: config.connect.eol,
        rx_delimiter: config.connect.rx_delimiter,
        pacing: Pacing::from(&config.pacing),
        policy: ReconnectPolicy::new(config.connect.timeout_first, config.connect.timeout_later),
        ..SessionConfig::default()
    }
}

fn log_file(args: &Args, config: &LinkTermConfig, manager: &ConfigManager) -> Option<PathBuf> {
    if args.no_log {
        return None;
    }
    Some(
        config
            .global
            .log_file
            .clone()
            .unwrap_or_else(|| manager.default_log_file()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{ConnectTimeout, Eol};
    use clap::Parser;
    use std::path::Path;
    use std::time::Duration;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["linkterm"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut config = LinkTermConfig::default();
        config.connect.eol = Eol::Lf;
        config.pacing.byte_delay_ms = 5;

        let args = parse(&["--serial", "/dev/ttyS1", "--eol", "cr", "--timeout-later", "3"]);
        apply_overrides(&mut config, &args);

        assert_eq!(config.connect.eol, Eol::Cr);
        assert_eq!(config.pacing.byte_delay_ms, 5);
        assert_eq!(
            config.connect.timeout_later,
            ConnectTimeout::After(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_connection_config_from_target() {
        let mut config = LinkTermConfig::default();
        let args = parse(&["--serial", "/dev/ttyACM0", "--baudrate", "57600"]);
        apply_overrides(&mut config, &args);
        assert_eq!(
            connection_config(&args, &config).unwrap(),
            ConnectionConfig::Serial {
                port: "/dev/ttyACM0".to_string(),
                baud_rate: 57600
            }
        );

        let args = parse(&["--socket", ":2323"]);
        assert_eq!(
            connection_config(&args, &config).unwrap(),
            ConnectionConfig::Tcp {
                host: "localhost".to_string(),
                port: 2323,
                timeout_ms: 3000
            }
        );
    }

    #[test]
    fn test_session_config_carries_pacing_and_policy() {
        let mut config = LinkTermConfig::default();
        let args = parse(&["--socket", "h:1", "--eol-delay", "20", "--prompt", "$ "]);
        apply_overrides(&mut config, &args);

        let session = session_config(&config);
        assert_eq!(session.prompt, "$ ");
        assert_eq!(session.pacing.eol_delay, Duration::from_millis(20));
        assert_eq!(
            session.policy.timeout_for(crate::core::reconnect::ConnectPhase::Later),
            ConnectTimeout::Forever
        );
    }

    #[test]
    fn test_log_file_selection() {
        let manager = ConfigManager::with_home(Path::new("/home/op"));
        let config = LinkTermConfig::default();

        let args = parse(&["--socket", "h:1"]);
        assert_eq!(
            log_file(&args, &config, &manager),
            Some(PathBuf::from("/home/op/.linkterm/log.txt"))
        );

        let args = parse(&["--socket", "h:1", "--no-log"]);
        assert_eq!(log_file(&args, &config, &manager), None);
    }
}
