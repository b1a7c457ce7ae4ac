//! blectl interactive console — entry point.
//!
//! Wires the Bluetooth central, the device registry, and the payload
//! command manager together behind shared state, then reads commands from
//! stdin one line at a time and dispatches each through the UI bridge.
//!
//! # Usage
//!
//! ```text
//! blectl [OPTIONS]
//!
//! Options:
//!   --scan-timeout <SECS>  Scan window length in seconds [default: 5]
//!   --mock                 Use the canned mock central (no radio needed)
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Default | Description                   |
//! |-----------------------|---------|-------------------------------|
//! | `BLECTL_SCAN_TIMEOUT` | `5`     | Scan window length in seconds |
//! | `BLECTL_MOCK`         | unset   | Run against the mock central  |
//!
//! # Console commands
//!
//! ```text
//! scan                   discover nearby peripherals
//! status                 show devices, connection state, and last error
//! connect <id>           connect to a discovered peripheral
//! disconnect [id]        disconnect a peripheral (default: the connected one)
//! battery <id>           read the battery level of a connected peripheral
//! payload                show the current payload record
//! history [clear]        show (or clear) the command history
//! cmd <NAME> [value]     run a payload command, e.g. `cmd SET_ID 42`
//! encode <NAME> [value]  print the wire string for a command
//! clear-error            clear the last platform error
//! clear-devices          forget all discovered devices
//! help, quit
//! ```
//!
//! Every command is awaited to completion before the next line is read, so
//! no two platform calls are ever in flight at once.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blectl_console::infrastructure::bluetooth::{BleCentral, BtleplugCentral, MockCentral};
use blectl_console::infrastructure::ui_bridge::{self, ConsoleAppState};
use blectl_core::generate_command_string;
use blectl_core::CommandResult;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Interactive console for BLE peripherals: discovery, battery reads, and
/// payload commands.
#[derive(Debug, Parser)]
#[command(name = "blectl", about = "Interactive BLE device console", version)]
struct Cli {
    /// Scan window length in seconds.
    ///
    /// One `scan` command runs one scan pass of this length and reports
    /// every peripheral seen during the window.
    #[arg(long, default_value_t = 5, env = "BLECTL_SCAN_TIMEOUT")]
    scan_timeout: u64,

    /// Use the canned mock central instead of the host Bluetooth stack.
    ///
    /// Lets the console be exercised end to end on a machine without a
    /// radio; two demo peripherals are pre-seeded.
    #[arg(long, env = "BLECTL_MOCK")]
    mock: bool,
}

// ── Console actions ───────────────────────────────────────────────────────────

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Help,
    Quit,
    Scan,
    Status,
    Connect(String),
    Disconnect(Option<String>),
    Battery(String),
    Payload,
    History,
    ClearHistory,
    ClearError,
    ClearDevices,
    Command { name: String, value: Option<String> },
    Encode { name: String, value: Option<String> },
    /// A recognised verb with bad arguments, or an unknown verb; carries
    /// the message to print.
    Invalid(String),
}

/// Parses one console line. Returns `None` for blank lines.
///
/// The verb is case-insensitive; command names after `cmd`/`encode` are
/// taken verbatim (the encoder treats unknown names as pass-through), and
/// the value is the raw remainder of the line so JSON documents with
/// spaces survive intact.
fn parse_line(line: &str) -> Option<Action> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    Some(match verb.to_ascii_lowercase().as_str() {
        "help" => Action::Help,
        "quit" | "exit" => Action::Quit,
        "scan" => Action::Scan,
        "status" => Action::Status,
        "connect" => match arg {
            Some(id) => Action::Connect(id),
            None => Action::Invalid("usage: connect <id>".to_string()),
        },
        "disconnect" => Action::Disconnect(arg),
        "battery" => match arg {
            Some(id) => Action::Battery(id),
            None => Action::Invalid("usage: battery <id>".to_string()),
        },
        "payload" => Action::Payload,
        "history" => match arg.as_deref() {
            None => Action::History,
            Some("clear") => Action::ClearHistory,
            Some(_) => Action::Invalid("usage: history [clear]".to_string()),
        },
        "clear-error" => Action::ClearError,
        "clear-devices" => Action::ClearDevices,
        "cmd" => match split_command(arg) {
            Some((name, value)) => Action::Command { name, value },
            None => Action::Invalid("usage: cmd <NAME> [value]".to_string()),
        },
        "encode" => match split_command(arg) {
            Some((name, value)) => Action::Encode { name, value },
            None => Action::Invalid("usage: encode <NAME> [value]".to_string()),
        },
        _ => Action::Invalid(format!("unknown command: {verb} (try 'help')")),
    })
}

/// Splits `NAME rest-of-line` into the command name and its raw value.
fn split_command(arg: Option<String>) -> Option<(String, Option<String>)> {
    let arg = arg?;
    match arg.split_once(char::is_whitespace) {
        Some((name, rest)) => Some((name.to_string(), Some(rest.trim().to_string()))),
        None => Some((arg, None)),
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn print_help() {
    println!("commands:");
    println!("  scan                   discover nearby peripherals");
    println!("  status                 show devices, connection state, and last error");
    println!("  connect <id>           connect to a discovered peripheral");
    println!("  disconnect [id]        disconnect a peripheral (default: the connected one)");
    println!("  battery <id>           read the battery level of a connected peripheral");
    println!("  payload                show the current payload record");
    println!("  history [clear]        show (or clear) the command history");
    println!("  cmd <NAME> [value]     run a payload command, e.g. `cmd SET_ID 42`");
    println!("  encode <NAME> [value]  print the wire string for a command");
    println!("  clear-error            clear the last platform error");
    println!("  clear-devices          forget all discovered devices");
    println!("  help, quit");
}

fn render_payload_result(result: &CommandResult) {
    let tag = if result.success { "ok" } else { "error" };
    println!("{tag}: {}", result.message);
    if let Some(record) = &result.data {
        match serde_json::to_string_pretty(record) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("error: failed to render payload: {e}"),
        }
    }
}

async fn execute(action: Action, state: &ConsoleAppState) -> bool {
    match action {
        Action::Help => print_help(),
        Action::Quit => return false,
        Action::Invalid(message) => println!("{message}"),

        Action::Scan => {
            println!("scanning...");
            let result = ui_bridge::scan_for_devices(state).await;
            match result.data {
                Some(devices) if !devices.is_empty() => {
                    for device in devices {
                        let marker = if device.connected { "*" } else { " " };
                        println!(" {marker} {}  {}", device.id, device.name);
                    }
                }
                Some(_) => println!("no peripherals seen"),
                None => println!("error: {}", result.error.unwrap_or_default()),
            }
        }

        Action::Status => {
            let result = ui_bridge::bluetooth_status(state).await;
            if let Some(status) = result.data {
                if status.devices.is_empty() {
                    println!("devices: none discovered yet (try 'scan')");
                } else {
                    println!("devices:");
                    for device in &status.devices {
                        let marker = if device.connected { "*" } else { " " };
                        println!(" {marker} {}  {}", device.id, device.name);
                    }
                }
                match &status.connected_device {
                    Some(device) => println!("connected: {} ({})", device.name, device.id),
                    None => println!("connected: none"),
                }
                println!("scanning: {}", status.scanning);
                match &status.last_error {
                    Some(error) => println!("last error: {error}"),
                    None => println!("last error: none"),
                }
            }
        }

        Action::Connect(id) => {
            let result = ui_bridge::connect_device(state, &id).await;
            match result.data {
                Some(device) => println!("connected to {} ({})", device.name, device.id),
                None => println!("error: {}", result.error.unwrap_or_default()),
            }
        }

        Action::Disconnect(id) => {
            let result = ui_bridge::disconnect_device(state, id.as_deref()).await;
            if result.success {
                println!("disconnected");
            } else {
                println!("error: {}", result.error.unwrap_or_default());
            }
        }

        Action::Battery(id) => {
            let result = ui_bridge::read_battery_level(state, &id).await;
            match result.data {
                Some(level) => println!("battery level: {level}"),
                None => println!("error: {}", result.error.unwrap_or_default()),
            }
        }

        Action::Payload => {
            let result = ui_bridge::current_payload(state).await;
            if let Some(record) = result.data {
                match serde_json::to_string_pretty(&record) {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("error: failed to render payload: {e}"),
                }
            }
        }

        Action::History => {
            let result = ui_bridge::command_history(state).await;
            match result.data {
                Some(history) if !history.is_empty() => {
                    for (index, entry) in history.iter().enumerate() {
                        let tag = if entry.success { "ok " } else { "err" };
                        println!("{:2}. [{tag}] {}  ({})", index + 1, entry.message, entry.timestamp);
                    }
                }
                _ => println!("history is empty"),
            }
        }

        Action::ClearHistory => {
            ui_bridge::clear_history(state).await;
            println!("history cleared");
        }

        Action::ClearError => {
            ui_bridge::clear_error(state).await;
            println!("last error cleared");
        }

        Action::ClearDevices => {
            ui_bridge::clear_devices(state).await;
            println!("device list cleared");
        }

        Action::Command { name, value } => {
            let result = ui_bridge::run_payload_command(state, &name, value.as_deref()).await;
            render_payload_result(&result);
        }

        Action::Encode { name, value } => {
            println!("{}", generate_command_string(&name, value.as_deref()));
        }
    }
    true
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let central: Arc<dyn BleCentral> = if cli.mock {
        info!("using the mock central; no radio will be touched");
        Arc::new(MockCentral::demo())
    } else {
        Arc::new(
            BtleplugCentral::new()
                .await
                .context("failed to initialise the Bluetooth stack")?,
        )
    };

    let state = ConsoleAppState::new(central, Duration::from_secs(cli.scan_timeout));

    println!("blectl — BLE device console (type 'help' for commands)");

    // One command at a time: each action is awaited to completion before
    // the next line is read, so platform calls never overlap.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("blectl> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read from stdin")? else {
            // EOF: behave like `quit`.
            break;
        };

        let Some(action) = parse_line(&line) else {
            continue;
        };
        if !execute(action, &state).await {
            break;
        }
    }

    info!("blectl console stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── CLI ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["blectl"]);

        assert_eq!(cli.scan_timeout, 5);
        assert!(!cli.mock);
    }

    #[test]
    fn test_cli_scan_timeout_override() {
        let cli = Cli::parse_from(["blectl", "--scan-timeout", "12"]);

        assert_eq!(cli.scan_timeout, 12);
    }

    #[test]
    fn test_cli_mock_flag() {
        let cli = Cli::parse_from(["blectl", "--mock"]);

        assert!(cli.mock);
    }

    // ── Line parsing ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_blank_line_is_ignored() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(parse_line("scan"), Some(Action::Scan));
        assert_eq!(parse_line("status"), Some(Action::Status));
        assert_eq!(parse_line("help"), Some(Action::Help));
        assert_eq!(parse_line("quit"), Some(Action::Quit));
        assert_eq!(parse_line("exit"), Some(Action::Quit));
    }

    #[test]
    fn test_parse_verb_is_case_insensitive() {
        assert_eq!(parse_line("SCAN"), Some(Action::Scan));
    }

    #[test]
    fn test_parse_connect_requires_id() {
        assert_eq!(
            parse_line("connect aa:bb"),
            Some(Action::Connect("aa:bb".to_string()))
        );
        assert_eq!(
            parse_line("connect"),
            Some(Action::Invalid("usage: connect <id>".to_string()))
        );
    }

    #[test]
    fn test_parse_disconnect_id_is_optional() {
        assert_eq!(parse_line("disconnect"), Some(Action::Disconnect(None)));
        assert_eq!(
            parse_line("disconnect aa"),
            Some(Action::Disconnect(Some("aa".to_string())))
        );
    }

    #[test]
    fn test_parse_history_clear() {
        assert_eq!(parse_line("history"), Some(Action::History));
        assert_eq!(parse_line("history clear"), Some(Action::ClearHistory));
    }

    #[test]
    fn test_parse_cmd_keeps_raw_value() {
        assert_eq!(
            parse_line(r#"cmd SET_PAYLOAD {"action":"add","user":{"id":"1"}}"#),
            Some(Action::Command {
                name: "SET_PAYLOAD".to_string(),
                value: Some(r#"{"action":"add","user":{"id":"1"}}"#.to_string()),
            })
        );
    }

    #[test]
    fn test_parse_cmd_without_value() {
        assert_eq!(
            parse_line("cmd GET_PAYLOAD"),
            Some(Action::Command {
                name: "GET_PAYLOAD".to_string(),
                value: None,
            })
        );
    }

    #[test]
    fn test_parse_encode() {
        assert_eq!(
            parse_line("encode SET_ID 42"),
            Some(Action::Encode {
                name: "SET_ID".to_string(),
                value: Some("42".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_unknown_verb_reports_usage_hint() {
        let Some(Action::Invalid(message)) = parse_line("frobnicate") else {
            panic!("expected Invalid");
        };
        assert!(message.contains("frobnicate"));
    }
}
