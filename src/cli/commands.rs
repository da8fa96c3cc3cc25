//! CLI command implementations

use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::attribute::{item_from_plain, item_to_plain, Item};
use crate::mapper::MapperConfig;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_input, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a command, reporting failures as an error response before returning them
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = match cmd {
        Command::ToPlain { input } => to_plain(input.as_deref()),
        Command::FromPlain { input } => from_plain(input.as_deref()),
        Command::CheckConfig { config } => check_config(&config),
    };

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Typed item → plain document
pub fn to_plain(input: Option<&Path>) -> CliResult<Value> {
    let typed = read_input(input)?;
    let item: Item = serde_json::from_value(typed)?;
    debug!(event = "CLI_TO_PLAIN", attributes = item.len(), "converting typed item");
    Ok(item_to_plain(&item)?)
}

/// Plain document → typed item
pub fn from_plain(input: Option<&Path>) -> CliResult<Value> {
    let plain = read_input(input)?;
    let item = item_from_plain(&plain)?;
    debug!(event = "CLI_FROM_PLAIN", attributes = item.len(), "converting plain document");
    Ok(serde_json::to_value(&item)?)
}

/// Loads and validates a configuration file, echoing the effective settings
pub fn check_config(path: &Path) -> CliResult<Value> {
    if !path.exists() {
        return Err(CliError::config_error(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    let config = MapperConfig::load(path)?;
    let schema = config.schema();
    info!(
        event = "CLI_CONFIG_VALID",
        path = %path.display(),
        schema = schema.name(),
        "configuration valid"
    );
    Ok(json!({
        "schema": schema.name(),
        "config": serde_json::to_value(&config)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_plain_roundtrip_through_files() {
        let plain = file_with(r#"{"id":"a-1","count":3,"tags":["x","y"],"gone":null}"#);
        let typed = from_plain(Some(plain.path())).unwrap();

        let typed_file = file_with(&typed.to_string());
        let back = to_plain(Some(typed_file.path())).unwrap();
        assert_eq!(back, json!({"id":"a-1","count":3,"tags":["x","y"],"gone":null}));
    }

    #[test]
    fn test_from_plain_rejects_non_object() {
        let plain = file_with("[1,2]");
        let err = from_plain(Some(plain.path())).unwrap_err();
        assert_eq!(err.code_str(), "DYNAMAP_CLI_INVALID_INPUT");
    }

    #[test]
    fn test_check_config() {
        let config = file_with(r#"{"conversion_schema":"v2_compatible"}"#);
        let report = check_config(config.path()).unwrap();
        assert_eq!(report["schema"], "V2_COMPATIBLE");
        assert_eq!(report["config"]["scan_segments"], 4);

        let bad = file_with(r#"{"scan_segments":0}"#);
        assert_eq!(
            check_config(bad.path()).unwrap_err().code_str(),
            "DYNAMAP_CLI_CONFIG_ERROR"
        );
        assert!(check_config(Path::new("/nonexistent/dynamap.json")).is_err());
    }
}
