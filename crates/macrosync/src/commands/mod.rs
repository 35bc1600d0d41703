//! Command dispatch: bridges CLI args to the engine and prints results.

pub mod config_cmd;
pub mod offline;
pub mod reconcile;
pub mod serve;

use serde::Serialize;

use crate::error::CliError;

/// Pretty-print a value as JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
