use crate::error::CliError;
use serde::Serialize;

/// Writes a document to the given path, or pretty-prints it to stdout.
pub async fn write_document<T: Serialize>(
    value: &T,
    path: Option<&str>,
) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => tokio::fs::write(path, json).await?,
        None => println!("{json}"),
    }
    Ok(())
}
