use crate::domain::errors::CredentialError;
use std::path::Path;

/// Reads `key` from a `KEY=value` credential file without touching the process environment.
pub fn read_credential(path: &Path, key: &str) -> Result<String, CredentialError> {
    let entries = dotenvy::from_path_iter(path)
        .map_err(|_| CredentialError::MissingFile(path.to_path_buf()))?;

    entries
        .filter_map(Result::ok)
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
        .ok_or_else(|| CredentialError::MissingKey {
            key: key.to_string(),
            path: path.to_path_buf(),
        })
}
