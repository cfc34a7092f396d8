//! Environment configuration helpers

/// Load a `.env` file from the working directory (or a parent) if one exists.
///
/// Returns the path that was loaded. A missing file is not an error.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    match dotenv::dotenv() {
        Ok(path) => {
            tracing::debug!("loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::debug!("no .env file loaded: {e}");
            None
        }
    }
}

/// Read a variable, treating unset and blank values alike
pub fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
