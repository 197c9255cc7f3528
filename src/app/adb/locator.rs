use std::path::Path;

use crate::app::error::AppError;

const DEFAULT_ADB: &str = "adb";

fn strip_wrapping_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|candidate| candidate.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

pub fn resolve_adb_program(cli_path: Option<&str>, config_path: &str) -> String {
    [cli_path.unwrap_or_default(), config_path]
        .into_iter()
        .map(strip_wrapping_quotes)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(DEFAULT_ADB)
        .to_string()
}

pub fn validate_adb_program(program: &str, trace_id: &str) -> Result<(), AppError> {
    if program.trim().is_empty() {
        return Err(AppError::dependency("ADB command is empty", trace_id));
    }
    if program == DEFAULT_ADB {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err(AppError::dependency(
            format!("ADB path {program} is a directory"),
            trace_id,
        ));
    }
    if !path.exists() {
        return Err(AppError::dependency(
            format!("ADB executable not found at {program}"),
            trace_id,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_value_wins_over_config() {
        assert_eq!(
            resolve_adb_program(Some("/opt/sdk/adb"), "/usr/bin/adb"),
            "/opt/sdk/adb"
        );
        assert_eq!(resolve_adb_program(Some("  "), "/usr/bin/adb"), "/usr/bin/adb");
    }

    #[test]
    fn strips_quotes_from_configured_path() {
        assert_eq!(
            resolve_adb_program(None, "  \"/opt/android/platform-tools/adb\"  "),
            "/opt/android/platform-tools/adb"
        );
        assert_eq!(
            resolve_adb_program(None, "'/opt/android/platform-tools/adb'"),
            "/opt/android/platform-tools/adb"
        );
    }

    #[test]
    fn falls_back_to_adb_on_path() {
        assert_eq!(resolve_adb_program(None, ""), "adb");
        assert_eq!(resolve_adb_program(Some("''"), "   "), "adb");
    }

    #[test]
    fn rejects_missing_and_directory_paths() {
        let err = validate_adb_program("/this/path/should/not/exist/adb", "t").unwrap_err();
        assert_eq!(err.code, "ERR_DEPENDENCY");
        assert!(err.error.contains("not found"));

        let tmp = tempfile::TempDir::new().expect("tmp");
        let dir = tmp.path().to_string_lossy().to_string();
        assert!(validate_adb_program(&dir, "t").is_err());
        assert!(validate_adb_program("adb", "t").is_ok());
    }
}
