//! `${VAR}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// - `${VAR}` expands to the value of VAR, errors if unset
/// - `${VAR:-default}` expands to VAR if set, otherwise to `default`
///
/// Strings without `${` are returned unchanged, so bare `$` (common in URLs)
/// is left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("FOLIO_TEST_EXPAND_HOST", "docs.example.com");
        }
        let result = expand_env("https://${FOLIO_TEST_EXPAND_HOST}/", "site.base_url").unwrap();
        assert_eq!(result, "https://docs.example.com/");
        unsafe {
            std::env::remove_var("FOLIO_TEST_EXPAND_HOST");
        }
    }

    #[test]
    fn test_expand_default_used_when_unset() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("FOLIO_TEST_EXPAND_UNSET");
        }
        let result =
            expand_env("${FOLIO_TEST_EXPAND_UNSET:-http://localhost:5000}", "site.base_url")
                .unwrap();
        assert_eq!(result, "http://localhost:5000");
    }

    #[test]
    fn test_expand_missing_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("FOLIO_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${FOLIO_TEST_EXPAND_MISSING}", "site.base_url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in site.base_url: ${FOLIO_TEST_EXPAND_MISSING} not set"
        );
    }

    #[test]
    fn test_bare_dollar_unchanged() {
        assert_eq!(
            expand_env("http://example.com/$root", "site.base_url").unwrap(),
            "http://example.com/$root"
        );
    }
}
