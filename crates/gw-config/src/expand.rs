//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key and is only used for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} {}", e.var_name, e.cause),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(expand_env("/srv/wiki", "f").unwrap(), "/srv/wiki");
    }

    #[test]
    fn test_default_value_used_when_unset() {
        let expanded = expand_env("${GW_TEST_SURELY_UNSET_VAR:-/tmp/wiki}", "f").unwrap();
        assert_eq!(expanded, "/tmp/wiki");
    }

    #[test]
    fn test_unset_variable_is_error() {
        let err = expand_env("${GW_TEST_SURELY_UNSET_VAR}", "application.repository").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("application.repository"));
        assert!(message.contains("GW_TEST_SURELY_UNSET_VAR"));
    }
}
