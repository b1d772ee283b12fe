//! Environment variable references in configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config key for error messages. Strings without `${`
/// are returned unchanged, so a literal `$` needs no escaping.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(UnsetVar(var.to_owned())),
        }
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
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_var_into_title() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::set_var("MDPANEL_TEST_PROJECT", "Widgets");
        }
        let result = expand_env("${MDPANEL_TEST_PROJECT} reference", "output.title").unwrap();
        assert_eq!(result, "Widgets reference");
        unsafe {
            std::env::remove_var("MDPANEL_TEST_PROJECT");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::remove_var("MDPANEL_TEST_UNSET_TARGET");
        }
        let result = expand_env("${MDPANEL_TEST_UNSET_TARGET:-_self}", "render.link_target").unwrap();
        assert_eq!(result, "_self");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::remove_var("MDPANEL_TEST_MISSING");
        }
        let err = expand_env("${MDPANEL_TEST_MISSING}", "render.heading_id_prefix").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in render.heading_id_prefix: ${MDPANEL_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_literal_dollar_unchanged() {
        assert_eq!(expand_env("cost: $5", "output.title").unwrap(), "cost: $5");
    }
}
