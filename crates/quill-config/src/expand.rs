//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Bare `$VAR` is left as-is, also next to braced references. An unset
/// variable without a default is an error naming the field.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&expand_reference(&rest[start..=start + len], field)?);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Expand a single `${...}` reference.
fn expand_reference(reference: &str, field: &str) -> Result<String, ConfigError> {
    let name = &reference[2..reference.len() - 1];
    if !name.contains(":-") && std::env::var_os(name).is_none() {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        });
    }
    Ok(shellexpand::env_with_context_no_errors(reference, |var| std::env::var(var).ok()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("QUILL_TEST_EXPAND_HOST", "api.example.com");
        }
        let result = expand_env("https://${QUILL_TEST_EXPAND_HOST}/v3", "cards.api_url").unwrap();
        assert_eq!(result, "https://api.example.com/v3");
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("QUILL_TEST_UNSET_TOKEN");
        }
        let result = expand_env("${QUILL_TEST_UNSET_TOKEN:-}", "cards.token").unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("QUILL_TEST_MISSING");
        }
        let err = expand_env("${QUILL_TEST_MISSING}", "cards.token").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("QUILL_TEST_MISSING"));
        assert!(message.contains("cards.token"));
    }

    #[test]
    fn test_bare_dollar_unchanged() {
        assert_eq!(expand_env("$HOME/x", "f").unwrap(), "$HOME/x");
        assert_eq!(expand_env("literal", "f").unwrap(), "literal");
    }

    #[test]
    fn test_bare_dollar_kept_next_to_braced_reference() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("QUILL_TEST_MIXED", "posts");
        }
        let result = expand_env("$HOME/${QUILL_TEST_MIXED}/$USER", "build.source_dir").unwrap();
        assert_eq!(result, "$HOME/posts/$USER");
    }

    #[test]
    fn test_unterminated_reference_is_literal() {
        assert_eq!(expand_env("a${b", "f").unwrap(), "a${b");
    }
}
