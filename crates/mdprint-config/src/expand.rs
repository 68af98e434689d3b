//! Shell-style expansion for configured tool commands.

use crate::ConfigError;

/// Expand `~` and `$VAR` references in a command string.
///
/// # Errors
///
/// Returns `ConfigError::EnvVar` if a referenced variable is not set.
pub(crate) fn expand_command(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
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
    fn test_plain_command_unchanged() {
        assert_eq!(expand_command("weasyprint", "pdf.command").unwrap(), "weasyprint");
    }

    #[test]
    fn test_expands_set_variable() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("MDPRINT_TEST_TOOL_DIR", "/opt/tools") };
        let expanded = expand_command("$MDPRINT_TEST_TOOL_DIR/mmdc", "diagrams.mermaid_command");
        assert_eq!(expanded.unwrap(), "/opt/tools/mmdc");
    }

    #[test]
    fn test_unset_variable_is_error() {
        let err = expand_command("${MDPRINT_TEST_UNSET_VAR}/mmdc", "diagrams.mermaid_command")
            .unwrap_err();
        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "diagrams.mermaid_command");
                assert!(message.contains("MDPRINT_TEST_UNSET_VAR"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
