//! `${VAR}` and `${VAR:-default}` references in configuration values.
//!
//! Only the braced form is expanded; a bare `$` is kept as is, so attribute
//! values such as `cost: $5` survive untouched.

use crate::ConfigError;

/// Expands variable references using a lookup function.
///
/// [`EnvExpander::process`] reads the process environment; tests supply a
/// fixed table instead.
pub(crate) struct EnvExpander<F> {
    lookup: F,
}

impl EnvExpander<fn(&str) -> Option<String>> {
    /// Expander backed by `std::env::var`.
    pub fn process() -> Self {
        Self::new(|name| std::env::var(name).ok())
    }
}

impl<F> EnvExpander<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Expand `value` of the config key `field` (e.g. `render.assets_base`).
    ///
    /// An unset variable without a `:-` default fails with
    /// [`ConfigError::EnvVar`] naming both the key and the variable.
    pub fn expand(&self, value: &str, field: &str) -> Result<String, ConfigError> {
        if !value.contains("${") {
            return Ok(value.to_owned());
        }
        let expanded = shellexpand::env_with_context(value, |name| {
            (self.lookup)(name)
                .map(Some)
                .ok_or_else(|| UnsetVariable(name.to_owned()))
        });
        match expanded {
            Ok(expanded) => Ok(expanded.into_owned()),
            Err(e) => Err(ConfigError::EnvVar {
                field: field.to_owned(),
                message: format!("${{{}}} not set", e.cause.0),
            }),
        }
    }
}

struct UnsetVariable(String);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn expander(
        vars: &'static [(&'static str, &'static str)],
    ) -> EnvExpander<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        EnvExpander::new(move |name| vars.get(name).map(|v| (*v).to_owned()))
    }

    #[test]
    fn test_expand_in_path() {
        let result = expander(&[("ASSETS", "/srv/assets")])
            .expand("${ASSETS}/img", "render.assets_base")
            .unwrap();
        assert_eq!(result, "/srv/assets/img");
    }

    #[test]
    fn test_default_used_when_unset() {
        let result = expander(&[]).expand("${STAGE:-dev}", "attributes.env").unwrap();
        assert_eq!(result, "dev");
    }

    #[test]
    fn test_set_variable_wins_over_default() {
        let result = expander(&[("STAGE", "prod")])
            .expand("${STAGE:-dev}", "attributes.env")
            .unwrap();
        assert_eq!(result, "prod");
    }

    #[test]
    fn test_unset_variable_names_key_and_variable() {
        let err = expander(&[])
            .expand("v${VERSION}", "attributes.version")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("VERSION"));
        assert!(err.to_string().contains("attributes.version"));
    }

    #[test]
    fn test_bare_dollar_is_literal() {
        let result = expander(&[]).expand("cost: $5", "attributes.price").unwrap();
        assert_eq!(result, "cost: $5");
    }

    #[test]
    fn test_process_environment() {
        let path = std::env::var("PATH").unwrap_or_default();
        let result = EnvExpander::process()
            .expand("${PATH:-}", "parser.base_dir")
            .unwrap();
        assert_eq!(result, path);
    }
}
