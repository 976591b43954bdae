//! Renderer configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default wrapper element of sections.
pub const DEFAULT_SECTION_TAG: &str = "section";

/// HTML renderer configuration.
///
/// `attributes` take precedence over attribute entries in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Configuration {
    /// Directory local images are read from when `data-uri` is set.
    pub assets_base: Option<PathBuf>,
    pub attributes: BTreeMap<String, String>,
    /// Forward `data-*` element options as HTML attributes.
    pub support_data_attributes: bool,
    /// Omit the `<div class="sectionbody">` wrapper inside sections.
    pub skip_section_body: bool,
    /// Element wrapping each section.
    pub section_tag: String,
    /// Omit the `<div id="content">` wrapper around the body.
    pub skip_global_content_wrapper: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            assets_base: None,
            attributes: BTreeMap::new(),
            support_data_attributes: false,
            skip_section_body: false,
            section_tag: DEFAULT_SECTION_TAG.to_owned(),
            skip_global_content_wrapper: false,
        }
    }
}

impl Configuration {
    #[must_use]
    pub fn with_assets_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.assets_base = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_section_tag(mut self, tag: impl Into<String>) -> Self {
        self.section_tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_support_data_attributes(mut self, enabled: bool) -> Self {
        self.support_data_attributes = enabled;
        self
    }

    #[must_use]
    pub fn with_skip_section_body(mut self, skip: bool) -> Self {
        self.skip_section_body = skip;
        self
    }

    #[must_use]
    pub fn with_skip_global_content_wrapper(mut self, skip: bool) -> Self {
        self.skip_global_content_wrapper = skip;
        self
    }

    pub fn assets_base(&self) -> Option<&Path> {
        self.assets_base.as_deref()
    }

    /// Check the configuration for invalid or contradictory values.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.section_tag.is_empty()
            || !self.section_tag.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigurationError::InvalidSectionTag(
                self.section_tag.clone(),
            ));
        }
        if self.attributes.contains_key("data-uri") && self.assets_base.is_none() {
            return Err(ConfigurationError::DataUriWithoutAssetsBase);
        }
        if let Some(levels) = self.attributes.get("toclevels")
            && levels.trim().parse::<usize>().is_err()
        {
            return Err(ConfigurationError::InvalidTocLevels(levels.clone()));
        }
        Ok(())
    }
}

/// Invalid renderer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid section tag '{0}': expected a non-empty alphanumeric element name")]
    InvalidSectionTag(String),
    #[error("The data-uri attribute requires an assets base directory")]
    DataUriWithoutAssetsBase,
    #[error("Invalid toclevels '{0}': expected a number")]
    InvalidTocLevels(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.section_tag, "section");
        assert!(!config.support_data_attributes);
        assert!(!config.skip_section_body);
        assert!(!config.skip_global_content_wrapper);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_section_tag() {
        for tag in ["", "my section", "div>"] {
            let config = Configuration::default().with_section_tag(tag);
            assert!(matches!(
                config.validate(),
                Err(ConfigurationError::InvalidSectionTag(_))
            ));
        }
        assert!(
            Configuration::default()
                .with_section_tag("div")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_data_uri_requires_assets_base() {
        let config = Configuration::default().with_attribute("data-uri", "");
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::DataUriWithoutAssetsBase)
        ));
        assert!(config.with_assets_base("assets").validate().is_ok());
    }

    #[test]
    fn test_invalid_toclevels() {
        let config = Configuration::default().with_attribute("toclevels", "deep");
        let error = config.validate().unwrap_err();
        assert_eq!(error.to_string(), "Invalid toclevels 'deep': expected a number");
    }
}
