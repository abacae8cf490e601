//! Translation of user-facing labels.

use std::collections::HashMap;

/// Looks up the display string for a translation key.
///
/// `params` values replace `{name}` placeholders in the result.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Returns the key itself, with placeholders filled in
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        interpolate(key, params)
    }
}

/// Translator backed by a fixed key → string table; unknown keys fall back to the key
#[derive(Debug, Clone, Default)]
pub struct TableTranslator {
    entries: HashMap<String, String>,
}

impl TableTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl Translator for TableTranslator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.entries.get(key).map(String::as_str).unwrap_or(key);
        interpolate(template, params)
    }
}

/// Scopes keys under a component namespace (`<namespace>.<key>`).
///
/// When the inner translator has nothing for the scoped key the bare key is
/// used instead.
pub struct NamespacedTranslator<'a> {
    inner: &'a dyn Translator,
    namespace: &'a str,
}

impl<'a> NamespacedTranslator<'a> {
    pub fn new(inner: &'a dyn Translator, namespace: &'a str) -> Self {
        Self { inner, namespace }
    }

    pub fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let scoped = format!("{}.{}", self.namespace, key);
        let translated = self.inner.translate(&scoped, params);
        if translated == interpolate(&scoped, params) {
            interpolate(key, params)
        } else {
            translated
        }
    }
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |out, (name, value)| {
            out.replace(&format!("{{{name}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_interpolates() {
        let t = IdentityTranslator;
        assert_eq!(t.translate("edit {type}", &[("type", "image")]), "edit image");
    }

    #[test]
    fn test_namespaced_lookup() {
        let table = TableTranslator::new()
            .with_entry("Components.BlockContextualization.edit mention parameters", "modifier");
        let t = NamespacedTranslator::new(&table, "Components.BlockContextualization");
        assert_eq!(t.translate("edit mention parameters", &[]), "modifier");
    }

    #[test]
    fn test_namespaced_falls_back_to_key() {
        let t = NamespacedTranslator::new(&IdentityTranslator, "Components.BlockContextualization");
        assert_eq!(t.translate("edit {type}", &[("type", "video")]), "edit video");
    }
}
