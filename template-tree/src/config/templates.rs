//! Template configuration entries

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// How one native event is bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventConfig {
    /// `true` binds on the template's parent element; `false` disables the event
    Enabled(bool),
    /// Bind on the elements matching each enabled selector
    Selectors(BTreeMap<String, bool>),
}

impl EventConfig {
    /// Whether anything should be bound for this event
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Enabled(enabled) => *enabled,
            Self::Selectors(selectors) => selectors.values().any(|enabled| *enabled),
        }
    }
}

/// Configuration of one template
///
/// Exactly one of `html` and `location` is authoritative: `html` is used
/// verbatim only when no `location` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Inline markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// URL to fetch, or the id (with or without `#`) of a document element
    /// whose inner markup is the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Id assigned to the parent element on attach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Render parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,

    /// Native events to forward, keyed by event type
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, EventConfig>,
}

impl TemplateConfig {
    /// Configuration with inline markup
    pub fn inline(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::default()
        }
    }

    /// Configuration loading from `location`
    pub fn located(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Set the parent element id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a render parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Bind `event_type` on the parent element
    #[must_use]
    pub fn with_event(mut self, event_type: impl Into<String>) -> Self {
        self.events.insert(event_type.into(), EventConfig::Enabled(true));
        self
    }

    /// Bind `event_type` on the elements matching `selector`
    #[must_use]
    pub fn with_selector_event(
        mut self,
        event_type: impl Into<String>,
        selector: impl Into<String>,
    ) -> Self {
        let entry = self
            .events
            .entry(event_type.into())
            .or_insert_with(|| EventConfig::Selectors(BTreeMap::new()));
        match entry {
            EventConfig::Selectors(selectors) => {
                selectors.insert(selector.into(), true);
            }
            EventConfig::Enabled(_) => {
                *entry = EventConfig::Selectors(BTreeMap::from([(selector.into(), true)]));
            }
        }
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Flag(bool),
    Location(String),
    Config(TemplateConfig),
}

/// Ordered mapping of template name to configuration
///
/// Entries may be disabled (`null`, `false` or `""` in serialized form),
/// which lets a layered configuration turn off a template defined by an
/// earlier layer. A bare string is shorthand for `{ location = "..." }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatesConfig {
    entries: Vec<(String, Option<TemplateConfig>)>,
}

impl TemplatesConfig {
    /// Empty mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry, keeping its original position
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, config: TemplateConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Add or replace an entry, keeping its original position
    pub fn insert(&mut self, name: impl Into<String>, config: TemplateConfig) {
        self.set(name.into(), Some(config));
    }

    /// Disable an entry
    pub fn disable(&mut self, name: impl Into<String>) {
        self.set(name.into(), None);
    }

    fn set(&mut self, name: String, config: Option<TemplateConfig>) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = config,
            None => self.entries.push((name, config)),
        }
    }

    /// Enabled configuration for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TemplateConfig> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, config)| config.as_ref())
    }

    /// Enabled entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateConfig)> {
        self.entries
            .iter()
            .filter_map(|(name, config)| config.as_ref().map(|config| (name.as_str(), config)))
    }

    /// Names of disabled entries
    pub fn disabled(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, config)| config.is_none())
            .map(|(name, _)| name.as_str())
    }

    /// Number of enabled entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether there are no enabled entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<N: Into<String>> FromIterator<(N, TemplateConfig)> for TemplatesConfig {
    fn from_iter<I: IntoIterator<Item = (N, TemplateConfig)>>(iter: I) -> Self {
        let mut templates = Self::new();
        for (name, config) in iter {
            templates.insert(name, config);
        }
        templates
    }
}

impl Serialize for TemplatesConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, config) in &self.entries {
            match config {
                Some(config) => map.serialize_entry(name, config)?,
                None => map.serialize_entry(name, &false)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TemplatesConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TemplatesVisitor;

        impl<'de> Visitor<'de> for TemplatesVisitor {
            type Value = TemplatesConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of template names to configurations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut templates = TemplatesConfig::new();
                while let Some((name, raw)) = access.next_entry::<String, Option<RawEntry>>()? {
                    let config = match raw {
                        None | Some(RawEntry::Flag(false)) => None,
                        Some(RawEntry::Location(location)) if location.is_empty() => None,
                        Some(RawEntry::Location(location)) => Some(TemplateConfig::located(location)),
                        Some(RawEntry::Flag(true)) => Some(TemplateConfig::default()),
                        Some(RawEntry::Config(config)) => Some(config),
                    };
                    templates.set(name, config);
                }
                Ok(templates)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(TemplatesConfig::new())
            }
        }

        deserializer.deserialize_map(TemplatesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_keep_map_order() {
        let templates: TemplatesConfig = serde_json::from_value(json!({
            "main": {"html": "<div></div>"},
            "navBar": "/nav.html",
            "overlay": {"location": "#overlay-template"},
        }))
        .unwrap();

        let names: Vec<&str> = templates.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["main", "navBar", "overlay"]);
        assert_eq!(
            templates.get("navBar").and_then(|c| c.location.as_deref()),
            Some("/nav.html")
        );
    }

    #[test]
    fn test_falsy_entries_are_disabled() {
        let templates: TemplatesConfig = serde_json::from_value(json!({
            "main": {"html": "<div></div>"},
            "loadingScreen": null,
            "help": false,
            "share": "",
        }))
        .unwrap();

        assert_eq!(templates.len(), 1);
        assert!(templates.get("help").is_none());
        let disabled: Vec<&str> = templates.disabled().collect();
        assert_eq!(disabled, vec!["loadingScreen", "help", "share"]);
    }

    #[test]
    fn test_true_entry_has_no_content() {
        let templates: TemplatesConfig = serde_json::from_value(json!({"main": true})).unwrap();
        assert_eq!(templates.get("main"), Some(&TemplateConfig::default()));
    }

    #[test]
    fn test_template_config_fields() {
        let config: TemplateConfig = serde_json::from_value(json!({
            "location": "./main.html",
            "id": "viewer",
            "params": {"noEscape": true, "title": "Hi"},
            "events": {"click": true, "pointerdown": {".btn": true, "#skip": false}},
        }))
        .unwrap();

        assert_eq!(config.id.as_deref(), Some("viewer"));
        assert_eq!(config.params["title"], json!("Hi"));
        assert_eq!(config.events["click"], EventConfig::Enabled(true));
        let EventConfig::Selectors(selectors) = &config.events["pointerdown"] else {
            panic!("expected selector map");
        };
        assert_eq!(selectors.get(".btn"), Some(&true));
        assert!(config.events["pointerdown"].is_enabled());
        assert!(!EventConfig::Enabled(false).is_enabled());
    }

    #[test]
    fn test_serialize_round_trips_through_toml() {
        let mut templates = TemplatesConfig::new()
            .with("main", TemplateConfig::inline("<div></div>").with_event("click"))
            .with("nav", TemplateConfig::located("/nav.html"));
        templates.disable("nav");

        let text = toml::to_string(&templates).unwrap();
        let parsed: TemplatesConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("main"), templates.get("main"));
        assert_eq!(parsed.disabled().collect::<Vec<_>>(), vec!["nav"]);
    }

    #[test]
    fn test_builders() {
        let config = TemplateConfig::inline("<button class=\"btn\"></button>")
            .with_id("controls")
            .with_param("visible", true)
            .with_selector_event("click", ".btn")
            .with_selector_event("click", "#play");

        assert_eq!(config.id.as_deref(), Some("controls"));
        assert_eq!(config.params["visible"], json!(true));
        let EventConfig::Selectors(selectors) = &config.events["click"] else {
            panic!("expected selector map");
        };
        assert_eq!(selectors.len(), 2);
    }
}
