//! Resolve parsed metadata to an n8n webhook URL.
//!
//! Keys are tried from most to least specific:
//!
//! ```text
//! workflow:reference:action → workflow:reference → workflow → default
//! ```
//!
//! so a workflow can have one coarse route while individual reference/action
//! combinations override it.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::metadata::Metadata;
use super::table::{RoutingEntry, RoutingTable};

/// n8n webhook environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    #[default]
    Prod,
    Test,
}

impl Environment {
    /// Case-insensitive parse. Anything other than `test` is PROD.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(label) if label.trim().eq_ignore_ascii_case("test") => Self::Test,
            _ => Self::Prod,
        }
    }

    /// URL path segment n8n serves this environment under.
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::Prod => "webhook",
            Self::Test => "webhook-test",
        }
    }
}

/// Where an interaction is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub url: String,
    pub environment: Environment,
    /// `None` for the default fallback route.
    pub webhook_id: Option<String>,
}

impl Destination {
    pub fn is_default(&self) -> bool {
        self.webhook_id.is_none()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A routing entry normalized to a single shape.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedEntry {
    environment: Environment,
    webhook_id: String,
}

impl ResolvedEntry {
    /// Returns `None` when the entry carries no usable webhook id.
    fn normalize(entry: &RoutingEntry) -> Option<Self> {
        let (environment, webhook_id) = match entry {
            RoutingEntry::Id(id) => (Environment::Prod, Some(id.as_str())),
            RoutingEntry::Record(record) => (
                Environment::from_label(record.env.as_deref()),
                record
                    .id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .or(record.uuid.as_deref()),
            ),
            RoutingEntry::Unsupported(_) => (Environment::Prod, None),
        };

        webhook_id.filter(|id| !id.is_empty()).map(|id| Self {
            environment,
            webhook_id: id.to_string(),
        })
    }
}

/// Builds destination URLs from the n8n base domain and relay path.
#[derive(Debug, Clone)]
pub struct WebhookResolver {
    base_domain: String,
    relay_path: String,
}

impl WebhookResolver {
    pub fn new(base_domain: impl Into<String>, relay_path: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into().trim_end_matches('/').to_string(),
            relay_path: relay_path.into().trim_matches('/').to_string(),
        }
    }

    /// Pick the destination for `meta`.
    ///
    /// The first candidate key with a valid entry wins. A matching entry
    /// without a webhook id is logged and skipped. When nothing matches, the
    /// default PROD route without an id is returned.
    pub fn resolve(&self, meta: &Metadata, table: &RoutingTable) -> Destination {
        for key in meta.candidate_keys() {
            let Some(entry) = table.get(&key) else {
                continue;
            };

            match ResolvedEntry::normalize(entry) {
                Some(resolved) => {
                    return self.destination(resolved.environment, Some(resolved.webhook_id));
                }
                None => {
                    warn!(key = %key, value = ?entry, "routing_table_invalid_entry");
                }
            }
        }

        warn!(meta = ?meta, "webhook_not_resolved");
        self.default_destination()
    }

    pub fn default_destination(&self) -> Destination {
        self.destination(Environment::Prod, None)
    }

    fn destination(&self, environment: Environment, webhook_id: Option<String>) -> Destination {
        let mut url = format!(
            "{}/{}/{}",
            self.base_domain,
            environment.path_prefix(),
            self.relay_path
        );
        if let Some(id) = &webhook_id {
            url.push('/');
            url.push_str(id);
        }

        Destination {
            url,
            environment,
            webhook_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "http://n8n:5678";
    const PATH: &str = "discord/interactions";

    fn resolver() -> WebhookResolver {
        WebhookResolver::new(DOMAIN, PATH)
    }

    fn table(json: &str) -> RoutingTable {
        RoutingTable::from_json(json).unwrap()
    }

    #[test]
    fn test_more_specific_key_wins() {
        let table = table(r#"{"wf": "coarse", "wf:ref": "specific"}"#);

        let dest = resolver().resolve(&Metadata::parse("wf:ref"), &table);
        assert_eq!(dest.url, "http://n8n:5678/webhook/discord/interactions/specific");
        assert_eq!(dest.webhook_id.as_deref(), Some("specific"));
    }

    #[test]
    fn test_falls_back_to_workflow_key() {
        let table = table(r#"{"wf": "coarse"}"#);

        let dest = resolver().resolve(&Metadata::parse("wf:ref:act"), &table);
        assert_eq!(dest.url, "http://n8n:5678/webhook/discord/interactions/coarse");
    }

    #[test]
    fn test_full_key_beats_partial_keys() {
        let table = table(r#"{"wf": "a", "wf:ref": "b", "wf:ref:act": "c"}"#);

        let dest = resolver().resolve(&Metadata::parse("wf:ref:act"), &table);
        assert_eq!(dest.webhook_id.as_deref(), Some("c"));

        let dest = resolver().resolve(&Metadata::parse("wf:ref:other"), &table);
        assert_eq!(dest.webhook_id.as_deref(), Some("b"));

        let dest = resolver().resolve(&Metadata::parse("wf:other:act"), &table);
        assert_eq!(dest.webhook_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_unknown_metadata_uses_default() {
        let table = table(r#"{"wf": "a"}"#);

        let dest = resolver().resolve(&Metadata::parse("unknown:ref"), &table);
        assert!(dest.is_default());
        assert_eq!(dest.environment, Environment::Prod);
        assert_eq!(dest.url, "http://n8n:5678/webhook/discord/interactions");

        let dest = resolver().resolve(&Metadata::default(), &table);
        assert_eq!(dest.url, "http://n8n:5678/webhook/discord/interactions");
    }

    #[test]
    fn test_test_environment_prefix() {
        let table = table(r#"{"wf": {"env": "TEST", "id": "abc"}}"#);

        let dest = resolver().resolve(&Metadata::parse("wf"), &table);
        assert_eq!(dest.environment, Environment::Test);
        assert_eq!(dest.url, "http://n8n:5678/webhook-test/discord/interactions/abc");
    }

    #[test]
    fn test_environment_is_case_insensitive_and_defaults_to_prod() {
        let table = table(
            r#"{
                "a": {"env": "test", "id": "1"},
                "b": {"env": "Prod", "id": "2"},
                "c": {"env": "staging", "id": "3"},
                "d": {"id": "4"}
            }"#,
        );
        let r = resolver();

        assert_eq!(r.resolve(&Metadata::parse("a"), &table).environment, Environment::Test);
        assert_eq!(r.resolve(&Metadata::parse("b"), &table).environment, Environment::Prod);
        assert_eq!(r.resolve(&Metadata::parse("c"), &table).environment, Environment::Prod);
        assert_eq!(r.resolve(&Metadata::parse("d"), &table).environment, Environment::Prod);
    }

    #[test]
    fn test_uuid_field_is_accepted() {
        let table = table(r#"{"wf": {"env": "PROD", "uuid": "legacy"}, "wf:x": {"id": "", "uuid": "u"}}"#);

        let dest = resolver().resolve(&Metadata::parse("wf"), &table);
        assert_eq!(dest.webhook_id.as_deref(), Some("legacy"));

        let dest = resolver().resolve(&Metadata::parse("wf:x"), &table);
        assert_eq!(dest.webhook_id.as_deref(), Some("u"));
    }

    #[test]
    fn test_non_string_env_defaults_to_prod() {
        let table = table(r#"{"wf": {"env": 1, "id": "abc"}}"#);

        let dest = resolver().resolve(&Metadata::parse("wf"), &table);
        assert_eq!(dest.environment, Environment::Prod);
        assert_eq!(dest.url, "http://n8n:5678/webhook/discord/interactions/abc");
    }

    #[test]
    fn test_non_string_uuid_does_not_hide_id() {
        let table = table(r#"{"wf": {"env": "TEST", "id": "abc", "uuid": 7}}"#);

        let dest = resolver().resolve(&Metadata::parse("wf"), &table);
        assert_eq!(dest.environment, Environment::Test);
        assert_eq!(dest.url, "http://n8n:5678/webhook-test/discord/interactions/abc");
    }

    #[test]
    fn test_invalid_entry_continues_to_next_candidate() {
        let table = table(r#"{"wf": "coarse", "wf:ref": {"env": "TEST"}, "wf:ref:act": ""}"#);

        let dest = resolver().resolve(&Metadata::parse("wf:ref:act"), &table);
        assert_eq!(dest.webhook_id.as_deref(), Some("coarse"));
        assert_eq!(dest.environment, Environment::Prod);
    }

    #[test]
    fn test_only_invalid_entries_use_default() {
        let table = table(r#"{"wf": 42, "wf:ref": {"id": ""}}"#);

        let dest = resolver().resolve(&Metadata::parse("wf:ref"), &table);
        assert!(dest.is_default());
    }

    #[test]
    fn test_trims_slashes() {
        let r = WebhookResolver::new("https://n8n.example.com/", "/relay/");
        assert_eq!(r.default_destination().url, "https://n8n.example.com/webhook/relay");
    }
}
