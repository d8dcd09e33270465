//! Metadata carried in a component `custom_id`.

use serde::{Deserialize, Serialize};

/// Routing metadata parsed from a `workflow:reference:action` custom id.
///
/// For `"deploy_project:approve_request:reject"` this is
/// `{ workflow: "deploy_project", reference: "approve_request", action: "reject" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Metadata {
    /// Split a custom id on `:`.
    ///
    /// Positions 0, 1 and 2 become workflow, reference and action. Anything
    /// after the third segment is dropped. An empty id gives empty metadata.
    pub fn parse(custom_id: &str) -> Self {
        if custom_id.is_empty() {
            return Self::default();
        }

        let mut parts = custom_id.split(':').map(str::to_string);
        Self {
            workflow: parts.next(),
            reference: parts.next(),
            action: parts.next(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workflow.is_none() && self.reference.is_none() && self.action.is_none()
    }

    /// Routing keys to try, most specific first.
    ///
    /// A key is only produced when every segment it is built from is present
    /// and non-empty.
    pub fn candidate_keys(&self) -> Vec<String> {
        fn non_empty(segment: &Option<String>) -> Option<&str> {
            segment.as_deref().filter(|v| !v.is_empty())
        }

        let mut keys = Vec::with_capacity(3);
        if let Some(wf) = non_empty(&self.workflow) {
            if let Some(reference) = non_empty(&self.reference) {
                if let Some(action) = non_empty(&self.action) {
                    keys.push(format!("{wf}:{reference}:{action}"));
                }
                keys.push(format!("{wf}:{reference}"));
            }
            keys.push(wf.to_string());
        }
        keys
    }
}
