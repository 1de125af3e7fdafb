//! Selection policy: which elements receive a resource.
//!
//! Evaluation order (first rejection wins): root container tags, the
//! opt-out class / enhanced-marker idempotence guard, exclusion selectors
//! on the element itself, exclusion selectors on any strict ancestor,
//! then inclusion selectors. Malformed selector strings are dropped at
//! compile time with a warning and behave as "no match"; a bad selector
//! never aborts a scan.

use serde::{Deserialize, Serialize};
use tracing::warn;

use veneer_dom::{Element, Selector};

/// Default inclusion list: overflow/scroll utility classes, the
/// scrollable text input, and the explicit opt-in marker.
pub const DEFAULT_SELECTORS: &[&str] = &[
    ".overflow-auto",
    ".overflow-y-auto",
    ".overflow-x-auto",
    "textarea",
    "[data-scrollbar]",
];

/// Default exclusion list: root containers, the opt-out marker, portal
/// roots, dialog/modal roles and toast viewports.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "html",
    "body",
    "[data-scrollbar-ignore]",
    "[data-portal-root]",
    "[role=dialog]",
    "[role=alertdialog]",
    "[data-toast-viewport]",
];

/// Marker attribute left on enhanced elements.
pub const ENHANCED_MARKER_ATTR: &str = "data-scrollbar-attached";

/// Class that opts an element out regardless of the inclusion list.
pub const OPT_OUT_CLASS: &str = "native-scroll";

const ROOT_CONTAINER_TAGS: &[&str] = &["html", "body"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachPolicy {
    #[serde(default = "default_selector_list")]
    pub selector: Vec<String>,
    #[serde(default = "default_exclude_list")]
    pub exclude: Vec<String>,
}

fn default_selector_list() -> Vec<String> {
    DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect()
}

fn default_exclude_list() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

impl Default for AttachPolicy {
    fn default() -> Self {
        Self {
            selector: default_selector_list(),
            exclude: default_exclude_list(),
        }
    }
}

/// Policy with its selector lists parsed once up front.
pub struct CompiledPolicy {
    include: Vec<Selector>,
    exclude: Vec<Selector>,
    /// Exclusions applied during the strict-ancestor walk. The root
    /// container tag selectors stay out of this list: every connected
    /// element sits under `body` and `html`, so carrying them here would
    /// disqualify the whole document. They reject the element itself
    /// only, via the static tag skip.
    ancestor_exclude: Vec<Selector>,
}

impl CompiledPolicy {
    pub fn compile(policy: &AttachPolicy) -> Self {
        let exclude = compile_list(&policy.exclude, "exclude");
        let ancestor_exclude = exclude
            .iter()
            .filter(|s| !ROOT_CONTAINER_TAGS.contains(&s.source().to_ascii_lowercase().as_str()))
            .cloned()
            .collect();
        Self {
            include: compile_list(&policy.selector, "selector"),
            exclude,
            ancestor_exclude,
        }
    }

    pub fn is_eligible(&self, element: &Element) -> bool {
        let tag = element.tag_name().to_ascii_lowercase();
        if ROOT_CONTAINER_TAGS.contains(&tag.as_str()) {
            return false;
        }
        if element.has_class(OPT_OUT_CLASS) || element.has_attribute(ENHANCED_MARKER_ATTR) {
            return false;
        }
        if self.excluded(element) {
            return false;
        }
        // Strict ancestors only; the element never excludes itself here.
        if element
            .ancestors()
            .iter()
            .any(|a| self.ancestor_excluded(a))
        {
            return false;
        }
        self.include.iter().any(|s| s.matches(element))
    }

    fn excluded(&self, element: &Element) -> bool {
        self.exclude.iter().any(|s| s.matches(element))
    }

    fn ancestor_excluded(&self, element: &Element) -> bool {
        self.ancestor_exclude.iter().any(|s| s.matches(element))
    }
}

fn compile_list(raw: &[String], list: &'static str) -> Vec<Selector> {
    raw.iter()
        .filter_map(|text| match Selector::parse(text) {
            Ok(selector) => Some(selector),
            Err(err) => {
                warn!(list, selector = %text, %err, "dropping malformed selector");
                None
            }
        })
        .collect()
}
