// Keyframes scoping
//
// Local `@keyframes` names are scoped like classes, and `animation` /
// `animation-name` references to them are rewritten.

use crate::util::{is_quoted, rewrite_identifiers, unquote};
use indexmap::IndexMap;

// Animation keywords that are never keyframes names
const ANIMATION_KEYWORDS: &[&str] = &[
    // global values
    "inherit",
    "initial",
    "revert",
    "revert-layer",
    "unset",
    // animation-direction
    "alternate",
    "alternate-reverse",
    "normal",
    "reverse",
    // animation-fill-mode
    "backwards",
    "both",
    "forwards",
    "none",
    // animation-play-state
    "paused",
    "running",
    // animation-timing-function
    "ease",
    "ease-in",
    "ease-in-out",
    "ease-out",
    "linear",
    "step-start",
    "step-end",
    // steps() function
    "end",
    "jump-both",
    "jump-end",
    "jump-none",
    "jump-start",
    "start",
    // animation-iteration-count
    "infinite",
];

const ANIMATION_PROPERTIES: &[&str] = &[
    "animation",
    "animation-name",
    "-webkit-animation",
    "-webkit-animation-name",
    "-moz-animation",
    "-moz-animation-name",
];

/// `@keyframes`, `@-webkit-keyframes`, ...
pub fn is_keyframes_at_rule(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "keyframes" || name.ends_with("-keyframes")
}

pub fn is_animation_property(prop: &str) -> bool {
    ANIMATION_PROPERTIES.contains(&prop)
}

/// A keyframes name and whether it is scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframesName {
    pub name: String,
    pub local: bool,
}

/// Read the name out of `@keyframes` params. Explicit `:global(...)` /
/// `:local(...)` wrappers win; quoted names are always global; plain names
/// follow `local_by_default`.
pub fn keyframes_name(params: &str, local_by_default: bool) -> KeyframesName {
    let params = params.trim();
    for (prefix, local) in [(":global(", false), (":local(", true)] {
        let matches_prefix = params
            .get(..prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(prefix));
        if matches_prefix && params.ends_with(')') {
            let inner = params[prefix.len()..params.len() - 1].trim();
            return KeyframesName {
                name: unquote(inner).to_string(),
                local: local && !is_quoted(inner),
            };
        }
    }
    if is_quoted(params) {
        return KeyframesName {
            name: params.to_string(),
            local: false,
        };
    }
    KeyframesName {
        name: params.to_string(),
        local: local_by_default,
    }
}

/// Rewrite keyframes names in an `animation` value.
pub fn rewrite_animation(value: &str, keyframes: &IndexMap<String, String>) -> String {
    rewrite_identifiers(value, |word| {
        if ANIMATION_KEYWORDS.contains(&word.to_ascii_lowercase().as_str()) {
            return None;
        }
        keyframes.get(word).cloned()
    })
}
