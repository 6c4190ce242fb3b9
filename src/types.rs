// src/types.rs

use std::fmt;

use serde::Deserialize;

/// What to do when `execute` is called for a key that already has a live run.
///
/// - `Supersede`: cancel (kill) the running instance and start the new one
///   (default behaviour). The new run waits until the cancelled one has
///   fully ended before it touches the key's build directory, so the two
///   never write the same artifact.
/// - `Reject`: leave the running instance alone and answer the new request
///   with a failed "already running" result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRunPolicy {
    #[default]
    Supersede,
    Reject,
}

impl fmt::Display for DuplicateRunPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateRunPolicy::Supersede => f.write_str("supersede"),
            DuplicateRunPolicy::Reject => f.write_str("reject"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        on_duplicate: DuplicateRunPolicy,
    }

    #[test]
    fn config_spelling_matches_display() {
        for policy in [DuplicateRunPolicy::Supersede, DuplicateRunPolicy::Reject] {
            let src = format!("on_duplicate = \"{policy}\"");
            let parsed: Wrapper = toml::from_str(&src).unwrap();
            assert_eq!(parsed.on_duplicate, policy);
        }
        assert!(toml::from_str::<Wrapper>("on_duplicate = \"queue\"").is_err());
    }
}
