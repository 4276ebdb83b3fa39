//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn src() -> PathBuf {
        "src".into()
    }

    pub fn dist() -> PathBuf {
        "dist".into()
    }

    pub fn modules() -> PathBuf {
        "node_modules".into()
    }

    pub fn npm() -> String {
        "npm".into()
    }

    pub fn pages() -> String {
        "pages".into()
    }
}

// ============================================================================
// [compiler] Section Defaults
// ============================================================================

pub mod compiler {
    pub fn template() -> Vec<String> {
        Vec::new()
    }

    pub fn style() -> Vec<String> {
        Vec::new()
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn debounce() -> u64 {
        100
    }
}
