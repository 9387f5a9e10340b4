// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cadenza plugin manager.
//!
//! This crate provides the error taxonomy, the domain types plugins produce
//! (music items, media sources, charts), plugin state codes and capabilities,
//! and the collaborator traits the manager talks through.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CadenzaError;
pub use traits::meta::{PluginMeta, PluginMetaDoc};
pub use traits::{MetaStore, MusicQueue, play_from_list};
pub use types::{
    Capability, CapabilitySet, ClickBehavior, MusicItem, PluginState, PluginStateCode,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_errors_map_to_state_codes() {
        let parse = CadenzaError::CannotParse {
            message: "trap".into(),
        };
        let version = CadenzaError::VersionNotMatch {
            name: "demo".into(),
            required: ">=2".into(),
            current: "0.1.0".into(),
        };
        let fetch = CadenzaError::Fetch {
            locator: "https://x/y.wasm".into(),
            message: "404".into(),
            source: None,
        };
        assert_eq!(parse.state_code(), Some(PluginStateCode::CannotParse));
        assert_eq!(version.state_code(), Some(PluginStateCode::VersionNotMatch));
        assert_eq!(fetch.state_code(), None);
    }

    #[test]
    fn aggregate_error_lists_every_failure() {
        let err = CadenzaError::AggregateInstall {
            failures: vec!["a: 404".into(), "b: cannot parse".into()],
            total: 10,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 of 10 plugin installs failed"));
        assert!(msg.contains("a: 404"));
        assert!(msg.contains("b: cannot parse"));
    }

    #[test]
    fn not_updatable_is_distinct_from_parse_failure() {
        let err = CadenzaError::NotUpdatable {
            name: "local".into(),
        };
        assert!(err.state_code().is_none());
        assert!(err.to_string().contains("no source URL"));
    }
}
