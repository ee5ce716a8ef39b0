//! Canned manifest JSON for common test scenarios.

/// Pre-built `package.json` documents matching
/// [`lithium_manifest::ManifestDocument`]'s schema.
pub struct Fixtures;

impl Fixtures {
    /// A manifest with no dependencies and no declared modules.
    #[must_use]
    pub fn minimal_manifest(name: &str, version: &str) -> String {
        format!(r#"{{"name": "{name}", "version": "{version}"}}"#)
    }

    /// A manifest declaring one in-tree dependency.
    #[must_use]
    pub fn manifest_with_dependency(name: &str, version: &str, dep_name: &str, constraint: &str) -> String {
        format!(
            r#"{{"name": "{name}", "version": "{version}", "dependencies": {{"{dep_name}": "{constraint}"}}}}"#
        )
    }

    /// A manifest declaring one `system:`-prefixed dependency.
    #[must_use]
    pub fn manifest_with_system_dependency(name: &str, version: &str, dep: &str, constraint: &str) -> String {
        format!(
            r#"{{"name": "{name}", "version": "{version}", "dependencies": {{"system:{dep}": "{constraint}"}}}}"#
        )
    }

    /// A manifest declaring one shared-library module with a component
    /// factory entry point.
    #[must_use]
    pub fn manifest_with_module(name: &str, version: &str, module: &str, func_name: &str) -> String {
        format!(
            r#"{{"name": "{name}", "version": "{version}", "modules": ["{module}"], "main": {{"{module}": {{"m_func_name": "{func_name}", "m_component_type": "shared"}}}}}}"#
        )
    }

    /// Two addons where `downstream` depends on `upstream`.
    #[must_use]
    pub fn dependent_pair() -> (String, String) {
        (
            Self::minimal_manifest("upstream", "1.0.0"),
            Self::manifest_with_dependency("downstream", "1.0.0", "upstream", "^1.0.0"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_parses_as_json() {
        let json = Fixtures::minimal_manifest("core", "1.2.3");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "core");
        assert_eq!(value["version"], "1.2.3");
    }

    #[test]
    fn manifest_with_dependency_round_trips() {
        let json = Fixtures::manifest_with_dependency("downstream", "1.0.0", "upstream", "^1.0.0");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dependencies"]["upstream"], "^1.0.0");
    }
}
