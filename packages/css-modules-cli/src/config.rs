//! Config
//!
//! `css-modules.json`, read in camelCase into a [`ModulesConfig`].

use anyhow::Context;
use css_modules::ModulesConfig;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "css-modules.json";

pub fn parse(content: &str) -> anyhow::Result<ModulesConfig> {
    let config: ModulesConfig = serde_json::from_str(content)?;
    Ok(config)
}

/// Read a config file. A relative `root` is taken from the file's directory.
pub fn load(path: &Path) -> anyhow::Result<ModulesConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut config =
        parse(&content).with_context(|| format!("failed to parse {}", path.display()))?;

    if let Some(root) = config.root.take() {
        let base = path.parent().unwrap_or(Path::new("."));
        config.root = Some(base.join(root).to_string_lossy().into_owned());
    }
    Ok(config)
}

/// Use `explicit` when given, else `css-modules.json` in `cwd` if present,
/// else the defaults.
pub fn discover(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<ModulesConfig> {
    if let Some(path) = explicit {
        return load(&cwd.join(path));
    }
    let candidate = cwd.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        load(&candidate)
    } else {
        Ok(ModulesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_modules::ScopeBehaviour;

    #[test]
    fn should_parse_camel_case_keys() {
        let config = parse(
            r#"{ "scopeBehaviour": "global", "exportGlobals": true, "hashPrefix": "app" }"#,
        )
        .unwrap();
        assert_eq!(config.scope_behaviour, ScopeBehaviour::Global);
        assert!(config.export_globals);
        assert_eq!(config.hash_prefix, "app");
    }

    #[test]
    fn should_reject_malformed_json() {
        assert!(parse("{ scopeBehaviour: }").is_err());
    }

    #[test]
    fn should_fall_back_to_defaults_without_a_config_file() {
        let dir = std::env::temp_dir().join("css-modules-cli-no-config");
        fs::create_dir_all(&dir).unwrap();
        let _ = fs::remove_file(dir.join(CONFIG_FILE_NAME));
        assert_eq!(discover(None, &dir).unwrap(), ModulesConfig::default());
    }

    #[test]
    fn should_resolve_root_against_the_config_directory() {
        let dir = std::env::temp_dir().join("css-modules-cli-root-config");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "root": "src" }"#).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(
            config.root.as_deref(),
            Some(dir.join("src").to_string_lossy().as_ref())
        );
    }
}
