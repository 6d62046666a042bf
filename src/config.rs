use crate::error::{ActorClippyError, ClippyResult};
use crate::level::LintLevel;
use crate::lint::{LintSettings, all_known_lints, canonical_lint_name};
use crate::semantic::ActorSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct ActorClippyConfig {
    #[serde(default)]
    pub lints: LintsConfig,

    #[serde(default)]
    pub actors: ActorsConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct LintsConfig {
    #[serde(default)]
    pub disabled: Vec<String>,

    #[serde(flatten)]
    pub levels: HashMap<String, LintLevel>,
}

/// Extra framework names, added to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ActorsConfig {
    #[serde(default)]
    pub base_types: Vec<String>,

    #[serde(default)]
    pub stash_interfaces: Vec<String>,

    #[serde(default)]
    pub stash_receivers: Vec<String>,
}

impl ActorClippyConfig {
    /// Every name under `[lints]` must be a known lint name or rule code.
    pub fn validate(&self) -> ClippyResult<()> {
        let names = self.lints.levels.keys().chain(self.lints.disabled.iter());
        for name in names {
            if canonical_lint_name(name).is_none() {
                let mut known: Vec<&str> = all_known_lints().into_iter().collect();
                known.sort_unstable();
                return Err(ActorClippyError::config(format!(
                    "unknown lint `{name}` in [lints] (known: {})",
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn lint_settings(&self) -> LintSettings {
        LintSettings::default()
            .with_config_levels(self.lints.levels.clone())
            .disable(self.lints.disabled.clone())
    }

    pub fn actor_settings(&self) -> ActorSettings {
        ActorSettings::default().extend(
            &self.actors.base_types,
            &self.actors.stash_interfaces,
            &self.actors.stash_receivers,
        )
    }
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "actor-clippy.toml";

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<ActorClippyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: ActorClippyConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    cfg.validate()
        .map_err(ActorClippyError::into_anyhow)
        .with_context(|| format!("invalid config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, ActorClippyConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    Ok(Some((p, cfg)))
}
