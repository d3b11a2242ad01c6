//! Configuration loading with multi-source merging

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tastr_core::TastrConfig;

/// Project-level config picked up from the working directory.
pub const PROJECT_CONFIG: &str = "tastr.toml";

/// Priority, lowest to highest:
/// 1. built-in defaults
/// 2. `./tastr.toml`
/// 3. the explicit `--config` path
/// 4. `TASTR_` environment variables (`TASTR_RATING__K_FACTOR=24`)
pub fn figment(config_path: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(TastrConfig::default()));

    let project = PathBuf::from(PROJECT_CONFIG);
    if project.exists() {
        figment = figment.merge(Toml::file(project));
    }

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(Env::prefixed("TASTR_").split("__"))
}

pub fn load(config_path: Option<&Path>) -> Result<TastrConfig, Box<figment::Error>> {
    figment(config_path).extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tastr_core::matchmaking::MatchmakingStrategy;

    #[test]
    fn defaults_extract_cleanly() {
        let config: TastrConfig = Figment::new()
            .merge(Serialized::defaults(TastrConfig::default()))
            .extract()
            .unwrap();
        assert_eq!(config, TastrConfig::default());
    }

    #[test]
    fn toml_overrides_single_fields() {
        let config: TastrConfig = Figment::new()
            .merge(Serialized::defaults(TastrConfig::default()))
            .merge(Toml::string(
                r#"
                [rating]
                k_factor = 24.0
                floor = 0.0

                [matchmaking]
                strategy = "scored"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.rating.k_factor, 24.0);
        assert_eq!(config.rating.scale, 400.0);
        assert_eq!(config.rating.floor, Some(0.0));
        assert_eq!(config.matchmaking.strategy, MatchmakingStrategy::Scored);
        assert_eq!(config.matchmaking.strict_retries, 10);
        assert_eq!(config.events.channel_capacity, 64);
    }
}
