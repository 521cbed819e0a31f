use serde::Deserialize;
use std::path::PathBuf;

/// The repository whose issues are browsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Default for Repository {
    fn default() -> Self {
        Self {
            owner: "facebook".to_string(),
            name: "react-native".to_string(),
        }
    }
}

impl Repository {
    /// Parse an `owner/name` override from the command line.
    pub fn parse(spec: &str) -> Option<Self> {
        let (owner, name) = spec.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repository: Repository,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_token_command")]
    pub token_command: Option<String>,
}

fn default_page_size() -> u32 {
    10
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_token_command() -> Option<String> {
    Some("gh auth token".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: Repository::default(),
            page_size: default_page_size(),
            token_env: default_token_env(),
            token_command: default_token_command(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("triage").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(_) => Config::default(),
        }
    }
}
