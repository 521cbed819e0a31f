use crate::config::Config;

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

/// Stored token path: ~/.config/triage/token
fn token_path() -> Option<std::path::PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("triage").join("token"))
}

fn load_stored_token() -> Option<String> {
    let path = token_path()?;
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn save_token(token: &str) -> std::io::Result<()> {
    if let Some(path) = token_path() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, token)?;
    }
    Ok(())
}

/// Load a GitHub token, trying multiple sources:
/// 1. The env var named in config (default GITHUB_TOKEN)
/// 2. Stored token from ~/.config/triage/token
/// 3. CLI command from config (default `gh auth token`)
pub fn load_token(config: &Config) -> Result<String, String> {
    if let Ok(token) = std::env::var(&config.token_env) {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    if let Some(token) = load_stored_token() {
        return Ok(token);
    }

    if let Some(cmd) = &config.token_command {
        if let Some(token) = try_cli_token(cmd) {
            if let Err(e) = save_token(&token) {
                tracing::warn!("could not save token: {}", e);
            }
            return Ok(token);
        }
    }

    Err(format!(
        "No GitHub token found. Set {} or configure a token_command.",
        config.token_env
    ))
}
