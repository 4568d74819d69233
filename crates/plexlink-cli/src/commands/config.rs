use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use owo_colors::OwoColorize;
use plexlink_config::{Config, CredentialStore, PathManager};
use serde_json::json;

use super::mask_string;

pub async fn run_config(cmd: ConfigCommands, path_manager: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(path_manager, output),
        ConfigCommands::Plex {
            token,
            server_url,
            preferred_users,
        } => configure_plex(path_manager, token, server_url, preferred_users, output),
        ConfigCommands::Tmdb { api_key, language } => configure_tmdb(path_manager, api_key, language, output),
    }
}

fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn save(path_manager: &PathManager, config: &Config, cred_store: &CredentialStore) -> Result<()> {
    let config_file = path_manager.config_file();
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Refusing to save invalid config: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    cred_store.save().map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to save credentials to {}: {}",
            path_manager.credentials_file().display(),
            e
        )
    })?;
    Ok(())
}

/// Use the argument when given, otherwise prompt without echo
fn secret(arg: Option<String>, prompt: &str) -> Result<String> {
    let value = match arg {
        Some(value) => value,
        None => rpassword::prompt_password(format!("{}: ", prompt))
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read {}: {}", prompt, e))?,
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(color_eyre::eyre::eyre!("{} cannot be empty", prompt));
    }
    Ok(value)
}

fn show_config(path_manager: &PathManager, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'plexlink config plex' to create one. Defaults are shown below.");
    }

    let config = load_config(path_manager)?;
    let cred_store = load_credentials(path_manager)?;
    let token = mask_string(cred_store.get_plex_token().map(String::as_str).unwrap_or(""));
    let api_key = mask_string(cred_store.get_tmdb_api_key().map(String::as_str).unwrap_or(""));
    let log_file = config.logging.resolved_file(&path_manager.log_dir());

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "plex": {
                "token": token,
                "server_url": config.plex.server_url,
                "machine_identifier": config.plex.machine_identifier,
                "history_page_size": config.plex.history_page_size,
                "limit_per_show": config.plex.limit_per_show,
                "preferred_home_user_ids": config.plex.preferred_home_user_ids,
            },
            "tmdb": {
                "api_key": api_key,
                "language": config.tmdb.language,
            },
            "prefetch": {
                "enabled": config.prefetch.enabled,
                "limit": config.prefetch.limit,
            },
            "log_file": log_file.as_ref().map(|p| p.display().to_string()),
        }));
        return Ok(());
    }

    let preferred = if config.plex.preferred_home_user_ids.is_empty() {
        "everyone".to_string()
    } else {
        config
            .plex
            .preferred_home_user_ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    output.info(format!("{} {}", "Config file:".bold(), config_file.display()));
    output.info(format!("\n{}", "Plex".bright_cyan().bold()));
    output.info(format!("  Token:           {}", token));
    output.info(format!(
        "  Server URL:      {}",
        config.plex.server_url.as_deref().unwrap_or("<discover via plex.tv>")
    ));
    output.info(format!("  Page size:       {}", config.plex.history_page_size));
    output.info(format!("  Episodes/show:   {}", config.plex.limit_per_show));
    output.info(format!("  Home users:      {}", preferred));
    output.info(format!("\n{}", "TMDB".bright_cyan().bold()));
    output.info(format!("  API key:         {}", api_key));
    output.info(format!("  Language:        {}", config.tmdb.language));
    output.info(format!("\n{}", "Prefetch".bright_cyan().bold()));
    output.info(format!("  Enabled:         {}", config.prefetch.enabled));
    output.info(format!("  Limit:           {}", config.prefetch.limit));
    output.info(format!("\n{}", "Logging".bright_cyan().bold()));
    output.info(format!(
        "  File:            {}",
        log_file.as_ref().map_or_else(|| "<stderr>".to_string(), |p| p.display().to_string())
    ));
    Ok(())
}

fn configure_plex(
    path_manager: &PathManager,
    token_arg: Option<String>,
    server_url_arg: Option<String>,
    preferred_users: Option<Vec<u64>>,
    output: &Output,
) -> Result<()> {
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let mut config = load_config(path_manager)?;
    let mut cred_store = load_credentials(path_manager)?;

    // Keep the stored token when only other settings change
    let token = match (token_arg, cred_store.get_plex_token()) {
        (None, Some(_)) if server_url_arg.is_some() || preferred_users.is_some() => None,
        (arg, _) => Some(secret(arg, "Plex API Token")?),
    };
    if let Some(token) = token {
        cred_store.set_plex_token(token);
    }

    if let Some(url) = server_url_arg {
        let url = url.trim().trim_end_matches('/').to_string();
        config.plex.server_url = if url.is_empty() { None } else { Some(url) };
    }
    if let Some(ids) = preferred_users {
        config.plex.preferred_home_user_ids = ids;
    }

    save(path_manager, &config, &cred_store)?;

    output.success("Plex configuration saved!");
    if let Some(url) = &config.plex.server_url {
        output.info(format!("  Server URL: {}", url));
    }
    Ok(())
}

fn configure_tmdb(
    path_manager: &PathManager,
    api_key_arg: Option<String>,
    language: Option<String>,
    output: &Output,
) -> Result<()> {
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let mut config = load_config(path_manager)?;
    let mut cred_store = load_credentials(path_manager)?;

    let keep_key = api_key_arg.is_none() && language.is_some() && cred_store.get_tmdb_api_key().is_some();
    if !keep_key {
        cred_store.set_tmdb_api_key(secret(api_key_arg, "TMDB API key")?);
    }
    if let Some(language) = language.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
        config.tmdb.language = language;
    }

    save(path_manager, &config, &cred_store)?;

    output.success("TMDB configuration saved!");
    output.info(format!("  Language: {}", config.tmdb.language));
    Ok(())
}
