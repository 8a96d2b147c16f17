mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use autoinstaller_core::config::AppConfig;
use autoinstaller_core::{InstallOptions, PanelTarget, Scheme};

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // One install at a time, a small runtime is plenty
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;
    apply_env_overrides(&mut config);

    match cli.command {
        Commands::Install {
            panel,
            host,
            port,
            username,
            password,
            api_key,
            domain,
            script,
            directory,
            admin_name,
            admin_pass,
            admin_email,
            http,
        } => {
            let target = PanelTarget {
                kind: panel,
                scheme: if http { Scheme::Http } else { Scheme::Https },
                host,
                port,
                username,
                password,
                api_key,
                domain,
            };
            let options = InstallOptions {
                script,
                directory,
                admin_username: admin_name,
                admin_password: admin_pass,
                admin_email,
            };
            commands::install::run(config, target, options).await?;
        }
        Commands::Dispatch { event } => {
            commands::dispatch::run(config, &event).await?;
        }
        Commands::Scripts { name } => {
            commands::scripts::run(config, name).await?;
        }
    }

    Ok(())
}

fn apply_env_overrides(config: &mut AppConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

fn apply_overrides(config: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("AUTOINSTALL_VERIFY_TLS") {
        config.http.verify_tls = v != "0" && v.to_lowercase() != "false";
    }
    if let Some(v) = var("AUTOINSTALL_CATALOG_URL") {
        if !v.trim().is_empty() {
            config.catalog.url = v.trim().to_string();
        }
    }
    if let Some(v) = var("AUTOINSTALL_TIMEOUT") {
        match v.parse::<u64>() {
            Ok(secs) if secs > 0 => config.http.request_timeout_seconds = secs,
            _ => warn!(value = %v, "ignoring invalid AUTOINSTALL_TIMEOUT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overridden(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = AppConfig::default();
        apply_overrides(&mut config, |name| vars.get(name).cloned());
        config
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let config = overridden(&[]);
        assert!(!config.http.verify_tls);
        assert_eq!(config.http.request_timeout_seconds, 120);
        assert!(config.catalog.url.starts_with("https://api.softaculous.com/"));
    }

    #[test]
    fn test_overrides_apply() {
        let config = overridden(&[
            ("AUTOINSTALL_VERIFY_TLS", "1"),
            ("AUTOINSTALL_CATALOG_URL", " http://mirror.local/scripts.php "),
            ("AUTOINSTALL_TIMEOUT", "30"),
        ]);
        assert!(config.http.verify_tls);
        assert_eq!(config.catalog.url, "http://mirror.local/scripts.php");
        assert_eq!(config.http.request_timeout_seconds, 30);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let config = overridden(&[
            ("AUTOINSTALL_VERIFY_TLS", "FALSE"),
            ("AUTOINSTALL_CATALOG_URL", "   "),
            ("AUTOINSTALL_TIMEOUT", "0"),
        ]);
        assert!(!config.http.verify_tls);
        assert!(config.catalog.url.starts_with("https://api.softaculous.com/"));
        assert_eq!(config.http.request_timeout_seconds, 120);

        let config = overridden(&[
            ("AUTOINSTALL_TIMEOUT", "soon"),
            ("AUTOINSTALL_VERIFY_TLS", "0"),
        ]);
        assert_eq!(config.http.request_timeout_seconds, 120);
        assert!(!config.http.verify_tls);
    }
}
