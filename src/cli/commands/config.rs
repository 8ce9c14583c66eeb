//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", render_settings(&settings)?);
        }

        ConfigAction::Path => {
            let path = match config_path {
                Some(p) => Settings::expand_path(p),
                None => Settings::default_config_path(),
            };
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Effective configuration as TOML, after environment overrides.
fn render_settings(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_settings_round_trips() {
        let mut settings = Settings::default();
        settings.subtitles.sub_langs = "de".to_string();

        let rendered = render_settings(&settings).unwrap();
        assert!(rendered.contains("[subtitles]"));

        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.subtitles.sub_langs, "de");
        assert_eq!(parsed.server.port, settings.server.port);
    }
}
