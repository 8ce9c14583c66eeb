//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("YouTube Video Analyzer Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let sections: Vec<(&str, Vec<CheckResult>)> = vec![
        (
            "External Tools",
            vec![
                check_tool("yt-dlp", &settings.subtitles.binary, install_hint_ytdlp(), true),
                // yt-dlp solves YouTube's JS challenges through node when available.
                check_tool("node", "node", install_hint_node(), false),
            ],
        ),
        ("API Configuration", vec![check_api_key(&settings.llm.api_key_env)]),
        ("Subtitles", vec![check_cookies(settings.cookies_path().as_deref())]),
        ("Directories", vec![check_temp_dir(&settings.temp_dir())]),
        ("Configuration", vec![check_config_file()]),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running the analyzer.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! The analyzer is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available. `required` decides error vs warning.
fn check_tool(name: &str, command: &str, hint: &str, required: bool) -> CheckResult {
    let fail = |message: &str| {
        if required {
            CheckResult::error(name, message, hint)
        } else {
            CheckResult::warning(name, message, hint)
        }
    };

    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return fail("no command configured");
    };

    match Command::new(program).args(parts).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => fail("installed but not working"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => fail("not found"),
        Err(e) => fail(&format!("error: {}", e)),
    }
}

/// Check if the LLM API key is configured.
fn check_api_key(var: &str) -> CheckResult {
    let hint = format!("Set with: export {}='sk-or-...'", var);
    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Ok(key) => CheckResult::ok(var, &format!("configured ({})", mask_key(key.trim()))),
        Err(_) => CheckResult::error(var, "not set", &hint),
    }
}

/// Check the optional cookie file.
fn check_cookies(path: Option<&Path>) -> CheckResult {
    let hint = "Export cookies.txt from a signed-in browser to get past bot checks";
    match path {
        None => CheckResult::warning("Cookies", "not configured", hint),
        Some(p) if p.is_file() => CheckResult::ok("Cookies", &p.display().to_string()),
        Some(p) if p.is_dir() => CheckResult::warning(
            "Cookies",
            &format!("{} is a directory", p.display()),
            "Point YTDLP_COOKIES_PATH at the cookies.txt file itself",
        ),
        Some(p) => CheckResult::warning("Cookies", &format!("{} does not exist", p.display()), hint),
    }
}

/// Check the working directory root.
fn check_temp_dir(dir: &Path) -> CheckResult {
    if dir.is_dir() {
        CheckResult::ok("Temp directory", &dir.display().to_string())
    } else {
        CheckResult::warning(
            "Temp directory",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", config_path.display()),
        )
    }
}

/// Show only the first 7 and last 4 characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for node.
fn install_hint_node() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install node"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install nodejs (or your package manager)"
    } else {
        "Install from: https://nodejs.org"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_missing_optional_tool_is_warning() {
        let result = check_tool("ghost", "ytva-missing-tool", "install it", false);
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.message, "not found");

        let result = check_tool("ghost", "ytva-missing-tool", "install it", true);
        assert_eq!(result.status, CheckStatus::Error);
    }

    #[test]
    fn test_check_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cookies.txt");
        std::fs::write(&file, "# Netscape HTTP Cookie File\n").unwrap();

        assert_eq!(check_cookies(None).status, CheckStatus::Warning);
        assert_eq!(check_cookies(Some(&file)).status, CheckStatus::Ok);
        assert_eq!(check_cookies(Some(dir.path())).status, CheckStatus::Warning);
        assert_eq!(
            check_cookies(Some(&dir.path().join("missing.txt"))).status,
            CheckStatus::Warning
        );
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-or-v1-abcdefghijklmnop"), "sk-or-v...mnop");
        assert_eq!(mask_key("short"), "*****");
    }
}
