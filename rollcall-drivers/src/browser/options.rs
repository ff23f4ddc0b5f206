use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::json;
use webdriver::capabilities::Capabilities;

/// How the Chrome session is launched.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub headless: bool,
    /// Persistent profile directory; keeps the chat client logged in across runs.
    pub session_dir: Option<PathBuf>,
    pub window_size: (u32, u32),
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            session_dir: None,
            window_size: (1200, 800),
        }
    }
}

/// Construct Chrome command-line arguments.
pub fn build_chrome_arguments(options: &BrowserOptions) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
    ];
    if let Some(dir) = &options.session_dir {
        args.push(format!("--user-data-dir={}", dir.display()));
    }
    if options.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
        args.push(format!(
            "--window-size={},{}",
            options.window_size.0, options.window_size.1
        ));
    } else {
        args.push("--start-maximized".to_string());
    }
    args
}

pub fn chrome_capabilities(options: &BrowserOptions) -> Capabilities {
    let mut caps = Capabilities::new();
    let mut chrome_opts = HashMap::new();
    chrome_opts.insert("args".to_string(), json!(build_chrome_arguments(options)));
    caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_gets_fixed_window() {
        let args = build_chrome_arguments(&BrowserOptions {
            headless: true,
            session_dir: Some(PathBuf::from("/tmp/rollcall-profile")),
            window_size: (1280, 720),
            ..BrowserOptions::default()
        });
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1280,720".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/rollcall-profile".to_string()));
        assert!(!args.contains(&"--start-maximized".to_string()));
    }

    #[test]
    fn headed_is_maximized_without_profile() {
        let args = build_chrome_arguments(&BrowserOptions::default());
        assert!(args.contains(&"--start-maximized".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--user-data-dir")));
    }

    #[test]
    fn capabilities_carry_chrome_args() {
        let caps = chrome_capabilities(&BrowserOptions::default());
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }
}
