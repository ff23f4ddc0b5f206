//! Loader for `rollcall.yaml` with environment overlays.
//!
//! Sources are merged in order: the YAML file (or inline snippets), then
//! `ROLLCALL__SECTION__KEY` environment variables. String values may contain
//! `${VAR}` placeholders which are expanded recursively before the typed
//! structs are materialised and validated.
use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use rollcall_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const PLACEHOLDER_TOKEN: &str = "secret_xxx";
const PLACEHOLDER_PAGE_ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

#[derive(Debug, Deserialize)]
pub struct RollcallConfig {
    pub version: Option<String>,
    pub notion: NotionConfig,
    pub whatsapp: WhatsappConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct NotionConfig {
    pub token: String,
    pub parent_page_id: String,
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
}

#[derive(Debug, Deserialize)]
pub struct WhatsappConfig {
    pub group: String,
    #[serde(default = "default_whatsapp_url")]
    pub url: String,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
    #[serde(default = "default_open_group_retries")]
    pub open_group_retries: u32,
}

#[derive(Debug, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            session_path: default_session_path(),
            window_size: default_window_size(),
        }
    }
}

impl BrowserConfig {
    /// Absolute session directory, created on first use so the browser
    /// profile (and its login) survives restarts.
    pub fn resolved_session_path(&self) -> std::io::Result<PathBuf> {
        let path = if self.session_path.is_absolute() {
            self.session_path.clone()
        } else {
            std::env::current_dir()?.join(&self.session_path)
        };
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }
}

/// Weekday vocabulary used when matching date markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Tr,
    En,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_step_px")]
    pub step_px: i64,
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_fallback_recent")]
    pub fallback_recent: usize,
    #[serde(default)]
    pub locale: Locale,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            target_date: None,
            max_steps: default_max_steps(),
            step_px: default_step_px(),
            settle_timeout_ms: default_settle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            fallback_recent: default_fallback_recent(),
            locale: Locale::default(),
        }
    }
}

impl ExtractionConfig {
    /// The pinned target day, if one was configured. Validated at load time.
    pub fn target_day(&self) -> Option<NaiveDate> {
        self.target_date.as_deref().and_then(parse_day)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub stderr: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::default(),
            stderr: true,
            filter: default_log_filter(),
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

fn default_notion_api_base() -> String {
    "https://api.notion.com/v1/".into()
}
fn default_whatsapp_url() -> String {
    "https://web.whatsapp.com".into()
}
fn default_scan_interval_secs() -> u64 {
    5
}
fn default_login_timeout_secs() -> u64 {
    180
}
fn default_open_group_retries() -> u32 {
    3
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_session_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rollcall")
        .join("session")
}
fn default_window_size() -> (u32, u32) {
    (1200, 800)
}
fn default_max_steps() -> usize {
    50
}
fn default_step_px() -> i64 {
    2000
}
fn default_settle_timeout_ms() -> u64 {
    1500
}
fn default_poll_interval_ms() -> u64 {
    200
}
fn default_fallback_recent() -> usize {
    20
}
fn default_true() -> bool {
    true
}
fn default_log_filter() -> String {
    "info".into()
}

/// Parse a `dd.mm.yyyy` day; `-` and `/` separators are accepted too.
///
/// ```
/// use chrono::NaiveDate;
/// use rollcall_config::parse_day;
///
/// assert_eq!(parse_day("27.09.2025"), NaiveDate::from_ymd_opt(2025, 9, 27));
/// assert_eq!(parse_day(" 27/09/2025 "), NaiveDate::from_ymd_opt(2025, 9, 27));
/// assert_eq!(parse_day("2025-09-27"), None);
/// ```
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Message(msg.into())
}

impl RollcallConfig {
    /// Reject placeholder secrets and normalise identifiers copied from URLs.
    fn validate(mut self) -> Result<Self, ConfigError> {
        let token = self.notion.token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return Err(invalid("notion.token is empty or still the placeholder"));
        }

        let page_id = self.notion.parent_page_id.trim();
        let page_id = page_id.split('?').next().unwrap_or_default().trim();
        if page_id.is_empty() || page_id == PLACEHOLDER_PAGE_ID {
            return Err(invalid(
                "notion.parent_page_id is empty or still the placeholder",
            ));
        }
        self.notion.parent_page_id = page_id.to_string();

        if self.whatsapp.group.trim().is_empty() {
            return Err(invalid("whatsapp.group is empty"));
        }

        if let Some(raw) = self.extraction.target_date.as_deref() {
            if parse_day(raw).is_none() {
                return Err(invalid(format!(
                    "extraction.target_date '{raw}' is not a dd.mm.yyyy date"
                )));
            }
        }
        if self.extraction.max_steps == 0 {
            return Err(invalid("extraction.max_steps must be at least 1"));
        }
        if self.extraction.poll_interval_ms == 0 {
            return Err(invalid("extraction.poll_interval_ms must be positive"));
        }

        Ok(self)
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct RollcallConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for RollcallConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RollcallConfigLoader {
    /// Start with the environment overlay only (`ROLLCALL__SECTION__KEY`).
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (tests and the CLI use this).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use rollcall_config::{Locale, RollcallConfigLoader};
    ///
    /// let cfg = RollcallConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// notion:
    ///   token: "ntn_example"
    ///   parent_page_id: "1234abcd?pvs=4"
    /// whatsapp:
    ///   group: "Takip Grubu"
    /// extraction:
    ///   target_date: "27.09.2025"
    ///   locale: en
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.notion.parent_page_id, "1234abcd");
    /// assert_eq!(cfg.whatsapp.scan_interval_secs, 5);
    /// assert_eq!(cfg.extraction.max_steps, 50);
    /// assert_eq!(cfg.extraction.locale, Locale::En);
    /// assert!(cfg.extraction.target_day().is_some());
    /// ```
    pub fn load(self) -> Result<RollcallConfig, ConfigError> {
        // Environment goes last so it overrides file values.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("ROLLCALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: RollcallConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        typed.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINIMAL: &str = r#"
notion:
  token: "ntn_live"
  parent_page_id: "abc"
whatsapp:
  group: "Takip Grubu"
"#;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!({ "token": "X=${FOO}", "list": ["${BAZ}", 3] });
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!({ "token": "X=start-mid-qux-end", "list": ["qux", 3] })
                );
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_ROLLCALL}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_ROLLCALL}"));
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let cfg = RollcallConfigLoader::new()
            .with_yaml_str(MINIMAL)
            .load()
            .unwrap();
        assert_eq!(cfg.browser.webdriver_url, "http://localhost:9515");
        assert_eq!(cfg.browser.window_size, (1200, 800));
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.extraction.step_px, 2000);
        assert_eq!(cfg.extraction.fallback_recent, 20);
        assert_eq!(cfg.logging.filter, "info");
        assert_eq!(cfg.notion.api_base, "https://api.notion.com/v1/");
        assert!(cfg.extraction.target_day().is_none());
    }

    #[test]
    fn placeholder_token_is_rejected() {
        let err = RollcallConfigLoader::new()
            .with_yaml_str(&MINIMAL.replace("ntn_live", PLACEHOLDER_TOKEN))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("notion.token"));
    }

    #[test]
    fn blank_group_is_rejected() {
        let err = RollcallConfigLoader::new()
            .with_yaml_str(&MINIMAL.replace("Takip Grubu", "  "))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("whatsapp.group"));
    }

    #[test]
    fn malformed_target_date_is_rejected() {
        let yaml = format!("{MINIMAL}extraction:\n  target_date: \"2025-09-27\"\n");
        let err = RollcallConfigLoader::new()
            .with_yaml_str(&yaml)
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("target_date"));
    }

    #[test]
    fn parse_day_accepts_three_separators() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 27);
        assert_eq!(parse_day("27.09.2025"), expected);
        assert_eq!(parse_day("27-09-2025"), expected);
        assert_eq!(parse_day("27/09/2025"), expected);
        assert_eq!(parse_day("31.02.2025"), None);
    }
}
