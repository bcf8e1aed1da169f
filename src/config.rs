use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{GridZoomError, GridZoomResult};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub active_provider: String,
    pub providers: HashMap<String, ProviderEntry>,
    #[serde(default)]
    pub roles: RolesConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderEntry {
                display_name: "OpenAI".to_string(),
                api_base: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o".to_string(),
                temperature: default_temperature(),
                max_tokens: default_max_tokens(),
                json_mode: true,
                api_key: None,
                api_key_env: Some("OPENAI_API_KEY".to_string()),
            },
        );
        Self {
            active_provider: "openai".to_string(),
            providers,
            roles: RolesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub display_name: String,
    /// Full URL of the OpenAI-compatible `chat/completions` endpoint.
    pub api_base: String,
    /// Default model for this provider (used when no vision role is configured).
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request `response_format: json_object`.
    #[serde(default = "default_true")]
    pub json_mode: bool,
    /// Optional API key stored in config.toml (lowest precedence).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Extra environment variable consulted after `GRIDZOOM_<ID>_API_KEY`.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Maps agent roles to specific provider+model combinations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RolesConfig {
    /// Vision / image-understanding model that picks grid cells.
    pub vision: Option<RoleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Must match a key under [llm.providers.*].
    pub provider: String,
    pub model: String,
    /// Overrides the provider-level temperature for this role.
    pub temperature: Option<f64>,
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    500
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_grid_size")]
    pub size: u32,
    /// RGB colour of grid lines and cell numbers.
    #[serde(default = "default_grid_color")]
    pub color: [u8; 3],
    #[serde(default = "default_line_width")]
    pub line_width: u32,
    /// Glyph height as a fraction of the cell height.
    #[serde(default = "default_font_factor")]
    pub font_factor: f32,
    /// Used when the label does not fit at `font_factor`.
    #[serde(default = "default_font_fallback_factor")]
    pub font_fallback_factor: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
            color: default_grid_color(),
            line_width: default_line_width(),
            font_factor: default_font_factor(),
            font_fallback_factor: default_font_fallback_factor(),
        }
    }
}

fn default_grid_size() -> u32 {
    2
}

fn default_grid_color() -> [u8; 3] {
    [255, 0, 0]
}

fn default_line_width() -> u32 {
    2
}

fn default_font_factor() -> f32 {
    0.5
}

fn default_font_fallback_factor() -> f32 {
    0.25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_goal")]
    pub goal: String,
    /// Pause after every OS-affecting action before the next capture.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,
    /// Smallest cell edge (capture pixels) the controller will zoom into.
    #[serde(default = "default_min_cell_px")]
    pub min_cell_px: u32,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub max_duration_minutes: Option<u32>,
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
    /// Directory for `grid-image-<n>.png` debug snapshots. Disabled when unset.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub record_history: bool,
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            settle_ms: default_settle_ms(),
            move_duration_ms: default_move_duration_ms(),
            min_cell_px: default_min_cell_px(),
            max_iterations: None,
            max_duration_minutes: None,
            max_consecutive_failures: default_max_failures(),
            snapshot_dir: None,
            record_history: true,
            history_dir: None,
        }
    }
}

fn default_goal() -> String {
    "Open safari".to_string()
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_move_duration_ms() -> u64 {
    500
}

fn default_min_cell_px() -> u32 {
    4
}

fn default_max_failures() -> u32 {
    5
}

impl AppConfig {
    /// Reject values the controller cannot work with.
    pub fn validate(&self) -> GridZoomResult<()> {
        if self.grid.size < 2 {
            return Err(GridZoomError::Config(format!(
                "grid.size must be at least 2 (got {})",
                self.grid.size
            )));
        }
        if self.grid.line_width == 0 {
            return Err(GridZoomError::Config("grid.line_width must be positive".into()));
        }
        if self.session.min_cell_px == 0 {
            return Err(GridZoomError::Config("session.min_cell_px must be at least 1".into()));
        }
        if !self.llm.providers.contains_key(&self.llm.active_provider) {
            return Err(GridZoomError::Config(format!(
                "active provider '{}' is not defined under [llm.providers]",
                self.llm.active_provider
            )));
        }
        Ok(())
    }
}

fn resolve_config_path() -> GridZoomResult<Option<PathBuf>> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(Some(candidate));
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE_NAME);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(Some(candidate));
    }

    Ok(None)
}

/// Load config from an explicit path, or from the usual locations.
/// Falls back to built-in defaults when no file is found in the usual locations.
///
/// Not validated: command-line overrides are applied first, then the caller
/// runs [`AppConfig::validate`].
pub fn load_config(explicit: Option<&Path>) -> GridZoomResult<AppConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => resolve_config_path()?,
    };

    let config = match path {
        Some(path) => {
            let config = load_config_from(&path)?;
            tracing::info!(path = %path.display(), provider = %config.llm.active_provider, "config loaded");
            config
        }
        None => {
            tracing::info!("no config.toml found; using built-in defaults");
            AppConfig::default()
        }
    };
    Ok(config)
}

pub fn load_config_from(path: &Path) -> GridZoomResult<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GridZoomError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}
