//! Application configuration module / アプリ設定モジュール
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 初回起動時にデフォルト設定を作成

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Global configuration instance / グローバル設定インスタンス
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / アプリ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / サーバ設定
    pub server: ServerConfig,
    /// Database configuration / データベース設定
    pub database: DatabaseConfig,
    /// Search configuration / 検索設定
    pub search: SearchConfig,
}

/// Server configuration / サーバ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 待ち受けアドレス
    pub host: String,
    /// Server port / ポート
    pub port: u16,
}

/// Database configuration / データベース設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Data directory path / データディレクトリ
    pub data_dir: String,
    /// Main database file path (relative to data_dir) / DBファイル名
    pub db_file: String,
}

/// Search configuration / 検索設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default page size when a request omits it / デフォルト件数
    pub default_page_size: u32,
    /// Hard upper bound on the page size / 件数上限
    pub max_page_size: u32,
    /// Default radius for "near me" search in km / デフォルト半径(km)
    pub default_radius_km: f64,
    /// Dedup window for search-history recording / 検索履歴の重複排除窓(分)
    pub history_ttl_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8280,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            db_file: "archimap.db".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            default_radius_km: 5.0,
            history_ttl_minutes: 60,
        }
    }
}

impl AppConfig {
    /// Get the full database URL / データベースURLを取得
    pub fn get_database_url(&self) -> String {
        let db_path = Path::new(&self.database.data_dir).join(&self.database.db_file);
        format!("sqlite:{}?mode=rwc", db_path.to_string_lossy())
    }

    /// Get the full data directory path / データディレクトリを取得
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.database.data_dir)
    }

    /// Get the server bind address / バインドアドレスを取得
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 設定ファイルパスを取得
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 設定を読み込み
pub fn load_config() -> Result<AppConfig, String> {
    let config_path = get_config_path();

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(&config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 設定を保存
pub fn save_config(config: &AppConfig) -> Result<(), String> {
    let config_path = get_config_path();

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

/// Initialize global configuration / グローバル設定を初期化
pub fn init_config() -> Result<Arc<RwLock<AppConfig>>, String> {
    let config = load_config()?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG
        .set(config_arc.clone())
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(config_arc)
}

/// Get global configuration instance / グローバル設定を取得
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG
        .get_or_init(|| Arc::new(RwLock::new(AppConfig::default())))
        .clone()
}

/// Get a read-only snapshot of current config / 現在の設定スナップショット
pub fn config() -> AppConfig {
    get_config().read().clone()
}
