//! # Enrollment Service 設定
//!
//! 環境変数からサーバーの設定を読み込む。

use std::env;

use enrollment_shared::observability::LogFormat;
use thiserror::Error;

/// 設定読み込みのエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 環境変数の値が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// 永続化バックエンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL（接続 URL を保持）
    Postgres { database_url: String },
    /// プロセス内のインメモリストア
    Memory,
}

/// Enrollment Service サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:       String,
    /// ポート番号
    pub port:       u16,
    /// 永続化バックエンド
    pub storage:    StorageBackend,
    /// ログ出力形式
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// `lookup` は変数名を受け取り、未設定なら `None` を返す。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("ENROLLMENT_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("ENROLLMENT_PORT").ok_or(ConfigError::Missing("ENROLLMENT_PORT"))?;
        let port = port.parse().map_err(|_| ConfigError::Invalid {
            name:  "ENROLLMENT_PORT",
            value: port.clone(),
        })?;

        let storage = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name:  "STORAGE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let log_format = match lookup("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(value) => LogFormat::from_name(&value).ok_or(ConfigError::Invalid {
                name: "LOG_FORMAT",
                value,
            })?,
        };

        Ok(Self {
            host,
            port,
            storage,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_未指定の項目はデフォルト値になる() {
        let config = load(&[
            ("ENROLLMENT_PORT", "3000"),
            ("DATABASE_URL", "postgres://localhost/enrollment"),
        ])
        .unwrap();

        assert_eq!(
            config,
            ServiceConfig {
                host:       "0.0.0.0".to_string(),
                port:       3000,
                storage:    StorageBackend::Postgres {
                    database_url: "postgres://localhost/enrollment".to_string(),
                },
                log_format: LogFormat::Pretty,
            }
        );
    }

    #[test]
    fn test_memoryバックエンドはdatabase_urlを要求しない() {
        let config = load(&[
            ("ENROLLMENT_HOST", "127.0.0.1"),
            ("ENROLLMENT_PORT", "8080"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_log_formatでjson出力を選べる() {
        let config = load(&[
            ("ENROLLMENT_PORT", "3000"),
            ("STORAGE_BACKEND", "memory"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[rstest]
    #[case(&[], ConfigError::Missing("ENROLLMENT_PORT"))]
    #[case(&[("ENROLLMENT_PORT", "3000")], ConfigError::Missing("DATABASE_URL"))]
    #[case(
        &[("ENROLLMENT_PORT", "port")],
        ConfigError::Invalid { name: "ENROLLMENT_PORT", value: "port".to_string() }
    )]
    #[case(
        &[("ENROLLMENT_PORT", "3000"), ("STORAGE_BACKEND", "redis")],
        ConfigError::Invalid { name: "STORAGE_BACKEND", value: "redis".to_string() }
    )]
    #[case(
        &[("ENROLLMENT_PORT", "3000"), ("STORAGE_BACKEND", "memory"), ("LOG_FORMAT", "xml")],
        ConfigError::Invalid { name: "LOG_FORMAT", value: "xml".to_string() }
    )]
    fn test_不正な設定はエラーになる(
        #[case] vars: &[(&str, &str)],
        #[case] expected: ConfigError,
    ) {
        assert_eq!(load(vars).unwrap_err(), expected);
    }
}
