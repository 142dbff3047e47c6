// src/error.rs
//! Ошибки конвертации
//!
//! Отсутствующие ссылки (удалённые провинции, поселения, культуры) ошибками не считаются:
//! такие единицы пропускаются с предупреждением в журнале. Сюда попадают только ошибки
//! конфигурации, ввода-вывода и нарушения структурных инвариантов.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Некорректные параметры; сообщается до начала разбиения
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("County '{county}' of state {state} is not connected")]
    DisconnectedCounty { state: u32, county: String },

    #[error("State {state} produced a county without baronies")]
    EmptyCounty { state: u32 },

    /// Графства штата не покрывают его провинции ровно один раз
    #[error("Counties of state {state} cover {found} provinces, expected {expected}")]
    PartitionCoverage {
        state: u32,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
