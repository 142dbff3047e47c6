// src/config.rs
//! Конфигурация конвертации
//!
//! Этот модуль определяет все параметры, управляющие построением иерархии титулов:
//! - Пороги разбиения штатов на графства
//! - Нарезка морских и бесхозных клеток на провинции
//! - Вероятности появления правителей на каждом ранге
//! - Пулы имён культур и религий для перемешивания
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Пороги сбалансированного разбиения
///
/// Чем больше население штата, тем меньше графств: густонаселённые земли
/// делятся на `min_parts`, пустынные — на `max_parts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionSettings {
    /// Население, ниже которого штат делится на `max_parts` графств
    #[serde(default = "default_low_pop")]
    pub low_pop: u32,

    /// Население, выше которого штат делится на `min_parts` графств
    #[serde(default = "default_high_pop")]
    pub high_pop: u32,

    #[serde(default = "default_min_parts")]
    pub min_parts: usize,

    #[serde(default = "default_max_parts")]
    pub max_parts: usize,
}

fn default_low_pop() -> u32 {
    1000
}
fn default_high_pop() -> u32 {
    20000
}
fn default_min_parts() -> usize {
    2
}
fn default_max_parts() -> usize {
    4
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            low_pop: 1000,
            high_pop: 20000,
            min_parts: 2,
            max_parts: 4,
        }
    }
}

/// Настройки синтеза морских провинций
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterSettings {
    /// Высота клетки, ниже которой она считается водной (шкала 0–100)
    #[serde(default = "default_sea_height")]
    pub sea_height: u8,

    /// Делитель общей площади пула: целевая площадь провинции не меньше `площадь / area_divisor`
    #[serde(default = "default_area_divisor")]
    pub area_divisor: f64,
}

fn default_sea_height() -> u8 {
    20
}
fn default_area_divisor() -> f64 {
    128.0
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            sea_height: 20,
            area_divisor: 128.0,
        }
    }
}

/// Вероятности и лимиты генератора правителей
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessionSettings {
    #[serde(default = "default_empire_chance")]
    pub empire_chance: f64,

    #[serde(default = "default_kingdom_chance")]
    pub kingdom_chance: f64,

    #[serde(default = "default_duchy_chance")]
    pub duchy_chance: f64,

    /// Базовая вероятность отдельного графа; к ней прибавляется взвешенная «загрузка» сюзеренов
    #[serde(default = "default_county_base_chance")]
    pub county_base_chance: f64,

    /// Веса загрузки по рангам: `[графство, герцогство, королевство, империя]`
    #[serde(default = "default_tier_weights")]
    pub tier_weights: [f64; 4],

    /// Лимит владений: `stewardship / 6 + base_limit`
    #[serde(default = "default_base_limit")]
    pub base_limit: u32,

    /// Порог принятия вассала непосредственным герцогом
    #[serde(default = "default_direct_liege_threshold")]
    pub direct_liege_threshold: f64,

    /// Порог принятия вассала через ранг (королём или императором)
    #[serde(default = "default_distant_liege_threshold")]
    pub distant_liege_threshold: f64,

    #[serde(default = "default_min_age")]
    pub min_age: u32,

    #[serde(default = "default_max_age")]
    pub max_age: u32,

    #[serde(default = "default_max_stewardship")]
    pub max_stewardship: u32,
}

fn default_empire_chance() -> f64 {
    0.1
}
fn default_kingdom_chance() -> f64 {
    0.3
}
fn default_duchy_chance() -> f64 {
    0.6
}
fn default_county_base_chance() -> f64 {
    0.2
}
fn default_tier_weights() -> [f64; 4] {
    [0.4, 0.3, 0.2, 0.1]
}
fn default_base_limit() -> u32 {
    3
}
fn default_direct_liege_threshold() -> f64 {
    0.51
}
fn default_distant_liege_threshold() -> f64 {
    0.81
}
fn default_min_age() -> u32 {
    18
}
fn default_max_age() -> u32 {
    60
}
fn default_max_stewardship() -> u32 {
    20
}

impl Default for SuccessionSettings {
    fn default() -> Self {
        Self {
            empire_chance: 0.1,
            kingdom_chance: 0.3,
            duchy_chance: 0.6,
            county_base_chance: 0.2,
            tier_weights: [0.4, 0.3, 0.2, 0.1],
            base_limit: 3,
            direct_liege_threshold: 0.51,
            distant_liege_threshold: 0.81,
            min_age: 18,
            max_age: 60,
            max_stewardship: 20,
        }
    }
}

/// Целевые имена культур и религий
///
/// Пустой пул означает «оставить исходные имена из набора данных».
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NameSettings {
    #[serde(default)]
    pub cultures: Vec<String>,

    #[serde(default)]
    pub religions: Vec<String>,
}

/// Основные параметры конвертации
///
/// Полная конфигурация одного прогона. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    pub seed: u64,

    #[serde(default)]
    pub partition: PartitionSettings,

    #[serde(default)]
    pub water: WaterSettings,

    #[serde(default)]
    pub succession: SuccessionSettings,

    #[serde(default)]
    pub names: NameSettings,
}

impl ConverterParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # realm.toml
    /// seed = 42
    ///
    /// [partition]
    /// min_parts = 2
    /// max_parts = 5
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Разбирает параметры из строки TOML и сразу проверяет их
    ///
    /// ```
    /// use realmgen::ConverterParams;
    /// let params = ConverterParams::from_toml_str("seed = 7").unwrap();
    /// assert_eq!(params.seed, 7);
    /// assert_eq!(params.partition.min_parts, 2);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let params: Self = toml::from_str(contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Проверяет согласованность параметров до запуска конвейера
    pub fn validate(&self) -> Result<()> {
        let p = &self.partition;
        if p.min_parts == 0 {
            return Err(ConvertError::InvalidConfig(
                "partition.min_parts must be at least 1".into(),
            ));
        }
        if p.max_parts < p.min_parts {
            return Err(ConvertError::InvalidConfig(format!(
                "partition.max_parts ({}) is less than min_parts ({})",
                p.max_parts, p.min_parts
            )));
        }
        if p.high_pop <= p.low_pop {
            return Err(ConvertError::InvalidConfig(format!(
                "partition.high_pop ({}) must exceed low_pop ({})",
                p.high_pop, p.low_pop
            )));
        }
        if self.water.area_divisor.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return Err(ConvertError::InvalidConfig(
                "water.area_divisor must be positive".into(),
            ));
        }

        let s = &self.succession;
        let chances = [
            ("empire_chance", s.empire_chance),
            ("kingdom_chance", s.kingdom_chance),
            ("duchy_chance", s.duchy_chance),
            ("county_base_chance", s.county_base_chance),
            ("direct_liege_threshold", s.direct_liege_threshold),
            ("distant_liege_threshold", s.distant_liege_threshold),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConvertError::InvalidConfig(format!(
                    "succession.{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if s.tier_weights.iter().any(|w| *w < 0.0) {
            return Err(ConvertError::InvalidConfig(
                "succession.tier_weights must be non-negative".into(),
            ));
        }
        if s.base_limit == 0 {
            return Err(ConvertError::InvalidConfig(
                "succession.base_limit must be at least 1".into(),
            ));
        }
        if s.min_age > s.max_age {
            return Err(ConvertError::InvalidConfig(format!(
                "succession.min_age ({}) exceeds max_age ({})",
                s.min_age, s.max_age
            )));
        }
        Ok(())
    }
}

impl Default for ConverterParams {
    fn default() -> Self {
        Self {
            seed: 0,
            partition: PartitionSettings::default(),
            water: WaterSettings::default(),
            succession: SuccessionSettings::default(),
            names: NameSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConverterParams::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let params = ConverterParams::from_toml_str(
            r#"
            seed = 99

            [partition]
            max_parts = 6

            [names]
            cultures = ["norse", "saxon"]
            "#,
        )
        .unwrap();

        assert_eq!(params.seed, 99);
        assert_eq!(params.partition.max_parts, 6);
        assert_eq!(params.partition.low_pop, 1000);
        assert_eq!(params.names.cultures.len(), 2);
        assert!(params.names.religions.is_empty());
        assert_eq!(params.succession, SuccessionSettings::default());
    }

    #[test]
    fn test_rejects_inverted_part_bounds() {
        let err = ConverterParams::from_toml_str(
            r"
            seed = 1
            [partition]
            min_parts = 5
            max_parts = 2
            ",
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_min_parts() {
        let mut params = ConverterParams::default();
        params.partition.min_parts = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_population_window() {
        let mut params = ConverterParams::default();
        params.partition.high_pop = params.partition.low_pop;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_chance() {
        let mut params = ConverterParams::default();
        params.succession.kingdom_chance = 1.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_missing_seed_is_parse_error() {
        let err = ConverterParams::from_toml_str("[partition]\nmin_parts = 1").unwrap_err();
        assert!(matches!(err, ConvertError::Toml(_)));
    }
}
