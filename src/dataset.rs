// src/dataset.rs
//! Исходный набор данных карты
//!
//! Экспорт генератора карт: клетки Вороного и таблицы метаданных провинций,
//! государств, поселений, культур и религий. Все таблицы адресуются целочисленным id;
//! записи с `removed = true` удалены вручную и считаются отсутствующими.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Сырая запись клетки в том виде, в каком её выгружает генератор карт
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCell {
    pub id: u32,
    /// Высота по шкале 0–100, вода ниже `water.sea_height`
    pub height: u8,
    pub area: f64,
    #[serde(default)]
    pub culture: u32,
    #[serde(default)]
    pub religion: u32,
    #[serde(default)]
    pub neighbors: Vec<u32>,
    /// 0 — клетка не принадлежит ни одной провинции
    #[serde(default)]
    pub province: u32,
    #[serde(default)]
    pub state: u32,
    /// 0 — в клетке нет поселения
    #[serde(default)]
    pub settlement: u32,
    #[serde(default)]
    pub polygon: Vec<[f32; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceMeta {
    pub id: u32,
    pub name: String,
    /// Цвет в формате `"#rrggbb"`
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub state: u32,
    /// Поселение-центр провинции (0 — нет)
    #[serde(default)]
    pub settlement: u32,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMeta {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementMeta {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub population: u32,
    /// Столица государства
    #[serde(default)]
    pub capital: bool,
    #[serde(default)]
    pub removed: bool,
}

/// Культура или религия: у обеих в наборе данных только id и имя
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedMeta {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapDataset {
    pub cells: Vec<RawCell>,
    #[serde(default)]
    pub provinces: Vec<ProvinceMeta>,
    #[serde(default)]
    pub states: Vec<StateMeta>,
    #[serde(default)]
    pub settlements: Vec<SettlementMeta>,
    #[serde(default)]
    pub cultures: Vec<NamedMeta>,
    #[serde(default)]
    pub religions: Vec<NamedMeta>,
}

impl MapDataset {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Индексы метаданных по id; удалённые записи в индекс не попадают
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub provinces: HashMap<u32, ProvinceMeta>,
    pub states: HashMap<u32, StateMeta>,
    pub settlements: HashMap<u32, SettlementMeta>,
    pub cultures: HashMap<u32, NamedMeta>,
    pub religions: HashMap<u32, NamedMeta>,
}

impl Metadata {
    #[must_use]
    pub fn from_dataset(dataset: &MapDataset) -> Self {
        Self {
            provinces: live(&dataset.provinces, |p| (p.id, p.removed)),
            states: live(&dataset.states, |s| (s.id, s.removed)),
            settlements: live(&dataset.settlements, |s| (s.id, s.removed)),
            cultures: live(&dataset.cultures, |c| (c.id, c.removed)),
            religions: live(&dataset.religions, |r| (r.id, r.removed)),
        }
    }

    /// Живое поселение по id; 0 и удалённые дают `None`
    #[must_use]
    pub fn settlement(&self, id: u32) -> Option<&SettlementMeta> {
        if id == 0 {
            return None;
        }
        self.settlements.get(&id)
    }

    #[must_use]
    pub fn state_name(&self, id: u32) -> String {
        self.states
            .get(&id)
            .map_or_else(|| format!("State_{id}"), |s| s.name.clone())
    }
}

fn live<T: Clone>(items: &[T], key: impl Fn(&T) -> (u32, bool)) -> HashMap<u32, T> {
    items
        .iter()
        .filter_map(|item| {
            let (id, removed) = key(item);
            (!removed).then(|| (id, item.clone()))
        })
        .collect()
}
