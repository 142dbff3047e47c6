// src/cell.rs
//! Таблица клеток
//!
//! Нормализует сырые записи клеток в индексированную таблицу: клетки упорядочены по id,
//! соседи хранятся индексами в таблице, висячие ссылки на несуществующие клетки отброшены.

use std::collections::HashMap;

use serde::Serialize;

use crate::dataset::RawCell;

#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub id: u32,
    pub height: u8,
    pub area: f64,
    pub culture: u32,
    pub religion: u32,
    /// Индексы соседних клеток в `CellTable::cells`, в исходном порядке
    pub neighbors: Vec<usize>,
    pub province: u32,
    pub state: u32,
    pub settlement: u32,
    pub is_water: bool,
    pub polygon: Vec<[f32; 2]>,
    pub centroid: (f32, f32),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CellTable {
    pub cells: Vec<Cell>,
}

impl CellTable {
    /// Упаковывает сырые клетки; дубликаты id отбрасываются (побеждает первая запись)
    #[must_use]
    pub fn repack(raw: &[RawCell], sea_height: u8) -> Self {
        let mut order: Vec<&RawCell> = raw.iter().collect();
        order.sort_by_key(|c| c.id);

        let mut index = HashMap::with_capacity(order.len());
        let mut kept: Vec<&RawCell> = Vec::with_capacity(order.len());
        for cell in order {
            if index.contains_key(&cell.id) {
                tracing::warn!("Повторный id клетки {}, запись пропущена", cell.id);
                continue;
            }
            index.insert(cell.id, kept.len());
            kept.push(cell);
        }

        let mut dangling = 0usize;
        let cells = kept
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let mut neighbors = Vec::with_capacity(raw.neighbors.len());
                for nid in &raw.neighbors {
                    match index.get(nid) {
                        Some(&n) if n != idx && !neighbors.contains(&n) => neighbors.push(n),
                        Some(_) => {}
                        None => dangling += 1,
                    }
                }
                Cell {
                    id: raw.id,
                    height: raw.height,
                    area: raw.area,
                    culture: raw.culture,
                    religion: raw.religion,
                    neighbors,
                    province: raw.province,
                    state: raw.state,
                    settlement: raw.settlement,
                    is_water: raw.height < sea_height,
                    polygon: raw.polygon.clone(),
                    centroid: centroid(&raw.polygon),
                }
            })
            .collect();

        if dangling > 0 {
            tracing::debug!("Отброшено {} ссылок на несуществующих соседей", dangling);
        }

        Self { cells }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn centroid(polygon: &[[f32; 2]]) -> (f32, f32) {
    if polygon.is_empty() {
        return (0.0, 0.0);
    }
    let n = polygon.len() as f32;
    let (sx, sy) = polygon
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    (sx / n, sy / n)
}
