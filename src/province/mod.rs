pub mod adjacency;
pub mod color;
pub mod graph;
pub mod hanging;
pub mod land;
pub mod water;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::CellTable;
use crate::config::WaterSettings;
use crate::dataset::Metadata;
use color::ColorAllocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvinceKind {
    /// Провинция из исходных данных, будущая баронство
    Land,
    /// Синтезированная водная провинция
    Sea,
    /// Синтезированная суша без провинции и государства
    Wasteland,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    /// Итоговый id, совпадает с индексом в `ProvinceTable::provinces`
    pub id: u32,
    /// id провинции в исходном наборе данных (`None` у синтезированных)
    pub source_id: Option<u32>,
    pub name: String,
    pub color: String, // "#rrggbb"
    #[serde(rename = "type")]
    pub kind: ProvinceKind,
    /// 0 у синтезированных провинций
    pub state: u32,
    pub settlement: u32,
    /// Население поселения, либо число клеток, если поселения нет
    pub population: u32,
    /// Поселение провинции — столица государства
    pub is_capital: bool,
    pub coastal: bool,
    pub center: (f32, f32),
    pub area: f64,
    /// Индексы клеток в `CellTable::cells`
    pub cells: Vec<usize>,
    /// Соседи в том же государстве (индексы провинций), по возрастанию
    pub neighbors: Vec<usize>,
}

impl Province {
    fn sentinel() -> Self {
        Self {
            id: 0,
            source_id: None,
            name: String::new(),
            color: "#000000".to_string(),
            kind: ProvinceKind::Wasteland,
            state: 0,
            settlement: 0,
            population: 0,
            is_capital: false,
            coastal: false,
            center: (0.0, 0.0),
            area: 0.0,
            cells: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_water(&self) -> bool {
        self.kind == ProvinceKind::Sea
    }

    /// Только исходные сухопутные провинции становятся баронствами
    #[must_use]
    pub fn is_titled(&self) -> bool {
        self.kind == ProvinceKind::Land
    }

    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.kind != ProvinceKind::Land
    }
}

/// Итоговый массив провинций; индекс 0 — служебная «нет провинции»
#[derive(Debug, Clone, Serialize)]
pub struct ProvinceTable {
    pub provinces: Vec<Province>,
    /// Исходный id провинции → индекс
    pub by_source: BTreeMap<u32, usize>,
    /// Индекс клетки → индекс провинции (0 — клетка удалена)
    #[serde(skip)]
    pub cell_owner: Vec<usize>,
}

impl ProvinceTable {
    /// Провинция по исходному id. Отсутствующий id — «не существует», а не ошибка.
    #[must_use]
    pub fn by_source_id(&self, source_id: u32) -> Option<&Province> {
        match self.by_source.get(&source_id) {
            Some(&0) | None => None,
            Some(&idx) => self.provinces.get(idx),
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Province> {
        if index == 0 {
            return None;
        }
        self.provinces.get(index)
    }

    /// Все провинции без служебной
    pub fn iter(&self) -> impl Iterator<Item = &Province> {
        self.provinces.iter().skip(1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.provinces.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Что было отброшено при сборке провинций
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyReport {
    /// Исходные id провинций, выброшенных из-за отсутствующих метаданных или поселения
    pub skipped_provinces: Vec<u32>,
    /// Исходные id провинций, оставшихся без клеток после починки висячих клеток
    pub emptied_provinces: Vec<u32>,
    pub transferred_cells: usize,
    /// id удалённых одиночных клеток
    pub deleted_cells: Vec<u32>,
}

/// Собирает итоговый массив провинций из таблицы клеток
///
/// Порядок: сухопутные группы → синтез морских и пустошных провинций из пула → починка
/// висячих клеток → удаление опустевших провинций → финализация id, цветов и центров →
/// соседство внутри государств.
#[must_use]
pub fn assemble_provinces(
    cells: &CellTable,
    meta: &Metadata,
    water: &WaterSettings,
) -> (ProvinceTable, AssemblyReport) {
    let mut report = AssemblyReport::default();

    let grouping = land::group_land_provinces(cells, meta);
    report.skipped_provinces = grouping.skipped;
    let mut provinces = grouping.provinces;

    provinces.extend(water::synthesize_pool_provinces(cells, &grouping.pool, water));

    let repair = hanging::repair_hanging_cells(&mut provinces, cells);
    report.transferred_cells = repair.transferred;
    report.deleted_cells = repair.deleted.iter().map(|&c| cells.cells[c].id).collect();

    provinces.retain(|p| {
        if p.cells.is_empty() {
            tracing::warn!(
                "Провинция {} ({}) осталась без клеток и удалена",
                p.source_id.unwrap_or(0),
                p.name
            );
            report.emptied_provinces.extend(p.source_id);
            false
        } else {
            true
        }
    });

    let mut table = finalize(provinces, cells);
    adjacency::derive_adjacency(&mut table, cells);

    tracing::info!(
        "Провинции собраны: {} сухопутных, {} синтезированных, пропущено {}, удалено клеток {}",
        table.iter().filter(|p| p.is_titled()).count(),
        table.iter().filter(|p| p.is_synthesized()).count(),
        report.skipped_provinces.len() + report.emptied_provinces.len(),
        report.deleted_cells.len()
    );

    (table, report)
}

/// Присваивает итоговые id по порядку, цвета, площади и центры
fn finalize(provinces: Vec<Province>, cells: &CellTable) -> ProvinceTable {
    let mut colors = ColorAllocator::new();
    let mut cell_owner = vec![0usize; cells.len()];
    let mut by_source = BTreeMap::new();
    let mut all = Vec::with_capacity(provinces.len() + 1);
    all.push(Province::sentinel());

    for mut province in provinces {
        let idx = all.len();
        province.id = idx as u32;
        let preferred = (!province.is_synthesized()).then_some(province.color.as_str());
        province.color = colors.assign(preferred);

        let mut area = 0.0;
        let (mut cx, mut cy) = (0.0f64, 0.0f64);
        for &c in &province.cells {
            let cell = &cells.cells[c];
            cell_owner[c] = idx;
            area += cell.area;
            cx += f64::from(cell.centroid.0) * cell.area;
            cy += f64::from(cell.centroid.1) * cell.area;
        }
        province.area = area;
        if area > 0.0 {
            province.center = ((cx / area) as f32, (cy / area) as f32);
        }

        if let Some(source) = province.source_id {
            by_source.insert(source, idx);
        }
        all.push(province);
    }

    ProvinceTable {
        provinces: all,
        by_source,
        cell_owner,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Небольшие карты-сетки для тестов сборки провинций

    use crate::dataset::{MapDataset, ProvinceMeta, RawCell, SettlementMeta, StateMeta};

    /// Квадратная клетка сетки `width` в строке `row`, столбце `col`
    pub fn grid_cell(width: u32, height: u32, row: u32, col: u32) -> RawCell {
        let id = row * width + col + 1;
        let mut neighbors = Vec::new();
        if col > 0 {
            neighbors.push(id - 1);
        }
        if col + 1 < width {
            neighbors.push(id + 1);
        }
        if row > 0 {
            neighbors.push(id - width);
        }
        if row + 1 < height {
            neighbors.push(id + width);
        }
        let (x, y) = (col as f32, row as f32);
        RawCell {
            id,
            height: 50,
            area: 1.0,
            culture: 1,
            religion: 1,
            neighbors,
            province: 0,
            state: 0,
            settlement: 0,
            polygon: vec![[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0]],
        }
    }

    /// Сетка `width × height`, `owner(row, col)` задаёт `(province, state)`; 0 — пул
    pub fn grid(
        width: u32,
        height: u32,
        owner: impl Fn(u32, u32) -> (u32, u32),
        water: impl Fn(u32, u32) -> bool,
    ) -> MapDataset {
        let mut dataset = MapDataset::default();
        for row in 0..height {
            for col in 0..width {
                let mut cell = grid_cell(width, height, row, col);
                let (province, state) = owner(row, col);
                cell.province = province;
                cell.state = state;
                if water(row, col) {
                    cell.height = 5;
                }
                dataset.cells.push(cell);
            }
        }
        dataset
    }

    pub fn province(id: u32, state: u32, settlement: u32) -> ProvinceMeta {
        ProvinceMeta {
            id,
            name: format!("P{id}"),
            color: String::new(),
            state,
            settlement,
            removed: false,
        }
    }

    pub fn settlement(id: u32, population: u32, capital: bool) -> SettlementMeta {
        SettlementMeta {
            id,
            name: format!("S{id}"),
            population,
            capital,
            removed: false,
        }
    }

    pub fn state(id: u32) -> StateMeta {
        StateMeta {
            id,
            name: format!("State{id}"),
            removed: false,
        }
    }
}
