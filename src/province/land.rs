use std::collections::BTreeMap;

use crate::cell::CellTable;
use crate::dataset::Metadata;
use crate::province::{Province, ProvinceKind};

/// Результат группировки клеток по исходным провинциям
#[derive(Debug, Clone, Default)]
pub struct LandGrouping {
    /// Черновики провинций по возрастанию исходного id; итоговые id ещё не присвоены
    pub provinces: Vec<Province>,
    /// Индексы клеток без провинции (по возрастанию), включая клетки отброшенных провинций
    pub pool: Vec<usize>,
    /// Исходные id пропущенных провинций
    pub skipped: Vec<u32>,
}

/// Группирует клетки по исходному id провинции и прикрепляет метаданные
///
/// Провинция без метаданных или со ссылкой на удалённое поселение пропускается, а её клетки
/// возвращаются в пул, чтобы они всё равно попали в какую-нибудь провинцию.
#[must_use]
pub fn group_land_provinces(cells: &CellTable, meta: &Metadata) -> LandGrouping {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    let mut pool = Vec::new();

    for (idx, cell) in cells.cells.iter().enumerate() {
        if cell.province == 0 {
            pool.push(idx);
        } else {
            groups.entry(cell.province).or_default().push(idx);
        }
    }

    let mut grouping = LandGrouping::default();
    for (source_id, members) in groups {
        let Some(info) = meta.provinces.get(&source_id) else {
            tracing::warn!("Нет метаданных провинции {}, клетки возвращены в пул", source_id);
            grouping.skipped.push(source_id);
            pool.extend(members);
            continue;
        };

        let settlement = if info.settlement == 0 {
            None
        } else if let Some(s) = meta.settlement(info.settlement) {
            Some(s)
        } else {
            tracing::warn!(
                "Поселение {} провинции {} ({}) удалено, провинция пропущена",
                info.settlement,
                source_id,
                info.name
            );
            grouping.skipped.push(source_id);
            pool.extend(members);
            continue;
        };

        let population = settlement.map_or(members.len() as u32, |s| s.population);
        grouping.provinces.push(Province {
            id: 0,
            source_id: Some(source_id),
            name: info.name.clone(),
            color: info.color.clone(),
            kind: ProvinceKind::Land,
            state: info.state,
            settlement: settlement.map_or(0, |s| s.id),
            population,
            is_capital: settlement.is_some_and(|s| s.capital),
            coastal: false,
            center: (0.0, 0.0),
            area: 0.0,
            cells: members,
            neighbors: Vec::new(),
        });
    }

    pool.sort_unstable();
    grouping.pool = pool;
    grouping
}
