use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::cell::CellTable;
use crate::config::WaterSettings;
use crate::province::{Province, ProvinceKind};

/// Целевая площадь синтезированной провинции
///
/// Берётся более крупная из двух оценок: половина площади самой большой водной клетки
/// пула или общая площадь пула, делённая на `area_divisor`. Сухие клетки пула учитываются
/// только в общей площади.
#[must_use]
pub fn target_area(cells: &CellTable, pool: &[usize], settings: &WaterSettings) -> f64 {
    let largest = pool
        .iter()
        .filter(|&&c| cells.cells[c].is_water)
        .map(|&c| cells.cells[c].area)
        .fold(0.0f64, f64::max);
    let total: f64 = pool.iter().map(|&c| cells.cells[c].area).sum();
    (largest / 2.0).max(total / settings.area_divisor)
}

/// Нарезает пул клеток без провинции на морские и пустошные провинции
///
/// Потоковая упаковка: провинция начинается с клетки пула с наименьшим id и растёт
/// обходом в ширину по соседям того же типа поверхности, пока накопленная площадь не
/// достигнет целевой. Клетки, поставленные в очередь, но не взятые, остаются в пуле.
#[must_use]
pub fn synthesize_pool_provinces(
    cells: &CellTable,
    pool: &[usize],
    settings: &WaterSettings,
) -> Vec<Province> {
    if pool.is_empty() {
        return Vec::new();
    }

    let target = target_area(cells, pool, settings);
    let mut remaining: BTreeSet<usize> = pool.iter().copied().collect();
    let mut provinces = Vec::new();
    let (mut seas, mut wastes) = (0u32, 0u32);

    while let Some(&seed) = remaining.first() {
        let is_water = cells.cells[seed].is_water;
        let mut queue = VecDeque::from([seed]);
        let mut queued = HashSet::from([seed]);
        let mut members = Vec::new();
        let mut area = 0.0;

        while members.is_empty() || area < target {
            let Some(current) = queue.pop_front() else {
                break;
            };
            remaining.remove(&current);
            members.push(current);
            area += cells.cells[current].area;

            for &n in &cells.cells[current].neighbors {
                if remaining.contains(&n) && cells.cells[n].is_water == is_water && queued.insert(n)
                {
                    queue.push_back(n);
                }
            }
        }

        let (kind, name) = if is_water {
            seas += 1;
            (ProvinceKind::Sea, format!("Sea_{seas}"))
        } else {
            wastes += 1;
            (ProvinceKind::Wasteland, format!("Wasteland_{wastes}"))
        };

        members.sort_unstable();
        provinces.push(Province {
            id: 0,
            source_id: None,
            name,
            color: String::new(),
            kind,
            state: 0,
            settlement: 0,
            population: 0,
            is_capital: false,
            coastal: false,
            center: (0.0, 0.0),
            area,
            cells: members,
            neighbors: Vec::new(),
        });
    }

    tracing::debug!(
        "Пул из {} клеток разбит на {} провинций (целевая площадь {:.1})",
        pool.len(),
        provinces.len(),
        target
    );
    provinces
}
