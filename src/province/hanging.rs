// src/province/hanging.rs
use std::collections::{HashMap, HashSet};

use crate::cell::CellTable;
use crate::province::{Province, ProvinceKind};

/// Итог починки висячих клеток
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HangingReport {
    pub transferred: usize,
    /// Индексы удалённых клеток
    pub deleted: Vec<usize>,
}

impl HangingReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.transferred == 0 && self.deleted.is_empty()
    }
}

enum Fix {
    Transfer { cell: usize, from: usize, to: usize },
    Delete { cell: usize, from: usize },
}

/// Чинит висячие клетки сухопутных провинций
///
/// Клетка висячая, если ни одна другая клетка её провинции не входит в её список соседей;
/// единственная клетка провинции тоже висячая. Висячая клетка, у которой все соседи
/// водные, удаляется. Висячая клетка многоклеточной провинции переходит в соседнюю
/// сухопутную провинцию через клетку-якорь: сначала провинция того же государства, затем
/// любая титульная, затем пустошь; внутри группы выигрывает якорь с наименьшим индексом.
/// Одноклеточная провинция с сухопутными соседями остаётся баронством.
///
/// Внутри прохода все решения принимаются до первого переноса. Проходы повторяются, пока
/// что-то меняется, поэтому повторный вызов ничего не меняет.
pub fn repair_hanging_cells(provinces: &mut [Province], cells: &CellTable) -> HangingReport {
    let mut report = HangingReport::default();
    loop {
        let pass = repair_pass(provinces, cells);
        if pass.is_noop() {
            break;
        }
        report.transferred += pass.transferred;
        report.deleted.extend(pass.deleted);
    }

    if !report.is_noop() {
        tracing::info!(
            "Висячие клетки: перенесено {}, удалено {}",
            report.transferred,
            report.deleted.len()
        );
    }
    report
}

fn repair_pass(provinces: &mut [Province], cells: &CellTable) -> HangingReport {
    // Якорем может стать клетка любой сухопутной провинции, включая синтезированную пустошь
    let mut owner: HashMap<usize, usize> = HashMap::new();
    for (pos, province) in provinces.iter().enumerate() {
        if !province.is_water() {
            for &c in &province.cells {
                owner.insert(c, pos);
            }
        }
    }

    let mut hanging: HashSet<usize> = HashSet::new();
    for (pos, province) in provinces.iter().enumerate() {
        if !province.is_titled() {
            continue;
        }
        for &c in &province.cells {
            let attached = cells.cells[c]
                .neighbors
                .iter()
                .any(|n| owner.get(n) == Some(&pos));
            if !attached {
                hanging.insert(c);
            }
        }
    }

    // Одноклеточная провинция не двигается, поэтому её клетка годится в якоря
    let movable = |c: usize, pos: usize| hanging.contains(&c) && provinces[pos].cells.len() > 1;

    let mut fixes = Vec::new();
    for (pos, province) in provinces.iter().enumerate() {
        if !province.is_titled() {
            continue;
        }
        for &c in province.cells.iter().filter(|c| hanging.contains(c)) {
            let neighbors = &cells.cells[c].neighbors;
            if neighbors.iter().all(|&n| cells.cells[n].is_water) {
                fixes.push(Fix::Delete { cell: c, from: pos });
                continue;
            }
            if !movable(c, pos) {
                continue;
            }

            let target = neighbors
                .iter()
                .filter_map(|&n| match owner.get(&n) {
                    Some(&q) if q != pos && !movable(n, q) => {
                        Some((anchor_rank(province, &provinces[q]), n, q))
                    }
                    _ => None,
                })
                .min_by_key(|&(rank, n, _)| (rank, n));

            if let Some((_, _, to)) = target {
                fixes.push(Fix::Transfer { cell: c, from: pos, to });
            } else {
                tracing::debug!(
                    "Висячая клетка {} провинции {} не имеет якоря, оставлена",
                    cells.cells[c].id,
                    province.name
                );
            }
        }
    }

    let mut report = HangingReport::default();
    for fix in fixes {
        match fix {
            Fix::Transfer { cell, from, to } => {
                provinces[from].cells.retain(|&c| c != cell);
                provinces[to].cells.push(cell);
                report.transferred += 1;
            }
            Fix::Delete { cell, from } => {
                provinces[from].cells.retain(|&c| c != cell);
                report.deleted.push(cell);
            }
        }
    }
    for province in provinces.iter_mut() {
        province.cells.sort_unstable();
    }
    report
}

/// Чем меньше, тем предпочтительнее провинция-получатель
fn anchor_rank(from: &Province, to: &Province) -> u8 {
    match to.kind {
        ProvinceKind::Land if to.state == from.state => 0,
        ProvinceKind::Land => 1,
        _ => 2,
    }
}
