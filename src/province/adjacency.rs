use std::collections::BTreeSet;

use crate::cell::CellTable;
use crate::province::ProvinceTable;

/// Вычисляет соседей каждой сухопутной провинции
///
/// Для каждой провинции собираются соседние клетки вне её, затем они отображаются на
/// провинции-владельцы. В соседи попадают только сухопутные провинции того же государства:
/// межгосударственная граница служит границей разбиения, а не ребром графа. Заодно отмечаются
/// прибрежные провинции.
pub fn derive_adjacency(table: &mut ProvinceTable, cells: &CellTable) {
    for idx in 1..table.provinces.len() {
        let province = &table.provinces[idx];
        if !province.is_titled() {
            continue;
        }

        let border: BTreeSet<usize> = province
            .cells
            .iter()
            .flat_map(|&c| cells.cells[c].neighbors.iter().copied())
            .filter(|&n| table.cell_owner[n] != idx)
            .collect();

        let mut coastal = false;
        let mut neighbors = BTreeSet::new();
        for n in border {
            let owner = table.cell_owner[n];
            let Some(other) = table.get(owner) else {
                continue;
            };
            if other.is_water() {
                coastal = true;
            } else if other.is_titled() && other.state == province.state {
                neighbors.insert(owner);
            }
        }

        let province = &mut table.provinces[idx];
        province.neighbors = neighbors.into_iter().collect();
        province.coastal = coastal;
    }
}
