// src/title/county.rs
use crate::cell::CellTable;
use crate::partition::Partition;
use crate::province::ProvinceTable;
use crate::province::graph::ProvinceGraph;
use crate::title::{Barony, County, Tally};

/// Превращает графства-разбиения одного государства в титулы графств
///
/// Каждый узел разбиения становится баронством. Столица графства — баронство, поселение
/// которого является столицей государства, иначе самое населённое (при равенстве — первое
/// по порядку разбиения); она ставится первой и даёт графству имя. Id и ключи проставляются
/// позже, при обходе готовой иерархии.
#[must_use]
pub fn build_counties(
    graph: &ProvinceGraph,
    partitions: &[Partition],
    provinces: &ProvinceTable,
    cells: &CellTable,
) -> Vec<County> {
    partitions
        .iter()
        .map(|partition| build_county(graph, partition, provinces, cells))
        .collect()
}

fn build_county(
    graph: &ProvinceGraph,
    partition: &Partition,
    provinces: &ProvinceTable,
    cells: &CellTable,
) -> County {
    let mut members: Vec<(Barony, bool, Tally, Tally)> = partition
        .nodes
        .iter()
        .map(|&n| {
            let node = graph.node(n);
            let province = &provinces.provinces[node.province];
            let mut cultures = Tally::default();
            let mut religions = Tally::default();
            for &c in &province.cells {
                cultures.add(cells.cells[c].culture, 1);
                religions.add(cells.cells[c].religion, 1);
            }
            let barony = Barony {
                id: 0,
                key: String::new(),
                name: node.name.clone(),
                province: node.province,
                population: node.population,
                culture: cultures.dominant().unwrap_or(0),
                religion: religions.dominant().unwrap_or(0),
                holder: None,
            };
            (barony, node.is_capital, cultures, religions)
        })
        .collect();

    let capital = members
        .iter()
        .position(|(_, is_capital, _, _)| *is_capital)
        .unwrap_or_else(|| most_populous(&members));
    let first = members.remove(capital);
    members.insert(0, first);

    let mut cultures = Tally::default();
    let mut religions = Tally::default();
    let mut baronies = Vec::with_capacity(members.len());
    for (barony, _, c, r) in members {
        cultures.merge(&c);
        religions.merge(&r);
        baronies.push(barony);
    }

    County {
        id: 0,
        key: String::new(),
        name: baronies[0].name.clone(),
        population: partition.population,
        culture: cultures.dominant().unwrap_or(0),
        religion: religions.dominant().unwrap_or(0),
        baronies,
        holder: None,
        liege: None,
        cultures,
        religions,
    }
}

fn most_populous(members: &[(Barony, bool, Tally, Tally)]) -> usize {
    let mut best = 0;
    for (i, (barony, _, _, _)) in members.iter().enumerate() {
        if barony.population > members[best].0.population {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PartitionSettings, WaterSettings};
    use crate::dataset::Metadata;
    use crate::partition::partition_graph;
    use crate::province::assemble_provinces;
    use crate::province::fixtures::*;
    use crate::province::graph::build_state_graphs;

    /// Строка из трёх провинций одного государства с поселениями
    fn counties_for(capital: Option<u32>) -> Vec<County> {
        let mut dataset = grid(3, 1, |_, col| (col + 1, 1), |_, _| false);
        dataset.provinces = (1..=3).map(|id| province(id, 1, id)).collect();
        dataset.settlements = vec![
            settlement(1, 100, capital == Some(1)),
            settlement(2, 900, capital == Some(2)),
            settlement(3, 300, capital == Some(3)),
        ];
        dataset.states = vec![state(1)];
        dataset.cells[2].culture = 4;

        let cells = CellTable::repack(&dataset.cells, 20);
        let meta = Metadata::from_dataset(&dataset);
        let (table, _) = assemble_provinces(&cells, &meta, &WaterSettings::default());
        let mut graphs = build_state_graphs(&table);
        let parts = partition_graph(&mut graphs[0], &PartitionSettings::default());
        build_counties(&graphs[0], &parts, &table, &cells)
    }

    #[test]
    fn test_capital_barony_names_the_county() {
        let counties = counties_for(Some(3));
        assert_eq!(counties.len(), 1);
        assert_eq!(counties[0].name, "P3");
        assert_eq!(counties[0].capital().name, "P3");
        assert_eq!(counties[0].baronies.len(), 3);
        assert_eq!(counties[0].population, 1300);
    }

    #[test]
    fn test_most_populous_barony_without_capital() {
        let counties = counties_for(None);
        assert_eq!(counties[0].name, "P2");
        assert_eq!(counties[0].baronies[0].population, 900);
    }

    #[test]
    fn test_barony_culture_is_dominant_of_its_cells() {
        let counties = counties_for(None);
        let p3 = counties[0]
            .baronies
            .iter()
            .find(|b| b.name == "P3")
            .unwrap();
        assert_eq!(p3.culture, 4);
        // Две клетки из трёх — культура 1
        assert_eq!(counties[0].culture, 1);
    }
}
