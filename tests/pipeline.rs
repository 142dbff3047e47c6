use std::collections::{BTreeSet, HashSet, VecDeque};

use realmgen::dataset::{NamedMeta, ProvinceMeta, RawCell, SettlementMeta, StateMeta};
use realmgen::{ConversionOutput, ConverterParams, MapDataset, convert};

const WIDTH: u32 = 12;
const HEIGHT: u32 = 8;

/// Карта 12×8 из блоков 2×2: правый столбец блоков — море, остальное — 20 провинций.
/// Государство 1 — два левых столбца блоков, 2 — верх остальной суши, 3 — низ.
/// У государств 1 и 2 культура 1, у государства 3 — культура 2.
fn block_of(row: u32, col: u32) -> (u32, u32) {
    (row / 2, col / 2)
}

fn province_of(row: u32, col: u32) -> u32 {
    let (br, bc) = block_of(row, col);
    if bc == 5 { 0 } else { br * 5 + bc + 1 }
}

fn state_of(province: u32) -> u32 {
    if province == 0 {
        return 0;
    }
    let (br, bc) = ((province - 1) / 5, (province - 1) % 5);
    if bc < 2 {
        1
    } else if br < 2 {
        2
    } else {
        3
    }
}

fn world() -> MapDataset {
    let mut dataset = MapDataset::default();
    for row in 0..HEIGHT {
        for col in 0..WIDTH {
            let id = row * WIDTH + col + 1;
            let mut neighbors = Vec::new();
            if col > 0 {
                neighbors.push(id - 1);
            }
            if col + 1 < WIDTH {
                neighbors.push(id + 1);
            }
            if row > 0 {
                neighbors.push(id - WIDTH);
            }
            if row + 1 < HEIGHT {
                neighbors.push(id + WIDTH);
            }
            let province = province_of(row, col);
            let state = state_of(province);
            let (x, y) = (col as f32, row as f32);
            dataset.cells.push(RawCell {
                id,
                height: if province == 0 { 5 } else { 60 },
                area: 1.0,
                culture: if state == 3 { 2 } else { 1 },
                religion: 1,
                neighbors,
                province,
                state,
                settlement: 0,
                polygon: vec![[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0]],
            });
        }
    }

    dataset.provinces = (1..=20)
        .map(|id| ProvinceMeta {
            id,
            name: format!("Barony {id}"),
            color: String::new(),
            state: state_of(id),
            settlement: id,
            removed: false,
        })
        .collect();
    dataset.settlements = (1..=20)
        .map(|id| SettlementMeta {
            id,
            name: format!("Town {id}"),
            population: (id * 37) % 900 + 100,
            capital: matches!(id, 1 | 3 | 13),
            removed: false,
        })
        .collect();
    dataset.states = (1..=3)
        .map(|id| StateMeta {
            id,
            name: format!("Realm {id}"),
            removed: false,
        })
        .collect();
    dataset.cultures = vec![
        NamedMeta {
            id: 1,
            name: "Highfolk".into(),
            removed: false,
        },
        NamedMeta {
            id: 2,
            name: "Marsh".into(),
            removed: false,
        },
    ];
    dataset
}

fn params(seed: u64) -> ConverterParams {
    let mut params = ConverterParams {
        seed,
        ..ConverterParams::default()
    };
    params.partition.min_parts = 1;
    params.partition.max_parts = 3;
    params
}

fn run(dataset: &MapDataset, seed: u64) -> ConversionOutput {
    convert(dataset, &params(seed)).unwrap()
}

#[test]
fn test_same_seed_is_byte_identical() {
    let dataset = world();
    let a = serde_json::to_string(&run(&dataset, 77)).unwrap();
    let b = serde_json::to_string(&run(&dataset, 77)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_counties_cover_each_duchy_exactly() {
    let output = run(&world(), 1);
    for duchy in output.hierarchy.duchies() {
        let mut seen = Vec::new();
        for county in &duchy.counties {
            assert!(!county.baronies.is_empty());
            seen.extend(county.baronies.iter().map(|b| b.province));
        }
        let unique: BTreeSet<usize> = seen.iter().copied().collect();
        assert_eq!(unique.len(), seen.len(), "duplicated barony in {}", duchy.name);

        let expected: BTreeSet<usize> = output
            .provinces
            .iter()
            .filter(|p| p.is_titled() && p.state == duchy.state)
            .map(|p| p.id as usize)
            .collect();
        assert_eq!(unique, expected);
    }
}

#[test]
fn test_counties_are_connected() {
    let output = run(&world(), 2);
    for county in output.hierarchy.counties() {
        let members: HashSet<usize> = county.baronies.iter().map(|b| b.province).collect();
        let start = county.baronies[0].province;
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(p) = queue.pop_front() {
            for &n in &output.provinces.provinces[p].neighbors {
                if members.contains(&n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        assert_eq!(seen, members, "county {} is split", county.key);
    }
}

#[test]
fn test_every_pool_cell_lands_in_one_water_province() {
    let dataset = world();
    let output = run(&dataset, 3);

    // Клетки уже отсортированы по id: индекс = id - 1
    let pool: BTreeSet<usize> = dataset
        .cells
        .iter()
        .filter(|c| c.province == 0)
        .map(|c| c.id as usize - 1)
        .collect();

    let mut covered = Vec::new();
    for province in output.provinces.iter().filter(|p| p.is_synthesized()) {
        assert!(!province.cells.is_empty());
        assert_eq!(province.state, 0);
        covered.extend(province.cells.iter().copied());
    }
    let unique: BTreeSet<usize> = covered.iter().copied().collect();
    assert_eq!(unique.len(), covered.len());
    assert_eq!(unique, pool);
}

#[test]
fn test_hierarchy_tiers_and_allowed_flags() {
    let output = run(&world(), 4);
    let hierarchy = &output.hierarchy;

    assert_eq!(hierarchy.empires.len(), 1);
    let empire = &hierarchy.empires[0];
    assert!(empire.is_allowed);
    assert_eq!(empire.kingdoms.len(), 2);

    // Государства 1 и 2 делят культуру 1, государство 3 одно в культуре 2
    let shared = &empire.kingdoms[0];
    assert_eq!(shared.culture, 1);
    assert_eq!(shared.duchies.len(), 2);
    assert!(shared.is_allowed);
    let lonely = &empire.kingdoms[1];
    assert_eq!(lonely.culture, 2);
    assert!(!lonely.is_allowed);

    assert_eq!(output.report.baronies, 20);
    assert_eq!(output.report.duchies, 3);
    assert_eq!(output.report.counties, hierarchy.counties().count());

    let county_keys: HashSet<&str> = hierarchy.counties().map(|c| c.key.as_str()).collect();
    assert_eq!(county_keys.len(), output.report.counties);
    assert!(hierarchy.duchies().all(|d| d.key.starts_with("d_realm_")));
}

#[test]
fn test_capitals_name_their_counties() {
    let output = run(&world(), 5);
    for county in output.hierarchy.counties() {
        assert_eq!(county.name, county.baronies[0].name);
    }
    let capital = output.provinces.by_source_id(13).unwrap();
    let county = output
        .hierarchy
        .counties()
        .find(|c| c.baronies.iter().any(|b| b.province == capital.id as usize))
        .unwrap();
    assert_eq!(county.name, "Barony 13");
}

#[test]
fn test_removed_metadata_is_skipped_not_fatal() {
    let mut dataset = world();
    dataset.provinces.retain(|p| p.id != 7);
    dataset.settlements[11].removed = true; // поселение провинции 12

    let output = run(&dataset, 6);
    assert_eq!(output.report.skipped_provinces, vec![7, 12]);
    assert!(output.provinces.by_source_id(7).is_none());
    assert_eq!(output.report.baronies, 18);
    // Клетки выброшенных провинций стали бесхозной сушей
    assert!(
        output
            .provinces
            .iter()
            .any(|p| p.is_synthesized() && !p.is_water())
    );
}

#[test]
fn test_characters_are_referenced_by_holders() {
    let output = run(&world(), 8);
    let ids: HashSet<u32> = output.characters.iter().map(|c| c.id).collect();
    for county in output.hierarchy.counties() {
        assert!(ids.contains(&county.holder.unwrap()));
    }
    for duchy in output.hierarchy.duchies() {
        if let Some(holder) = duchy.holder {
            assert!(ids.contains(&holder));
        }
    }
    assert_eq!(output.cultures.name(1), Some("Highfolk"));
    assert_eq!(output.religions.name(1), Some("religion_1"));
}

#[test]
fn test_dataset_reads_from_json() {
    let json = r#"{
        "cells": [
            {"id": 2, "height": 50, "area": 1.0, "neighbors": [1, 99], "province": 1, "state": 1},
            {"id": 1, "height": 50, "area": 1.0, "neighbors": [2], "province": 1, "state": 1}
        ],
        "provinces": [{"id": 1, "name": "Solo", "state": 1}],
        "states": [{"id": 1, "name": "Lone"}]
    }"#;
    let dataset: MapDataset = serde_json::from_str(json).unwrap();
    let output = convert(&dataset, &ConverterParams::default()).unwrap();

    // Без поселений государство — пустошь
    assert_eq!(output.hierarchy.wasteland_states, vec![1]);
    assert_eq!(output.report.land_provinces, 1);
    assert!(output.hierarchy.empires.is_empty());
}
