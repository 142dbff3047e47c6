// src/pipeline.rs
//! Конвейер конвертации карты в иерархию титулов
//!
//! Стадии идут строго по порядку: упаковка клеток → сборка провинций → графы соседства →
//! разбиение на графства → агрегация рангов → перемешивание имён → правители.
//! Единственная параллельная единица: разбиение одного государства; ГПСЧ создаётся
//! после неё и расходуется в фиксированном порядке.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::cell::CellTable;
use crate::config::{ConverterParams, PartitionSettings};
use crate::dataset::{MapDataset, Metadata};
use crate::error::Result;
use crate::partition::{Partition, partition_graph, verify_partitions};
use crate::province::graph::{ProvinceGraph, build_state_graphs};
use crate::province::{ProvinceTable, assemble_provinces};
use crate::remap::NameRemap;
use crate::succession::{Character, SuccessionGenerator};
use crate::title::Hierarchy;
use crate::title::aggregate::{aggregate, assign_ids, build_duchy};
use crate::title::county::build_counties;

/// Сводка прогона: сколько чего получилось и что было отброшено
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub cells: usize,
    pub land_provinces: usize,
    pub synthesized_provinces: usize,
    pub state_graphs: usize,
    pub baronies: usize,
    pub counties: usize,
    pub duchies: usize,
    pub kingdoms: usize,
    pub empires: usize,
    pub characters: usize,
    pub wasteland_states: Vec<u32>,
    /// Сухопутные провинции без государства: на карте есть, титулов нет
    pub stateless_provinces: Vec<u32>,
    pub skipped_provinces: Vec<u32>,
    pub emptied_provinces: Vec<u32>,
    pub transferred_cells: usize,
    pub deleted_cells: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub provinces: ProvinceTable,
    pub hierarchy: Hierarchy,
    pub characters: Vec<Character>,
    pub cultures: NameRemap,
    pub religions: NameRemap,
    pub report: ConversionReport,
}

impl ConversionOutput {
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Полная конвертация набора данных
///
/// Параметры проверяются до первой стадии. Отсутствующие ссылки только сокращают
/// результат; ошибкой заканчиваются лишь нарушения структуры графств.
pub fn convert(dataset: &MapDataset, params: &ConverterParams) -> Result<ConversionOutput> {
    params.validate()?;

    let cells = CellTable::repack(&dataset.cells, params.water.sea_height);
    tracing::info!("Упаковано {} клеток", cells.len());

    let meta = Metadata::from_dataset(dataset);
    let (provinces, assembly) = assemble_provinces(&cells, &meta, &params.water);

    let graphs = build_state_graphs(&provinces);
    let state_graphs = graphs.len();
    let (mut settled, wasteland): (Vec<ProvinceGraph>, Vec<ProvinceGraph>) =
        graphs.into_iter().partition(ProvinceGraph::is_settled);
    let wasteland_states: Vec<u32> = wasteland.iter().map(|g| g.state).collect();
    for graph in &wasteland {
        tracing::info!(
            "Государство {} без поселений, {} провинций остаются пустошью",
            meta.state_name(graph.state),
            graph.node_count()
        );
    }

    let partitions = partition_states(&mut settled, &params.partition);
    let mut duchies = Vec::with_capacity(settled.len());
    for (graph, parts) in settled.iter().zip(&partitions) {
        verify_partitions(graph, parts)?;
        tracing::debug!(
            "Государство {}: {} провинций, население {} → {} графств",
            graph.state,
            graph.node_count(),
            graph.total_population(),
            parts.len()
        );
        let counties = build_counties(graph, parts, &provinces, &cells);
        duchies.push(build_duchy(graph.state, meta.state_name(graph.state), counties));
    }

    let mut empires = aggregate(duchies);
    assign_ids(&mut empires);
    let mut hierarchy = Hierarchy {
        empires,
        wasteland_states,
    };
    let [baronies, counties, duchies, kingdoms, empires] = hierarchy.tier_counts();
    tracing::info!(
        "Иерархия: {} баронств, {} графств, {} герцогств, {} королевств, {} империй",
        baronies,
        counties,
        duchies,
        kingdoms,
        empires
    );

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let land = cells.cells.iter().filter(|c| !c.is_water);
    let culture_ids: BTreeSet<u32> = land.clone().map(|c| c.culture).collect();
    let religion_ids: BTreeSet<u32> = land.map(|c| c.religion).collect();
    let cultures = NameRemap::build(
        &culture_ids,
        &params.names.cultures,
        &meta.cultures,
        "culture",
        &mut rng,
    );
    let religions = NameRemap::build(
        &religion_ids,
        &params.names.religions,
        &meta.religions,
        "religion",
        &mut rng,
    );

    let characters = SuccessionGenerator::new(&params.succession, &mut rng).run(&mut hierarchy);

    let report = ConversionReport {
        cells: cells.len(),
        land_provinces: provinces.iter().filter(|p| p.is_titled()).count(),
        synthesized_provinces: provinces.iter().filter(|p| p.is_synthesized()).count(),
        state_graphs,
        baronies,
        counties,
        duchies,
        kingdoms,
        empires,
        characters: characters.len(),
        wasteland_states: hierarchy.wasteland_states.clone(),
        stateless_provinces: provinces
            .iter()
            .filter(|p| p.is_titled() && p.state == 0)
            .filter_map(|p| p.source_id)
            .collect(),
        skipped_provinces: assembly.skipped_provinces,
        emptied_provinces: assembly.emptied_provinces,
        transferred_cells: assembly.transferred_cells,
        deleted_cells: assembly.deleted_cells,
    };

    Ok(ConversionOutput {
        provinces,
        hierarchy,
        characters,
        cultures,
        religions,
        report,
    })
}

/// Разбивает графы государств; каждый граф принадлежит ровно одной задаче
#[cfg(feature = "parallel")]
fn partition_states(graphs: &mut [ProvinceGraph], settings: &PartitionSettings) -> Vec<Vec<Partition>> {
    use rayon::prelude::*;

    graphs
        .par_iter_mut()
        .map(|graph| partition_graph(graph, settings))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn partition_states(graphs: &mut [ProvinceGraph], settings: &PartitionSettings) -> Vec<Vec<Partition>> {
    graphs
        .iter_mut()
        .map(|graph| partition_graph(graph, settings))
        .collect()
}
