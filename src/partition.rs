// src/partition.rs
//! Сбалансированное разбиение графа провинций на графства
//!
//! Жадный рост: самый населённый свободный узел становится зерном графства и забирает
//! одного соседа: наименее связанного и наименее населённого. Узлы, не попавшие ни в
//! одно графство, затем раздаются соседним графствам так, чтобы население каждого было
//! ближе к идеальному `total / target`.
//!
//! Разбиение выполняется по каждой компоненте связности отдельно, поэтому каждое
//! графство связно по построению. [`verify_partitions`] только проверяет это.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use crate::config::PartitionSettings;
use crate::error::{ConvertError, Result};
use crate::province::graph::ProvinceGraph;

/// Одно графство: множество узлов общего графа и собственный список рёбер между ними
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Узлы в порядке добавления, зерно первым
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<(NodeIndex, NodeIndex)>,
    pub population: u64,
}

impl Partition {
    fn new(seed: NodeIndex, graph: &ProvinceGraph) -> Self {
        Self {
            nodes: vec![seed],
            edges: Vec::new(),
            population: u64::from(graph.node(seed).population),
        }
    }

    fn insert(&mut self, node: NodeIndex, graph: &ProvinceGraph) {
        for &member in &self.nodes {
            if graph.contains_edge(member, node) {
                self.edges.push((member, node));
            }
        }
        self.nodes.push(node);
        self.population += u64::from(graph.node(node).population);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Обход в ширину от первого узла только по собственным рёбрам графства
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.nodes.first() else {
            return false;
        };
        let mut adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for &(a, b) in &self.edges {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &n in adjacency.get(&current).into_iter().flatten() {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        self.nodes.iter().all(|n| seen.contains(n))
    }
}

/// Целевое число графств для группы узлов
///
/// Меньше `2 * min_parts` узлов дают одно графство. Население не ниже `high_pop` даёт
/// `min_parts`, не выше `low_pop` даёт `max_parts`, между ними линейная интерполяция с
/// округлением вниз.
/// В среднем на графство приходится не меньше двух узлов.
#[must_use]
pub fn target_count(total_population: u64, node_count: usize, settings: &PartitionSettings) -> usize {
    if node_count < 2 * settings.min_parts {
        return 1;
    }

    let low = u64::from(settings.low_pop);
    let high = u64::from(settings.high_pop);
    let count = if total_population >= high {
        settings.min_parts
    } else if total_population <= low {
        settings.max_parts
    } else {
        let frac = (total_population - low) as f64 / (high - low) as f64;
        let span = (settings.max_parts - settings.min_parts) as f64;
        (settings.max_parts as f64 - frac * span).floor() as usize
    };

    count.min(node_count / 2).max(1)
}

/// Разбивает граф государства на графства
///
/// Флаги узлов сбрасываются в начале, так что повторный вызов на том же графе даёт тот же
/// результат.
pub fn partition_graph(graph: &mut ProvinceGraph, settings: &PartitionSettings) -> Vec<Partition> {
    graph.reset_flags();
    let mut partitions = Vec::new();
    for component in graph.components() {
        partitions.extend(partition_component(graph, &component, settings));
    }
    partitions
}

fn partition_component(
    graph: &mut ProvinceGraph,
    component: &[NodeIndex],
    settings: &PartitionSettings,
) -> Vec<Partition> {
    let total: u64 = component
        .iter()
        .map(|&n| u64::from(graph.node(n).population))
        .sum();
    let target = target_count(total, component.len(), settings);

    if target <= 1 {
        let mut whole = Partition::new(component[0], graph);
        for &n in &component[1..] {
            whole.insert(n, graph);
        }
        for &n in component {
            graph.mark_in_sub_graph(n);
        }
        return vec![whole];
    }

    let mut partitions: Vec<Partition> = Vec::with_capacity(target);
    while partitions.len() < target {
        let Some(seed) = component
            .iter()
            .copied()
            .filter(|&n| !graph.in_sub_graph(n) && !graph.is_isolated(n))
            .max_by(|&a, &b| {
                graph
                    .node(a)
                    .population
                    .cmp(&graph.node(b).population)
                    .then(b.cmp(&a))
            })
        else {
            break;
        };

        let candidates: Vec<NodeIndex> = graph
            .neighbors(seed)
            .into_iter()
            .filter(|&n| !graph.in_sub_graph(n))
            .collect();
        if candidates.is_empty() {
            graph.mark_isolated(seed);
            continue;
        }

        // Сначала периферийные и малые узлы: крупные остаются зёрнами для следующих графств
        let second = if candidates.len() == 1 {
            candidates[0]
        } else {
            candidates
                .iter()
                .copied()
                .min_by_key(|&n| (graph.degree(n), graph.node(n).population, n))
                .unwrap_or(candidates[0])
        };

        let mut partition = Partition::new(seed, graph);
        partition.insert(second, graph);
        graph.mark_in_sub_graph(seed);
        graph.mark_in_sub_graph(second);
        partitions.push(partition);
    }

    redistribute_leftovers(graph, component, &mut partitions, total as f64 / target as f64);
    partitions
}

/// Раздаёт свободные узлы соседним графствам, приближая их население к `ideal`
fn redistribute_leftovers(
    graph: &mut ProvinceGraph,
    component: &[NodeIndex],
    partitions: &mut [Partition],
    ideal: f64,
) {
    let mut owner: HashMap<NodeIndex, usize> = HashMap::new();
    for (i, p) in partitions.iter().enumerate() {
        for &n in &p.nodes {
            owner.insert(n, i);
        }
    }

    loop {
        let mut changed = false;
        for &node in component {
            if graph.in_sub_graph(node) {
                continue;
            }
            let mut bordering: Vec<usize> = graph
                .neighbors(node)
                .iter()
                .filter_map(|n| owner.get(n).copied())
                .collect();
            bordering.sort_unstable();
            bordering.dedup();

            let population = f64::from(graph.node(node).population);
            let best = bordering.into_iter().min_by(|&a, &b| {
                let da = (partitions[a].population as f64 + population - ideal).abs();
                let db = (partitions[b].population as f64 + population - ideal).abs();
                da.total_cmp(&db).then(a.cmp(&b))
            });
            if let Some(i) = best {
                partitions[i].insert(node, graph);
                owner.insert(node, i);
                graph.mark_in_sub_graph(node);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Проверяет структурные инварианты разбиения государства
///
/// Каждый узел графа ровно в одном графстве, графства непусты и связны. Нарушение
/// означает дефект алгоритма, а не особенность данных, поэтому это ошибка.
pub fn verify_partitions(graph: &ProvinceGraph, partitions: &[Partition]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut found = 0usize;
    for p in partitions {
        if p.is_empty() {
            return Err(ConvertError::EmptyCounty { state: graph.state });
        }
        if !p.is_connected() {
            return Err(ConvertError::DisconnectedCounty {
                state: graph.state,
                county: graph.node(p.nodes[0]).name.clone(),
            });
        }
        for &n in &p.nodes {
            seen.insert(n);
            found += 1;
        }
    }
    if found != graph.node_count() || seen.len() != graph.node_count() {
        return Err(ConvertError::PartitionCoverage {
            state: graph.state,
            expected: graph.node_count(),
            found,
        });
    }
    Ok(())
}
