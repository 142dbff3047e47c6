// src/province/graph.rs
//! Граф соседства провинций одного государства
//!
//! Узлы хранятся в арене `petgraph` и адресуются `NodeIndex`; флаги «уже в графстве»
//! и «изолирован» лежат в отдельных массивах по тому же индексу. Разбиения ссылаются
//! на узлы по индексу и не владеют ими.

use std::collections::{BTreeMap, HashMap, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;

use crate::province::ProvinceTable;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    /// Индекс провинции в `ProvinceTable::provinces`
    pub province: usize,
    pub name: String,
    pub population: u32,
    pub has_settlement: bool,
    pub is_capital: bool,
}

#[derive(Debug, Clone)]
pub struct ProvinceGraph {
    pub state: u32,
    graph: UnGraph<GraphNode, ()>,
    by_province: HashMap<usize, NodeIndex>,
    in_sub_graph: Vec<bool>,
    isolated: Vec<bool>,
}

impl ProvinceGraph {
    #[must_use]
    pub fn new(state: u32) -> Self {
        Self {
            state,
            graph: UnGraph::new_undirected(),
            by_province: HashMap::new(),
            in_sub_graph: Vec::new(),
            isolated: Vec::new(),
        }
    }

    /// Добавляет узел; повторное добавление той же провинции возвращает существующий индекс
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.by_province.get(&node.province) {
            return idx;
        }
        let province = node.province;
        let idx = self.graph.add_node(node);
        self.by_province.insert(province, idx);
        self.in_sub_graph.push(false);
        self.isolated.push(false);
        idx
    }

    /// Добавляет ребро между провинциями
    ///
    /// Ребро к провинции вне графа, петля и дубликат молча игнорируются: так подграфы
    /// можно строить по частям. Возвращает `true`, если ребро действительно добавлено.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        let (Some(&na), Some(&nb)) = (self.by_province.get(&a), self.by_province.get(&b)) else {
            return false;
        };
        if na == nb || self.graph.find_edge(na, nb).is_some() {
            return false;
        }
        self.graph.add_edge(na, nb, ());
        true
    }

    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Соседи узла по возрастанию индекса
    #[must_use]
    pub fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    #[must_use]
    pub fn contains_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.graph
            .node_weights()
            .map(|n| u64::from(n.population))
            .sum()
    }

    /// Есть ли в государстве хоть одно живое поселение
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.graph.node_weights().any(|n| n.has_settlement)
    }

    #[must_use]
    pub fn in_sub_graph(&self, idx: NodeIndex) -> bool {
        self.in_sub_graph[idx.index()]
    }

    pub fn mark_in_sub_graph(&mut self, idx: NodeIndex) {
        self.in_sub_graph[idx.index()] = true;
    }

    #[must_use]
    pub fn is_isolated(&self, idx: NodeIndex) -> bool {
        self.isolated[idx.index()]
    }

    pub fn mark_isolated(&mut self, idx: NodeIndex) {
        self.isolated[idx.index()] = true;
    }

    pub fn reset_flags(&mut self) {
        self.in_sub_graph.fill(false);
        self.isolated.fill(false);
    }

    /// Компоненты связности; каждая по возрастанию индекса, упорядочены по первому узлу
    #[must_use]
    pub fn components(&self) -> Vec<Vec<NodeIndex>> {
        let mut seen = vec![false; self.node_count()];
        let mut components = Vec::new();
        for start in self.graph.node_indices() {
            if seen[start.index()] {
                continue;
            }
            seen[start.index()] = true;
            let mut queue = VecDeque::from([start]);
            let mut members = Vec::new();
            while let Some(current) = queue.pop_front() {
                members.push(current);
                for n in self.neighbors(current) {
                    if !seen[n.index()] {
                        seen[n.index()] = true;
                        queue.push_back(n);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }
}

/// Строит по графу на каждое государство из сухопутных провинций таблицы
///
/// Провинции без государства (state 0) не попадают ни в один граф. Графы упорядочены по id
/// государства, узлы — по индексу провинции.
#[must_use]
pub fn build_state_graphs(table: &ProvinceTable) -> Vec<ProvinceGraph> {
    let mut by_state: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for province in table.iter().filter(|p| p.is_titled()) {
        if province.state == 0 {
            tracing::debug!("Провинция {} не принадлежит государству", province.name);
            continue;
        }
        by_state
            .entry(province.state)
            .or_default()
            .push(province.id as usize);
    }

    let graphs: Vec<ProvinceGraph> = by_state
        .into_iter()
        .map(|(state, members)| {
            let mut graph = ProvinceGraph::new(state);
            for &p in &members {
                let province = &table.provinces[p];
                graph.add_node(GraphNode {
                    province: p,
                    name: province.name.clone(),
                    population: province.population,
                    has_settlement: province.settlement != 0,
                    is_capital: province.is_capital,
                });
            }
            for &p in &members {
                for &n in &table.provinces[p].neighbors {
                    graph.add_edge(p, n);
                }
            }
            graph
        })
        .collect();

    tracing::info!("Построено {} графов соседства", graphs.len());
    graphs
}
