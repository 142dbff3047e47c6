// src/remap.rs
//! Детерминированная замена имён культур и религий
//!
//! Пул целевых имён перемешивается один раз (Фишер–Йетс) на общем потоке ГПСЧ, затем
//! исходные id по возрастанию получают имена из перемешанного пула по кругу.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::dataset::NamedMeta;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameRemap {
    names: BTreeMap<u32, String>,
}

impl NameRemap {
    /// Строит отображение для `ids`
    ///
    /// С пустым пулом ГПСЧ не трогается, а имена берутся из метаданных (`source`); id без
    /// метаданных получает имя вида `{fallback}_{id}`.
    pub fn build(
        ids: &BTreeSet<u32>,
        pool: &[String],
        source: &HashMap<u32, NamedMeta>,
        fallback: &str,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let names = if pool.is_empty() {
            ids.iter()
                .map(|&id| {
                    let name = source
                        .get(&id)
                        .map_or_else(|| format!("{fallback}_{id}"), |m| m.name.clone());
                    (id, name)
                })
                .collect()
        } else {
            let mut shuffled = pool.to_vec();
            shuffled.shuffle(rng);
            ids.iter()
                .enumerate()
                .map(|(i, &id)| (id, shuffled[i % shuffled.len()].clone()))
                .collect()
        };
        Self { names }
    }

    #[must_use]
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn pool(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_same_seed_same_names() {
        let ids: BTreeSet<u32> = [3, 1, 9].into_iter().collect();
        let names = pool(&["norse", "saxon", "frankish", "gaelic"]);
        let a = NameRemap::build(
            &ids,
            &names,
            &HashMap::new(),
            "culture",
            &mut ChaCha8Rng::seed_from_u64(5),
        );
        let b = NameRemap::build(
            &ids,
            &names,
            &HashMap::new(),
            "culture",
            &mut ChaCha8Rng::seed_from_u64(5),
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        // Три id из пула в четыре имени — все разные
        let distinct: BTreeSet<&str> = ids.iter().filter_map(|&id| a.name(id)).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_pool_cycles_when_short() {
        let ids: BTreeSet<u32> = (1..=5).collect();
        let remap = NameRemap::build(
            &ids,
            &pool(&["a", "b"]),
            &HashMap::new(),
            "culture",
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        assert_eq!(remap.name(1), remap.name(3));
        assert_eq!(remap.name(2), remap.name(4));
        assert_ne!(remap.name(1), remap.name(2));
    }

    #[test]
    fn test_empty_pool_keeps_source_names() {
        let ids: BTreeSet<u32> = [1, 2].into_iter().collect();
        let source = HashMap::from([(
            1,
            NamedMeta {
                id: 1,
                name: "Elvish".into(),
                removed: false,
            },
        )]);
        let remap = NameRemap::build(
            &ids,
            &[],
            &source,
            "religion",
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        assert_eq!(remap.name(1), Some("Elvish"));
        assert_eq!(remap.name(2), Some("religion_2"));
        assert_eq!(remap.name(3), None);
    }
}
