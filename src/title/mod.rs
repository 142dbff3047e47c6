// src/title/mod.rs
//! Иерархия титулов: баронство → графство → герцогство → королевство → империя
//!
//! Членство строго вложенное: каждый титул владеет списком титулов ранга ниже, поэтому
//! графство не может оказаться в двух герцогствах, а герцогство не может остаться вне королевства.
//! После построения меняются только поля `holder` и `liege`.

pub mod aggregate;
pub mod county;

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Barony,
    County,
    Duchy,
    Kingdom,
    Empire,
}

impl Tier {
    /// Префикс ключа титула
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Tier::Barony => "b",
            Tier::County => "c",
            Tier::Duchy => "d",
            Tier::Kingdom => "k",
            Tier::Empire => "e",
        }
    }
}

/// Ссылка на титул: ранг и id внутри ранга
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TitleRef {
    pub tier: Tier,
    pub id: u32,
}

impl TitleRef {
    #[must_use]
    pub fn new(tier: Tier, id: u32) -> Self {
        Self { tier, id }
    }
}

/// Подсчёт клеток по культурам или религиям с запоминанием порядка первого появления
///
/// При равенстве счёта побеждает id, встреченный раньше.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    order: Vec<u32>,
    counts: HashMap<u32, usize>,
}

impl Tally {
    pub fn add(&mut self, id: u32, count: usize) {
        let entry = self.counts.entry(id).or_insert_with(|| {
            self.order.push(id);
            0
        });
        *entry += count;
    }

    /// Добавляет счёт другой таблицы так, будто её клетки шли следом за нашими
    pub fn merge(&mut self, other: &Tally) {
        for &id in &other.order {
            self.add(id, other.counts[&id]);
        }
    }

    #[must_use]
    pub fn dominant(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for &id in &self.order {
            let count = self.counts[&id];
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((id, count));
            }
        }
        best.map(|(id, _)| id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Barony {
    pub id: u32,
    pub key: String,
    pub name: String,
    /// Индекс провинции в итоговом массиве провинций
    pub province: usize,
    pub population: u32,
    pub culture: u32,
    pub religion: u32,
    pub holder: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct County {
    pub id: u32,
    pub key: String,
    pub name: String,
    /// Столичное баронство всегда первое
    pub baronies: Vec<Barony>,
    pub population: u64,
    pub culture: u32,
    pub religion: u32,
    pub holder: Option<u32>,
    pub liege: Option<TitleRef>,
    #[serde(skip)]
    pub(crate) cultures: Tally,
    #[serde(skip)]
    pub(crate) religions: Tally,
}

impl County {
    #[must_use]
    pub fn capital(&self) -> &Barony {
        &self.baronies[0]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Duchy {
    pub id: u32,
    pub key: String,
    pub name: String,
    /// Исходное государство
    pub state: u32,
    pub counties: Vec<County>,
    pub population: u64,
    pub culture: u32,
    pub religion: u32,
    pub holder: Option<u32>,
    pub liege: Option<TitleRef>,
    /// Клетки по религиям, из них выводится религия королевства
    #[serde(skip)]
    pub(crate) religions: Tally,
}

#[derive(Debug, Clone, Serialize)]
pub struct Kingdom {
    pub id: u32,
    pub key: String,
    pub name: String,
    /// Королевство из одного герцогства — заглушка, которую игрок не может создать сам
    pub is_allowed: bool,
    pub duchies: Vec<Duchy>,
    pub population: u64,
    pub culture: u32,
    pub religion: u32,
    pub holder: Option<u32>,
    pub liege: Option<TitleRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Empire {
    pub id: u32,
    pub key: String,
    pub name: String,
    pub is_allowed: bool,
    pub kingdoms: Vec<Kingdom>,
    pub population: u64,
    pub culture: u32,
    pub religion: u32,
    pub holder: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Hierarchy {
    pub empires: Vec<Empire>,
    /// Государства без единого поселения: в иерархию титулов не входят
    pub wasteland_states: Vec<u32>,
}

impl Hierarchy {
    pub fn kingdoms(&self) -> impl Iterator<Item = &Kingdom> {
        self.empires.iter().flat_map(|e| &e.kingdoms)
    }

    pub fn duchies(&self) -> impl Iterator<Item = &Duchy> {
        self.kingdoms().flat_map(|k| &k.duchies)
    }

    pub fn counties(&self) -> impl Iterator<Item = &County> {
        self.duchies().flat_map(|d| &d.counties)
    }

    pub fn baronies(&self) -> impl Iterator<Item = &Barony> {
        self.counties().flat_map(|c| &c.baronies)
    }

    /// Число титулов по рангам от баронств до империй
    #[must_use]
    pub fn tier_counts(&self) -> [usize; 5] {
        [
            self.baronies().count(),
            self.counties().count(),
            self.duchies().count(),
            self.kingdoms().count(),
            self.empires.len(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_prefers_first_seen_on_tie() {
        let mut tally = Tally::default();
        tally.add(7, 2);
        tally.add(3, 2);
        assert_eq!(tally.dominant(), Some(7));
        tally.add(3, 1);
        assert_eq!(tally.dominant(), Some(3));
    }

    #[test]
    fn test_tally_merge_keeps_order() {
        let mut a = Tally::default();
        a.add(1, 1);
        let mut b = Tally::default();
        b.add(2, 1);
        b.add(1, 0);
        a.merge(&b);
        // 1 и 2 по одному разу, 1 встречен раньше
        assert_eq!(a.dominant(), Some(1));
        assert!(Tally::default().dominant().is_none());
    }

    #[test]
    fn test_tier_prefixes() {
        let keys: Vec<&str> = [
            Tier::Barony,
            Tier::County,
            Tier::Duchy,
            Tier::Kingdom,
            Tier::Empire,
        ]
        .into_iter()
        .map(Tier::prefix)
        .collect();
        assert_eq!(keys, vec!["b", "c", "d", "k", "e"]);
    }
}
