// src/succession.rs
//! Генерация правителей и вассальных связей
//!
//! Иерархия обходится сверху вниз за один проход на едином потоке ГПСЧ. На каждом ранге
//! бросается «есть ли здесь свой правитель»; если он есть у ранга выше, он есть и здесь.
//! Титул без своего правителя записывается за последним созданным персонажем, но в
//! вассальных связях и загрузке такой держатель не участвует.
//! Графство держит всегда кто-то: либо новый персонаж, либо текущий держатель, пока у того
//! не исчерпан лимит владений. Загрузка сюзеренов (`владения / лимит`) повышает шанс, что
//! графство получит собственного правителя.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::SuccessionSettings;
use crate::title::{County, Hierarchy, Tier, TitleRef};

const SYLLABLES: [&str; 24] = [
    "al", "bar", "cor", "dan", "el", "fen", "gar", "hal", "is", "jor", "kel", "lor", "mar",
    "nor", "or", "per", "quin", "ros", "sar", "tor", "ul", "var", "wen", "yr",
];

const DYNASTY_SUFFIXES: [&str; 6] = ["ing", "son", "ard", "ell", "ov", "ici"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub dynasty: String,
    pub culture: u32,
    pub religion: u32,
    pub age: u32,
    pub stewardship: u32,
    /// Предел прямых владений: `stewardship / 6 + base_limit`
    pub limit: u32,
    pub holdings: u32,
    /// Титул, ради которого персонаж создан
    pub primary_title: TitleRef,
}

impl Character {
    #[must_use]
    pub fn encouragement(&self) -> f64 {
        f64::from(self.holdings) / f64::from(self.limit)
    }

    #[must_use]
    pub fn at_limit(&self) -> bool {
        self.holdings >= self.limit
    }
}

/// Держатели и титулы рангов над текущим герцогством
#[derive(Debug, Clone, Copy)]
struct Overlords {
    duchy: (Option<u32>, TitleRef),
    kingdom: (Option<u32>, TitleRef),
    empire: (Option<u32>, TitleRef),
}

impl Overlords {
    /// Ближайший ранг с правителем
    fn nearest(&self) -> Option<(u32, TitleRef)> {
        [self.duchy, self.kingdom, self.empire]
            .into_iter()
            .find_map(|(holder, title)| holder.map(|h| (h, title)))
    }
}

pub struct SuccessionGenerator<'a> {
    settings: &'a SuccessionSettings,
    rng: &'a mut ChaCha8Rng,
    characters: Vec<Character>,
}

impl<'a> SuccessionGenerator<'a> {
    pub fn new(settings: &'a SuccessionSettings, rng: &'a mut ChaCha8Rng) -> Self {
        Self {
            settings,
            rng,
            characters: Vec::new(),
        }
    }

    /// Заполняет `holder` и `liege` всех титулов и возвращает созданных персонажей
    pub fn run(mut self, hierarchy: &mut Hierarchy) -> Vec<Character> {
        let s = self.settings;
        for empire in &mut hierarchy.empires {
            let empire_ref = TitleRef::new(Tier::Empire, empire.id);
            let empire_ranked = self.draw(s.empire_chance);
            empire.holder =
                self.holder_for(empire_ranked, empire.culture, empire.religion, empire_ref);
            let empire_ruler = empire.holder.filter(|_| empire_ranked);

            for kingdom in &mut empire.kingdoms {
                let kingdom_ref = TitleRef::new(Tier::Kingdom, kingdom.id);
                let kingdom_ranked = self.draw(s.kingdom_chance) || empire_ranked;
                kingdom.holder =
                    self.holder_for(kingdom_ranked, kingdom.culture, kingdom.religion, kingdom_ref);
                kingdom.liege = (kingdom_ranked && empire_ranked).then_some(empire_ref);
                let kingdom_ruler = kingdom.holder.filter(|_| kingdom_ranked);

                for duchy in &mut kingdom.duchies {
                    let duchy_ref = TitleRef::new(Tier::Duchy, duchy.id);
                    let duchy_ranked = self.draw(s.duchy_chance) || kingdom_ranked;
                    duchy.holder =
                        self.holder_for(duchy_ranked, duchy.culture, duchy.religion, duchy_ref);

                    let overlords = Overlords {
                        duchy: (duchy.holder.filter(|_| duchy_ranked), duchy_ref),
                        kingdom: (kingdom_ruler, kingdom_ref),
                        empire: (empire_ruler, empire_ref),
                    };
                    if duchy_ranked {
                        duchy.liege = Overlords {
                            duchy: (None, duchy_ref),
                            ..overlords
                        }
                        .nearest()
                        .map(|(_, title)| title);
                    }
                    self.walk_counties(&mut duchy.counties, &overlords);
                }
            }
        }

        tracing::info!("Создано {} персонажей", self.characters.len());
        self.characters
    }

    fn walk_counties(&mut self, counties: &mut [County], overlords: &Overlords) {
        let s = self.settings;
        let nearest = overlords.nearest();
        let mut current = nearest.map(|(h, _)| h);
        let mut current_liege = nearest.map(|(_, t)| t);

        for county in counties {
            let encouragement = [
                self.encouragement(current),
                self.encouragement(overlords.duchy.0),
                self.encouragement(overlords.kingdom.0),
                self.encouragement(overlords.empire.0),
            ];
            let chance = (s.county_base_chance
                + s.tier_weights
                    .iter()
                    .zip(encouragement)
                    .map(|(w, e)| w * e)
                    .sum::<f64>())
            .clamp(0.0, 1.0);
            let roll = self.roll();

            let holder = match current {
                Some(id) if !self.character(id).at_limit() && roll >= chance => {
                    self.character_mut(id).holdings += 1;
                    county.liege = current_liege;
                    id
                }
                _ => {
                    let county_ref = TitleRef::new(Tier::County, county.id);
                    let id = self.create(county.culture, county.religion, county_ref);
                    county.liege = self.choose_liege(overlords, &encouragement);
                    current = Some(id);
                    current_liege = county.liege;
                    id
                }
            };

            county.holder = Some(holder);
            for barony in &mut county.baronies {
                barony.holder = Some(holder);
            }
        }
    }

    /// Ищет сюзерена нового графа: герцог, затем король, затем император
    ///
    /// Порог каждого уровня снижается его загрузкой; первый согласившийся становится
    /// сюзереном. Если никто не согласился, графство независимо.
    fn choose_liege(&mut self, overlords: &Overlords, encouragement: &[f64; 4]) -> Option<TitleRef> {
        let s = self.settings;
        let candidates = [
            (overlords.duchy, s.direct_liege_threshold, encouragement[1]),
            (overlords.kingdom, s.distant_liege_threshold, encouragement[2]),
            (overlords.empire, s.distant_liege_threshold, encouragement[3]),
        ];
        for ((holder, title), threshold, load) in candidates {
            if holder.is_none() {
                continue;
            }
            if self.roll() < (threshold - load).max(0.0) {
                return Some(title);
            }
        }
        None
    }

    /// Новый правитель для ранга с правителем, иначе держатель для учёта
    fn holder_for(
        &mut self,
        ranked: bool,
        culture: u32,
        religion: u32,
        title: TitleRef,
    ) -> Option<u32> {
        if ranked {
            Some(self.create(culture, religion, title))
        } else {
            self.last_created()
        }
    }

    fn last_created(&self) -> Option<u32> {
        self.characters.last().map(|c| c.id)
    }

    fn draw(&mut self, chance: f64) -> bool {
        self.roll() < chance
    }

    fn roll(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    fn encouragement(&self, holder: Option<u32>) -> f64 {
        holder.map_or(0.0, |id| self.character(id).encouragement())
    }

    fn character(&self, id: u32) -> &Character {
        &self.characters[id as usize - 1]
    }

    fn character_mut(&mut self, id: u32) -> &mut Character {
        &mut self.characters[id as usize - 1]
    }

    fn create(&mut self, culture: u32, religion: u32, title: TitleRef) -> u32 {
        let s = self.settings;
        let age = self.rng.gen_range(s.min_age..=s.max_age);
        let stewardship = self.rng.gen_range(0..=s.max_stewardship);
        let name = self.compose(2, 3);
        let dynasty = format!(
            "{}{}",
            self.compose(1, 2),
            DYNASTY_SUFFIXES[self.rng.gen_range(0..DYNASTY_SUFFIXES.len())]
        );
        let id = self.characters.len() as u32 + 1;
        self.characters.push(Character {
            id,
            name,
            dynasty,
            culture,
            religion,
            age,
            stewardship,
            limit: stewardship / 6 + s.base_limit,
            holdings: 1,
            primary_title: title,
        });
        id
    }

    fn compose(&mut self, min: usize, max: usize) -> String {
        let count = self.rng.gen_range(min..=max);
        let mut out = String::new();
        for _ in 0..count {
            out.push_str(SYLLABLES[self.rng.gen_range(0..SYLLABLES.len())]);
        }
        let mut chars = out.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => out,
        }
    }
}
