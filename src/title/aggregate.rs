// src/title/aggregate.rs
//! Сборка верхних рангов
//!
//! Герцогство создаётся одно на государство. Королевства собирают герцогства с одинаковой
//! преобладающей культурой, империи собирают королевства с одинаковой преобладающей религией.
//! Группы идут в порядке первого появления ключа, поэтому результат зависит только от
//! порядка герцогств на входе.

use std::collections::HashMap;

use crate::title::{County, Duchy, Empire, Kingdom, Tally, Tier};

#[must_use]
pub fn build_duchy(state: u32, name: String, counties: Vec<County>) -> Duchy {
    let mut cultures = Tally::default();
    let mut religions = Tally::default();
    for county in &counties {
        cultures.merge(&county.cultures);
        religions.merge(&county.religions);
    }
    Duchy {
        id: 0,
        key: String::new(),
        name,
        state,
        population: counties.iter().map(|c| c.population).sum(),
        culture: cultures.dominant().unwrap_or(0),
        religion: religions.dominant().unwrap_or(0),
        counties,
        holder: None,
        liege: None,
        religions,
    }
}

/// Группирует элементы по ключу, сохраняя порядок первого появления ключа
fn group_by_key<T>(items: Vec<T>, key: impl Fn(&T) -> u32) -> Vec<(u32, Vec<T>)> {
    let mut slot: HashMap<u32, usize> = HashMap::new();
    let mut groups: Vec<(u32, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        let i = *slot.entry(k).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(item);
    }
    groups
}

/// Индекс самого населённого элемента; при равенстве — первый
fn most_populous<T>(items: &[T], population: impl Fn(&T) -> u64) -> usize {
    let mut best = 0;
    for (i, item) in items.iter().enumerate() {
        if population(item) > population(&items[best]) {
            best = i;
        }
    }
    best
}

/// Собирает королевства и империи над готовыми герцогствами
///
/// Королевство (империя) разрешено, только если объединяет больше одного герцогства
/// (королевства). Название берётся у самого населённого члена.
#[must_use]
pub fn aggregate(duchies: Vec<Duchy>) -> Vec<Empire> {
    let kingdoms: Vec<Kingdom> = group_by_key(duchies, |d| d.culture)
        .into_iter()
        .map(|(culture, duchies)| {
            let mut religions = Tally::default();
            for duchy in &duchies {
                religions.merge(&duchy.religions);
            }
            let name = duchies[most_populous(&duchies, |d| d.population)].name.clone();
            Kingdom {
                id: 0,
                key: String::new(),
                name,
                is_allowed: duchies.len() > 1,
                population: duchies.iter().map(|d| d.population).sum(),
                culture,
                religion: religions.dominant().unwrap_or(0),
                duchies,
                holder: None,
                liege: None,
            }
        })
        .collect();

    group_by_key(kingdoms, |k| k.religion)
        .into_iter()
        .map(|(religion, kingdoms)| {
            let lead = &kingdoms[most_populous(&kingdoms, |k| k.population)];
            Empire {
                id: 0,
                key: String::new(),
                name: lead.name.clone(),
                is_allowed: kingdoms.len() > 1,
                population: kingdoms.iter().map(|k| k.population).sum(),
                culture: lead.culture,
                religion,
                kingdoms,
                holder: None,
            }
        })
        .collect()
}

/// Проставляет id и ключи в порядке вывода: империя, её королевства, их герцогства и т.д.
///
/// Счётчик у каждого ранга свой и начинается с 1.
pub fn assign_ids(empires: &mut [Empire]) {
    let mut next = [1u32; 5];
    let mut take = |tier: Tier, name: &str| {
        let slot = &mut next[tier as usize];
        let id = *slot;
        *slot += 1;
        (id, title_key(tier, name, id))
    };

    for empire in empires {
        (empire.id, empire.key) = take(Tier::Empire, &empire.name);
        for kingdom in &mut empire.kingdoms {
            (kingdom.id, kingdom.key) = take(Tier::Kingdom, &kingdom.name);
            for duchy in &mut kingdom.duchies {
                (duchy.id, duchy.key) = take(Tier::Duchy, &duchy.name);
                for county in &mut duchy.counties {
                    (county.id, county.key) = take(Tier::County, &county.name);
                    for barony in &mut county.baronies {
                        (barony.id, barony.key) = take(Tier::Barony, &barony.name);
                    }
                }
            }
        }
    }
}

#[must_use]
pub fn title_key(tier: Tier, name: &str, id: u32) -> String {
    format!("{}_{}_{id}", tier.prefix(), slug(name))
}

/// Строчный ASCII-слаг: буквы и цифры, остальное схлопывается в одиночный `_`
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("title");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::title::Barony;

    fn county(name: &str, population: u64, culture: u32, religion: u32) -> County {
        let mut cultures = Tally::default();
        cultures.add(culture, 1);
        let mut religions = Tally::default();
        religions.add(religion, 1);
        County {
            id: 0,
            key: String::new(),
            name: name.to_string(),
            baronies: vec![Barony {
                id: 0,
                key: String::new(),
                name: name.to_string(),
                province: 1,
                population: population as u32,
                culture,
                religion,
                holder: None,
            }],
            population,
            culture,
            religion,
            holder: None,
            liege: None,
            cultures,
            religions,
        }
    }

    fn duchy(state: u32, culture: u32, religion: u32) -> Duchy {
        build_duchy(
            state,
            format!("Duchy {state}"),
            vec![county(&format!("C{state}"), u64::from(state) * 10, culture, religion)],
        )
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Nova Aurelia"), "nova_aurelia");
        assert_eq!(slug("  --Ölm'stadt!! "), "lm_stadt");
        assert_eq!(slug("Œ"), "title");
    }

    #[test]
    fn test_single_duchy_kingdom_is_not_allowed() {
        let empires = aggregate(vec![duchy(1, 1, 1)]);
        assert_eq!(empires.len(), 1);
        assert!(!empires[0].is_allowed);
        assert!(!empires[0].kingdoms[0].is_allowed);
    }

    #[test]
    fn test_shared_culture_forms_allowed_kingdom() {
        let empires = aggregate(vec![duchy(1, 1, 1), duchy(2, 1, 1)]);
        let kingdom = &empires[0].kingdoms[0];
        assert!(kingdom.is_allowed);
        assert_eq!(kingdom.duchies.len(), 2);
        // Название у самого населённого герцогства
        assert_eq!(kingdom.name, "Duchy 2");
    }

    #[test]
    fn test_empires_group_kingdoms_by_religion() {
        let empires = aggregate(vec![
            duchy(1, 1, 7),
            duchy(2, 2, 7),
            duchy(3, 3, 8),
            duchy(4, 1, 7),
        ]);
        assert_eq!(empires.len(), 2);
        assert_eq!(empires[0].religion, 7);
        assert_eq!(empires[0].kingdoms.len(), 2);
        assert!(empires[0].is_allowed);
        assert_eq!(empires[0].kingdoms[0].duchies.len(), 2);
        assert!(!empires[1].is_allowed);
    }

    #[test]
    fn test_ids_follow_emission_order() {
        let mut empires = aggregate(vec![duchy(1, 1, 7), duchy(2, 2, 8), duchy(3, 1, 7)]);
        assign_ids(&mut empires);

        let duchy_ids: Vec<(u32, u32)> = empires
            .iter()
            .flat_map(|e| &e.kingdoms)
            .flat_map(|k| &k.duchies)
            .map(|d| (d.state, d.id))
            .collect();
        // Герцогство 3 попадает в королевство герцогства 1 и выводится вторым
        assert_eq!(duchy_ids, vec![(1, 1), (3, 2), (2, 3)]);
        assert_eq!(empires[1].key, "e_duchy_2_2");
        assert_eq!(empires[0].kingdoms[0].duchies[1].counties[0].key, "c_c3_2");
    }
}
