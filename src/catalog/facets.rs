//! Facet selection and filtering over already-fetched records

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A filter dimension shown in the listing sidebars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Category,
    Supplier,
    Source,
    Country,
}

impl Facet {
    pub const ALL: [Facet; 4] = [Facet::Category, Facet::Supplier, Facet::Source, Facet::Country];
}

/// Records that expose a value per facet
pub trait Faceted {
    fn facet_value(&self, facet: Facet) -> Option<&str>;
}

/// Selected values per facet. Empty groups do not constrain anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSelection {
    groups: BTreeMap<Facet, BTreeSet<String>>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = self.groups.entry(facet).or_default();
        group.extend(values.into_iter().map(Into::into).filter(|v| !v.is_empty()));
        self
    }

    /// Select the value if absent, deselect it otherwise. Returns the new state.
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let group = self.groups.entry(facet).or_default();
        if group.remove(value) {
            false
        } else {
            group.insert(value.to_string());
            true
        }
    }

    pub fn clear(&mut self, facet: Facet) {
        self.groups.remove(&facet);
    }

    pub fn selected(&self, facet: Facet) -> impl Iterator<Item = &str> {
        self.groups
            .get(&facet)
            .into_iter()
            .flat_map(|group| group.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeSet::is_empty)
    }

    /// AND across non-empty groups, OR within a group
    pub fn matches<R: Faceted + ?Sized>(&self, record: &R) -> bool {
        self.groups
            .iter()
            .filter(|(_, group)| !group.is_empty())
            .all(|(facet, group)| {
                record
                    .facet_value(*facet)
                    .is_some_and(|value| group.contains(value))
            })
    }
}

/// Records passing `selection`, in input order
pub fn filter_records<R: Faceted + Clone>(records: &[R], selection: &FacetSelection) -> Vec<R> {
    if selection.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| selection.matches(*record))
        .cloned()
        .collect()
}

/// A facet value and how many records carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Distinct values for `facet`, most frequent first, ties by value
pub fn facet_counts<R: Faceted>(records: &[R], facet: Facet) -> Vec<FacetCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in records.iter().filter_map(|r| r.facet_value(facet)) {
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut counts: Vec<FacetCount> = counts
        .into_iter()
        .map(|(value, count)| FacetCount {
            value: value.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

/// Counts for every facet, keyed by facet
pub fn all_facet_counts<R: Faceted>(records: &[R]) -> BTreeMap<Facet, Vec<FacetCount>> {
    Facet::ALL
        .iter()
        .map(|facet| (*facet, facet_counts(records, *facet)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Listing {
        name: &'static str,
        category: Option<&'static str>,
        supplier: Option<&'static str>,
        country: Option<&'static str>,
    }

    impl Faceted for Listing {
        fn facet_value(&self, facet: Facet) -> Option<&str> {
            match facet {
                Facet::Category => self.category,
                Facet::Supplier => self.supplier,
                Facet::Country => self.country,
                Facet::Source => None,
            }
        }
    }

    fn listing(
        name: &'static str,
        category: &'static str,
        supplier: &'static str,
        country: &'static str,
    ) -> Listing {
        Listing {
            name,
            category: Some(category),
            supplier: Some(supplier),
            country: Some(country),
        }
    }

    fn catalog() -> Vec<Listing> {
        vec![
            listing("radio", "Electronics", "Andes Tech", "Peru"),
            listing("cable", "Electronics", "Norte Sur", "Mexico"),
            listing("poncho", "Textiles", "Tejidos MX", "Mexico"),
            listing("coffee", "Food", "Cafe Verde", "Mexico"),
            listing("scarf", "Textiles", "Alpaca Co", "Peru"),
        ]
    }

    fn names(records: &[Listing]) -> Vec<&'static str> {
        records.iter().map(|r| r.name).collect()
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let records = catalog();
        assert_eq!(filter_records(&records, &FacetSelection::new()), records);
    }

    #[test]
    fn groups_are_anded_values_are_ored() {
        let selection = FacetSelection::new()
            .with(Facet::Category, ["Electronics", "Textiles"])
            .with(Facet::Country, ["Mexico"]);

        let filtered = filter_records(&catalog(), &selection);
        assert_eq!(names(&filtered), vec!["cable", "poncho"]);
        assert!(filtered.iter().all(|r| {
            matches!(r.category, Some("Electronics") | Some("Textiles"))
                && r.country == Some("Mexico")
        }));
    }

    #[test]
    fn passes_iff_every_nonempty_group_contains_value() {
        let selection = FacetSelection::new()
            .with(Facet::Supplier, ["Alpaca Co", "Andes Tech"])
            .with(Facet::Country, Vec::<String>::new());

        for record in catalog() {
            let expected = matches!(record.supplier, Some("Alpaca Co") | Some("Andes Tech"));
            assert_eq!(selection.matches(&record), expected, "{}", record.name);
        }
    }

    #[test]
    fn missing_value_fails_a_constrained_group() {
        let mut unbranded = listing("jar", "Food", "x", "Mexico");
        unbranded.supplier = None;

        let selection = FacetSelection::new().with(Facet::Supplier, ["x"]);
        assert!(!selection.matches(&unbranded));
        assert!(FacetSelection::new().matches(&unbranded));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = FacetSelection::new();
        assert!(selection.toggle(Facet::Country, "Peru"));
        assert_eq!(selection.selected(Facet::Country).collect::<Vec<_>>(), vec!["Peru"]);
        assert!(!selection.toggle(Facet::Country, "Peru"));
        assert!(selection.is_empty());

        selection.toggle(Facet::Source, "Expo");
        selection.clear(Facet::Source);
        assert!(selection.is_empty());
    }

    #[test]
    fn counts_sorted_by_frequency_then_value() {
        let counts = facet_counts(&catalog(), Facet::Country);
        assert_eq!(
            counts,
            vec![
                FacetCount { value: "Mexico".into(), count: 3 },
                FacetCount { value: "Peru".into(), count: 2 },
            ]
        );

        let categories = facet_counts(&catalog(), Facet::Category);
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[0].value, "Electronics");
        assert_eq!(categories[2].value, "Food");
    }
}
