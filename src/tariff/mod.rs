//! Import tariff estimation for a basket of line items
//!
//! Every category carries a flat ad-valorem rate. An item tagged with several
//! categories pays the sum of their rates on its base price.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Rate applied to every shipped category
pub const DEFAULT_RATE: f64 = 0.10;

/// Categories offered by the calculator, as (id, display name)
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("agriculture", "Agriculture & Food"),
    ("beverages", "Beverages"),
    ("textiles", "Textiles & Apparel"),
    ("leather", "Leather Goods"),
    ("handicrafts", "Handicrafts & Home Decor"),
    ("jewelry", "Jewelry"),
    ("furniture", "Furniture"),
    ("cosmetics", "Cosmetics & Personal Care"),
    ("electronics", "Electronics"),
    ("machinery", "Machinery & Parts"),
    ("chemicals", "Chemicals & Plastics"),
    ("metals", "Metals"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffCategory {
    pub id: String,
    pub name: String,
    /// Fraction of the base price, 0.10 for 10%
    pub rate: f64,
}

/// A basket entry submitted by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub base_price: f64,
    pub category_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTariff {
    pub item_id: String,
    pub base: f64,
    pub rate: f64,
    pub tariff: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TariffSummary {
    pub items: Vec<ItemTariff>,
    pub total_base: f64,
    pub total_tariff: f64,
    pub total_final: f64,
    /// `total_tariff / total_base`; `None` when there is no base to divide by
    pub effective_rate: Option<f64>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TariffError {
    #[error("Unknown tariff category: {0}")]
    UnknownCategory(String),

    #[error("Invalid base price for item {0}")]
    InvalidPrice(String),
}

/// Rates by category id
#[derive(Debug, Clone)]
pub struct TariffSchedule {
    categories: Vec<TariffCategory>,
    rates: HashMap<String, f64>,
}

impl TariffSchedule {
    pub fn new(categories: Vec<TariffCategory>) -> Self {
        let rates = categories
            .iter()
            .map(|c| (c.id.clone(), c.rate))
            .collect();
        Self { categories, rates }
    }

    pub fn categories(&self) -> &[TariffCategory] {
        &self.categories
    }

    /// Combined rate of the distinct tags
    pub fn rate_for(&self, category_ids: &[String]) -> Result<f64, TariffError> {
        let distinct: BTreeSet<&str> = category_ids.iter().map(String::as_str).collect();
        distinct.into_iter().try_fold(0.0, |sum, id| {
            self.rates
                .get(id)
                .map(|rate| sum + rate)
                .ok_or_else(|| TariffError::UnknownCategory(id.to_string()))
        })
    }

    pub fn item_tariff(&self, item: &LineItem) -> Result<ItemTariff, TariffError> {
        if !item.base_price.is_finite() || item.base_price < 0.0 {
            return Err(TariffError::InvalidPrice(item.id.clone()));
        }

        let rate = self.rate_for(&item.category_ids)?;
        let tariff = item.base_price * rate;

        Ok(ItemTariff {
            item_id: item.id.clone(),
            base: item.base_price,
            rate,
            tariff,
            total: item.base_price + tariff,
        })
    }

    pub fn calculate(&self, items: &[LineItem]) -> Result<TariffSummary, TariffError> {
        let items = items
            .iter()
            .map(|item| self.item_tariff(item))
            .collect::<Result<Vec<_>, _>>()?;

        let total_base: f64 = items.iter().map(|i| i.base).sum();
        let total_tariff: f64 = items.iter().map(|i| i.tariff).sum();
        let total_final: f64 = items.iter().map(|i| i.total).sum();

        let effective_rate = (total_base > 0.0).then(|| total_tariff / total_base);

        Ok(TariffSummary {
            items,
            total_base,
            total_tariff,
            total_final,
            effective_rate,
        })
    }
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORIES
                .iter()
                .map(|(id, name)| TariffCategory {
                    id: id.to_string(),
                    name: name.to_string(),
                    rate: DEFAULT_RATE,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, base: f64, tags: &[&str]) -> LineItem {
        LineItem {
            id: id.to_string(),
            name: String::new(),
            base_price: base,
            category_ids: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_item_sums_its_rates() {
        let schedule = TariffSchedule::default();
        let result = schedule
            .item_tariff(&item("poncho", 200.0, &["textiles", "handicrafts"]))
            .unwrap();

        assert!(close(result.rate, 0.20));
        assert!(close(result.tariff, 40.0));
        assert!(close(result.total, 240.0));
    }

    #[test]
    fn custom_rates_are_summed() {
        let schedule = TariffSchedule::new(vec![
            TariffCategory { id: "a".into(), name: "A".into(), rate: 0.05 },
            TariffCategory { id: "b".into(), name: "B".into(), rate: 0.125 },
        ]);

        let result = schedule.item_tariff(&item("x", 80.0, &["a", "b"])).unwrap();
        assert!(close(result.tariff, 80.0 * 0.175));
        assert!(close(result.total, 80.0 + 80.0 * 0.175));
    }

    #[test]
    fn duplicate_tags_count_once() {
        let schedule = TariffSchedule::default();
        let result = schedule
            .item_tariff(&item("coffee", 100.0, &["agriculture", "agriculture"]))
            .unwrap();
        assert!(close(result.tariff, 10.0));
    }

    #[test]
    fn untagged_item_pays_nothing() {
        let schedule = TariffSchedule::default();
        let result = schedule.item_tariff(&item("sample", 50.0, &[])).unwrap();
        assert_eq!(result.tariff, 0.0);
        assert_eq!(result.total, 50.0);
    }

    #[test]
    fn summary_aggregates_and_blends_rate() {
        let schedule = TariffSchedule::default();
        let summary = schedule
            .calculate(&[
                item("a", 100.0, &["electronics"]),
                item("b", 300.0, &["textiles", "leather"]),
            ])
            .unwrap();

        assert!(close(summary.total_base, 400.0));
        assert!(close(summary.total_tariff, 70.0));
        assert!(close(summary.total_final, 470.0));
        assert!(close(summary.effective_rate.unwrap(), 70.0 / 400.0));
    }

    #[test]
    fn empty_basket_has_no_effective_rate() {
        let summary = TariffSchedule::default().calculate(&[]).unwrap();
        assert_eq!(summary.total_base, 0.0);
        assert_eq!(summary.effective_rate, None);
    }

    #[test]
    fn zero_priced_basket_has_no_effective_rate() {
        let summary = TariffSchedule::default()
            .calculate(&[item("free", 0.0, &["metals"])])
            .unwrap();
        assert_eq!(summary.effective_rate, None);
    }

    #[test]
    fn rejects_unknown_tags_and_bad_prices() {
        let schedule = TariffSchedule::default();
        assert_eq!(
            schedule.calculate(&[item("x", 10.0, &["fireworks"])]),
            Err(TariffError::UnknownCategory("fireworks".into()))
        );
        assert_eq!(
            schedule.calculate(&[item("y", -1.0, &[])]),
            Err(TariffError::InvalidPrice("y".into()))
        );
        assert_eq!(
            schedule.calculate(&[item("z", f64::NAN, &[])]),
            Err(TariffError::InvalidPrice("z".into()))
        );
    }

    #[test]
    fn shipped_categories_are_all_ten_percent() {
        let schedule = TariffSchedule::default();
        assert!(!schedule.categories().is_empty());
        assert!(schedule.categories().iter().all(|c| c.rate == DEFAULT_RATE));
    }
}
