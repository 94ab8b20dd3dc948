//! Single-key sorting for listings and search results

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep the order the data source returned
    #[default]
    Relevance,
    Title,
    Price,
    Moq,
    Supplier,
    Country,
}

impl SortKey {
    fn is_numeric(self) -> bool {
        matches!(self, SortKey::Price | SortKey::Moq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Records that expose a raw display value per sort key
pub trait Sortable {
    fn sort_field(&self, key: SortKey) -> Option<&str>;
}

/// Comparable form of a raw field
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(String),
    Number(f64),
}

fn sort_value(raw: Option<&str>, key: SortKey) -> Option<SortValue> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if key.is_numeric() {
        parse_amount(raw).map(SortValue::Number)
    } else {
        Some(SortValue::Text(raw.to_lowercase()))
    }
}

/// Parse the first amount in a formatted value such as `"$1,250.00"`,
/// `"500 units"` or `"100-500 pcs"` (a range reads as its lower bound)
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim_start();
    let negative = raw.starts_with('-');

    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let mut number = String::new();
    let mut seen_point = false;
    for c in raw[start..].chars() {
        match c {
            '0'..='9' => number.push(c),
            // thousands separator
            ',' => {}
            '.' if !seen_point => {
                seen_point = true;
                number.push(c);
            }
            _ => break,
        }
    }

    let value: f64 = number.trim_end_matches('.').parse().ok()?;
    Some(if negative { -value } else { value })
}

fn compare_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    }
}

/// Stable sort by a single key. Records without a usable value go last in
/// either direction.
pub fn sort_records<R: Sortable>(records: &mut [R], key: SortKey, direction: SortDirection) {
    if key == SortKey::Relevance {
        return;
    }

    let mut keyed: Vec<(Option<SortValue>, usize)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (sort_value(r.sort_field(key), key), i))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let order: Vec<usize> = keyed.into_iter().map(|(_, i)| i).collect();
    apply_permutation(records, order);
}

/// Reorder so that position `n` holds the element previously at `order[n]`
fn apply_permutation<R>(records: &mut [R], mut order: Vec<usize>) {
    for start in 0..order.len() {
        let mut current = start;
        while order[current] != start {
            let next = order[current];
            records.swap(current, next);
            order[current] = current;
            current = next;
        }
        order[current] = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        title: &'static str,
        price: Option<&'static str>,
    }

    impl Sortable for Row {
        fn sort_field(&self, key: SortKey) -> Option<&str> {
            match key {
                SortKey::Title => Some(self.title),
                SortKey::Price => self.price,
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { title: "banana", price: Some("$1,250.00") },
            Row { title: "Apple", price: Some("$99.50") },
            Row { title: "cherry", price: None },
            Row { title: "apricot", price: Some("USD 300") },
            Row { title: "Banana", price: Some("$99.50") },
        ]
    }

    fn titles(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.title).collect()
    }

    #[test]
    fn parses_formatted_currency() {
        assert_eq!(parse_amount("$1,250.00"), Some(1250.0));
        assert_eq!(parse_amount("MOQ: 500 units"), Some(500.0));
        assert_eq!(parse_amount("-$3.5"), Some(-3.5));
        assert_eq!(parse_amount("100-500 units"), Some(100.0));
        assert_eq!(parse_amount("1.5 kg / 2.0 kg"), Some(1.5));
        assert_eq!(parse_amount("12."), Some(12.0));
        assert_eq!(parse_amount("Contact supplier"), None);
    }

    #[test]
    fn text_ascending_is_case_insensitive_and_non_decreasing() {
        let mut sorted = rows();
        sort_records(&mut sorted, SortKey::Title, SortDirection::Asc);

        let keys: Vec<String> = sorted.iter().map(|r| r.title.to_lowercase()).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        // equal keys keep input order
        assert_eq!(titles(&sorted), vec!["Apple", "apricot", "banana", "Banana", "cherry"]);
    }

    #[test]
    fn price_ascending_by_parsed_amount_missing_last() {
        let mut sorted = rows();
        sort_records(&mut sorted, SortKey::Price, SortDirection::Asc);

        assert_eq!(titles(&sorted), vec!["Apple", "Banana", "apricot", "banana", "cherry"]);
        let amounts: Vec<f64> = sorted
            .iter()
            .filter_map(|r| r.price.and_then(parse_amount))
            .collect();
        assert!(amounts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn price_descending_keeps_missing_last() {
        let mut sorted = rows();
        sort_records(&mut sorted, SortKey::Price, SortDirection::Desc);
        assert_eq!(titles(&sorted), vec!["banana", "apricot", "Apple", "Banana", "cherry"]);
    }

    #[test]
    fn moq_ranges_sort_by_lower_bound() {
        let mut sorted = vec![
            Row { title: "range", price: Some("100-500 units") },
            Row { title: "single", price: Some("1,000 units") },
            Row { title: "small", price: Some("50 units") },
        ];
        sort_records(&mut sorted, SortKey::Price, SortDirection::Asc);
        assert_eq!(titles(&sorted), vec!["small", "range", "single"]);
    }

    #[test]
    fn relevance_leaves_order_untouched() {
        let mut sorted = rows();
        sort_records(&mut sorted, SortKey::Relevance, SortDirection::Desc);
        assert_eq!(titles(&sorted), titles(&rows()));
    }

    #[test]
    fn toggle_flips_direction() {
        assert_eq!(SortDirection::Asc.toggle(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggle().toggle(), SortDirection::Desc);
    }
}
