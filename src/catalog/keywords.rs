//! Related-search suggestions drawn from static keyword lists

use std::collections::HashMap;

/// Keyword lists per product theme
pub const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    (
        "food",
        &[
            "coffee", "cacao", "chocolate", "honey", "quinoa", "avocado", "mango", "spices",
            "tequila", "mezcal", "wine", "organic", "snacks", "sauce",
        ],
    ),
    (
        "textiles",
        &[
            "alpaca", "wool", "cotton", "leather", "poncho", "blanket", "embroidered", "woven",
            "apparel", "bags", "footwear",
        ],
    ),
    (
        "home",
        &[
            "ceramics", "pottery", "furniture", "handcrafted", "artisan", "decor", "hammock",
            "candles", "silver", "jewelry",
        ],
    ),
    (
        "industrial",
        &[
            "packaging", "machinery", "electronics", "automotive", "plastics", "steel",
            "chemicals", "wholesale", "private label", "export",
        ],
    ),
];

fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word (or whole-phrase) occurrences of `keyword` in normalized text
fn occurrences(haystack: &str, keyword: &str) -> usize {
    let needle: Vec<&str> = keyword.split(' ').collect();
    let words: Vec<&str> = haystack.split(' ').collect();
    words.windows(needle.len()).filter(|w| *w == needle.as_slice()).count()
}

/// Keywords that appear in the result texts but not in the query, most frequent
/// first, ties alphabetical
pub fn suggest_keywords<'a, I>(query: &str, texts: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = normalize(query);
    let texts: Vec<String> = texts.into_iter().map(normalize).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for keyword in KEYWORD_GROUPS.iter().flat_map(|(_, words)| words.iter()) {
        if occurrences(&query, keyword) > 0 {
            continue;
        }
        let hits: usize = texts.iter().map(|t| occurrences(t, keyword)).sum();
        if hits > 0 {
            *counts.entry(*keyword).or_default() += hits;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(keyword, _)| keyword.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_frequency_and_skips_query_terms() {
        let texts = [
            "Organic Coffee beans from Chiapas",
            "Single-origin coffee, organic certified",
            "Artisan cacao nibs",
            "Coffee & cacao gift box",
        ];

        let suggestions = suggest_keywords("coffee", texts, 5);
        assert_eq!(suggestions, vec!["cacao", "organic", "artisan"]);
    }

    #[test]
    fn matches_whole_words_only() {
        let suggestions = suggest_keywords("", ["Mangosteen juice", "mango pulp"], 10);
        assert_eq!(suggestions, vec!["mango"]);
    }

    #[test]
    fn matches_multi_word_keywords() {
        let suggestions = suggest_keywords("bottles", ["Private-label bottles for export"], 10);
        assert_eq!(suggestions, vec!["export", "private label"]);
    }

    #[test]
    fn repeated_words_all_count() {
        assert_eq!(occurrences("wool wool", "wool"), 2);
        assert_eq!(occurrences("private label private label", "private label"), 2);
        assert_eq!(occurrences("", "wool"), 0);

        let suggestions = suggest_keywords("", ["wool wool", "cotton"], 10);
        assert_eq!(suggestions, vec!["wool", "cotton"]);
    }

    #[test]
    fn respects_limit() {
        let suggestions = suggest_keywords("", ["wool cotton leather alpaca"], 2);
        assert_eq!(suggestions, vec!["alpaca", "cotton"]);
    }
}
