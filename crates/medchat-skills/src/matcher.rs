//! Relevance matcher: ranks knowledge entries against a free-text query.
//!
//! score = quick similarity ratio + 0.1 × keyword overlap, highest first, top `limit`.
//! Entries with a non-positive score still survive when they list symptoms.

use medchat_core::{KnowledgeEntry, KnowledgeMap};
use std::collections::{HashMap, HashSet};

/// Default top-N.
pub const DEFAULT_MATCH_LIMIT: usize = 3;

/// Weight applied to each keyword hit.
const KEYWORD_WEIGHT: f64 = 0.1;

/// Tokens with this many characters or fewer are ignored for keyword overlap.
const MIN_KEYWORD_CHARS: usize = 2;

const TOKEN_TRIM: &[char] = &['.', ',', ';', ':', '(', ')', '[', ']'];

/// One ranked entry. Produced per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub score: f64,
    pub id: String,
    pub entry: KnowledgeEntry,
}

/// Returns at most `limit` candidates ordered by non-increasing score. Ties keep the
/// store's iteration order.
pub fn find_relevant_entries(
    query: &str,
    entries: &KnowledgeMap,
    limit: usize,
) -> Vec<MatchCandidate> {
    let query = query.to_lowercase();
    let keywords = keyword_tokens(&query);

    let mut candidates: Vec<MatchCandidate> = entries
        .iter()
        .map(|(id, entry)| {
            let haystack = searchable_text(entry);
            let ratio = quick_ratio(&query, &haystack);
            let overlap = keywords.iter().filter(|w| haystack.contains(w.as_str())).count();
            MatchCandidate {
                score: ratio + KEYWORD_WEIGHT * overlap as f64,
                id: id.clone(),
                entry: entry.clone(),
            }
        })
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    candidates
        .into_iter()
        .take(limit)
        .filter(|c| c.score > 0.0 || c.entry.has_symptoms())
        .collect()
}

/// Title, description and symptoms joined by spaces, lower-cased.
pub fn searchable_text(entry: &KnowledgeEntry) -> String {
    format!(
        "{} {} {}",
        entry.title,
        entry.description,
        entry.common_symptoms.join(" ")
    )
    .to_lowercase()
}

/// Whitespace tokens longer than two characters, stripped of surrounding punctuation,
/// deduplicated in first-seen order. A token that strips down to nothing is kept as the
/// empty string, which is contained in every text and so counts as one hit per entry.
pub fn keyword_tokens(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS)
        .map(|w| w.trim_matches(TOKEN_TRIM))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

/// Upper bound on sequence similarity: 2·M / (|a| + |b|), where M is the size of the
/// character multiset intersection. Two empty strings are identical (1.0).
pub fn quick_ratio(a: &str, b: &str) -> f64 {
    let mut available: HashMap<char, usize> = HashMap::new();
    let mut b_len = 0usize;
    for c in b.chars() {
        *available.entry(c).or_insert(0) += 1;
        b_len += 1;
    }

    let mut a_len = 0usize;
    let mut matches = 0usize;
    for c in a.chars() {
        a_len += 1;
        if let Some(n) = available.get_mut(&c) {
            if *n > 0 {
                *n -= 1;
                matches += 1;
            }
        }
    }

    let total = a_len + b_len;
    if total == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use medchat_core::starter_entries;

    fn ids(candidates: &[MatchCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn quick_ratio_bounds() {
        assert_eq!(quick_ratio("", ""), 1.0);
        assert_eq!(quick_ratio("abc", ""), 0.0);
        assert_eq!(quick_ratio("abc", "cba"), 1.0);
        assert_eq!(quick_ratio("abcd", "xyzw"), 0.0);
        // 2 shared of 3 + 3 chars
        assert!((quick_ratio("abx", "aby") - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn quick_ratio_counts_multibyte_chars_once() {
        assert_eq!(quick_ratio("tórax", "tórax"), 1.0);
        assert!((quick_ratio("ñ", "n") - 0.0).abs() < 1e-9);
    }

    #[test]
    fn keyword_tokens_filter_strip_and_dedup() {
        let tokens = keyword_tokens("tengo (dolor), dolor y un bulto... mama; [mama] ...");
        assert_eq!(tokens, vec!["tengo", "dolor", "bulto", "mama"]);
    }

    #[test]
    fn length_filter_applies_before_stripping() {
        // "(a)" has three characters, survives the length filter, strips to "a"
        assert_eq!(keyword_tokens("(a) de"), vec!["a"]);
        assert_eq!(keyword_tokens("(((( ...."), vec![""]);
    }

    #[test]
    fn punctuation_only_token_hits_every_entry() {
        let store = starter_entries();
        let ranked = find_relevant_entries("((((", &store, 3);
        assert_eq!(ranked.len(), 3);
        for c in &ranked {
            let ratio = quick_ratio("((((", &searchable_text(&c.entry));
            assert!((c.score - (ratio + 0.1)).abs() < 1e-9);
        }
        // "hemoptisis (sangre al toser)" is the only text with a '('
        assert_eq!(ranked[0].id, "lung_cancer");
        assert!((ranked[0].score - 0.109709).abs() < 1e-6);

        let mut bare = KnowledgeMap::new();
        bare.insert("zz".to_string(), KnowledgeEntry::new("zz", "", Vec::<String>::new(), ""));
        let ranked = find_relevant_entries("((((", &bare, 3);
        assert_eq!(ids(&ranked), vec!["zz"]);
        assert!((ranked[0].score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn breast_lump_ranks_breast_cancer_above_lung_cancer() {
        let store = starter_entries();
        let ranked = find_relevant_entries("tengo un bulto en la mama y dolor", &store, 3);
        let pos = |id: &str| ranked.iter().position(|c| c.id == id).unwrap();
        assert!(pos("breast_cancer") < pos("lung_cancer"));
        assert_eq!(ranked[0].id, "breast_cancer");
    }

    #[test]
    fn coughing_blood_surfaces_lung_cancer() {
        let store = starter_entries();
        let ranked = find_relevant_entries("tos con sangre", &store, 3);
        assert!(ids(&ranked).contains(&"lung_cancer"));
    }

    #[test]
    fn results_respect_limit_and_order() {
        let store = starter_entries();
        for query in ["dolor", "fatiga y pérdida de peso", "xyz", "bulto"] {
            for limit in 0..=4 {
                let ranked = find_relevant_entries(query, &store, limit);
                assert!(ranked.len() <= limit);
                assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }

    #[test]
    fn empty_store_yields_nothing() {
        let ranked = find_relevant_entries("dolor de cabeza", &KnowledgeMap::new(), 3);
        assert!(ranked.is_empty());
    }

    #[test]
    fn zero_score_entry_without_symptoms_is_dropped() {
        let mut store = KnowledgeMap::new();
        store.insert("blank".to_string(), KnowledgeEntry::default());
        store.insert(
            "listed".to_string(),
            KnowledgeEntry::new("", "", ["zzz"], ""),
        );
        // "qqq" shares no characters with either searchable text
        let ranked = find_relevant_entries("qqq", &store, 3);
        assert_eq!(ids(&ranked), vec!["listed"]);
        assert_eq!(ranked[0].score, 0.0);
        assert!(ranked.iter().all(|c| c.score > 0.0 || c.entry.has_symptoms()));
    }

    #[test]
    fn ties_keep_store_order() {
        let mut store = KnowledgeMap::new();
        for id in ["a_first", "b_second", "c_third"] {
            store.insert(id.to_string(), KnowledgeEntry::new("Gripe", "fiebre", ["tos"], ""));
        }
        let ranked = find_relevant_entries("gripe con fiebre", &store, 3);
        assert_eq!(ids(&ranked), vec!["a_first", "b_second", "c_third"]);
    }

    #[test]
    fn single_entry_store_goes_through_filter() {
        let mut store = KnowledgeMap::new();
        store.insert(
            "only".to_string(),
            KnowledgeEntry::new("Migraña", "Dolor de cabeza intenso", Vec::<String>::new(), ""),
        );
        let ranked = find_relevant_entries("dolor de cabeza", &store, 3);
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].score > 0.1);
    }

    #[test]
    fn query_is_case_insensitive() {
        let store = starter_entries();
        let lower = find_relevant_entries("bulto en la mama", &store, 3);
        let upper = find_relevant_entries("BULTO EN LA MAMA", &store, 3);
        assert_eq!(ids(&lower), ids(&upper));
    }
}
