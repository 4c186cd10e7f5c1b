//! Ranking response parsing for the peer ranking stage.
//!
//! Pure text processing: extracts the ordered list of response labels from a
//! free-form ranking and aggregates positions across rankers.

use super::stages::{AggregateRank, PeerRanking};
use crate::core::model::Model;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Header that introduces the machine-readable part of a ranking
pub const FINAL_RANKING_HEADER: &str = "FINAL RANKING:";

static NUMBERED_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*(Response [A-Z])").ok());
static LABEL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"Response [A-Z]").ok());

fn numbered_labels(text: &str) -> Vec<String> {
    NUMBERED_LABEL
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn mentioned_labels(text: &str) -> Vec<String> {
    LABEL
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Anonymous label for the response at `index` ("Response A", "Response B", ...)
///
/// Returns `None` past the 26th response.
pub fn response_label(index: usize) -> Option<String> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| format!("Response {}", (b'A' + i) as char))
}

/// Parse the ranked labels out of a ranking response.
///
/// Looks at the text after [`FINAL_RANKING_HEADER`] when present, preferring
/// numbered entries (`1. Response C`). Falls back to every label mentioned
/// in order. Repeated labels are kept only at their first position.
pub fn parse_ranking(text: &str) -> Vec<String> {
    let section = text
        .find(FINAL_RANKING_HEADER)
        .map(|idx| &text[idx + FINAL_RANKING_HEADER.len()..]);

    let labels: Vec<String> = match section {
        Some(section) => {
            let numbered = numbered_labels(section);
            if numbered.is_empty() {
                mentioned_labels(section)
            } else {
                numbered
            }
        }
        None => mentioned_labels(text),
    };

    let mut deduped = Vec::with_capacity(labels.len());
    for label in labels {
        if !deduped.contains(&label) {
            deduped.push(label);
        }
    }
    deduped
}

/// Compute each model's average position across all rankings.
///
/// Labels that do not map to a model are ignored. Results are sorted by
/// average rank ascending; ties keep model-name order.
pub fn aggregate_rankings(
    rankings: &[PeerRanking],
    label_to_model: &BTreeMap<String, Model>,
) -> Vec<AggregateRank> {
    let mut positions: HashMap<&Model, Vec<usize>> = HashMap::new();

    for ranking in rankings {
        for (position, label) in ranking.parsed_ranking.iter().enumerate() {
            if let Some(model) = label_to_model.get(label) {
                positions.entry(model).or_default().push(position + 1);
            }
        }
    }

    let mut aggregate: Vec<AggregateRank> = positions
        .into_iter()
        .map(|(model, ranks)| AggregateRank {
            model: model.clone(),
            average_rank: ranks.iter().sum::<usize>() as f64 / ranks.len() as f64,
            rankings_count: ranks.len(),
        })
        .collect();

    aggregate.sort_by(|a, b| {
        a.average_rank
            .total_cmp(&b.average_rank)
            .then_with(|| a.model.cmp(&b.model))
    });
    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_label() {
        assert_eq!(response_label(0).as_deref(), Some("Response A"));
        assert_eq!(response_label(25).as_deref(), Some("Response Z"));
        assert_eq!(response_label(26), None);
    }

    #[test]
    fn test_parse_numbered_final_ranking() {
        let text = "Response A is thorough. Response B is terse.\n\n\
                    FINAL RANKING:\n1. Response B\n2. Response A\n3. Response C";
        assert_eq!(
            parse_ranking(text),
            vec!["Response B", "Response A", "Response C"]
        );
    }

    #[test]
    fn test_parse_unnumbered_section() {
        let text = "analysis...\nFINAL RANKING:\nResponse C, then Response A";
        assert_eq!(parse_ranking(text), vec!["Response C", "Response A"]);
    }

    #[test]
    fn test_parse_without_header_uses_all_mentions() {
        let text = "I prefer Response B over Response A. Response B again.";
        assert_eq!(parse_ranking(text), vec!["Response B", "Response A"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_ranking("no labels here").is_empty());
    }

    #[test]
    fn test_aggregate_rankings() {
        let mut labels = BTreeMap::new();
        labels.insert("Response A".to_string(), Model::new("m1"));
        labels.insert("Response B".to_string(), Model::new("m2"));

        let rankings = vec![
            PeerRanking {
                model: Model::new("m1"),
                ranking: String::new(),
                parsed_ranking: vec!["Response B".into(), "Response A".into()],
            },
            PeerRanking {
                model: Model::new("m2"),
                ranking: String::new(),
                parsed_ranking: vec!["Response B".into(), "Response A".into(), "Response Q".into()],
            },
        ];

        let aggregate = aggregate_rankings(&rankings, &labels);
        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate[0].model, Model::new("m2"));
        assert_eq!(aggregate[0].average_rank, 1.0);
        assert_eq!(aggregate[0].rankings_count, 2);
        assert_eq!(aggregate[1].model, Model::new("m1"));
        assert_eq!(aggregate[1].average_rank, 2.0);
    }
}
