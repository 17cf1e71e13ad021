use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use crate::analysis::analyzer::{Analyzer, AnalyzerRegistry};
use crate::analysis::token::Token;
use crate::core::config::FullTextConfig;
use crate::core::error::Result;
use crate::core::types::{KeyValue, Record};
use crate::index::inverted::{InvertedIndex, Term};
use crate::scoring::scorer::{BM25Scorer, DocStats, Scorer};
use crate::search::results::{RankedKey, TopKCollector};

/// Token with the number of records containing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFrequency {
    pub token: String,
    pub doc_freq: u32,
    pub total_freq: u64,
}

/// Full-text index over the text lines of records
pub struct FullTextIndex {
    analyzer: Arc<Analyzer>,
    index: InvertedIndex,
    scorer: Box<dyn Scorer>,
    max_results: usize,
}

impl FullTextIndex {
    pub fn new(config: &FullTextConfig) -> Result<Self> {
        let registry = AnalyzerRegistry::new();
        let analyzer = registry.get(&config.analyzer)?;

        Ok(FullTextIndex {
            analyzer,
            index: InvertedIndex::new(),
            scorer: Box::new(BM25Scorer::default()),
            max_results: config.max_results,
        })
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    fn analyze_lines(&self, lines: &[String]) -> Vec<Token> {
        lines.iter().flat_map(|line| self.analyzer.analyze(line)).collect()
    }

    pub fn put(&mut self, record: &Record) {
        let tokens = self.analyze_lines(&record.full_text);
        self.index.add_document(&record.primary_key, &tokens);
    }

    pub fn remove(&mut self, key: &KeyValue) -> bool {
        self.index.remove_document(key)
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    pub fn doc_count(&self) -> usize {
        self.index.doc_count()
    }

    pub fn term_count(&self) -> usize {
        self.index.term_count()
    }

    /// Score every record containing at least one query term. Best first.
    pub fn search(&self, text: &str, max_results: usize) -> Vec<RankedKey> {
        let tokens = self.analyzer.analyze(text);
        let terms: HashSet<Term> = tokens.iter().map(|t| Term::new(&t.text)).collect();

        let total_docs = self.index.doc_count();
        let avg_doc_length = self.index.avg_doc_length();
        let mut scores: HashMap<&KeyValue, f32> = HashMap::new();

        for term in &terms {
            let (Some(list), Some(term_info)) = (self.index.search_term(term), self.index.term_info(term)) else {
                continue;
            };
            for posting in &list.postings {
                let doc_stats = DocStats {
                    doc_length: self.index.doc_length(&posting.key),
                    avg_doc_length,
                    total_docs,
                };
                *scores.entry(&posting.key).or_insert(0.0) += self.scorer.score(posting, &term_info, &doc_stats);
            }
        }

        let mut collector = TopKCollector::new(max_results);
        for (key, score) in scores {
            collector.collect(RankedKey { key: key.clone(), score });
        }

        tracing::trace!(
            "[full text]: '{}' matched {} records with {} scorer",
            text,
            collector.total_collected,
            self.scorer.name()
        );
        collector.get_results()
    }

    pub fn most_frequent_tokens(&self, max: usize) -> Vec<TokenFrequency> {
        self.index
            .most_frequent_terms(max)
            .into_iter()
            .map(|(term, info)| TokenFrequency {
                token: term.as_str().to_string(),
                doc_freq: info.doc_freq,
                total_freq: info.total_freq,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: i64, text: &str) -> Record {
        Record::new("Article", id).with_full_text(text)
    }

    fn index() -> FullTextIndex {
        let mut index = FullTextIndex::new(&FullTextConfig::enabled()).unwrap();
        index.put(&document(1, "Euro bond issuance rises"));
        index.put(&document(2, "Bond yields fall as bond funds grow"));
        index.put(&document(3, "Equity markets rally"));
        index
    }

    #[test]
    fn test_search_ranks_by_relevance() {
        let index = index();
        let hits = index.search("bonds", 10);
        let keys: Vec<KeyValue> = hits.iter().map(|h| h.key.clone()).collect();
        assert_eq!(keys, vec![KeyValue::from(2), KeyValue::from(1)]);
        assert!(hits[0].score > hits[1].score);

        assert!(index.search("commodities", 10).is_empty());
        assert_eq!(index.search("bond equity", 1).len(), 1);
    }

    #[test]
    fn test_remove_and_update() {
        let mut index = index();
        assert!(index.remove(&KeyValue::from(2)));
        assert_eq!(index.search("yields", 10).len(), 0);

        index.put(&document(1, "Equity derivatives"));
        let keys: Vec<KeyValue> = index.search("equity", 10).into_iter().map(|h| h.key).collect();
        assert_eq!(keys.len(), 2);
        assert!(index.search("euro", 10).is_empty());
    }

    #[test]
    fn test_most_frequent_tokens() {
        let index = index();
        let top = index.most_frequent_tokens(1);
        assert_eq!(top[0].token, "bond");
        assert_eq!(top[0].doc_freq, 2);
        assert_eq!(top[0].total_freq, 3);
    }
}
