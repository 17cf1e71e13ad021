use crate::index::inverted::TermInfo;
use crate::index::posting::Posting;

/// Scorer trait
pub trait Scorer: Send + Sync {
    fn score(&self, posting: &Posting, term_info: &TermInfo, doc_stats: &DocStats) -> f32;

    fn name(&self) -> &str;
}

/// Document statistics for scoring
#[derive(Debug, Clone)]
pub struct DocStats {
    pub doc_length: usize,    // Number of tokens in the record's text
    pub avg_doc_length: f32,  // Average length over the collection
    pub total_docs: usize,    // Number of records with text
}

/// BM25 Scorer
pub struct BM25Scorer {
    pub k1: f32,  // Term frequency saturation (default: 1.2)
    pub b: f32,   // Length normalization strength (default: 0.75)
}

impl Default for BM25Scorer {
    fn default() -> Self {
        BM25Scorer {
            k1: 1.2,
            b: 0.75,
        }
    }
}

impl Scorer for BM25Scorer {
    fn score(&self, posting: &Posting, term_info: &TermInfo, doc_stats: &DocStats) -> f32 {
        let tf = posting.term_freq as f32;
        let doc_len = doc_stats.doc_length as f32;
        let avg_doc_len = doc_stats.avg_doc_length.max(1.0);
        let idf = term_info.idf(doc_stats.total_docs);

        let numerator = idf * tf * (self.k1 + 1.0);
        let denominator = tf + self.k1 * (1.0 - self.b + self.b * (doc_len / avg_doc_len));

        numerator / denominator
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::KeyValue;

    #[test]
    fn test_rare_terms_score_higher() {
        let scorer = BM25Scorer::default();
        let posting = Posting { key: KeyValue::from(1), term_freq: 1 };
        let stats = DocStats { doc_length: 10, avg_doc_length: 10.0, total_docs: 100 };

        let rare = TermInfo { doc_freq: 2, total_freq: 2 };
        let common = TermInfo { doc_freq: 80, total_freq: 90 };
        assert!(scorer.score(&posting, &rare, &stats) > scorer.score(&posting, &common, &stats));
        assert!(scorer.score(&posting, &common, &stats) > 0.0);
    }
}
