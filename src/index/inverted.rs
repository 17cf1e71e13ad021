use std::collections::HashMap;
use crate::analysis::token::Token;
use crate::core::types::KeyValue;
use crate::index::posting::{Posting, PostingList};

/// Term representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term(String);

impl Term {
    pub fn new(text: &str) -> Self {
        Term(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Term statistics
#[derive(Debug, Clone, Copy)]
pub struct TermInfo {
    pub doc_freq: u32,        // Number of records containing term
    pub total_freq: u64,      // Total occurrences across all records
}

impl TermInfo {
    /// BM25 inverse document frequency, never negative
    pub fn idf(&self, total_docs: usize) -> f32 {
        let n = total_docs as f32;
        let df = self.doc_freq as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

/// Terms a record was indexed under, kept so it can be removed again
#[derive(Debug)]
struct IndexedText {
    terms: Vec<Term>,
    length: usize,
}

/// Inverted index from analyzed terms to the records containing them
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<Term, PostingList>,
    documents: HashMap<KeyValue, IndexedText>,
    total_tokens: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn avg_doc_length(&self) -> f32 {
        if self.documents.is_empty() {
            0.0
        } else {
            self.total_tokens as f32 / self.documents.len() as f32
        }
    }

    pub fn doc_length(&self, key: &KeyValue) -> usize {
        self.documents.get(key).map(|d| d.length).unwrap_or(0)
    }

    /// Index a record's tokens, replacing what was indexed for the same key
    pub fn add_document(&mut self, key: &KeyValue, tokens: &[Token]) {
        self.remove_document(key);
        if tokens.is_empty() {
            return;
        }

        let mut term_freqs: HashMap<Term, u32> = HashMap::new();
        for token in tokens {
            *term_freqs.entry(Term::new(&token.text)).or_insert(0) += 1;
        }

        let mut terms = Vec::with_capacity(term_freqs.len());
        for (term, term_freq) in term_freqs {
            self.postings
                .entry(term.clone())
                .or_insert_with(PostingList::new)
                .add_posting(Posting { key: key.clone(), term_freq });
            terms.push(term);
        }

        self.total_tokens += tokens.len();
        self.documents.insert(key.clone(), IndexedText { terms, length: tokens.len() });
    }

    pub fn remove_document(&mut self, key: &KeyValue) -> bool {
        let Some(indexed) = self.documents.remove(key) else {
            return false;
        };

        for term in &indexed.terms {
            if let Some(list) = self.postings.get_mut(term) {
                list.remove(key);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        self.total_tokens -= indexed.length;
        true
    }

    pub fn search_term(&self, term: &Term) -> Option<&PostingList> {
        self.postings.get(term)
    }

    pub fn term_info(&self, term: &Term) -> Option<TermInfo> {
        self.postings.get(term).map(|list| TermInfo {
            doc_freq: list.doc_freq(),
            total_freq: list.total_freq(),
        })
    }

    /// Terms ordered by the number of records containing them, most common first
    pub fn most_frequent_terms(&self, max: usize) -> Vec<(Term, TermInfo)> {
        let mut terms: Vec<(Term, TermInfo)> = self
            .postings
            .iter()
            .map(|(term, list)| (term.clone(), TermInfo {
                doc_freq: list.doc_freq(),
                total_freq: list.total_freq(),
            }))
            .collect();

        terms.sort_by(|a, b| b.1.doc_freq.cmp(&a.1.doc_freq).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(max);
        terms
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.documents.clear();
        self.total_tokens = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect()
    }

    #[test]
    fn test_add_and_remove() {
        let mut index = InvertedIndex::new();
        index.add_document(&KeyValue::from(1), &tokens(&["bond", "euro", "bond"]));
        index.add_document(&KeyValue::from(2), &tokens(&["euro"]));

        let bond = index.term_info(&Term::new("bond")).unwrap();
        assert_eq!(bond.doc_freq, 1);
        assert_eq!(bond.total_freq, 2);
        assert_eq!(index.avg_doc_length(), 2.0);

        assert!(index.remove_document(&KeyValue::from(1)));
        assert!(index.search_term(&Term::new("bond")).is_none());
        assert_eq!(index.term_count(), 1);
        assert_eq!(index.doc_count(), 1);
    }

    #[test]
    fn test_reindex_replaces_terms() {
        let mut index = InvertedIndex::new();
        index.add_document(&KeyValue::from(1), &tokens(&["old"]));
        index.add_document(&KeyValue::from(1), &tokens(&["new", "text"]));

        assert!(index.search_term(&Term::new("old")).is_none());
        assert_eq!(index.doc_length(&KeyValue::from(1)), 2);
        assert_eq!(index.doc_count(), 1);
    }

    #[test]
    fn test_most_frequent_terms() {
        let mut index = InvertedIndex::new();
        index.add_document(&KeyValue::from(1), &tokens(&["a", "b"]));
        index.add_document(&KeyValue::from(2), &tokens(&["b", "c"]));
        index.add_document(&KeyValue::from(3), &tokens(&["b", "c"]));

        let top = index.most_frequent_terms(2);
        let names: Vec<&str> = top.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }
}
