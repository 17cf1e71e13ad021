use crate::core::types::KeyValue;

#[derive(Debug, Clone)]
pub struct Posting {
    pub key: KeyValue,        // Primary key of the record
    pub term_freq: u32,       // Term frequency in the record's text
}

/// Posting list for a term
/// Note: Sorted by primary key for efficient merging
#[derive(Debug, Default)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        match self.postings.binary_search_by(|p| p.key.cmp(&posting.key)) {
            Ok(pos) => {
                // Update existing posting
                self.postings[pos] = posting;
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    pub fn remove(&mut self, key: &KeyValue) -> bool {
        match self.postings.binary_search_by(|p| p.key.cmp(key)) {
            Ok(pos) => {
                self.postings.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }
}
