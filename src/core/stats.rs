use serde::{Serialize, Deserialize};

/// Store statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub type_name: String,
    pub count: usize,
    pub hit_count: u64,
    pub read_count: u64,
    pub index_names: Vec<String>,
    pub eviction_policy: String,
    pub evicted_count: u64,
    pub full_text_documents: usize,
    pub full_text_terms: usize,
    pub is_fully_loaded: bool,
}

impl StoreStats {
    pub fn hit_rate(&self) -> f64 {
        if self.read_count == 0 {
            0.0
        } else {
            self.hit_count as f64 / self.read_count as f64
        }
    }
}
