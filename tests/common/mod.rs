#![allow(dead_code)]

use std::sync::Arc;
use cachedenx::core::activity::RecordingSink;
use cachedenx::core::config::{Config, FullTextConfig};
use cachedenx::core::datastore::DataStore;
use cachedenx::core::types::Record;
use cachedenx::eviction::EvictionPolicy;
use cachedenx::schema::schema::CollectionSchema;

pub const DESKS: [&str; 3] = ["london", "paris", "tokyo"];

pub fn trade_schema() -> CollectionSchema {
    CollectionSchema::new("Trade", "id")
        .add_unique_key("reference")
        .add_ordered_index("amount")
        .add_dictionary_index("desk")
        .add_list_index("tags")
}

pub fn trade(id: i64, amount: i64, desk: &str) -> Record {
    Record::new("Trade", id)
        .with_unique_key(format!("T-{}", id))
        .with_index_key(amount)
        .with_index_key(desk)
        .with_payload(format!("trade {}", id).into_bytes())
}

/// `count` trades with amount `id * 10` spread over the desks
pub fn trades(count: i64) -> Vec<Record> {
    (0..count)
        .map(|id| trade(id, id * 10, DESKS[id as usize % DESKS.len()]))
        .collect()
}

pub fn store(eviction: EvictionPolicy) -> DataStore {
    DataStore::new(trade_schema(), eviction, FullTextConfig::enabled()).unwrap()
}

pub fn recording_store(eviction: EvictionPolicy, config: Config) -> (DataStore, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let store = DataStore::with_config(
        trade_schema(),
        eviction,
        FullTextConfig::enabled(),
        config,
        sink.clone(),
    )
    .unwrap();
    (store, sink)
}
