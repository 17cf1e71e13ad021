use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use crate::core::activity::{ActivityEvent, ActivityKind, ActivitySink, TracingSink};
use crate::core::config::{Config, FullTextConfig};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::StoreStats;
use crate::core::types::{KeyValue, Record};
use crate::eviction::EvictionPolicy;
use crate::index::{create_index, Index};
use crate::query::ast::{AndQuery, OrQuery, QueryOperator};
use crate::query::domain::DomainDescription;
use crate::query::matcher::RecordMatcher;
use crate::query::planner::ExecutionPlan;
use crate::schema::schema::CollectionSchema;
use crate::search::executor::{key_query, QueryExecutor};
use crate::search::fulltext::{FullTextIndex, TokenFrequency};
use crate::search::results::QueryResult;

/// In-memory store for the records of one collection.
///
/// Writes take `&mut self` and reads take `&self`; callers share a store
/// behind a `parking_lot::RwLock` to get single-writer, multiple-reader
/// access. Read-side bookkeeping (counters, LRU recency) is interior.
pub struct DataStore {
    schema: CollectionSchema,
    config: Config,

    primary: HashMap<KeyValue, Arc<Record>>,
    unique: Vec<HashMap<KeyValue, Arc<Record>>>, // one map per unique key, schema order
    indexes: HashMap<String, Box<dyn Index>>,
    full_text: Option<FullTextIndex>,

    eviction: EvictionPolicy,
    domain: DomainDescription,
    sink: Arc<dyn ActivitySink>,

    // Metrics
    hit_count: AtomicU64,
    read_count: AtomicU64,
    evicted_count: AtomicU64,
}

impl DataStore {
    pub fn new(schema: CollectionSchema, eviction: EvictionPolicy, full_text: FullTextConfig) -> Result<Self> {
        Self::with_config(schema, eviction, full_text, Config::default(), Arc::new(TracingSink))
    }

    pub fn with_config(
        schema: CollectionSchema,
        eviction: EvictionPolicy,
        full_text: FullTextConfig,
        config: Config,
        sink: Arc<dyn ActivitySink>,
    ) -> Result<Self> {
        schema.check()?;

        let mut indexes = HashMap::new();
        let mut scalar_position = 0;
        for definition in &schema.indexes {
            let position = if definition.is_list {
                None
            } else {
                scalar_position += 1;
                Some(scalar_position - 1)
            };
            indexes.insert(definition.name.clone(), create_index(definition, position));
        }

        let full_text = if full_text.enabled {
            Some(FullTextIndex::new(&full_text)?)
        } else {
            None
        };

        tracing::debug!(
            "[store]: created {} with {} indexes, eviction '{}'",
            schema.type_name,
            indexes.len(),
            eviction.name()
        );

        Ok(DataStore {
            unique: vec![HashMap::new(); schema.unique_keys.len()],
            schema,
            config,
            primary: HashMap::new(),
            indexes,
            full_text,
            eviction,
            domain: DomainDescription::default(),
            sink,
            hit_count: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
            evicted_count: AtomicU64::new(0),
        })
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn count(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    pub fn domain(&self) -> &DomainDescription {
        &self.domain
    }

    pub fn declare_domain(&mut self, domain: DomainDescription) {
        self.domain = domain;
    }

    fn log(&self, kind: ActivityKind, items: usize, detail: String) {
        self.sink.record(ActivityEvent {
            kind,
            collection: self.schema.type_name.clone(),
            items,
            detail,
        });
    }

    // ---- Mutation ----

    pub fn add_new(&mut self, record: Record, exclude_from_eviction: bool) -> Result<()> {
        let key = record.primary_key.clone();
        self.insert(record, exclude_from_eviction)?;
        self.log(ActivityKind::Put, 1, format!("added {}", key));
        self.evict_if_required()?;
        Ok(())
    }

    /// Returns 1 if the record was added, 0 if its key is already present
    pub fn try_add(&mut self, record: Record) -> Result<usize> {
        if self.primary.contains_key(&record.primary_key) {
            return Ok(0);
        }
        self.add_new(record, false)?;
        Ok(1)
    }

    pub fn update(&mut self, record: Record) -> Result<()> {
        let key = record.primary_key.clone();
        self.replace(record)?;
        self.log(ActivityKind::Update, 1, format!("updated {}", key));
        Ok(())
    }

    /// Update only if the stored version of the record matches `condition`
    pub fn update_if(&mut self, record: Record, condition: &AndQuery) -> Result<()> {
        let current = self.primary.get(&record.primary_key).ok_or_else(|| Self::not_found(&record.primary_key))?;
        let matcher = RecordMatcher::new(&self.schema, condition)?;
        if !matcher.matches(current) {
            return Err(Error::new(
                ErrorKind::ConditionNotSatisfied,
                format!("Stored version of {} does not match the update condition", record.primary_key),
            ));
        }
        self.update(record)
    }

    pub fn remove_by_primary_key(&mut self, key: &KeyValue) -> Result<Arc<Record>> {
        let removed = self.detach(key)?.ok_or_else(|| Self::not_found(key))?;
        self.eviction.try_remove(key);
        self.log(ActivityKind::Remove, 1, format!("removed {}", key));
        Ok(removed)
    }

    /// Remove every record matching `query`, returning how many went
    pub fn remove_many(&mut self, query: &OrQuery) -> Result<usize> {
        let records: Vec<Arc<Record>> = self.executor().execute(query)?
            .items
            .into_iter()
            .map(|item| item.record)
            .collect();
        let removed = self.remove_records(&records)?;
        self.log(ActivityKind::Remove, removed, "removed by query".to_string());
        Ok(removed)
    }

    /// Insert or update every record. Large batches load ordered indexes in
    /// bulk mode; records whose key already exists are updated afterwards.
    /// Not atomic: records before a failing one stay in the store.
    pub fn put_many(&mut self, records: Vec<Record>, exclude_from_eviction: bool) -> Result<usize> {
        let total = records.len();
        let bulk = total > self.config.bulk_threshold;
        if bulk {
            tracing::debug!("[store]: bulk loading {} records into {}", total, self.schema.type_name);
            for index in self.indexes.values_mut() {
                index.begin_fill()?;
            }
        }

        let mut updates = Vec::new();
        let mut inserted = Ok(0);
        for record in records {
            if self.primary.contains_key(&record.primary_key) {
                updates.push(record);
                continue;
            }
            if let Err(e) = self.insert(record, exclude_from_eviction) {
                inserted = Err(e);
                break;
            }
            inserted = inserted.map(|n| n + 1);
        }

        // indexes must leave bulk mode even when an insert failed
        if bulk {
            for index in self.indexes.values_mut() {
                index.end_fill()?;
            }
        }
        let inserted = inserted?;

        let updated = updates.len();
        for record in updates {
            self.replace(record)?;
        }

        self.log(
            if bulk { ActivityKind::BulkLoad } else { ActivityKind::Put },
            inserted + updated,
            format!("{} inserted, {} updated", inserted, updated),
        );
        self.evict_if_required()?;
        Ok(inserted + updated)
    }

    pub fn truncate(&mut self) {
        let count = self.primary.len();
        self.primary.clear();
        for map in &mut self.unique {
            map.clear();
        }
        for index in self.indexes.values_mut() {
            index.clear();
        }
        if let Some(full_text) = &mut self.full_text {
            full_text.clear();
        }
        self.eviction.clear();
        self.domain = DomainDescription::default();
        self.hit_count.store(0, Ordering::Relaxed);
        self.read_count.store(0, Ordering::Relaxed);
        self.evicted_count.store(0, Ordering::Relaxed);
        self.log(ActivityKind::Truncate, count, "truncated".to_string());
    }

    /// Remove whatever the eviction policy selects. Returns the number of
    /// records evicted.
    pub fn evict_if_required(&mut self) -> Result<usize> {
        if !self.eviction.is_eviction_required() {
            return Ok(0);
        }
        let keys = self.eviction.do_eviction();
        let records: Vec<Arc<Record>> = keys.iter().filter_map(|k| self.primary.get(k).cloned()).collect();
        let evicted = self.remove_records(&records)?;

        if evicted > 0 {
            self.domain.is_fully_loaded = false;
            self.evicted_count.fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::debug!(
                "[store]: {} policy evicted {} records from {}",
                self.eviction.name(),
                evicted,
                self.schema.type_name
            );
            self.log(ActivityKind::Evict, evicted, format!("{} eviction", self.eviction.name()));
        }
        Ok(evicted)
    }

    fn not_found(key: &KeyValue) -> Error {
        Error::new(ErrorKind::ItemNotFound, format!("No record with primary key {}", key))
    }

    // Validate everything, then touch the structures
    fn insert(&mut self, record: Record, exclude_from_eviction: bool) -> Result<()> {
        self.schema.validate(&record)?;
        if self.primary.contains_key(&record.primary_key) {
            return Err(Error::new(
                ErrorKind::DuplicateKey,
                format!("Primary key {} already exists in {}", record.primary_key, self.schema.type_name),
            ));
        }
        self.check_unique_keys(&record)?;
        if !exclude_from_eviction {
            self.eviction.add_item(record.primary_key.clone())?;
        }
        self.attach(Arc::new(record));
        Ok(())
    }

    fn replace(&mut self, record: Record) -> Result<()> {
        self.schema.validate(&record)?;
        if !self.primary.contains_key(&record.primary_key) {
            return Err(Self::not_found(&record.primary_key));
        }
        self.check_unique_keys(&record)?;

        let key = record.primary_key.clone();
        self.detach(&key)?;
        self.attach(Arc::new(record));
        self.eviction.touch(&key);
        Ok(())
    }

    // a unique key may only be shared with the record being replaced
    fn check_unique_keys(&self, record: &Record) -> Result<()> {
        for (position, value) in record.unique_keys.iter().enumerate() {
            if let Some(existing) = self.unique[position].get(value) {
                if existing.primary_key != record.primary_key {
                    return Err(Error::new(
                        ErrorKind::DuplicateKey,
                        format!(
                            "Unique key '{}' = {} already used by {}",
                            self.schema.unique_keys[position], value, existing.primary_key
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn attach(&mut self, record: Arc<Record>) {
        for (position, value) in record.unique_keys.iter().enumerate() {
            self.unique[position].insert(value.clone(), record.clone());
        }
        for index in self.indexes.values_mut() {
            index.put(record.clone());
        }
        if let Some(full_text) = &mut self.full_text {
            full_text.put(&record);
        }
        self.primary.insert(record.primary_key.clone(), record);
    }

    fn detach(&mut self, key: &KeyValue) -> Result<Option<Arc<Record>>> {
        let Some(record) = self.primary.remove(key) else {
            return Ok(None);
        };
        for (position, value) in record.unique_keys.iter().enumerate() {
            self.unique[position].remove(value);
        }
        for index in self.indexes.values_mut() {
            index.remove_one(&record)?;
        }
        if let Some(full_text) = &mut self.full_text {
            full_text.remove(key);
        }
        Ok(Some(record))
    }

    // batch removal: indexes rebuild once instead of once per record
    fn remove_records(&mut self, records: &[Arc<Record>]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        for index in self.indexes.values_mut() {
            index.remove_many(records)?;
        }
        let mut removed = 0;
        for record in records {
            if self.primary.remove(&record.primary_key).is_none() {
                continue;
            }
            removed += 1;
            for (position, value) in record.unique_keys.iter().enumerate() {
                self.unique[position].remove(value);
            }
            if let Some(full_text) = &mut self.full_text {
                full_text.remove(&record.primary_key);
            }
            self.eviction.try_remove(&record.primary_key);
        }
        Ok(removed)
    }

    // ---- Query ----

    fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor {
            schema: &self.schema,
            primary: &self.primary,
            unique: &self.unique,
            indexes: &self.indexes,
            full_text: self.full_text.as_ref(),
            parallel_full_text: self.config.parallel_full_text,
        }
    }

    fn record_read(&self, hit: bool) {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_one(&self, key: &KeyValue) -> Option<Arc<Record>> {
        let record = self.primary.get(key).cloned();
        self.record_read(record.is_some());
        if record.is_some() {
            self.eviction.touch(key);
        }
        record
    }

    pub fn get_many_by_key(&self, field: &str, values: Vec<KeyValue>, operator: QueryOperator) -> Result<QueryResult> {
        self.get_many(&key_query(field, values, operator), false)
    }

    /// Resolve a query. With `only_if_complete`, fails with `IncompleteData`
    /// unless the declared domain guarantees every match is in memory.
    pub fn get_many(&self, query: &OrQuery, only_if_complete: bool) -> Result<QueryResult> {
        if only_if_complete && !self.domain.covers(query) {
            return Err(Error::new(
                ErrorKind::IncompleteData,
                format!("{} does not hold every record matching the query", self.schema.type_name),
            ));
        }

        let result = self.executor().execute(query)?;
        self.record_read(!result.is_empty());
        self.eviction.touch_many(result.records().map(|r| &r.primary_key));
        self.log(
            ActivityKind::Query,
            result.len(),
            format!("resolved with {}", result.plan.primary_index_name().unwrap_or("scan")),
        );
        Ok(result)
    }

    /// Count matching records without returning them
    pub fn eval(&self, query: &OrQuery) -> Result<(usize, ExecutionPlan)> {
        self.executor().count(query)
    }

    pub fn most_frequent_full_text_tokens(&self, max: usize) -> Vec<TokenFrequency> {
        self.full_text
            .as_ref()
            .map(|full_text| full_text.most_frequent_tokens(max))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            type_name: self.schema.type_name.clone(),
            count: self.primary.len(),
            hit_count: self.hit_count(),
            read_count: self.read_count(),
            index_names: self.schema.indexes.iter().map(|d| d.name.clone()).collect(),
            eviction_policy: self.eviction.name().to_string(),
            evicted_count: self.evicted_count.load(Ordering::Relaxed),
            full_text_documents: self.full_text.as_ref().map_or(0, |f| f.doc_count()),
            full_text_terms: self.full_text.as_ref().map_or(0, |f| f.term_count()),
            is_fully_loaded: self.domain.is_fully_loaded,
        }
    }

    // ---- Dump / reload ----

    pub fn dump(&self) -> Vec<Arc<Record>> {
        self.primary.values().cloned().collect()
    }

    /// Replace the content of the store with `records`
    pub fn load_snapshot(&mut self, records: Vec<Record>) -> Result<usize> {
        self.truncate();
        let exclude = self.config.exclude_snapshot_from_eviction;
        self.put_many(records, exclude)
    }
}
