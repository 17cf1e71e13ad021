pub mod core;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod scoring;
pub mod search;
pub mod query;
pub mod eviction;

pub use crate::core::datastore::DataStore;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{KeyValue, Record};

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                              CACHEDENX STRUCT ARCHITECTURE                                  │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── CORE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                               struct DataStore                                      │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ schema: CollectionSchema          // Keys and indexes of the collection     │ │    │
│  │  │ config: Config                    // Bulk threshold, full-text parallelism  │ │    │
│  │  │ primary: HashMap<KeyValue, Arc<Record>>     // Primary key lookup           │ │    │
│  │  │ unique: Vec<HashMap<KeyValue, Arc<Record>>> // One map per unique key       │ │    │
│  │  │ indexes: HashMap<String, Box<dyn Index>>    // Ordered / dictionary         │ │    │
│  │  │ full_text: Option<FullTextIndex>  // Token → records, BM25 ranked           │ │    │
│  │  │ eviction: EvictionPolicy          // None / Lru / Ttl                       │ │    │
│  │  │ domain: DomainDescription         // What is known to be complete           │ │    │
│  │  │ sink: Arc<dyn ActivitySink>       // Activity log                           │ │    │
│  │  │ // Metrics                                                                   │ │    │
│  │  │ hit_count: AtomicU64                                                        │ │    │
│  │  │ read_count: AtomicU64                                                       │ │    │
│  │  │ evicted_count: AtomicU64                                                    │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────┐  ┌──────────────────────┐  ┌───────────────────────────────────┐    │
│  │ struct Config    │  │ struct Record        │  │ struct StoreStats                 │    │
│  │ • bulk_threshold │  │ • type_name          │  │ • count                           │    │
│  │ • exclude_snap.. │  │ • primary_key        │  │ • hit_count / read_count          │    │
│  │ • parallel_full..│  │ • unique_keys        │  │ • evicted_count                   │    │
│  └──────────────────┘  │ • index_keys         │  │ • full_text_documents             │    │
│                        │ • list_index_keys    │  └───────────────────────────────────┘    │
│  ┌──────────────────┐  │ • full_text          │                                            │
│  │ enum KeyValue    │  │ • payload: Bytes     │  ┌───────────────────────────────────┐    │
│  │ • Null           │  └──────────────────────┘  │ trait ActivitySink                │    │
│  │ • Integer(i64)   │                            │ • TracingSink / NullSink          │    │
│  │ • Float(f64)     │                            │ • RecordingSink                   │    │
│  │ • Boolean(bool)  │                            └───────────────────────────────────┘    │
│  │ • Date(i64)      │                                                                      │
│  │ • String(String) │                                                                      │
│  └──────────────────┘                                                                      │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────────── INDEXING LAYER ────────────────────────────────────────┐
│                                                                                              │
│  ┌──────────────────────────┐  ┌──────────────────────────┐  ┌───────────────────────┐     │
│  │ struct OrderedIndex      │  │ struct DictionaryIndex   │  │ struct UniqueIndex    │     │
│  │ • items: Vec<Arc<Record>>│  │ • data: HashMap<KeyValue,│  │ • map: &HashMap       │     │
│  │ • mode: FillMode         │  │   HashMap<KeyValue, Arc>>│  │   (read only, Eq)     │     │
│  │ • key_position           │  │ • source: Scalar / List  │  └───────────────────────┘     │
│  └──────────────────────────┘  └──────────────────────────┘                                │
│                                                                                              │
│  ┌──────────────────────────┐  ┌──────────────────────────┐  ┌───────────────────────┐     │
│  │ struct InvertedIndex     │  │ struct PostingList       │  │ struct BM25Scorer     │     │
│  │ • postings: Term → List  │  │ • postings: Vec<Posting> │  │ • k1, b               │     │
│  │ • doc_lengths            │  │   (key, term_freq)       │  └───────────────────────┘     │
│  └──────────────────────────┘  └──────────────────────────┘                                │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────────── SEARCH LAYER ─────────────────────────────────────────┐
│                                                                                              │
│  ┌─────────────────────┐  ┌──────────────────────┐  ┌────────────────────────────┐        │
│  │ OrQuery             │  │ struct QueryExecutor │  │ struct QueryResult         │        │
│  │  └ AndQuery         │  │ • borrowed store view│  │ • items: Vec<RankedRecord> │        │
│  │     └ AtomicQuery   │  │ • RecordMatcher      │  │ • plan: ExecutionPlan      │        │
│  │ • take, full_text   │  │ • choose_primary_idx │  └────────────────────────────┘        │
│  └─────────────────────┘  └──────────────────────┘                                         │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────────── EVICTION LAYER ────────────────────────────────────────┐
│                                                                                              │
│  ┌───────────────────────────┐  ┌───────────────────────────┐  ┌──────────────────────┐    │
│  │ enum EvictionPolicy       │  │ struct LruEvictionPolicy  │  │ struct TtlEviction.. │    │
│  │ • None                    │  │ • limit, eviction_count   │  │ • time_to_live       │    │
│  │ • Lru(..)                 │  │ • Mutex<EvictionQueue>    │  │ • Mutex<TtlState>    │    │
│  │ • Ttl(..)                 │  └───────────────────────────┘  └──────────────────────┘    │
│  └───────────────────────────┘                                                              │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
