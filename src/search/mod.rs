//! Search engine core / 検索エンジン
//!
//! One-way data flow / データの流れ:
//! FilterSpec -> PredicateBuilder -> repository query -> rows
//!   -> AssociationAggregator (+ GeoFilter when geo) -> Paginator -> SearchResult
//!
//! The storage layer behind the repository trait is an external
//! collaborator; this module only defines what predicate and ordering it
//! must enforce and what row shape it returns.

pub mod aggregate;
pub mod filter;
pub mod geo;
pub mod history;
pub mod paginate;
pub mod predicate;
pub mod service;

pub use filter::FilterSpec;
pub use history::{SearchHistory, SearchKind};
pub use predicate::{Predicate, PredicateBuilder};
pub use service::SearchService;
