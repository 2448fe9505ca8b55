//! azsearch Core Library
//!
//! Request models for the Azure Search REST API, with no I/O:
//! - Index field descriptors and index definitions
//! - Search options
//! - Batch indexing operations
//! - Client configuration
//! - Validation helpers

pub mod batch;
pub mod config;
pub mod definition;
pub mod error;
pub mod field;
pub mod options;
pub mod utils;

// Re-export commonly used types
pub use batch::{BatchAction, Document, IndexBatchOperation, SEARCH_ACTION};
pub use config::{ClientConfig, API_VERSION, MAX_BATCH_SIZE};
pub use definition::{IndexDefinition, Suggester};
pub use error::ValidationError;
pub use field::{EdmType, IndexField};
pub use options::{SearchMode, SearchOptions};
