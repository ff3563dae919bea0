/*!
 * Translation of prose units through the backend.
 *
 * - `core`: single backend calls behind the admission gate
 * - `batch`: batching, de-duplication and fallback
 * - `cache`: content-addressed translation cache
 * - `concurrency`: run-wide admission gate
 * - `stats`: token and cost statistics
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, ResolvedFrom, ResolvedText};
pub use self::cache::TranslationCache;
pub use self::concurrency::AdmissionGate;
pub use self::core::TranslationService;
pub use self::stats::{RunStatistics, StatsStore};

// Submodules
pub mod batch;
pub mod cache;
pub mod concurrency;
pub mod core;
pub mod stats;
