//! Price sources, normalization, and the retry policy wrapping fetches.

pub mod normalize;
pub mod provider;
pub mod retry;
pub mod synthetic;
pub mod yahoo;

pub use normalize::{ColumnExtractor, FieldExtractor, NormalizationError, Normalizer};
pub use provider::{FetchError, PriceSource, PriceTable};
pub use retry::{RetryError, RetryPolicy, Sleeper, ThreadSleeper};
pub use synthetic::SyntheticSource;
pub use yahoo::YahooSource;
