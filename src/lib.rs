//! Search the YouTube Data API, keep each raw response on disk under a name
//! that encodes when and what was searched, and flatten the stored responses
//! into one table.

pub mod codec;
pub mod config;
pub mod errors;
pub mod export;
pub mod flatten;
pub mod search;
pub mod store;
pub mod youtube;

pub use codec::{
    decode_filename, encode_filename, sanitize_filename, stored_identifier, SearchRecord,
};
pub use config::{ApiKeySource, SearchConfig};
pub use errors::{
    ConfigError, ExportError, FlattenError, FormatError, SearchError, SearcherError, StoreError,
};
pub use flatten::{flatten_one, rename_columns, Cell, Dataset, ErrorPolicy, FlattenReport, Flattener};
pub use search::{SearchOutcome, Searcher};
pub use youtube::{is_valid_response, YouTubeClient};
