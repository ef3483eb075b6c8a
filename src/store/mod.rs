pub mod baseline;

pub use baseline::{BaselineRecord, BaselineStore, DEFAULT_BASELINE_FILE};
