pub mod http;
pub mod trait_def;

pub use http::HttpQrStore;
pub use trait_def::{QrStore, StoreError, StoreResult};
