//! Short identifiers and QR image artifacts.
//!
//! Everything here is stateless; the record client calls these before it
//! talks to the store.

mod artifact;
mod short_id;

pub use artifact::{encode_qr_image, ExportFormat, QrImage};
pub use short_id::{generate_short_id, SHORT_ID_LEN};
