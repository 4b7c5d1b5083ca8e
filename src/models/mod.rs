mod qr_code;

pub use qr_code::{
    CurrentUser, LandingPage, LinkEntry, NewQrRecord, QrRecord, QrType, UpdateLinksRequest,
};
