//! Public landing pages for scanned QR codes.

mod handlers;
mod middleware;
mod render;
mod routes;
mod view;

pub use render::{escape_html, render_page};
pub use routes::create_landing_router;
pub use view::{LookupTicket, ResolutionState, ResolutionView, ResolvedPage};
