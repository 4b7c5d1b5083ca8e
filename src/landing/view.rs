use tracing::{debug, warn};

use crate::error::{QrError, QrResult};
use crate::models::{LandingPage, LinkEntry};
use crate::store::{QrStore, StoreResult};

const NO_LINKS_MESSAGE: &str = "QR code has no links";

/// What a scanned QR code currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub name: String,
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Loading,
    Resolved(ResolvedPage),
    NotFound(String),
}

/// Handle for one in-flight lookup.
#[derive(Debug)]
#[must_use]
pub struct LookupTicket {
    seq: u64,
    short_id: String,
}

impl LookupTicket {
    pub fn short_id(&self) -> &str {
        &self.short_id
    }
}

/// Public view over a single short id at a time.
///
/// Only the most recently issued lookup may change the state; answers to
/// earlier lookups are dropped.
#[derive(Debug)]
pub struct ResolutionView {
    short_id: Option<String>,
    seq: u64,
    state: ResolutionState,
}

impl Default for ResolutionView {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionView {
    pub fn new() -> Self {
        Self {
            short_id: None,
            seq: 0,
            state: ResolutionState::Loading,
        }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn short_id(&self) -> Option<&str> {
        self.short_id.as_deref()
    }

    /// The resolved page, or the reason there is none.
    pub fn page(&self) -> QrResult<&ResolvedPage> {
        match &self.state {
            ResolutionState::Resolved(page) => Ok(page),
            ResolutionState::NotFound(message) => Err(QrError::NotFound(message.clone())),
            ResolutionState::Loading => Err(QrError::NotFound("lookup has not completed".to_string())),
        }
    }

    /// Point the view at `short_id`.
    ///
    /// Returns a ticket only when the id changed; re-entering the current id
    /// neither re-fetches nor retries.
    pub fn enter(&mut self, short_id: &str) -> Option<LookupTicket> {
        if self.short_id.as_deref() == Some(short_id) {
            return None;
        }

        self.seq += 1;
        self.short_id = Some(short_id.to_string());
        self.state = ResolutionState::Loading;
        Some(LookupTicket {
            seq: self.seq,
            short_id: short_id.to_string(),
        })
    }

    /// Apply a lookup result. Returns `false` if the ticket was stale.
    pub fn complete(&mut self, ticket: LookupTicket, result: StoreResult<LandingPage>) -> bool {
        if ticket.seq != self.seq {
            debug!("Discarding stale lookup for {}", ticket.short_id);
            return false;
        }

        self.state = match result {
            Ok(page) => {
                let links = page.display_links();
                if links.is_empty() {
                    ResolutionState::NotFound(NO_LINKS_MESSAGE.to_string())
                } else {
                    ResolutionState::Resolved(ResolvedPage {
                        name: page.name,
                        links,
                    })
                }
            }
            Err(e) => {
                warn!("Lookup for {} failed: {}", ticket.short_id, e);
                ResolutionState::NotFound(e.user_message())
            }
        };
        true
    }

    /// Enter `short_id` and resolve it against the store.
    pub async fn load(&mut self, store: &dyn QrStore, short_id: &str) -> &ResolutionState {
        if let Some(ticket) = self.enter(short_id) {
            let result = store.resolve(ticket.short_id()).await;
            self.complete(ticket, result);
        }
        &self.state
    }
}
