// Per-user session state: SIP cart, active mandates, footprint ledger and
// coach conversation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::coach::{ChatMessage, GREETING, ReportOutcome, Role};
use crate::core::{FootprintLedger, FundKind, ValidationError, positive};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipOrder {
    pub fund: FundKind,
    pub monthly_amount: f64,
}

impl SipOrder {
    /// kg CO2e offset per month by this order.
    pub fn monthly_impact(&self) -> f64 {
        self.fund.fund().monthly_impact(self.monthly_amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_monthly: f64,
    pub monthly_impact: f64,
}

fn summarize(orders: &[SipOrder]) -> CartSummary {
    CartSummary {
        total_monthly: orders.iter().map(|o| o.monthly_amount).sum(),
        monthly_impact: orders.iter().map(SipOrder::monthly_impact).sum(),
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub cart: Vec<SipOrder>,
    pub mandates: Vec<SipOrder>,
    pub ledger: FootprintLedger,
    pub chat: Vec<ChatMessage>,
    pub report: Option<ReportOutcome>,
    last_active: Instant,
}

impl Session {
    pub fn new(ledger: FootprintLedger) -> Self {
        Self {
            id: Uuid::new_v4(),
            cart: Vec::new(),
            mandates: Vec::new(),
            ledger,
            chat: vec![ChatMessage::new(Role::Assistant, GREETING)],
            report: None,
            last_active: Instant::now(),
        }
    }

    pub fn add_to_cart(
        &mut self,
        fund: FundKind,
        monthly_amount: f64,
    ) -> Result<(), ValidationError> {
        let monthly_amount = positive("monthly_amount", monthly_amount)?;
        self.cart.push(SipOrder {
            fund,
            monthly_amount,
        });
        Ok(())
    }

    pub fn remove_from_cart(&mut self, index: usize) -> Result<SipOrder, ValidationError> {
        if index >= self.cart.len() {
            return Err(ValidationError::CartIndex(index));
        }
        Ok(self.cart.remove(index))
    }

    pub fn cart_summary(&self) -> CartSummary {
        summarize(&self.cart)
    }

    /// Moves the cart into active mandates and books their monthly impact
    /// against the footprint.
    pub fn authorize_mandates(&mut self) -> Result<CartSummary, ValidationError> {
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let authorized = summarize(&self.cart);
        for order in &self.cart {
            self.ledger.apply_offset(order.monthly_impact())?;
        }
        self.mandates.append(&mut self.cart);
        Ok(authorized)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            cart: self.cart.clone(),
            cart_summary: self.cart_summary(),
            mandates: self.mandates.clone(),
            mandate_summary: summarize(&self.mandates),
            ledger: self.ledger,
            net_footprint: self.ledger.net(),
            neutralized: self.ledger.is_neutralized(),
            chat: self.chat.clone(),
            report: self.report.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub cart: Vec<SipOrder>,
    pub cart_summary: CartSummary,
    pub mandates: Vec<SipOrder>,
    pub mandate_summary: CartSummary,
    pub ledger: FootprintLedger,
    pub net_footprint: f64,
    pub neutralized: bool,
    pub chat: Vec<ChatMessage>,
    pub report: Option<ReportOutcome>,
}

pub const DEFAULT_MAX_SESSIONS: usize = 1_000;

/// Sessions keyed by id, at most `capacity` of them. Creating a session in a
/// full store evicts the least recently used one. Closures passed to
/// [`SessionStore::with_session`] run under the store lock and must not await.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, Session>>>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, ledger: FootprintLedger) -> SessionSnapshot {
        let session = Session::new(ledger);
        let snapshot = session.snapshot();
        let mut sessions = self.lock();
        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_active)
                .map(|s| s.id)
            else {
                break;
            };
            sessions.remove(&oldest);
            debug!(session = %oldest, "session evicted");
        }
        sessions.insert(session.id, session);
        drop(sessions);
        info!(session = %snapshot.id, baseline = ledger.baseline, "session created");
        snapshot
    }

    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        self.lock().get_mut(&id).map(|session| {
            session.last_active = Instant::now();
            f(session)
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
