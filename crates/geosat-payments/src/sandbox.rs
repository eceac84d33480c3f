//! Sandbox Checkout
//!
//! In-process stand-in for the hosted checkout, for headless use and tests.
//! Receipts are signed the way the payment provider signs them:
//! `hex(HMAC-SHA256(secret, "{order_id}|{payment_id}"))`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use geosat_core::PaymentConfirmation;

use crate::checkout::{CheckoutOptions, CheckoutOutcome, CheckoutWidget};
use crate::error::{PaymentError, Result};
use crate::loader::ScriptHost;

type HmacSha256 = Hmac<Sha256>;

/// Sign a checkout receipt
pub fn sign(secret: &[u8], order_id: &str, payment_id: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| PaymentError::Signature(e.to_string()))?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a receipt signature in constant time
pub fn verify_signature(secret: &[u8], confirmation: &PaymentConfirmation) -> bool {
    let Ok(expected) = hex::decode(&confirmation.razorpay_signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(
        format!(
            "{}|{}",
            confirmation.razorpay_order_id, confirmation.razorpay_payment_id
        )
        .as_bytes(),
    );
    mac.verify_slice(&expected).is_ok()
}

/// Widget that pays instantly (or is dismissed) and signs its receipts
pub struct SandboxCheckout {
    secret: Vec<u8>,
    dismiss: AtomicBool,
    opened: Mutex<Vec<CheckoutOptions>>,
}

impl SandboxCheckout {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            dismiss: AtomicBool::new(false),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Make every later checkout close without paying
    pub fn dismiss_all(&self, dismiss: bool) {
        self.dismiss.store(dismiss, Ordering::SeqCst);
    }

    /// Options of every checkout opened so far
    pub fn opened(&self) -> Vec<CheckoutOptions> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CheckoutWidget for SandboxCheckout {
    async fn open(&self, options: &CheckoutOptions) -> Result<CheckoutOutcome> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options.clone());

        if self.dismiss.load(Ordering::SeqCst) {
            tracing::debug!(order_id = %options.order_id, "Sandbox checkout dismissed");
            return Ok(CheckoutOutcome::Dismissed);
        }

        let payment_id = format!("pay_{}", uuid::Uuid::new_v4().simple());
        let signature = sign(&self.secret, &options.order_id, &payment_id)?;
        tracing::debug!(order_id = %options.order_id, %payment_id, "Sandbox checkout completed");

        Ok(CheckoutOutcome::Completed(PaymentConfirmation {
            razorpay_payment_id: payment_id,
            razorpay_order_id: options.order_id.clone(),
            razorpay_signature: signature,
        }))
    }
}

/// Script host that "loads" a given widget
pub struct SandboxHost {
    widget: Arc<dyn CheckoutWidget>,
    scripts: Mutex<HashSet<String>>,
    injections: AtomicUsize,
    failures_left: AtomicUsize,
}

impl SandboxHost {
    pub fn new(widget: Arc<dyn CheckoutWidget>) -> Self {
        Self {
            widget,
            scripts: Mutex::new(HashSet::new()),
            injections: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Pretend a script tag with this URL is already on the page
    pub fn mark_present(&self, url: &str) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string());
    }

    /// Fail the next `count` injections
    pub fn fail_next_injections(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Number of successful injections
    pub fn injections(&self) -> usize {
        self.injections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptHost for SandboxHost {
    fn has_script(&self, url: &str) -> bool {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    fn widget(&self) -> Option<Arc<dyn CheckoutWidget>> {
        let loaded = !self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty();
        loaded.then(|| Arc::clone(&self.widget))
    }

    async fn inject(&self, url: &str) -> Result<()> {
        // loading is never synchronous
        tokio::task::yield_now().await;

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PaymentError::WidgetLoad(format!("network error loading {}", url)));
        }

        self.mark_present(url);
        self.injections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
