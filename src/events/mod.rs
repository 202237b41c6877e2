use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Audit events emitted after financially significant state changes commit.
/// Emission is fire-and-forget: a full or closed channel is logged and the
/// business transaction is never rolled back for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Inventory events
    BatchCreated {
        batch_id: i64,
        batch_code: String,
        unit_count: i32,
    },
    UnitRestocked(i64),
    UnitSpoiled(i64),

    // Order events
    OrderCreated(i64),
    OrderUpdated(i64),
    UnitAllocated {
        order_id: i64,
        unit_id: i64,
    },
    UnitReleased {
        order_id: i64,
        unit_id: i64,
    },
    OrderFinalized {
        order_id: i64,
        invoice_id: i64,
        total_amount: Decimal,
    },
    OrderCancelled {
        order_id: i64,
        credit_note_id: Option<i64>,
    },

    // Return events
    ReturnProcessed {
        invoice_id: i64,
        credit_note_id: i64,
        refund_amount: Decimal,
    },

    // Payment events
    PaymentRecorded {
        payment_id: i64,
        customer_id: i64,
        amount: Decimal,
    },
    PaymentVoided {
        payment_id: i64,
        reissued_note_id: Option<i64>,
    },
    CreditNoteIssued {
        credit_note_id: i64,
        customer_id: i64,
        amount: Decimal,
    },
    AccountSettled {
        customer_id: i64,
        cash_amount: Decimal,
        credit_amount: Decimal,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Consumes the audit channel and writes each event to the structured log.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderFinalized {
                order_id,
                invoice_id,
                total_amount,
            } => {
                info!(
                    order_id,
                    invoice_id,
                    %total_amount,
                    "Order finalized"
                );
            }
            Event::PaymentRecorded {
                payment_id,
                customer_id,
                amount,
            } => {
                info!(payment_id, customer_id, %amount, "Payment recorded");
            }
            Event::PaymentVoided {
                payment_id,
                reissued_note_id,
            } => {
                info!(payment_id, ?reissued_note_id, "Payment voided");
            }
            Event::CreditNoteIssued {
                credit_note_id,
                customer_id,
                amount,
            } => {
                info!(credit_note_id, customer_id, %amount, "Credit note issued");
            }
            Event::AccountSettled {
                customer_id,
                cash_amount,
                credit_amount,
            } => {
                info!(
                    customer_id,
                    %cash_amount,
                    %credit_amount,
                    "Account settled"
                );
            }
            _ => {
                info!("Audit event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}
