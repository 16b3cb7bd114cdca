use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Handle for emitting domain events from services.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Events emitted after a successful state change. Emission happens outside
/// the transaction that produced the change; consumers must treat events as
/// at-most-once notifications, not as the system of record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    IngredientCreated {
        ingredient_id: i64,
        is_compound: bool,
    },
    DoNotCombineRuleAdded {
        ingredient1_id: i64,
        ingredient2_id: i64,
    },
    FormulationCommitted {
        formulation_id: i64,
        ingredient_id: i64,
        supplier_id: i64,
        version_number: i32,
    },
    RecipeCommitted {
        recipe_id: i64,
        product_id: i64,
        line_count: usize,
    },
    IngredientLotReceived {
        lot_id: i64,
        formulation_id: i64,
        total_mass_oz: Decimal,
        expiration_date: NaiveDate,
    },
    IngredientLotsClaimed {
        manufacturer_id: i64,
        requested: usize,
        claimed: usize,
    },
    ProductBatchCreated {
        product_lot_id: i64,
        recipe_id: i64,
        quantity: i32,
        total_cost: Decimal,
        production_date: NaiveDate,
    },
}

/// Drains the event channel, logging each event. Spawn once at startup;
/// returns when all senders have been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        info!(?event, "Processing event");
    }
}
