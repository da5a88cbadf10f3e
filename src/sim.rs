use std::time::Duration;

use rand::Rng;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Success,
    Failed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Paid,
        TransactionStatus::Success,
        TransactionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Wallet,
    Cash,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Wallet, PaymentMethod::Cash];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Cash => "cash",
        }
    }
}

/// Per-request fake transaction, discarded after the response is written.
#[derive(Serialize, Debug)]
pub struct Transaction {
    pub id: i64,
    pub code: String,
    pub status: TransactionStatus,
    pub payment_type: PaymentMethod,
}

impl Transaction {
    pub fn with_outcomes(outcomes: &dyn OutcomeGenerator) -> Transaction {
        let id = outcomes.transaction_id();
        Transaction {
            id,
            code: format!("TRX-{id}"),
            status: outcomes.status(),
            payment_type: outcomes.payment_method(),
        }
    }
}

/// Source of all simulated randomness, injected into the app state so tests
/// can substitute deterministic values.
pub trait OutcomeGenerator: Send + Sync {
    fn transaction_id(&self) -> i64;
    fn status(&self) -> TransactionStatus;
    fn payment_method(&self) -> PaymentMethod;
    /// value in [50,100)
    fn active_users(&self) -> i64;
    fn delay_up_to(&self, max: Duration) -> Duration;
}

pub struct RandomOutcomes;

impl OutcomeGenerator for RandomOutcomes {
    fn transaction_id(&self) -> i64 {
        rand::rng().random_range(0..1_000_000)
    }

    fn status(&self) -> TransactionStatus {
        TransactionStatus::ALL[rand::rng().random_range(0..TransactionStatus::ALL.len())]
    }

    fn payment_method(&self) -> PaymentMethod {
        PaymentMethod::ALL[rand::rng().random_range(0..PaymentMethod::ALL.len())]
    }

    fn active_users(&self) -> i64 {
        rand::rng().random_range(50..100)
    }

    fn delay_up_to(&self, max: Duration) -> Duration {
        max.mul_f64(rand::rng().random::<f64>())
    }
}

#[cfg(test)]
pub(crate) struct FixedOutcomes {
    pub id: i64,
    pub status: TransactionStatus,
    pub payment: PaymentMethod,
    pub users: i64,
}

#[cfg(test)]
impl OutcomeGenerator for FixedOutcomes {
    fn transaction_id(&self) -> i64 {
        self.id
    }

    fn status(&self) -> TransactionStatus {
        self.status
    }

    fn payment_method(&self) -> PaymentMethod {
        self.payment
    }

    fn active_users(&self) -> i64 {
        self.users
    }

    fn delay_up_to(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}
