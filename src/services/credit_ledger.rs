use crate::error::{InterviewError, InterviewResult};
use crate::models::UserAccount;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

/// Interview credit balances
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn account(&self, user_id: &str) -> InterviewResult<UserAccount>;

    /// Atomically remove `amount` credits, failing with
    /// `InsufficientCredits` when the balance is too low. Returns the new balance.
    async fn try_deduct(&self, user_id: &str, amount: i64) -> InterviewResult<i64>;

    /// Give back credits taken for an interview that never started
    async fn refund(&self, user_id: &str, amount: i64) -> InterviewResult<i64>;
}

#[derive(Debug, Default)]
pub struct InMemoryCreditLedger {
    balances: DashMap<String, i64>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, user_id: impl Into<String>, credits: i64) -> Self {
        self.balances.insert(user_id.into(), credits);
        self
    }

    /// Add credits, creating the account when missing
    pub fn add_credits(&self, user_id: &str, credits: i64) -> i64 {
        let mut balance = self.balances.entry(user_id.to_string()).or_insert(0);
        *balance += credits;
        info!(user_id = user_id, added = credits, balance = *balance, "💳 Credits added");
        *balance
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn account(&self, user_id: &str) -> InterviewResult<UserAccount> {
        self.balances
            .get(user_id)
            .map(|balance| UserAccount::new(user_id, *balance))
            .ok_or_else(|| InterviewError::not_found("User", user_id))
    }

    async fn try_deduct(&self, user_id: &str, amount: i64) -> InterviewResult<i64> {
        let mut balance = self
            .balances
            .get_mut(user_id)
            .ok_or_else(|| InterviewError::not_found("User", user_id))?;

        if *balance < amount {
            return Err(InterviewError::InsufficientCredits {
                user_id: user_id.to_string(),
                balance: *balance,
            });
        }

        *balance -= amount;
        debug!(user_id = user_id, deducted = amount, balance = *balance, "Credits deducted");
        Ok(*balance)
    }

    async fn refund(&self, user_id: &str, amount: i64) -> InterviewResult<i64> {
        let mut balance = self
            .balances
            .get_mut(user_id)
            .ok_or_else(|| InterviewError::not_found("User", user_id))?;
        *balance += amount;
        debug!(user_id = user_id, refunded = amount, balance = *balance, "Credits refunded");
        Ok(*balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deduct_until_empty() {
        let ledger = InMemoryCreditLedger::new().with_account("user_1", 1);
        assert_eq!(ledger.try_deduct("user_1", 1).await.unwrap(), 0);

        let err = ledger.try_deduct("user_1", 1).await.unwrap_err();
        assert!(matches!(err, InterviewError::InsufficientCredits { balance: 0, .. }));
        assert_eq!(ledger.account("user_1").await.unwrap().credits, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_and_refund() {
        let ledger = InMemoryCreditLedger::new();
        assert!(matches!(
            ledger.try_deduct("ghost", 1).await,
            Err(InterviewError::NotFound { .. })
        ));

        ledger.add_credits("user_2", 2);
        ledger.try_deduct("user_2", 1).await.unwrap();
        assert_eq!(ledger.refund("user_2", 1).await.unwrap(), 2);
    }
}
