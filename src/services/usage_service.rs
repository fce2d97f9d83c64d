use super::credit_ledger::CreditLedger;
use crate::constants::LOW_CREDIT_THRESHOLD;
use crate::error::InterviewResult;
use crate::state_machine::{round_to_tenth, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Nudge shown when a user is running out of interview credits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradePrompt {
    NoCredits,
    LowCredits { remaining: i64 },
}

impl UpgradePrompt {
    pub fn for_balance(credits: i64) -> Option<Self> {
        if credits <= 0 {
            Some(Self::NoCredits)
        } else if credits <= LOW_CREDIT_THRESHOLD {
            Some(Self::LowCredits { remaining: credits })
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NoCredits => {
                "You're out of interview credits. Purchase more to keep practicing.".to_string()
            }
            Self::LowCredits { remaining } => {
                format!("Only {remaining} interview credit(s) left. Top up to avoid interruptions.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub user_id: String,
    pub credits: i64,
    pub total_interviews: usize,
    pub completed_interviews: usize,
    pub in_progress_interviews: usize,
    /// Percentage of started interviews that were completed, one decimal
    pub completion_rate: f64,
    pub average_score: Option<f64>,
    pub upgrade_prompt: Option<UpgradePrompt>,
}

/// Credit balance plus interview statistics for one user
pub struct UsageService {
    store: Arc<dyn SessionStore>,
    ledger: Arc<dyn CreditLedger>,
}

impl UsageService {
    pub fn new(store: Arc<dyn SessionStore>, ledger: Arc<dyn CreditLedger>) -> Self {
        Self { store, ledger }
    }

    pub async fn report(&self, user_id: &str) -> InterviewResult<UsageReport> {
        let account = self.ledger.account(user_id).await?;
        let sessions = self.store.list_for_user(user_id, usize::MAX).await?;

        let total = sessions.len();
        let scores: Vec<f64> = sessions
            .iter()
            .filter(|s| s.is_completed())
            .filter_map(|s| s.overall_score)
            .collect();
        let completed = sessions.iter().filter(|s| s.is_completed()).count();

        let completion_rate = if total == 0 {
            0.0
        } else {
            round_to_tenth(completed as f64 / total as f64 * 100.0)
        };
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(round_to_tenth(scores.iter().sum::<f64>() / scores.len() as f64))
        };

        Ok(UsageReport {
            user_id: user_id.to_string(),
            credits: account.credits,
            total_interviews: total,
            completed_interviews: completed,
            in_progress_interviews: total - completed,
            completion_rate,
            average_score,
            upgrade_prompt: UpgradePrompt::for_balance(account.credits),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_prompt_thresholds() {
        assert_eq!(UpgradePrompt::for_balance(0), Some(UpgradePrompt::NoCredits));
        assert_eq!(
            UpgradePrompt::for_balance(2),
            Some(UpgradePrompt::LowCredits { remaining: 2 })
        );
        assert_eq!(
            UpgradePrompt::for_balance(1),
            Some(UpgradePrompt::LowCredits { remaining: 1 })
        );
        assert_eq!(UpgradePrompt::for_balance(3), None);
        assert!(UpgradePrompt::NoCredits.message().contains("out of interview credits"));
    }
}
