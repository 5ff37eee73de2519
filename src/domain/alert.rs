//! Notification digest for critical and high alerts.

use crate::domain::advisory::{AdvisoryState, AlertLevel};
use crate::domain::engine::{CycleResult, HoldingEvaluation};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertDigest {
    pub title: String,
    /// Markdown body.
    pub body: String,
    pub count: usize,
}

impl AlertDigest {
    /// `None` when the cycle has nothing worth notifying.
    pub fn from_cycle(result: &CycleResult) -> Option<Self> {
        let alerts = result.alerts();
        if alerts.is_empty() {
            return None;
        }
        Some(Self::from_alerts(&alerts, &result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()))
    }

    pub fn from_alerts(alerts: &[&HoldingEvaluation], time: &str) -> Self {
        let title = format!("Fund monitor alert ({} funds)", alerts.len());
        let mut body = String::from("## Fund monitor alert\n\n");
        let _ = writeln!(body, "**Time**: {time}\n");

        for eval in alerts {
            let marker = match eval.alert_level() {
                AlertLevel::Critical => "[CRITICAL]",
                _ => "[HIGH]",
            };
            let _ = writeln!(body, "### {marker} {} - {}", eval.name, eval.advisory.state);
            let _ = writeln!(body, "- NAV: **{:.4}**", eval.nav);
            let _ = writeln!(body, "- Average cost: {:.4}", eval.simulation.average_cost);
            let _ = writeln!(body, "- Profit rate: **{:.2}%**", eval.profit_rate * 100.0);
            let _ = writeln!(body, "- Profit amount: **{:.2}**", eval.profit_amount);
            let _ = writeln!(body, "- Drawdown: {:.2}%", eval.drawdown * 100.0);
            let _ = writeln!(body, "\n**Suggestion**: {}\n", action(eval.advisory.state));
            body.push_str("---\n\n");
        }

        AlertDigest {
            title,
            body,
            count: alerts.len(),
        }
    }
}

fn action(state: AdvisoryState) -> &'static str {
    match state {
        AdvisoryState::TrendReversalTakeProfit => "consider taking profit to lock in gains",
        AdvisoryState::EmergencyStopLoss | AdvisoryState::StopLossAdvised => {
            "consider cutting the position to limit losses"
        }
        _ => "watch for drawdown risk",
    }
}
