//! # Reports
//!
//! Read-only figures derived on demand from approved transactions.
//!
//! ## Income Statement
//! ```text
//!   Revenue              Σ approved INCOME
//! − Cost of goods        Σ approved EXPENSE in the "Inventory" category
//! ─────────────────────
//! = Gross profit
//! − Operating expenses   Σ approved EXPENSE, every other category
//! ─────────────────────
//! = EBITDA               (no depreciation or interest is tracked,
//!                         so EBITDA equals net income here)
//! ```
//!
//! Every report takes an optional unit scope; `None` covers all units.

use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use crate::kernel::Kernel;
use crate::money::Money;
use crate::types::{Transaction, TransactionKind};
use crate::INVENTORY_CATEGORY;

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
    pub low_stock_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub revenue: Money,
    pub cost_of_goods: Money,
    pub gross_profit: Money,
    pub operating_expenses: Money,
    pub ebitda: Money,
    pub net_income: Money,
    /// gross_profit / revenue, basis points.
    pub gross_margin_bps: i64,
    /// net_income / revenue, basis points.
    pub net_margin_bps: i64,
    /// revenue / number of income entries.
    pub average_ticket: Money,
    pub income_count: usize,
}

/// One point of the series handed to the forecasting advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Income positive, expense negative.
    pub signed_amount: Money,
    pub category: String,
}

impl Kernel {
    fn approved_in<'a>(
        &'a self,
        unit_id: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions()
            .iter()
            .filter(move |t| t.is_approved() && unit_id.map_or(true, |u| t.unit_id == u))
    }

    pub fn dashboard_summary(&self, unit_id: Option<&str>) -> DashboardSummary {
        let mut income = Money::zero();
        let mut expense = Money::zero();
        for tx in self.approved_in(unit_id) {
            match tx.kind {
                TransactionKind::Income => income += tx.amount,
                TransactionKind::Expense => expense += tx.amount,
            }
        }

        let pending_count = self
            .transactions()
            .iter()
            .filter(|t| !t.status.is_terminal() && unit_id.map_or(true, |u| t.unit_id == u))
            .count();

        DashboardSummary {
            income,
            expense,
            balance: income - expense,
            low_stock_count: self.low_stock(unit_id).len(),
            pending_count,
        }
    }

    pub fn income_statement(&self, unit_id: Option<&str>) -> IncomeStatement {
        let mut revenue = Money::zero();
        let mut income_count = 0usize;
        let mut cost_of_goods = Money::zero();
        let mut operating_expenses = Money::zero();

        for tx in self.approved_in(unit_id) {
            match tx.kind {
                TransactionKind::Income => {
                    revenue += tx.amount;
                    income_count += 1;
                }
                TransactionKind::Expense if tx.category == INVENTORY_CATEGORY => {
                    cost_of_goods += tx.amount
                }
                TransactionKind::Expense => operating_expenses += tx.amount,
            }
        }

        let gross_profit = revenue - cost_of_goods;
        let net_income = gross_profit - operating_expenses;
        let average_ticket = if income_count == 0 {
            Money::zero()
        } else {
            Money::from_cents(revenue.cents() / income_count as i64)
        };

        IncomeStatement {
            revenue,
            cost_of_goods,
            gross_profit,
            operating_expenses,
            ebitda: net_income,
            net_income,
            gross_margin_bps: gross_profit.ratio_bps(revenue),
            net_margin_bps: net_income.ratio_bps(revenue),
            average_ticket,
            income_count,
        }
    }

    /// Approved transactions as a signed series, oldest first.
    pub fn forecast_input(&self, unit_id: Option<&str>) -> Vec<ForecastPoint> {
        let mut points: Vec<ForecastPoint> = self
            .approved_in(unit_id)
            .map(|t| ForecastPoint {
                date: t.date,
                signed_amount: t.signed_amount(),
                category: t.category.clone(),
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points
    }
}
