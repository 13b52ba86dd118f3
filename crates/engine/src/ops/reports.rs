use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Earmark, EngineError, Invoice, MoneyCents, ResultEngine, earmarks, invoices, links,
};

use super::{Engine, with_tx};

/// Invoices sharing one due date, with their combined total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DueDateGroup {
    pub due_date: NaiveDate,
    pub invoices: Vec<Invoice>,
    pub total: MoneyCents,
}

/// Earmarks drawing from one bank account, with their combined figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankAccountGroup {
    pub bank_account: String,
    pub earmarks: Vec<Earmark>,
    pub total: MoneyCents,
    pub balance: MoneyCents,
}

/// The consolidated view of one user's ledger: invoices grouped by due
/// date, earmarks grouped by bank account, and the grand totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullReport {
    pub by_due_date: Vec<DueDateGroup>,
    pub by_bank_account: Vec<BankAccountGroup>,
    /// Sum of all invoice totals.
    pub invoice_total: MoneyCents,
    /// Sum of all linkage amounts across the user's invoices.
    pub linked_total: MoneyCents,
    /// `invoice_total - linked_total`: what still has no earmark coverage.
    pub pending_total: MoneyCents,
}

impl Engine {
    /// Builds the [`FullReport`] for a user from a single consistent read of
    /// the store. Due-date groups come out in ascending calendar order,
    /// bank-account groups in lexical order.
    pub async fn full_report(&self, user_id: &str) -> ResultEngine<FullReport> {
        with_tx!(self, |db_tx| {
            let invoice_models = invoices::Entity::find()
                .filter(invoices::Column::UserId.eq(user_id))
                .order_by_asc(invoices::Column::DueDate)
                .all(&db_tx)
                .await?;
            let earmark_models = earmarks::Entity::find()
                .filter(earmarks::Column::UserId.eq(user_id))
                .order_by_desc(earmarks::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let link_models = links::Entity::find()
                .filter(links::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?;

            let overflow =
                || EngineError::InvalidAmount("report total overflow".to_string());

            let mut invoice_total = MoneyCents::ZERO;
            let mut by_due_date: BTreeMap<NaiveDate, Vec<Invoice>> = BTreeMap::new();
            for model in invoice_models {
                let invoice = Invoice::try_from(model)?;
                invoice_total = invoice_total
                    .checked_add(invoice.total)
                    .ok_or_else(overflow)?;
                by_due_date
                    .entry(invoice.due_date)
                    .or_default()
                    .push(invoice);
            }

            let mut linked_total = MoneyCents::ZERO;
            for model in link_models {
                linked_total = linked_total
                    .checked_add(MoneyCents::new(model.amount_minor))
                    .ok_or_else(overflow)?;
            }

            let mut by_bank_account: BTreeMap<String, Vec<Earmark>> = BTreeMap::new();
            for model in earmark_models {
                let earmark = Earmark::try_from(model)?;
                by_bank_account
                    .entry(earmark.bank_account.clone())
                    .or_default()
                    .push(earmark);
            }

            let by_due_date = by_due_date
                .into_iter()
                .map(|(due_date, invoices)| {
                    let mut total = MoneyCents::ZERO;
                    for invoice in &invoices {
                        total = total.checked_add(invoice.total).ok_or_else(overflow)?;
                    }
                    Ok(DueDateGroup {
                        due_date,
                        invoices,
                        total,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()?;

            let by_bank_account = by_bank_account
                .into_iter()
                .map(|(bank_account, earmarks)| {
                    let mut total = MoneyCents::ZERO;
                    let mut balance = MoneyCents::ZERO;
                    for earmark in &earmarks {
                        total = total.checked_add(earmark.total).ok_or_else(overflow)?;
                        balance = balance.checked_add(earmark.balance).ok_or_else(overflow)?;
                    }
                    Ok(BankAccountGroup {
                        bank_account,
                        earmarks,
                        total,
                        balance,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()?;

            Ok(FullReport {
                by_due_date,
                by_bank_account,
                invoice_total,
                linked_total,
                pending_total: invoice_total.checked_sub(linked_total).ok_or_else(overflow)?,
            })
        })
    }
}
