use chrono::Utc;
use uuid::Uuid;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Linkage, MoneyCents, ResultEngine, invoices, links};

use super::{Engine, with_tx};

impl Engine {
    /// Draws `amount` from an earmark to pay an invoice.
    ///
    /// The balance decrement and the linkage insert commit together; if
    /// either fails the earmark is left untouched. Returns the id of the new
    /// linkage.
    pub async fn link(
        &self,
        invoice_id: Uuid,
        earmark_id: Uuid,
        amount: MoneyCents,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let invoice = invoices::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("invoice not exists".to_string()))?;
            if invoice.user_id != user_id {
                return Err(EngineError::NotFound("invoice not exists".to_string()));
            }

            let earmark = self.require_earmark(&db_tx, earmark_id).await?;
            if earmark.user_id != user_id {
                return Err(EngineError::Forbidden(
                    "earmark does not belong to the user".to_string(),
                ));
            }

            let link = Linkage::new(
                invoice_id,
                earmark_id,
                amount,
                user_id.to_string(),
                Utc::now(),
            )?;
            self.apply_balance_adjustment(&db_tx, earmark_id, amount, link.created_at)
                .await?;
            links::ActiveModel::from(&link).insert(&db_tx).await?;
            Ok(link.id)
        })
    }

    /// Reverses a linkage: restores `amount` to the earmark and deletes the
    /// linkage row, atomically. A missing linkage aborts the whole
    /// transaction, so the balance is never restored twice.
    pub async fn unlink(
        &self,
        link_id: Uuid,
        earmark_id: Uuid,
        amount: MoneyCents,
    ) -> ResultEngine<()> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "linkage amount must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.apply_balance_adjustment(&db_tx, earmark_id, -amount, Utc::now())
                .await?;

            let deleted = links::Entity::delete_by_id(link_id.to_string())
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::NotFound("linkage not exists".to_string()));
            }
            Ok(())
        })
    }

    /// Linkages paying one invoice, most recent first.
    pub async fn links_for_invoice(&self, invoice_id: Uuid) -> ResultEngine<Vec<Linkage>> {
        let models = links::Entity::find()
            .filter(links::Column::InvoiceId.eq(invoice_id.to_string()))
            .order_by_desc(links::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Linkage::try_from).collect()
    }

    /// Linkages drawing from one earmark, most recent first.
    pub async fn links_for_earmark(&self, earmark_id: Uuid) -> ResultEngine<Vec<Linkage>> {
        let models = links::Entity::find()
            .filter(links::Column::EarmarkId.eq(earmark_id.to_string()))
            .order_by_desc(links::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Linkage::try_from).collect()
    }

    /// Sum of all linkage amounts paying one invoice.
    pub async fn total_linked(&self, invoice_id: Uuid) -> ResultEngine<MoneyCents> {
        let links = self.links_for_invoice(invoice_id).await?;
        let mut total = MoneyCents::ZERO;
        for link in &links {
            total = total
                .checked_add(link.amount)
                .ok_or_else(|| EngineError::InvalidAmount("linked total overflow".to_string()))?;
        }
        Ok(total)
    }

    /// Whether an invoice is fully covered: the linked total matches the
    /// invoice total to the centavo. A missing invoice is simply not
    /// complete.
    pub async fn is_complete(&self, invoice_id: Uuid) -> ResultEngine<bool> {
        let Some(invoice) = invoices::Entity::find_by_id(invoice_id.to_string())
            .one(&self.database)
            .await?
        else {
            return Ok(false);
        };

        let linked = self.total_linked(invoice_id).await?;
        Ok(linked.cents() == invoice.total_minor)
    }
}
