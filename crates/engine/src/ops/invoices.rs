use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ExtractedSnapshot, Invoice, InvoiceCategory, MoneyCents, ResultEngine, dates,
    invoices, links,
};

use super::{Engine, with_tx};

/// Field changes for [`Engine::update_invoice`]. `None` leaves a field as is.
/// The extraction snapshot is immutable and deliberately absent here.
#[derive(Clone, Debug, Default)]
pub struct InvoiceUpdate {
    pub category: Option<InvoiceCategory>,
    pub due_date: Option<NaiveDate>,
    pub total: Option<MoneyCents>,
    pub file_url: Option<String>,
}

impl Engine {
    /// Registers a new invoice. When the invoice was created from a scanned
    /// document the extraction snapshot is stored alongside, frozen as of
    /// this moment.
    pub async fn create_invoice(
        &self,
        category: InvoiceCategory,
        due_date: NaiveDate,
        total: MoneyCents,
        file_url: Option<&str>,
        extracted: Option<ExtractedSnapshot>,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let invoice = Invoice::new(
            category,
            due_date,
            total,
            file_url.map(|s| s.to_string()),
            user_id.to_string(),
            extracted,
            Utc::now(),
        )?;

        invoices::ActiveModel::try_from(&invoice)?
            .insert(&self.database)
            .await?;
        Ok(invoice.id)
    }

    /// Return an [`Invoice`] owned by the user.
    pub async fn invoice(&self, invoice_id: Uuid, user_id: &str) -> ResultEngine<Invoice> {
        let model = invoices::Entity::find_by_id(invoice_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("invoice not exists".to_string()))?;
        if model.user_id != user_id {
            return Err(EngineError::NotFound("invoice not exists".to_string()));
        }
        Invoice::try_from(model)
    }

    /// All invoices of a user, earliest due date first.
    pub async fn invoices_for_user(&self, user_id: &str) -> ResultEngine<Vec<Invoice>> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .order_by_asc(invoices::Column::DueDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(Invoice::try_from).collect()
    }

    /// Invoices of a user in one category, earliest due date first.
    pub async fn invoices_for_category(
        &self,
        user_id: &str,
        category: InvoiceCategory,
    ) -> ResultEngine<Vec<Invoice>> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::Category.eq(category.as_str()))
            .order_by_asc(invoices::Column::DueDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(Invoice::try_from).collect()
    }

    /// Invoices of a user due between today and `days` days from now,
    /// earliest first.
    pub async fn invoices_due_within(&self, user_id: &str, days: i64) -> ResultEngine<Vec<Invoice>> {
        let today = Utc::now().date_naive();
        let horizon = today
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| EngineError::InvalidDate("horizon out of range".to_string()))?;

        let models = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::DueDate.gte(dates::date_to_timestamp(today)?))
            .filter(invoices::Column::DueDate.lte(dates::date_to_timestamp(horizon)?))
            .order_by_asc(invoices::Column::DueDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(Invoice::try_from).collect()
    }

    /// Updates the user-confirmed fields of an invoice. The extraction
    /// snapshot taken at creation never changes.
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        user_id: &str,
        update: InvoiceUpdate,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = invoices::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("invoice not exists".to_string()))?;
            if model.user_id != user_id {
                return Err(EngineError::NotFound("invoice not exists".to_string()));
            }

            let mut active = invoices::ActiveModel {
                id: ActiveValue::Set(model.id),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(category) = update.category {
                active.category = ActiveValue::Set(category.as_str().to_string());
            }
            if let Some(due_date) = update.due_date {
                active.due_date = ActiveValue::Set(dates::date_to_timestamp(due_date)?);
            }
            if let Some(total) = update.total {
                if !total.is_positive() {
                    return Err(EngineError::InvalidAmount(
                        "invoice total must be > 0".to_string(),
                    ));
                }
                active.total_minor = ActiveValue::Set(total.cents());
            }
            if let Some(file_url) = &update.file_url {
                active.file_url = ActiveValue::Set(Some(file_url.clone()));
            }
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes an invoice. Refused while any linkage still references it;
    /// the linkages have to be unlinked first so the earmark balances are
    /// restored through the ledger.
    pub async fn delete_invoice(&self, invoice_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = invoices::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("invoice not exists".to_string()))?;
            if model.user_id != user_id {
                return Err(EngineError::NotFound("invoice not exists".to_string()));
            }

            let linked = links::Entity::find()
                .filter(links::Column::InvoiceId.eq(invoice_id.to_string()))
                .count(&db_tx)
                .await?;
            if linked > 0 {
                return Err(EngineError::ExistingKey(
                    "invoice is still referenced by linkages".to_string(),
                ));
            }

            invoices::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
