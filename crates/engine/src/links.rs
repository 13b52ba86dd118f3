//! Invoice/earmark linkage records.
//!
//! A [`Linkage`] records a specific amount drawn from one earmark to pay one
//! invoice. Linkages are only ever created by the atomic link operation
//! (which also decrements the earmark balance) and destroyed by the atomic
//! unlink operation (which increments it back), so for any earmark
//! `total - balance == sum(amount over linkages referencing it)` holds after
//! any sequence of operations.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Linkage {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub earmark_id: Uuid,
    /// Always > 0.
    pub amount: MoneyCents,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Linkage {
    pub fn new(
        invoice_id: Uuid,
        earmark_id: Uuid,
        amount: MoneyCents,
        user_id: String,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "linkage amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            invoice_id,
            earmark_id,
            amount,
            user_id,
            created_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoice_earmark_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub invoice_id: String,
    pub earmark_id: String,
    pub amount_minor: i64,
    pub user_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Invoices,
    #[sea_orm(
        belongs_to = "super::earmarks::Entity",
        from = "Column::EarmarkId",
        to = "super::earmarks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Earmarks,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::earmarks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Earmarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Linkage> for ActiveModel {
    fn from(link: &Linkage) -> Self {
        Self {
            id: ActiveValue::Set(link.id.to_string()),
            invoice_id: ActiveValue::Set(link.invoice_id.to_string()),
            earmark_id: ActiveValue::Set(link.earmark_id.to_string()),
            amount_minor: ActiveValue::Set(link.amount.cents()),
            user_id: ActiveValue::Set(link.user_id.clone()),
            created_at: ActiveValue::Set(link.created_at),
        }
    }
}

impl TryFrom<Model> for Linkage {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid linkage id".to_string()))?,
            invoice_id: Uuid::parse_str(&model.invoice_id)
                .map_err(|_| EngineError::InvalidId("invalid invoice id".to_string()))?,
            earmark_id: Uuid::parse_str(&model.earmark_id)
                .map_err(|_| EngineError::InvalidId("invalid earmark id".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            user_id: model.user_id,
            created_at: model.created_at,
        })
    }
}
