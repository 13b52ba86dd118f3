//! The module contains the representation of a utility invoice (fatura).
//!
//! An invoice carries user-confirmed truth (category, due date, total) plus
//! an optional immutable snapshot of what the extraction pipeline produced at
//! upload time. The snapshot is kept for audit and comparison only; the
//! confirmed fields are never overwritten by it.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, dates};

/// Vendor category of a utility bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceCategory {
    Electricity,
    Water,
    Telecom,
}

impl InvoiceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Water => "water",
            Self::Telecom => "telecom",
        }
    }
}

impl TryFrom<&str> for InvoiceCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "electricity" => Ok(Self::Electricity),
            "water" => Ok(Self::Water),
            "telecom" => Ok(Self::Telecom),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid invoice category: {other}"
            ))),
        }
    }
}

/// What the extraction pipeline found in the scanned document.
///
/// Advisory only: confidence gates nothing, and the user confirms or edits
/// every field before the invoice is created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSnapshot {
    pub category: Option<InvoiceCategory>,
    pub amount: Option<MoneyCents>,
    pub due_date: Option<NaiveDate>,
    /// In `[0.0, 1.0]`: 0.3 for category + 0.4 for amount + 0.3 for due date.
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub category: InvoiceCategory,
    pub due_date: NaiveDate,
    pub total: MoneyCents,
    pub file_url: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub extracted: Option<ExtractedSnapshot>,
}

impl Invoice {
    pub fn new(
        category: InvoiceCategory,
        due_date: NaiveDate,
        total: MoneyCents,
        file_url: Option<String>,
        user_id: String,
        extracted: Option<ExtractedSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if !total.is_positive() {
            return Err(EngineError::InvalidAmount(
                "invoice total must be > 0".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            category,
            due_date,
            total,
            file_url,
            user_id,
            created_at: now,
            updated_at: now,
            extracted,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category: String,
    pub due_date: DateTimeUtc,
    pub total_minor: i64,
    pub file_url: Option<String>,
    pub user_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    // Immutable extraction snapshot, present when the invoice was created
    // from a scanned document. `extracted_confidence` marks presence.
    pub extracted_category: Option<String>,
    pub extracted_amount_minor: Option<i64>,
    pub extracted_due_date: Option<DateTimeUtc>,
    pub extracted_confidence: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::links::Entity")]
    Links,
}

impl Related<super::links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Invoice> for ActiveModel {
    type Error = EngineError;

    fn try_from(invoice: &Invoice) -> Result<Self, Self::Error> {
        let extracted_due_date = invoice
            .extracted
            .and_then(|snapshot| snapshot.due_date)
            .map(dates::date_to_timestamp)
            .transpose()?;

        Ok(Self {
            id: ActiveValue::Set(invoice.id.to_string()),
            category: ActiveValue::Set(invoice.category.as_str().to_string()),
            due_date: ActiveValue::Set(dates::date_to_timestamp(invoice.due_date)?),
            total_minor: ActiveValue::Set(invoice.total.cents()),
            file_url: ActiveValue::Set(invoice.file_url.clone()),
            user_id: ActiveValue::Set(invoice.user_id.clone()),
            created_at: ActiveValue::Set(invoice.created_at),
            updated_at: ActiveValue::Set(invoice.updated_at),
            extracted_category: ActiveValue::Set(
                invoice
                    .extracted
                    .and_then(|snapshot| snapshot.category)
                    .map(|category| category.as_str().to_string()),
            ),
            extracted_amount_minor: ActiveValue::Set(
                invoice
                    .extracted
                    .and_then(|snapshot| snapshot.amount)
                    .map(MoneyCents::cents),
            ),
            extracted_due_date: ActiveValue::Set(extracted_due_date),
            extracted_confidence: ActiveValue::Set(
                invoice.extracted.map(|snapshot| snapshot.confidence),
            ),
        })
    }
}

impl TryFrom<Model> for Invoice {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let extracted = model.extracted_confidence.map(|confidence| {
            Ok::<_, EngineError>(ExtractedSnapshot {
                category: model
                    .extracted_category
                    .as_deref()
                    .map(InvoiceCategory::try_from)
                    .transpose()?,
                amount: model.extracted_amount_minor.map(MoneyCents::new),
                due_date: model.extracted_due_date.map(dates::timestamp_to_date),
                confidence,
            })
        });

        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid invoice id".to_string()))?,
            category: InvoiceCategory::try_from(model.category.as_str())?,
            due_date: dates::timestamp_to_date(model.due_date),
            total: MoneyCents::new(model.total_minor),
            file_url: model.file_url,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            extracted: extracted.transpose()?,
        })
    }
}
