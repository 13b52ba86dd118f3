//! The module contains the representation of a budget earmark (empenho).
//!
//! An earmark is a budget allocation with a fixed total and a spendable
//! remaining balance, tied to one bank account. The invariant is
//! `0 <= balance <= total`, and the status is always a pure function of the
//! balance: `Active` iff `balance > 0`, otherwise `Exhausted`. The status is
//! recomputed on every balance write and never set independently.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarmarkStatus {
    Active,
    Exhausted,
}

impl EarmarkStatus {
    /// Derives the status from a balance. The only way a status is produced.
    #[must_use]
    pub fn for_balance(balance: MoneyCents) -> Self {
        if balance.is_positive() {
            Self::Active
        } else {
            Self::Exhausted
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Exhausted => "exhausted",
        }
    }
}

impl TryFrom<&str> for EarmarkStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "exhausted" => Ok(Self::Exhausted),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid earmark status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Earmark {
    pub id: Uuid,
    /// Official earmark number assigned by the municipality.
    pub number: String,
    pub budget_line: String,
    pub bank_account: String,
    pub total: MoneyCents,
    pub balance: MoneyCents,
    pub status: EarmarkStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Earmark {
    /// Creates a new earmark. The balance defaults to the full total when no
    /// explicit initial balance is given.
    pub fn new(
        number: String,
        budget_line: String,
        bank_account: String,
        total: MoneyCents,
        initial_balance: Option<MoneyCents>,
        user_id: String,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !total.is_positive() {
            return Err(EngineError::InvalidAmount(
                "earmark total must be > 0".to_string(),
            ));
        }
        let balance = initial_balance.unwrap_or(total);
        if balance.is_negative() || balance > total {
            return Err(EngineError::InvalidAmount(
                "earmark balance must be within 0..=total".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            number,
            budget_line,
            bank_account,
            total,
            balance,
            status: EarmarkStatus::for_balance(balance),
            user_id,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "earmarks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    pub budget_line: String,
    pub bank_account: String,
    pub total_minor: i64,
    pub balance_minor: i64,
    pub status: String,
    pub user_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

impl From<&Earmark> for ActiveModel {
    fn from(earmark: &Earmark) -> Self {
        Self {
            id: ActiveValue::Set(earmark.id.to_string()),
            number: ActiveValue::Set(earmark.number.clone()),
            budget_line: ActiveValue::Set(earmark.budget_line.clone()),
            bank_account: ActiveValue::Set(earmark.bank_account.clone()),
            total_minor: ActiveValue::Set(earmark.total.cents()),
            balance_minor: ActiveValue::Set(earmark.balance.cents()),
            status: ActiveValue::Set(earmark.status.as_str().to_string()),
            user_id: ActiveValue::Set(earmark.user_id.clone()),
            created_at: ActiveValue::Set(earmark.created_at),
            updated_at: ActiveValue::Set(earmark.updated_at),
        }
    }
}

impl TryFrom<Model> for Earmark {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid earmark id".to_string()))?,
            number: model.number,
            budget_line: model.budget_line,
            bank_account: model.bank_account,
            total: MoneyCents::new(model.total_minor),
            balance: MoneyCents::new(model.balance_minor),
            status: EarmarkStatus::try_from(model.status.as_str())?,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
