use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{Earmark, EarmarkStatus, EngineError, MoneyCents, ResultEngine, earmarks, links};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Registers a new earmark. The spendable balance starts at the full
    /// total unless an explicit initial balance is given.
    pub async fn create_earmark(
        &self,
        number: &str,
        budget_line: &str,
        bank_account: &str,
        total: MoneyCents,
        initial_balance: Option<MoneyCents>,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let earmark = Earmark::new(
            normalize_required_text(number, "earmark number")?,
            normalize_required_text(budget_line, "budget line")?,
            normalize_required_text(bank_account, "bank account")?,
            total,
            initial_balance,
            user_id.to_string(),
            Utc::now(),
        )?;

        earmarks::ActiveModel::from(&earmark)
            .insert(&self.database)
            .await?;
        Ok(earmark.id)
    }

    /// Return an [`Earmark`] owned by the user.
    pub async fn earmark(&self, earmark_id: Uuid, user_id: &str) -> ResultEngine<Earmark> {
        let model = earmarks::Entity::find_by_id(earmark_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("earmark not exists".to_string()))?;
        if model.user_id != user_id {
            return Err(EngineError::NotFound("earmark not exists".to_string()));
        }
        Earmark::try_from(model)
    }

    /// All earmarks of a user, most recently created first.
    pub async fn earmarks_for_user(&self, user_id: &str) -> ResultEngine<Vec<Earmark>> {
        let models = earmarks::Entity::find()
            .filter(earmarks::Column::UserId.eq(user_id))
            .order_by_desc(earmarks::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Earmark::try_from).collect()
    }

    /// Earmarks of a user that still have spendable balance.
    pub async fn active_earmarks_for_user(&self, user_id: &str) -> ResultEngine<Vec<Earmark>> {
        let models = earmarks::Entity::find()
            .filter(earmarks::Column::UserId.eq(user_id))
            .filter(earmarks::Column::Status.eq(EarmarkStatus::Active.as_str()))
            .order_by_desc(earmarks::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Earmark::try_from).collect()
    }

    /// Earmarks of a user tied to one bank account.
    pub async fn earmarks_for_account(
        &self,
        user_id: &str,
        bank_account: &str,
    ) -> ResultEngine<Vec<Earmark>> {
        let models = earmarks::Entity::find()
            .filter(earmarks::Column::UserId.eq(user_id))
            .filter(earmarks::Column::BankAccount.eq(bank_account))
            .order_by_desc(earmarks::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Earmark::try_from).collect()
    }

    /// Updates the descriptive fields of an earmark. Balance and status are
    /// out of reach here; they only move through [`Engine::adjust_balance`]
    /// and the link/unlink operations.
    pub async fn update_earmark(
        &self,
        earmark_id: Uuid,
        user_id: &str,
        number: Option<&str>,
        budget_line: Option<&str>,
        bank_account: Option<&str>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_earmark(&db_tx, earmark_id).await?;
            if model.user_id != user_id {
                return Err(EngineError::NotFound("earmark not exists".to_string()));
            }

            let mut active = earmarks::ActiveModel {
                id: ActiveValue::Set(model.id),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(number) = number {
                active.number = ActiveValue::Set(normalize_required_text(number, "earmark number")?);
            }
            if let Some(budget_line) = budget_line {
                active.budget_line =
                    ActiveValue::Set(normalize_required_text(budget_line, "budget line")?);
            }
            if let Some(bank_account) = bank_account {
                active.bank_account =
                    ActiveValue::Set(normalize_required_text(bank_account, "bank account")?);
            }
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes an earmark. Refused while any linkage still references it, so
    /// the ledger never ends up with dangling consumption records.
    pub async fn delete_earmark(&self, earmark_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_earmark(&db_tx, earmark_id).await?;
            if model.user_id != user_id {
                return Err(EngineError::NotFound("earmark not exists".to_string()));
            }

            let linked = links::Entity::find()
                .filter(links::Column::EarmarkId.eq(earmark_id.to_string()))
                .count(&db_tx)
                .await?;
            if linked > 0 {
                return Err(EngineError::ExistingKey(
                    "earmark is still referenced by linkages".to_string(),
                ));
            }

            earmarks::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Moves the spendable balance of an earmark by `delta` centavos.
    ///
    /// A positive delta consumes balance, a negative delta restores it. The
    /// read, the range checks and the write happen inside one transaction,
    /// and the status is rederived from the new balance on every write.
    pub async fn adjust_balance(&self, earmark_id: Uuid, delta: MoneyCents) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.apply_balance_adjustment(&db_tx, earmark_id, delta, Utc::now())
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_earmark(
        &self,
        db_tx: &DatabaseTransaction,
        earmark_id: Uuid,
    ) -> ResultEngine<earmarks::Model> {
        earmarks::Entity::find_by_id(earmark_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("earmark not exists".to_string()))
    }

    /// Shared balance write used by [`Engine::adjust_balance`] and the
    /// link/unlink operations, which compose it with their own row changes
    /// inside a single transaction.
    pub(super) async fn apply_balance_adjustment(
        &self,
        db_tx: &DatabaseTransaction,
        earmark_id: Uuid,
        delta: MoneyCents,
        now: DateTime<Utc>,
    ) -> ResultEngine<MoneyCents> {
        let model = self.require_earmark(db_tx, earmark_id).await?;
        let total = MoneyCents::new(model.total_minor);
        let balance = MoneyCents::new(model.balance_minor);

        let new_balance = balance
            .checked_sub(delta)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        if delta.is_positive() && new_balance.is_negative() {
            return Err(EngineError::InsufficientBalance(format!(
                "earmark {} has {} available, requested {}",
                model.number, balance, delta
            )));
        }
        if delta.is_negative() && new_balance > total {
            return Err(EngineError::OverAllocation(format!(
                "restoring {} would push earmark {} above its total of {}",
                -delta, model.number, total
            )));
        }

        let active = earmarks::ActiveModel {
            id: ActiveValue::Set(model.id),
            balance_minor: ActiveValue::Set(new_balance.cents()),
            status: ActiveValue::Set(EarmarkStatus::for_balance(new_balance).as_str().to_string()),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(new_balance)
    }
}
