//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication
//! - `earmarks`: budget earmarks (empenhos) with total and spendable balance
//! - `invoices`: utility invoices (faturas) with the immutable extraction
//!   snapshot taken at upload time
//! - `invoice_earmark_links`: amounts drawn from an earmark to pay an invoice

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Earmarks {
    Table,
    Id,
    Number,
    BudgetLine,
    BankAccount,
    TotalMinor,
    BalanceMinor,
    Status,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    Category,
    DueDate,
    TotalMinor,
    FileUrl,
    UserId,
    CreatedAt,
    UpdatedAt,
    ExtractedCategory,
    ExtractedAmountMinor,
    ExtractedDueDate,
    ExtractedConfidence,
}

#[derive(Iden)]
enum InvoiceEarmarkLinks {
    Table,
    Id,
    InvoiceId,
    EarmarkId,
    AmountMinor,
    UserId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Earmarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Earmarks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Earmarks::Number).string().not_null())
                    .col(ColumnDef::new(Earmarks::BudgetLine).string().not_null())
                    .col(ColumnDef::new(Earmarks::BankAccount).string().not_null())
                    .col(
                        ColumnDef::new(Earmarks::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Earmarks::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Earmarks::Status).string().not_null())
                    .col(ColumnDef::new(Earmarks::UserId).string().not_null())
                    .col(ColumnDef::new(Earmarks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Earmarks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-earmarks-user_id")
                            .from(Earmarks::Table, Earmarks::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-earmarks-user_id")
                    .table(Earmarks::Table)
                    .col(Earmarks::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invoices::Category).string().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Invoices::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoices::FileUrl).string())
                    .col(ColumnDef::new(Invoices::UserId).string().not_null())
                    .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::ExtractedCategory).string())
                    .col(ColumnDef::new(Invoices::ExtractedAmountMinor).big_integer())
                    .col(ColumnDef::new(Invoices::ExtractedDueDate).timestamp())
                    .col(ColumnDef::new(Invoices::ExtractedConfidence).double())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoices-user_id")
                            .from(Invoices::Table, Invoices::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-user_id-due_date")
                    .table(Invoices::Table)
                    .col(Invoices::UserId)
                    .col(Invoices::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceEarmarkLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceEarmarkLinks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InvoiceEarmarkLinks::InvoiceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceEarmarkLinks::EarmarkId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceEarmarkLinks::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceEarmarkLinks::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceEarmarkLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-links-invoice_id")
                            .from(InvoiceEarmarkLinks::Table, InvoiceEarmarkLinks::InvoiceId)
                            .to(Invoices::Table, Invoices::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-links-earmark_id")
                            .from(InvoiceEarmarkLinks::Table, InvoiceEarmarkLinks::EarmarkId)
                            .to(Earmarks::Table, Earmarks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-links-invoice_id")
                    .table(InvoiceEarmarkLinks::Table)
                    .col(InvoiceEarmarkLinks::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-links-earmark_id")
                    .table(InvoiceEarmarkLinks::Table)
                    .col(InvoiceEarmarkLinks::EarmarkId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvoiceEarmarkLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Earmarks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
