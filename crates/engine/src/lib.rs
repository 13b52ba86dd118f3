pub use earmarks::{Earmark, EarmarkStatus};
pub use error::EngineError;
pub use invoices::{ExtractedSnapshot, Invoice, InvoiceCategory};
pub use links::Linkage;
pub use money::MoneyCents;
pub use ops::{
    BankAccountGroup, DueDateGroup, Engine, EngineBuilder, FullReport, InvoiceUpdate,
};

pub mod dates;
pub mod earmarks;
mod error;
pub mod invoices;
pub mod links;
mod money;
mod ops;

type ResultEngine<T> = Result<T, EngineError>;
