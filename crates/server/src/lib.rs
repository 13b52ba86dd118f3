use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod earmarks;
mod extract;
mod invoices;
mod links;
mod reports;
mod server;
mod user;

pub mod types {
    pub mod earmark {
        pub use api_types::earmark::{
            BalanceAdjust, EarmarkCreated, EarmarkList, EarmarkNew, EarmarkUpdate,
        };
        pub use engine::Earmark;
    }

    pub mod invoice {
        pub use api_types::invoice::{
            ExtractedData, InvoiceCreated, InvoiceList, InvoiceNew, InvoiceUpdate,
        };
        pub use engine::Invoice;
    }

    pub mod link {
        pub use api_types::link::{Coverage, LinkCreated, LinkNew, Unlink};
        pub use engine::Linkage;
    }

    pub mod report {
        pub use engine::FullReport;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientBalance(_)
        | EngineError::OverAllocation(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidDate(_)
        | EngineError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
