use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{earmarks, extract, invoices, links, reports, user};
use engine::Engine;
use extraction::RecognizerHandle;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub recognizer: Arc<RecognizerHandle>,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/earmarks", post(earmarks::create).get(earmarks::list))
        .route(
            "/earmarks/{id}",
            get(earmarks::get)
                .patch(earmarks::update)
                .delete(earmarks::remove),
        )
        .route("/earmarks/{id}/adjust", post(earmarks::adjust))
        .route("/earmarks/{id}/links", get(links::list_for_earmark))
        .route("/invoices", post(invoices::create).get(invoices::list))
        .route(
            "/invoices/{id}",
            get(invoices::get)
                .patch(invoices::update)
                .delete(invoices::remove),
        )
        .route("/invoices/{id}/links", get(links::list_for_invoice))
        .route("/invoices/{id}/coverage", get(links::coverage))
        .route("/links", post(links::create))
        .route("/links/{id}", delete(links::remove))
        .route("/report", get(reports::full))
        .route("/extract", post(extract::run))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, recognizer: RecognizerHandle) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, recognizer, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    recognizer: RecognizerHandle,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
        recognizer: Arc::new(recognizer),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    recognizer: RecognizerHandle,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, recognizer, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
