//! In-memory stand-in for the books REST API.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub description: Option<String>,
}

/// Body of both `POST /books` and `PUT /books/{id}`.
#[derive(Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BookInput {
    fn into_book(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            description: self.description,
        }
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Book>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", put(update_book).delete(delete_book))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_books(State(db): State<Db>) -> Json<Vec<Book>> {
    let books = db.read().await;
    let mut listed: Vec<Book> = books.values().cloned().collect();
    listed.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    debug!(count = listed.len(), "listing books");
    Json(listed)
}

async fn create_book(
    State(db): State<Db>,
    Json(input): Json<BookInput>,
) -> (StatusCode, Json<Book>) {
    let book = input.into_book(Uuid::new_v4());
    info!(id = %book.id, title = %book.title, "book created");
    db.write().await.insert(book.id, book.clone());
    (StatusCode::CREATED, Json(book))
}

/// Full replacement: fields missing from the body are cleared.
async fn update_book(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<BookInput>,
) -> Result<Json<Book>, StatusCode> {
    let mut books = db.write().await;
    let book = books.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    *book = input.into_book(id);
    info!(%id, "book replaced");
    Ok(Json(book.clone()))
}

async fn delete_book(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut books = db.write().await;
    books.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    info!(%id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
