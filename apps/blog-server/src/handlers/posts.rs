//! Post handlers.
//!
//! Each route opens a unit of work, resolves `{id}` into a post where the
//! route has one (404 when it does not exist), and hands over to
//! [`PostController`](blog_core::PostController).

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use blog_core::domain::PostId;
use blog_core::form::{PostForm, Submission};

use super::client_nonce::ClientNonce;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Fields posted by the delete confirmation form.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "_token", default)]
    pub token: Option<String>,
}

/// GET /post
pub async fn index(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let mut gateway = state.posts.gateway();
    let outcome = state.posts.list(&mut gateway).await?;
    Ok(state.views.respond(outcome)?)
}

/// GET /post/new
pub async fn new_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    create(&state, Submission::NotSubmitted).await
}

/// POST /post/new
pub async fn new_submit(
    state: web::Data<AppState>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    create(&state, Submission::Submitted(form.into_inner())).await
}

/// GET /post/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    edit(&state, PostId::new(path.into_inner()), Submission::NotSubmitted).await
}

/// POST /post/{id}/edit
pub async fn edit_submit(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let submission = Submission::Submitted(form.into_inner());
    edit(&state, PostId::new(path.into_inner()), submission).await
}

/// GET /post/delete/{id}
pub async fn delete_confirm(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    delete(&state, &req, PostId::new(path.into_inner()), None).await
}

/// POST /post/delete/{id}
///
/// A body that is not a urlencoded form counts as a missing token.
pub async fn delete_submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: Option<web::Form<DeleteForm>>,
) -> AppResult<HttpResponse> {
    let token = form.and_then(|form| form.into_inner().token);
    delete(&state, &req, PostId::new(path.into_inner()), token.as_deref()).await
}

/// GET /
pub async fn home() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, blog_core::Route::PostIndex.path()))
        .finish()
}

async fn create(state: &AppState, submission: Submission<PostForm>) -> AppResult<HttpResponse> {
    let mut gateway = state.posts.gateway();
    let outcome = state.posts.create(&mut gateway, submission).await?;
    Ok(state.views.respond(outcome)?)
}

async fn edit(
    state: &AppState,
    id: PostId,
    submission: Submission<PostForm>,
) -> AppResult<HttpResponse> {
    let mut gateway = state.posts.gateway();
    let post = gateway.require(id).await?;
    let outcome = state.posts.edit(&mut gateway, &post, submission).await?;
    Ok(state.views.respond(outcome)?)
}

async fn delete(
    state: &AppState,
    req: &HttpRequest,
    id: PostId,
    token: Option<&str>,
) -> AppResult<HttpResponse> {
    let nonce = ClientNonce::from_request(req);
    let posts = state.posts_for_client(nonce.value());

    let mut gateway = posts.gateway();
    let post = gateway.require(id).await?;
    let outcome = posts.delete(&mut gateway, &post, token).await?;

    let mut response = state.views.respond(outcome)?;
    nonce.attach(&mut response)?;
    Ok(response)
}
