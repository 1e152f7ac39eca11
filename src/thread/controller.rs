use actix_web::{HttpRequest, HttpResponse, web};

use crate::cache::{HOME_PATH, PageCache, cached_json, store_json, thread_path};
use crate::thread::model::{AddCommentRequest, CreateThreadRequest, FetchPostsQuery, ThreadView};
use crate::thread::service::{AddCommentParams, CreateThreadParams, ThreadService};
use crate::user::controller::resolve_caller;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::pagination::Page;
use crate::utils::response;

/// POST /api/threads
pub async fn create_thread(
    req: HttpRequest,
    thread_service: web::Data<ThreadService>,
    user_service: web::Data<UserService>,
    body: web::Json<CreateThreadRequest>,
) -> Result<HttpResponse, CustomError> {
    let author = resolve_caller(&req, &user_service).await?;
    let body = body.into_inner();

    let thread = thread_service
        .create_thread(CreateThreadParams {
            text: body.text,
            author: author.id,
            community_id: body.community_id,
            path: body.path,
        })
        .await?;

    Ok(response::created("Thread created successfully", thread))
}

/// GET /api/threads
pub async fn list_threads(
    thread_service: web::Data<ThreadService>,
    cache: web::Data<dyn PageCache>,
    query: web::Query<FetchPostsQuery>,
) -> Result<HttpResponse, CustomError> {
    let cacheable = query.page_number.unwrap_or(1) <= 1 && query.page_size.is_none();

    if cacheable {
        if let Some(page) = cached_json::<Page<ThreadView>>(cache.get_ref(), HOME_PATH).await {
            return Ok(response::ok("Threads fetched successfully", page));
        }
    }

    let page = thread_service
        .fetch_posts(query.page_number, query.page_size)
        .await?;

    if cacheable {
        store_json(cache.get_ref(), HOME_PATH, &page).await;
    }

    Ok(response::ok("Threads fetched successfully", page))
}

/// GET /api/threads/{id}
pub async fn get_thread(
    thread_service: web::Data<ThreadService>,
    cache: web::Data<dyn PageCache>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let id = path.into_inner();
    let cache_path = thread_path(&id);

    if let Some(thread) = cached_json::<ThreadView>(cache.get_ref(), &cache_path).await {
        return Ok(response::ok("Thread fetched successfully", thread));
    }

    let thread = thread_service.fetch_thread_by_id(&id).await?;
    store_json(cache.get_ref(), &cache_path, &thread).await;

    Ok(response::ok("Thread fetched successfully", thread))
}

/// POST /api/threads/{id}/comments
pub async fn add_comment(
    req: HttpRequest,
    thread_service: web::Data<ThreadService>,
    user_service: web::Data<UserService>,
    path: web::Path<String>,
    body: web::Json<AddCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let author = resolve_caller(&req, &user_service).await?;
    let body = body.into_inner();

    let comment = thread_service
        .add_comment_to_thread(AddCommentParams {
            thread_id: path.into_inner(),
            comment_text: body.text,
            user_id: author.id,
            path: body.path,
        })
        .await?;

    Ok(response::created("Comment added successfully", comment))
}
