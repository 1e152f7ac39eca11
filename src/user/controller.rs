use actix_web::{HttpRequest, HttpResponse, web};

use crate::middleware::auth::caller_claims;
use crate::user::model::{FetchUsersQuery, UpdateUserRequest, User, UserView};
use crate::user::service::{FetchUsersParams, UpdateUserParams, UserService};
use crate::utils::error::CustomError;
use crate::utils::response;

/// The authenticated caller's user document. Callers must have onboarded.
pub async fn resolve_caller(req: &HttpRequest, users: &UserService) -> Result<User, CustomError> {
    let claims = caller_claims(req)?;

    users
        .fetch_user(&claims.id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("User has not completed onboarding".to_string()))
}

/// PUT /api/users/me
pub async fn update_me(
    req: HttpRequest,
    user_service: web::Data<UserService>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, CustomError> {
    let claims = caller_claims(&req)?;
    let body = body.into_inner();

    user_service
        .update_user(UpdateUserParams {
            user_id: claims.id.clone(),
            username: body.username,
            name: body.name,
            bio: body.bio,
            image: body.image,
            path: body.path,
        })
        .await?;

    let user = user_service
        .fetch_user(&claims.id)
        .await?
        .ok_or_else(|| CustomError::InternalServerError("User missing after update".to_string()))?;

    Ok(response::ok("User updated successfully", UserView::from(&user)))
}

/// GET /api/users
pub async fn list_users(
    req: HttpRequest,
    user_service: web::Data<UserService>,
    query: web::Query<FetchUsersQuery>,
) -> Result<HttpResponse, CustomError> {
    let claims = caller_claims(&req)?;
    let query = query.into_inner();

    let page = user_service
        .fetch_users(FetchUsersParams {
            user_id: claims.id,
            search_string: query.search_string,
            page_number: query.page_number,
            page_size: query.page_size,
            sort_by: query.sort_by,
        })
        .await?;

    Ok(response::ok("Users fetched successfully", page))
}

/// GET /api/users/me/activity
pub async fn my_activity(
    req: HttpRequest,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, CustomError> {
    let caller = resolve_caller(&req, &user_service).await?;
    let replies = user_service.get_activity(&caller.id).await?;

    Ok(response::ok("Activity fetched successfully", replies))
}

/// GET /api/users/{id}
pub async fn get_user(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user = user_service
        .fetch_user(&path.into_inner())
        .await?
        .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

    Ok(response::ok("User fetched successfully", UserView::from(&user)))
}

/// GET /api/users/{id}/threads
pub async fn get_user_threads(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let posts = user_service
        .fetch_user_posts(&path.into_inner())
        .await?
        .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

    Ok(response::ok("User threads fetched successfully", posts))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::middleware::auth::issue_token;
    use crate::middleware::error_handler::json_errors;
    use crate::test_support::{TEST_SECRET, TestApp, onboard};

    fn bearer(user_id: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", issue_token(user_id, TEST_SECRET)))
    }

    #[actix_web::test]
    async fn onboarding_then_profile_lookup() {
        let app = TestApp::new();
        let state = app.state();
        let service =
            test::init_service(App::new().configure(|cfg| state.configure(cfg)).wrap(json_errors()))
                .await;

        let req = test::TestRequest::put()
            .uri("/api/users/me")
            .insert_header(bearer("user_1"))
            .set_json(json!({
                "username": "AdaLovelace",
                "name": "Ada Lovelace",
                "bio": "first programmer",
                "path": "/profile/edit",
            }))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/users/user_1").to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;

        assert_eq!(body["data"]["username"], "adalovelace");
        assert_eq!(body["data"]["onboarded"], true);
        assert_eq!(app.cache.revalidated_paths().await, vec!["/profile/edit".to_string()]);
    }

    #[actix_web::test]
    async fn listing_users_requires_a_token_and_excludes_caller() {
        let app = TestApp::new();
        onboard(&app, "user_1", "ada").await;
        onboard(&app, "user_2", "grace").await;
        let state = app.state();
        let service =
            test::init_service(App::new().configure(|cfg| state.configure(cfg)).wrap(json_errors()))
                .await;

        let resp =
            test::call_service(&service, test::TestRequest::get().uri("/api/users").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/users?search_string=&sort_by=asc")
            .insert_header(bearer("user_1"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&service, req).await;

        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "user_2");
    }

    #[actix_web::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::new();
        let state = app.state();
        let service =
            test::init_service(App::new().configure(|cfg| state.configure(cfg)).wrap(json_errors()))
                .await;

        for uri in ["/api/users/ghost", "/api/users/ghost/threads"] {
            let resp = test::call_service(&service, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::get()
            .uri("/api/users/me/activity")
            .insert_header(bearer("ghost"))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
