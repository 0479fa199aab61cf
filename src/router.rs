// src/router.rs

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    common::error::AppError,
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
};

async fn health(State(app_state): State<AppState>) -> Result<&'static str, AppError> {
    sqlx::query("SELECT 1").execute(&app_state.db_pool).await?;
    Ok("OK")
}

pub fn create_router(app_state: AppState) -> Router {
    // Rotas públicas: quem tem o token do convite ou do reset
    let public_routes = Router::new()
        .route("/workspaces", post(handlers::workspaces::sign_up))
        .route("/invitations/{token}", get(handlers::invitations::view_invitation))
        .route("/invitations/{token}/extend", patch(handlers::invitations::extend_invitation))
        .route("/invitations/{token}/accept", patch(handlers::invitations::accept_invitation))
        .route("/sessions", post(handlers::auth::login))
        .route("/password-resets", post(handlers::auth::request_password_reset))
        .route("/password-resets/{token}", patch(handlers::auth::reset_password));

    // Rotas protegidas pela sessão (Bearer)
    let protected_routes = Router::new()
        .route("/invitations", post(handlers::invitations::invite_members))
        .route("/members/{email}/invitation", delete(handlers::invitations::revoke_invitation))
        .route("/sessions/current", get(handlers::auth::current_session))
        .route("/workspace", patch(handlers::workspaces::rename_workspace))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        models::auth::{NewMember, Role},
        testing::{pending_user, Fixture},
    };

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration() -> Value {
        json!({
            "firstName": "Alice",
            "lastName": "Souza",
            "phone": "08011112222",
            "password": "longenough1"
        })
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer() {
        let fx = Fixture::new();
        let app = create_router(fx.state());

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/invitations",
                None,
                Some(json!([{ "email": "a@x.com", "role": "member" }])),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(fx.users.users().is_empty());
    }

    #[tokio::test]
    async fn unknown_session_key_is_rejected() {
        let fx = Fixture::new();
        let app = create_router(fx.state());

        let response = app
            .oneshot(request("GET", "/api/v1/sessions/current", Some("lixo"), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn members_get_403_and_nothing_is_created() {
        let fx = Fixture::new();
        let member = fx.signed_session(Role::Member).await;
        let app = create_router(fx.state());

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/invitations",
                Some(&member.session_key),
                Some(json!([{ "email": "bob@x.com", "role": "member" }])),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(fx.users.users().is_empty());
        assert!(fx.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn invalid_invitations_are_a_400() {
        let fx = Fixture::new();
        let admin = fx.signed_session(Role::Admin).await;

        let cases = [
            json!([]),
            json!([{ "email": "nao-e-email", "role": "member" }]),
            json!([{ "email": "dono@x.com", "role": "owner" }]),
        ];
        for body in cases {
            let response = create_router(fx.state())
                .oneshot(request(
                    "POST",
                    "/api/v1/invitations",
                    Some(&admin.session_key),
                    Some(body),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(body_json(response).await["details"].is_object());
        }
        assert!(fx.users.users().is_empty());
    }

    #[tokio::test]
    async fn invite_view_accept_and_reuse() {
        let fx = Fixture::new();
        let admin = fx.signed_session(Role::Admin).await;

        let response = create_router(fx.state())
            .oneshot(request(
                "POST",
                "/api/v1/invitations",
                Some(&admin.session_key),
                Some(json!([{ "email": "Alice@X.com", "role": "member" }])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let invitations = body_json(response).await;
        assert_eq!(invitations[0]["email"], "alice@x.com");
        let token = invitations[0]["token"].as_str().unwrap().to_owned();

        let response = create_router(fx.state())
            .oneshot(request("GET", &format!("/api/v1/invitations/{}", token), None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let viewed = body_json(response).await;
        assert_eq!(viewed["companyName"], "Acme");
        assert_eq!(viewed["workspaceId"], fx.workspace.id.to_string());

        let response = create_router(fx.state())
            .oneshot(request(
                "PATCH",
                &format!("/api/v1/invitations/{}/accept", token),
                None,
                Some(registration()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert_eq!(session["role"], "member");
        assert_eq!(session["fullName"], "Alice Souza");
        let session_key = session["sessionKey"].as_str().unwrap().to_owned();

        // A sessão nova já abre as rotas protegidas
        let response = create_router(fx.state())
            .oneshot(request("GET", "/api/v1/sessions/current", Some(&session_key), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = create_router(fx.state())
            .oneshot(request(
                "PATCH",
                &format!("/api/v1/invitations/{}/accept", token),
                None,
                Some(registration()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    async fn invite(fx: &Fixture, email: &str) -> String {
        let invitations = fx
            .onboarding
            .invite_members(
                &fx.session(Role::Admin),
                &[NewMember {
                    email: email.to_owned(),
                    role: Role::Member,
                }],
            )
            .await
            .unwrap();
        invitations[0].token.clone()
    }

    async fn view_status(fx: &Fixture, token: &str) -> StatusCode {
        create_router(fx.state())
            .oneshot(request("GET", &format!("/api/v1/invitations/{}", token), None, None))
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn revoked_invitation_is_gone() {
        let fx = Fixture::new();
        let owner = fx.signed_session(Role::Owner).await;
        let token = invite(&fx, "bob@x.com").await;

        let response = create_router(fx.state())
            .oneshot(request(
                "DELETE",
                "/api/v1/members/bob@x.com/invitation",
                Some(&owner.session_key),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        assert_eq!(view_status(&fx, &token).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admins_cannot_revoke_another_workspaces_invitation() {
        let fx = Fixture::new();
        let token = invite(&fx, "bob@x.com").await;

        let evil = fx.workspaces.insert("Evil");
        let intruder = fx
            .sessions
            .create(&pending_user(evil.id, "admin@evil.com", Role::Admin))
            .await
            .unwrap();

        let response = create_router(fx.state())
            .oneshot(request(
                "DELETE",
                "/api/v1/members/bob@x.com/invitation",
                Some(&intruder.session_key),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(view_status(&fx, &token).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn extend_answers_with_the_invitation() {
        let fx = Fixture::new();
        let token = invite(&fx, "bob@x.com").await;

        let response = create_router(fx.state())
            .oneshot(request("PATCH", &format!("/api/v1/invitations/{}/extend", token), None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let extended = body_json(response).await;
        assert_eq!(extended["email"], "bob@x.com");
        assert_eq!(extended["companyName"], "Acme");
        assert_eq!(extended["workspaceId"], fx.workspace.id.to_string());
        assert_eq!(extended["token"], token.as_str());

        let response = create_router(fx.state())
            .oneshot(request("PATCH", "/api/v1/invitations/nao-existe/extend", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn only_managers_rename_the_workspace() {
        let fx = Fixture::new();
        let member = fx.signed_session(Role::Member).await;
        let owner = fx.signed_session(Role::Owner).await;
        let body = json!({ "companyName": "Acme Ltda" });

        let response = create_router(fx.state())
            .oneshot(request("PATCH", "/api/v1/workspace", Some(&member.session_key), Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = create_router(fx.state())
            .oneshot(request("PATCH", "/api/v1/workspace", Some(&owner.session_key), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["companyName"], "Acme Ltda");
    }

    #[tokio::test]
    async fn sign_up_answers_with_the_workspace_and_mails_the_token() {
        let fx = Fixture::new();

        let response = create_router(fx.state())
            .oneshot(request(
                "POST",
                "/api/v1/workspaces",
                None,
                Some(json!({ "companyName": "Globex", "email": "Dona@Globex.com" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let workspace = body_json(response).await;
        assert_eq!(workspace["companyName"], "Globex");
        assert_eq!(workspace["email"], "dona@globex.com");
        // O token do dono não vaza na resposta
        assert!(workspace.get("token").is_none());

        let owner = fx.users.find("dona@globex.com").unwrap();
        assert!(owner.is_pending());
        assert_eq!(workspace["id"], owner.workspace_id.to_string());

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].receiver_email, "dona@globex.com");
    }

    #[tokio::test]
    async fn reset_request_is_accepted_for_unknown_emails() {
        let fx = Fixture::new();

        let response = create_router(fx.state())
            .oneshot(request(
                "POST",
                "/api/v1/password-resets",
                None,
                Some(json!({ "email": "ninguem@x.com" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(fx.mailer.sent().is_empty());
    }
}
