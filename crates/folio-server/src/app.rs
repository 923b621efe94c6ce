//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/webhooks/github", post(handlers::webhook::github_webhook))
        .route("/api/page-tree", get(handlers::page_tree::get_page_tree))
        .route("/ws/revalidate", get(handlers::revalidate::ws_handler))
        .layer(security::csp_layer())
        .layer(security::content_type_options_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use folio_remote::{
        EVENT_HEADER, GitHost, RemoteSite, RemoteSiteOptions, RevalidateScope, SIGNATURE_HEADER,
        SnapshotHost, sign,
    };
    use folio_source::LoaderOptions;
    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    use crate::{DynSite, RevalidateEvent, create_app};

    const SECRET: &str = "s3cret";

    fn repo(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(path, content)| (format!("docs/{path}"), (*content).to_owned()))
            .collect()
    }

    /// Site on branch `main` plus the sha of a follow-up commit.
    fn site() -> (Arc<DynSite>, String) {
        let mut host = SnapshotHost::new();
        host.add_snapshot(
            "main",
            &repo(&[
                ("index.mdx", "---\ntitle: Home\n---\n"),
                ("guide.md", "---\ntitle: Guide\n---\n"),
            ]),
        );
        let next = host.add_snapshot(
            "next",
            &repo(&[
                ("index.mdx", "---\ntitle: Home\n---\n"),
                ("guide.md", "---\ntitle: Guide v2\n---\n"),
            ]),
        );
        let host: Box<dyn GitHost> = Box::new(host);
        let options = RemoteSiteOptions {
            directory: "docs".to_owned(),
            branch: "main".to_owned(),
            save_file: None,
            include: vec!["**/*.md".to_owned(), "**/*.mdx".to_owned()],
            cache_outputs: true,
        };
        let site = RemoteSite::open(host, options, LoaderOptions::new("/docs")).unwrap();
        (Arc::new(site), next)
    }

    fn push_body(branch: &str, after: &str) -> String {
        format!(r#"{{"ref": "refs/heads/{branch}", "before": "", "after": "{after}"}}"#)
    }

    fn webhook(event: &str, body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks/github")
            .header(EVENT_HEADER, event);
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn drain(receiver: &mut broadcast::Receiver<RevalidateEvent>) -> Vec<RevalidateEvent> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_webhook_rejects_missing_signature() {
        let (site, next) = site();
        let before = site.sha();
        let (app, _) = create_app(Arc::clone(&site), Some(SECRET.to_owned()));

        let response = app
            .oneshot(webhook("push", &push_body("main", &next), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");
        assert_eq!(site.sha(), before);
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_signature() {
        let (site, next) = site();
        let (app, _) = create_app(Arc::clone(&site), Some(SECRET.to_owned()));
        let body = push_body("main", &next);

        let response = app
            .oneshot(webhook("push", &body, Some(sign("other", body.as_bytes()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_push_reconciles_and_broadcasts() {
        let (site, next) = site();
        let (app, sender) = create_app(Arc::clone(&site), Some(SECRET.to_owned()));
        let mut receiver = sender.subscribe();
        let body = push_body("main", &next);

        let response = app
            .oneshot(webhook("push", &body, Some(sign(SECRET, body.as_bytes()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let events = drain(&mut receiver);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].url, "/docs/guide");
        assert_eq!(events[0].scope, RevalidateScope::Page);
        assert_eq!(events[0].sha, site.sha());
        let output = site.output().unwrap();
        let page = output.get_page(&["guide"], None).unwrap();
        assert_eq!(page.data["title"], "Guide v2");
    }

    #[tokio::test]
    async fn test_webhook_ignores_other_events_and_branches() {
        let (site, next) = site();
        let before = site.sha();
        let (app, sender) = create_app(Arc::clone(&site), None);
        let mut receiver = sender.subscribe();

        let ping = app
            .clone()
            .oneshot(webhook("ping", r#"{"zen": "hi"}"#, None))
            .await
            .unwrap();
        let other_branch = app
            .oneshot(webhook("push", &push_body("dev", &next), None))
            .await
            .unwrap();

        assert_eq!(ping.status(), StatusCode::ACCEPTED);
        assert_eq!(other_branch.status(), StatusCode::ACCEPTED);
        assert_eq!(site.sha(), before);
        assert!(drain(&mut receiver).is_empty());
    }

    #[tokio::test]
    async fn test_webhook_invalid_payload() {
        let (site, _) = site();
        let (app, _) = create_app(site, None);

        let response = app.oneshot(webhook("push", "{oops", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_tree() {
        let (site, _) = site();
        let (app, _) = create_app(site, None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/page-tree")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        let json = json_body(response).await;
        assert_eq!(json["name"], "Home");
        let names: Vec<_> = json["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|node| node["name"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["Home".to_owned(), "Guide".to_owned()]);
    }

    #[tokio::test]
    async fn test_page_tree_unknown_locale() {
        let (site, _) = site();
        let (app, _) = create_app(site, None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/page-tree?lang=fr")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
