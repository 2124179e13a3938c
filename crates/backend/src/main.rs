mod data;
mod graphql;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use graphql::Schema;

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

struct ServerConfig {
    data_dir: PathBuf,
    dist_dir: PathBuf,
    port: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());
        ServerConfig {
            data_dir: PathBuf::from(var("DATA_DIR", "data")),
            dist_dir: PathBuf::from(var("DIST_DIR", "dist")),
            port: var("PORT", "3000"),
        }
    }
}

/// Build the full application router.
fn build_app(schema: Schema, data_dir: &Path, dist_dir: &Path) -> Router {
    // Static file routers are stateless, so merge them before adding app state
    let static_files = Router::new()
        .nest("/static", cached_static_router(data_dir, CACHE_1DAY))
        .nest("/dist", cached_static_router(dist_dir, CACHE_IMMUTABLE))
        .nest(
            "/assets",
            cached_static_router(&dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    let index = dist_dir.join("index.html");
    let index_page = get(move || serve_index(index.clone()));
    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", index_page.clone())
        .route("/embed", index_page.clone())
        .route("/embed/", index_page)
        .with_state(schema)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let data = match data::IndexData::load(&config.data_dir) {
        Ok(data) => Arc::new(data),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let schema = graphql::build_schema(data);
    let app = build_app(schema, &config.data_dir, &config.dist_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn serve_index(index: PathBuf) -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Open Data Index</title></head>
<body>
<h1>Open Data Index</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Fixture {
        data: tempfile::TempDir,
        dist: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let data = tempfile::tempdir().unwrap();
            data::tests::write_fixture(data.path());
            let dist = tempfile::tempdir().unwrap();
            std::fs::write(dist.path().join("index.html"), "<html>odi</html>").unwrap();
            std::fs::write(dist.path().join("odi-abc123.js"), "bundle()").unwrap();
            std::fs::create_dir_all(dist.path().join("assets")).unwrap();
            std::fs::write(dist.path().join("assets/style-xyz.css"), "body{}").unwrap();
            Fixture { data, dist }
        }

        fn app(&self) -> Router {
            let data = data::IndexData::load(self.data.path()).unwrap();
            build_app(
                graphql::build_schema(Arc::new(data)),
                self.data.path(),
                self.dist.path(),
            )
        }
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn cache_control(resp: &axum::response::Response) -> &str {
        resp.headers()
            .get("cache-control")
            .unwrap()
            .to_str()
            .unwrap()
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_data_files_have_1day_cache() {
        let fixture = Fixture::new();
        let resp = get(fixture.app(), "/static/places.csv").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), CACHE_1DAY);
    }

    #[tokio::test]
    async fn test_dist_bundles_have_immutable_cache() {
        let fixture = Fixture::new();
        let resp = get(fixture.app(), "/dist/odi-abc123.js").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), CACHE_IMMUTABLE);

        let resp = get(fixture.app(), "/assets/style-xyz.css").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache_control(&resp), CACHE_IMMUTABLE);
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let fixture = Fixture::new();
        let resp = get(fixture.app(), "/static/nonexistent.csv").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_served_for_map_and_embed() {
        let fixture = Fixture::new();
        for uri in ["/", "/embed"] {
            let resp = get(fixture.app(), uri).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(body_text(resp).await, "<html>odi</html>");
        }
    }

    #[tokio::test]
    async fn test_embed_code_src_is_served() {
        use odi_shared::template::{EmbedCode, HtmlTemplates, Templates};

        let html = HtmlTemplates.embed_code(&EmbedCode {
            base_url: String::new(),
            state_params: "?panel_tools=false&panel_share=false".into(),
        });
        let start = html.find("src=\"").unwrap() + "src=\"".len();
        let end = start + html[start..].find('"').unwrap();
        let src = html[start..end].replace("&amp;", "&");
        assert_eq!(src, "/embed?panel_tools=false&panel_share=false");

        let fixture = Fixture::new();
        for uri in [src.as_str(), "/embed/?panel_tools=false"] {
            let resp = get(fixture.app(), uri).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(body_text(resp).await, "<html>odi</html>");
        }
    }

    #[tokio::test]
    async fn test_index_fallback_without_frontend_build() {
        let fixture = Fixture::new();
        std::fs::remove_file(fixture.dist.path().join("index.html")).unwrap();
        let body = body_text(get(fixture.app(), "/").await).await;
        assert!(body.contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_graphql_post() {
        let fixture = Fixture::new();
        let resp = fixture
            .app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"query":"{ datasets { id title score } }"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json["data"]["datasets"][0]["id"], "budget");
        assert_eq!(json["data"]["datasets"][0]["score"], "65");
    }
}
