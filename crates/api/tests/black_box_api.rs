use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use vitrina_auth::{JwtClaims, Role};
use vitrina_core::UserId;
use vitrina_auth::Hs256JwtValidator;
use vitrina_infra::InMemoryStore;
use vitrina_infra::accounts::AccountService;

const JWT_SECRET: &str = "test-secret-0123456789";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(InMemoryStore::new())).await
    }

    async fn spawn_with(store: Arc<InMemoryStore>) -> Self {
        // Same router as prod over the given in-memory store, on an ephemeral port.
        let app = vitrina_api::app::build_app(store, JWT_SECRET, ChronoDuration::hours(1));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Redirects are asserted on, not followed.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: UserId, roles: &[&str]) -> String {
    let claims = JwtClaims::new(
        sub,
        "caller@example.com",
        roles.iter().map(|r| Role::new(r.to_string())).collect(),
        Utc::now(),
        ChronoDuration::minutes(10),
    );

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn location(res: &reqwest::Response) -> String {
    res.headers()
        .get(reqwest::header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn product_body(name: &str, versions: Value) -> Value {
    json!({
        "product": {
            "name": name,
            "description": "Описание товара",
            "price": "1999.99",
            "is_published": true
        },
        "versions": versions
    })
}

/// Create a product as `token` and return its id.
async fn create_product(srv: &TestServer, token: &str, name: &str) -> String {
    let res = srv
        .post("/products", Some(token), product_body(name, json!([])))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let home: Value = srv.get("/", None).await.json().await.unwrap();
    home["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .expect("created product is listed")["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    assert_eq!(srv.get("/health", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.get("/whoami", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        srv.get("/products/new", Some("not-a-token")).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let issued = Utc::now() - ChronoDuration::hours(2);
    let claims = JwtClaims::new(UserId::new(), "a@example.com", vec![], issued, ChronoDuration::minutes(5));
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(srv.get("/whoami", Some(&token)).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let user = UserId::new();
    let token = mint_jwt(user, &["moderator"]);

    let res = srv.get("/whoami", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["principal_id"].as_str().unwrap(), user.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "moderator"));
    assert_eq!(body["permissions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn register_then_login_then_profile() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post(
            "/users/register",
            None,
            json!({ "email": "buyer@example.com", "password1": "pa55-word!", "password2": "pa55-word!" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/login");

    let res = srv
        .post(
            "/users/register",
            None,
            json!({ "email": "buyer@example.com", "password1": "pa55-word!", "password2": "pa55-word!" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = srv
        .post(
            "/users/login",
            None,
            json!({ "email": "buyer@example.com", "password": "pa55-word!" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token: Value = res.json().await.unwrap();
    let token = token["access_token"].as_str().unwrap().to_string();

    let res = srv.get("/users/profile", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["form"]["values"]["email"], "buyer@example.com");

    let res = srv
        .post(
            "/users/login",
            None,
            json!({ "email": "buyer@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_create_then_edit_with_one_active_version() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), &[]);
    let id = create_product(&srv, &token, "Смартфон").await;

    let res = srv.get(&format!("/products/{id}/edit"), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["capability"], "full_owner_edit");
    assert_eq!(page["formset"]["forms"].as_array().unwrap().len(), 1);

    let res = srv
        .post(
            &format!("/products/{id}/edit"),
            Some(&token),
            product_body(
                "Смартфон",
                json!([{ "version_number": 1, "version_name": "Первая", "is_active": true }]),
            ),
        )
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/products/{id}"));

    let detail: Value = srv.get(&format!("/products/{id}"), None).await.json().await.unwrap();
    assert_eq!(detail["versions"].as_array().unwrap().len(), 1);
    assert_eq!(detail["active_version"]["version_name"], "Первая");
}

#[tokio::test]
async fn two_active_versions_are_rejected_with_a_form_error() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), &[]);

    let res = srv
        .post(
            "/products",
            Some(&token),
            product_body(
                "Наушники",
                json!([
                    { "version_number": 1, "version_name": "a", "is_active": true },
                    { "version_number": 2, "version_name": "b", "is_active": true }
                ]),
            ),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["form"]["errors"]["non_field"].as_array().unwrap().len(), 1);

    let home: Value = srv.get("/", None).await.json().await.unwrap();
    assert!(home["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn forbidden_word_is_reported_on_the_name_field() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), &[]);

    let res = srv
        .post("/products", Some(&token), product_body("Лучшее Казино", json!([])))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page: Value = res.json().await.unwrap();
    assert!(!page["form"]["errors"]["fields"]["name"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn editing_rights_follow_roles() {
    let srv = TestServer::spawn().await;
    let owner = mint_jwt(UserId::new(), &[]);
    let id = create_product(&srv, &owner, "Камера").await;
    let edit = format!("/products/{id}/edit");

    let stranger = mint_jwt(UserId::new(), &["viewer"]);
    assert_eq!(srv.get(&edit, Some(&stranger)).await.status(), StatusCode::FORBIDDEN);

    let manager = mint_jwt(UserId::new(), &["content_manager"]);
    let res = srv.get(&edit, Some(&manager)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["capability"], "content_manager_edit");
    assert_eq!(page["form"]["fields"].as_array().unwrap().len(), 2);

    assert_eq!(
        srv.post(&format!("/products/{id}/delete"), Some(&manager), json!({}))
            .await
            .status(),
        StatusCode::FORBIDDEN
    );

    let moderator = mint_jwt(UserId::new(), &["moderator"]);
    let res = srv
        .post(&format!("/products/{id}/delete"), Some(&moderator), json!({}))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        srv.get(&format!("/products/{id}"), None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), &[]);

    let unknown = vitrina_core::ProductId::new();
    assert_eq!(
        srv.get(&format!("/products/{unknown}/edit"), Some(&token)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        srv.get("/products/not-an-id", None).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(srv.get("/contacts", None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blog_articles_count_views() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), &["admin"]);

    let res = srv
        .post(
            "/blog",
            Some(&token),
            json!({ "title": "Новости магазина", "content": "Текст", "is_published": true }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/blog");

    let list: Value = srv.get("/blog", None).await.json().await.unwrap();
    let item = &list["items"][0];
    assert_eq!(item["slug"], "novosti-magazina");
    let id = item["id"].as_str().unwrap().to_string();

    srv.get(&format!("/blog/{id}"), None).await;
    let article: Value = srv.get(&format!("/blog/{id}"), None).await.json().await.unwrap();
    assert_eq!(article["views_count"], 2);
}

#[tokio::test]
async fn bootstrapped_superuser_moderates_other_products() {
    let store = Arc::new(InMemoryStore::new());
    AccountService::new(
        Arc::clone(&store),
        Hs256JwtValidator::new(JWT_SECRET),
        ChronoDuration::hours(1),
    )
    .create_superuser("root@example.com", "root-pass-1", Utc::now())
    .await
    .unwrap();
    let srv = TestServer::spawn_with(store).await;

    let res = srv
        .post(
            "/users/login",
            None,
            json!({ "email": "root@example.com", "password": "root-pass-1" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token: Value = res.json().await.unwrap();
    let admin = token["access_token"].as_str().unwrap().to_string();

    let whoami: Value = srv.get("/whoami", Some(&admin)).await.json().await.unwrap();
    assert_eq!(whoami["permissions"], json!(["*"]));

    let owner = mint_jwt(UserId::new(), &[]);
    let id = create_product(&srv, &owner, "Планшет").await;
    let page: Value = srv
        .get(&format!("/products/{id}/edit"), Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["capability"], "moderator_edit");

    let res = srv
        .post(&format!("/products/{id}/delete"), Some(&admin), json!({}))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}
