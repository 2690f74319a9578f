//! reqwest client for the booking-site REST API.

use std::sync::PoisonError;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiConfig, Page, PageQuery, PagedContent, Remote, Session, SharedSession, paginate};
use crate::error::{ApiError, ApiResult};
use crate::model::{DeleteStyle, Entity, Listing, Scope, User};

const SIGN_IN_PATH: &str = "/api/auth/signin";
const API_KEY_HEADER: HeaderName = HeaderName::from_static("tokencybersoft");
const TOKEN_HEADER: HeaderName = HeaderName::from_static("token");

#[derive(Debug, Deserialize)]
struct SignInContent {
    user: User,
    token: String,
}

pub struct HttpApi {
    client: Client,
    config: ApiConfig,
    session: SharedSession,
}

impl HttpApi {
    pub fn new(config: ApiConfig, session: SharedSession) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("client setup failed: {e}")))?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// `POST /api/auth/signin`; on success the token is attached to every later request.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let body = serde_json::json!({ "email": email, "password": password });
        let req = self.client.post(self.url(SIGN_IN_PATH)).json(&body);
        let content: SignInContent = content(self.send(req).await?)?;
        let session = Session::signed_in(content.user, content.token);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        debug!(user = %session.display_name(), "signed in");
        Ok(session)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET of one page of a server-paged collection. An empty keyword is left out.
    pub fn search_request<E: Entity>(&self, query: &PageQuery) -> RequestBuilder {
        let mut params = vec![
            ("pageIndex", query.page_index.to_string()),
            ("pageSize", query.page_size.to_string()),
        ];
        let keyword = query.keyword.trim();
        if !keyword.is_empty() {
            params.push(("keyword", keyword.to_string()));
        }
        self.client.get(self.url(&E::ENDPOINT.search_path())).query(&params)
    }

    pub fn delete_request<E: Entity>(&self, id: i64) -> RequestBuilder {
        let ep = E::ENDPOINT;
        match ep.delete {
            DeleteStyle::Path => self.client.delete(self.url(&ep.item_path(id))),
            DeleteStyle::Query => self.client.delete(self.url(ep.collection)).query(&[("id", id)]),
        }
    }

    pub fn headers(&self) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|e| ApiError::Network(format!("invalid api key header: {e}")))?;
        headers.insert(API_KEY_HEADER, key);
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = session.token() {
            let value = HeaderValue::from_str(token)
                .map_err(|e| ApiError::Network(format!("invalid token header: {e}")))?;
            headers.insert(TOKEN_HEADER, value);
        }
        Ok(headers)
    }

    /// Send and return the parsed body. Empty or non-JSON 2xx bodies are `None`.
    async fn send(&self, req: RequestBuilder) -> ApiResult<Option<Value>> {
        let resp = req
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("read body failed: {e}")))?;
        if !status.is_success() {
            let message = error_message(&body, status.canonical_reason().unwrap_or("request failed"));
            warn!(status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(&body).ok())
    }

    async fn get_list<E: Entity>(&self, path: &str) -> ApiResult<Vec<E>> {
        let req = self.client.get(self.url(path));
        content(self.send(req).await?)
    }
}

/// Extract and decode `content` of a 2xx body.
pub fn content<T: DeserializeOwned>(body: Option<Value>) -> ApiResult<T> {
    let mut body = body.ok_or_else(|| ApiError::Decode("empty body".into()))?;
    let inner = body
        .get_mut("content")
        .map(Value::take)
        .ok_or_else(|| ApiError::Decode("missing content".into()))?;
    serde_json::from_value(inner).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Mutations may answer with the record, with a bare message, or with nothing.
fn echoed<E: Entity>(body: Option<Value>) -> Option<E> {
    match content(body) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(error = %e, "mutation acknowledged without a record");
            None
        }
    }
}

/// Human message from an error body: `content` when it is a string, else `message`.
pub fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        for key in ["content", "message"] {
            if let Some(s) = v.get(key).and_then(Value::as_str) {
                if !s.trim().is_empty() {
                    return s.to_string();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') {
        fallback.to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[async_trait]
impl<E: Entity> Remote<E> for HttpApi {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn fetch_page(&self, query: &PageQuery) -> ApiResult<Page<E>> {
        match (query.scope, E::ENDPOINT.listing) {
            (Scope::All, Listing::ServerPaged) => {
                let req = self.search_request::<E>(query);
                let paged: PagedContent<E> = content(self.send(req).await?)?;
                Ok(Page {
                    rows: paged.data,
                    total: paged.total_row,
                })
            }
            (Scope::All, Listing::Full) => {
                let rows = self.get_list::<E>(E::ENDPOINT.collection).await?;
                Ok(paginate(rows, query))
            }
            (scope, _) => {
                let path = E::scoped_path(scope).ok_or(ApiError::Unsupported("scoped listing"))?;
                let rows = self.get_list::<E>(&path).await?;
                Ok(paginate(rows, query))
            }
        }
    }

    async fn fetch_one(&self, id: i64) -> ApiResult<E> {
        let req = self.client.get(self.url(&E::ENDPOINT.item_path(id)));
        content(self.send(req).await?)
    }

    async fn create(&self, record: &E) -> ApiResult<Option<E>> {
        let req = self.client.post(self.url(E::ENDPOINT.collection)).json(record);
        Ok(echoed(self.send(req).await?))
    }

    async fn update(&self, id: i64, record: &E) -> ApiResult<Option<E>> {
        let req = self.client.put(self.url(&E::ENDPOINT.item_path(id))).json(record);
        Ok(echoed(self.send(req).await?))
    }

    async fn delete(&self, id: i64) -> ApiResult<()> {
        let req = self.delete_request::<E>(id);
        self.send(req).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, Room};

    fn api() -> HttpApi {
        let config = ApiConfig::new("https://example.test/", "key-123");
        HttpApi::new(config, Session::default().shared()).unwrap()
    }

    fn built_url(req: RequestBuilder) -> reqwest::Url {
        req.build().unwrap().url().clone()
    }

    #[test]
    fn urls_follow_endpoint_conventions() {
        let api = api();
        let url = built_url(api.search_request::<Room>(&PageQuery::new(2, 20, " deluxe & room ")));
        assert_eq!(url.path(), "/api/phong-thue/phan-trang-tim-kiem");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("pageIndex".to_string(), "2".to_string()),
                ("pageSize".to_string(), "20".to_string()),
                ("keyword".to_string(), "deluxe & room".to_string()),
            ]
        );
        assert!(!url.as_str().contains(' '));

        let url = built_url(api.search_request::<User>(&PageQuery::new(1, 10, "  ")));
        assert_eq!(
            url.as_str(),
            "https://example.test/api/users/phan-trang-tim-kiem?pageIndex=1&pageSize=10"
        );
        assert_eq!(
            built_url(api.delete_request::<Room>(8)).as_str(),
            "https://example.test/api/phong-thue/8"
        );
        assert_eq!(
            built_url(api.delete_request::<User>(8)).as_str(),
            "https://example.test/api/users?id=8"
        );
    }

    #[test]
    fn token_header_only_after_login() {
        let api = api();
        let headers = api.headers().unwrap();
        assert_eq!(headers.get("TokenCybersoft").unwrap(), "key-123");
        assert!(headers.get("token").is_none());

        let user = User {
            id: 1,
            role: Role::Admin,
            ..User::default()
        };
        *api.session.write().unwrap() = Session::signed_in(user, "jwt-abc");
        assert_eq!(api.headers().unwrap().get("token").unwrap(), "jwt-abc");

        api.session.write().unwrap().logout();
        assert!(api.headers().unwrap().get("token").is_none());
    }

    #[test]
    fn error_messages_prefer_content_then_message() {
        assert_eq!(
            error_message(r#"{"statusCode":400,"content":"Email đã tồn tại !"}"#, "Bad Request"),
            "Email đã tồn tại !"
        );
        assert_eq!(error_message(r#"{"message":"token expired"}"#, "Forbidden"), "token expired");
        assert_eq!(error_message(r#"{"content":null}"#, "Not Found"), "Not Found");
        assert_eq!(error_message("", "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("upstream down", "Bad Gateway"), "upstream down");
    }

    #[test]
    fn content_decoding() {
        let body = serde_json::json!({"content": [{"id": 1, "tenPhong": "A"}]});
        let rows: Vec<Room> = content(Some(body)).unwrap();
        assert_eq!(rows[0].name, "A");
        assert!(matches!(content::<Vec<Room>>(None), Err(ApiError::Decode(_))));
        let msg = serde_json::json!({"content": "Xóa thành công"});
        assert_eq!(echoed::<Room>(Some(msg)), None);
    }
}
