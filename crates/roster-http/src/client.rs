//! Async HTTP client wrapping the subscriber service's JSON API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use roster_core::{
  FetchError,
  record::{self, NewSubscriber, SubscriberId, SubscriberRecord, WireSubscriber},
  session::SessionCredential,
  source::SubscriberSource,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Connection settings for the subscriber service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080".into(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP client for the subscriber REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ApiClient {
  client: Client,
  base:   Url,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
  token:    String,
  username: String,
}

fn transport(e: reqwest::Error) -> FetchError {
  FetchError::Transport(Box::new(e))
}

/// Map a body-read failure: undecodable JSON is the service's fault, anything
/// else is the connection's.
fn body_error(e: reqwest::Error, what: &str) -> FetchError {
  if e.is_decode() {
    FetchError::Malformed(format!("{what}: {e}"))
  } else {
    transport(e)
  }
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|_| Error::BaseUrl(config.base_url.clone()))?;
    if base.cannot_be_a_base() {
      return Err(Error::BaseUrl(config.base_url));
    }
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn authed(&self, req: RequestBuilder, credential: &SessionCredential) -> RequestBuilder {
    req.bearer_auth(credential.bearer())
  }

  async fn send(req: RequestBuilder) -> Result<Response, FetchError> {
    let resp = req.send().await.map_err(transport)?;
    debug!(url = %resp.url(), status = %resp.status(), "subscriber service responded");
    Ok(resp)
  }

  // ── Subscribers ───────────────────────────────────────────────────────────

  /// `POST /subscribers/add`
  pub async fn add_subscriber(
    &self,
    credential: &SessionCredential,
    subscriber: &NewSubscriber,
  ) -> Result<(), FetchError> {
    let req = self
      .authed(self.client.post(self.url(&["subscribers", "add"])), credential)
      .json(subscriber);
    let resp = Self::send(req).await?;

    if !resp.status().is_success() {
      return Err(FetchError::Rejected(resp.status().as_u16()));
    }
    Ok(())
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /auth/login`: exchange a username and password for a bearer
  /// token issued by the service.
  pub async fn login(
    &self,
    username: &str,
    password: &SecretString,
  ) -> Result<SessionCredential, FetchError> {
    let req = self.client.post(self.url(&["auth", "login"])).json(&LoginRequest {
      username,
      password: password.expose_secret(),
    });
    let resp = Self::send(req).await?;

    if !resp.status().is_success() {
      return Err(FetchError::Rejected(resp.status().as_u16()));
    }
    let body: LoginResponse = resp.json().await.map_err(|e| body_error(e, "login"))?;
    Ok(SessionCredential::new(body.token, body.username))
  }
}

impl SubscriberSource for ApiClient {
  /// `GET /subscribers`
  async fn list_subscribers(
    &self,
    credential: &SessionCredential,
  ) -> Result<Vec<SubscriberRecord>, FetchError> {
    let req = self.authed(self.client.get(self.url(&["subscribers"])), credential);
    let resp = Self::send(req).await?;

    if !resp.status().is_success() {
      return Err(FetchError::Rejected(resp.status().as_u16()));
    }
    let wire: Vec<WireSubscriber> = resp
      .json()
      .await
      .map_err(|e| body_error(e, "subscriber list"))?;
    record::parse_list(wire).map_err(|e| FetchError::Malformed(e.to_string()))
  }

  /// `GET /subscribers/{id}`
  async fn get_subscriber(
    &self,
    credential: &SessionCredential,
    id: &SubscriberId,
  ) -> Result<SubscriberRecord, FetchError> {
    let segment = id.to_string();
    let req = self.authed(
      self.client.get(self.url(&["subscribers", &segment])),
      credential,
    );
    let resp = Self::send(req).await?;

    match resp.status() {
      StatusCode::NOT_FOUND => return Err(FetchError::NotFound(id.clone())),
      status if !status.is_success() => return Err(FetchError::Rejected(status.as_u16())),
      _ => {}
    }
    let wire: WireSubscriber = resp
      .json()
      .await
      .map_err(|e| body_error(e, "subscriber"))?;
    SubscriberRecord::try_from(wire).map_err(|e| FetchError::Malformed(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use roster_core::record::SubscriberId;
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
  };

  use super::*;

  fn client(base_url: String) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url,
      timeout: Duration::from_secs(2),
    })
    .unwrap()
  }

  fn credential() -> SessionCredential {
    SessionCredential::new("t0k", "admin")
  }

  fn ann() -> serde_json::Value {
    json!({
      "id": 1,
      "firstName": "Ann",
      "lastName": "Lee",
      "name": "Ann Lee",
      "email": "a@x.com",
      "phone": "555-0101",
      "createdAt": "2024-01-05T09:00:00"
    })
  }

  #[tokio::test]
  async fn list_sends_bearer_token_and_parses_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/subscribers"))
      .and(header("Authorization", "Bearer t0k"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([ann()])))
      .expect(1)
      .mount(&server)
      .await;

    let records = client(server.uri()).list_subscribers(&credential()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, SubscriberId::Numeric(1));
    assert_eq!(records[0].email, "a@x.com");
  }

  #[tokio::test]
  async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/subscribers"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let records = client(format!("{}/api/", server.uri()))
      .list_subscribers(&credential())
      .await
      .unwrap();
    assert!(records.is_empty());
  }

  #[tokio::test]
  async fn list_non_success_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/subscribers"))
      .respond_with(ResponseTemplate::new(403))
      .mount(&server)
      .await;

    let err = client(server.uri()).list_subscribers(&credential()).await.unwrap_err();
    assert!(matches!(err, FetchError::Rejected(403)));
  }

  #[tokio::test]
  async fn list_with_invalid_record_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/subscribers"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        ann(),
        { "id": 2, "firstName": "Bob", "lastName": "Ng" }
      ])))
      .mount(&server)
      .await;

    let err = client(server.uri()).list_subscribers(&credential()).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
  }

  #[tokio::test]
  async fn list_with_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/subscribers"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
      .mount(&server)
      .await;

    let err = client(server.uri()).list_subscribers(&credential()).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
  }

  #[tokio::test]
  async fn unreachable_service_is_a_transport_failure() {
    // Nothing listens on port 1.
    let err = client("http://127.0.0.1:1".into())
      .list_subscribers(&credential())
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
  }

  #[tokio::test]
  async fn get_one_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/subscribers/1"))
      .and(header("Authorization", "Bearer t0k"))
      .respond_with(ResponseTemplate::new(200).set_body_json(ann()))
      .expect(1)
      .mount(&server)
      .await;

    let record = client(server.uri())
      .get_subscriber(&credential(), &SubscriberId::Numeric(1))
      .await
      .unwrap();
    assert_eq!(record.display_name(), "Ann Lee");
  }

  #[tokio::test]
  async fn get_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/subscribers/99"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let err = client(server.uri())
      .get_subscriber(&credential(), &SubscriberId::Numeric(99))
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::NotFound(SubscriberId::Numeric(99))));
  }

  #[tokio::test]
  async fn add_posts_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/subscribers/add"))
      .and(header("Authorization", "Bearer t0k"))
      .and(body_json(json!({
        "firstName": "Dee",
        "lastName": "Oh",
        "email": "d@x.com",
        "phone": "555-0104"
      })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 4 })))
      .expect(1)
      .mount(&server)
      .await;

    let new = NewSubscriber::parse("Dee", "Oh", "d@x.com", "555-0104").unwrap();
    client(server.uri()).add_subscriber(&credential(), &new).await.unwrap();
  }

  #[tokio::test]
  async fn add_rejected_by_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/subscribers/add"))
      .respond_with(ResponseTemplate::new(400).set_body_string("Error saving subscriber"))
      .mount(&server)
      .await;

    let new = NewSubscriber::parse("Dee", "Oh", "d@x.com", "").unwrap();
    let err = client(server.uri())
      .add_subscriber(&credential(), &new)
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Rejected(400)));
  }

  #[tokio::test]
  async fn login_returns_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .and(body_json(json!({ "username": "admin", "password": "hunter2" })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt.abc", "username": "admin" })),
      )
      .expect(1)
      .mount(&server)
      .await;

    let cred = client(server.uri())
      .login("admin", &SecretString::new("hunter2".into()))
      .await
      .unwrap();
    assert_eq!(cred.bearer(), "jwt.abc");
    assert_eq!(cred.identity(), "admin");
  }

  #[test]
  fn rejects_unusable_base_url() {
    let bad = ApiClient::new(ApiConfig {
      base_url: "not a url".into(),
      ..ApiConfig::default()
    });
    assert!(matches!(bad, Err(Error::BaseUrl(_))));
  }
}
