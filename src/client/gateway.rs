//! Single HTTP entry point of the client. Every request goes through
//! [`ApiGateway::request`], which attaches the bearer token when signed in.

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, SessionStore};

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: reqwest::Client,
    api_url: String,
    session: SessionStore,
}

impl ApiGateway {
    /// `api_url` is the API root, e.g. `http://localhost:3001/api`.
    pub fn new(api_url: impl Into<String>, session: SessionStore) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            api_url,
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorMessage>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(ApiError::from_status(status, message))
    }

    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::GET, path).query(query))
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::POST, path).json(body))
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::PUT, path).json(body))
            .await
    }

    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::PUT, path)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, path)).await
    }
}
