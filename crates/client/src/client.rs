use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use warden_auth::{CreateRole, CreateUser, Credentials, Role, UpdateRole, UpdateUser, User, UserWithRole};
use warden_core::{RoleId, UserId};

use crate::error::{ClientError, ErrorBody};
use crate::session::Session;

#[derive(Deserialize)]
struct LoginBody {
    user: User,
    token: String,
}

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Deserialize)]
struct RoleBody {
    role: Role,
}

/// Typed client for the `/v1` API.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Debug, Clone)]
pub struct WardenClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl WardenClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Arc::new(Session::new()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(res) => res.status().is_success(),
            Err(_) => false,
        }
    }

    /// Authenticate and store the token in the session. A token held from an
    /// earlier login is revoked on the server first.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        if let Some(previous) = self.session.begin_login()? {
            self.revoke(&previous).await;
        }

        let outcome = self.request_login(email, password).await;

        match outcome {
            Ok(body) => {
                debug!(user_id = %body.user.id, "logged in");
                self.session.complete_login(body.token, body.user.clone());
                Ok(body.user)
            }
            Err(err) => {
                self.session.fail_login();
                Err(err)
            }
        }
    }

    async fn request_login(&self, email: &str, password: &str) -> Result<LoginBody, ClientError> {
        let res = self
            .http
            .post(self.url("/v1/login"))
            .json(&Credentials::new(email, password))
            .send()
            .await?;
        if res.status() == StatusCode::UNAUTHORIZED {
            let body = error_body(res).await;
            return Err(ClientError::InvalidCredentials(body.message));
        }
        parse(res).await
    }

    /// Best effort: a failure leaves the old token to the server's own expiry.
    async fn revoke(&self, token: &str) {
        let sent = self
            .http
            .post(self.url("/v1/logout"))
            .bearer_auth(token)
            .send()
            .await;
        match sent {
            Ok(res) if res.status().is_success() => debug!("replaced session token revoked"),
            Ok(res) => warn!(status = %res.status(), "could not revoke replaced session token"),
            Err(e) => warn!(error = %e, "could not revoke replaced session token"),
        }
    }

    /// Revoke the current token. The session ends `Anonymous` even when the
    /// server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let Some(token) = self.session.invalidate() else {
            return Err(ClientError::NotAuthenticated);
        };

        let res = self
            .http
            .post(self.url("/v1/logout"))
            .bearer_auth(&token)
            .send()
            .await?;
        if res.status().is_success() {
            return Ok(());
        }
        let status = res.status();
        Err(ClientError::from_status(status, error_body(res).await))
    }

    pub async fn profile(&self) -> Result<User, ClientError> {
        let res = self.authed(self.http.get(self.url("/v1/profile"))).await?;
        parse(res).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserWithRole>, ClientError> {
        let res = self.authed(self.http.get(self.url("/v1/users"))).await?;
        parse(res).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ClientError> {
        let res = self.authed(self.http.get(self.url(&format!("/v1/users/{id}")))).await?;
        parse(res).await
    }

    pub async fn create_user(&self, input: &CreateUser) -> Result<User, ClientError> {
        let req = self.http.post(self.url("/v1/users")).json(input);
        let res = self.authed(req).await?;
        Ok(parse::<UserBody>(res).await?.user)
    }

    pub async fn update_user(&self, id: UserId, input: &UpdateUser) -> Result<User, ClientError> {
        let req = self.http.put(self.url(&format!("/v1/users/{id}"))).json(input);
        let res = self.authed(req).await?;
        Ok(parse::<UserBody>(res).await?.user)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), ClientError> {
        self.authed(self.http.delete(self.url(&format!("/v1/users/{id}"))))
            .await?;
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ClientError> {
        let res = self.authed(self.http.get(self.url("/v1/roles"))).await?;
        parse(res).await
    }

    pub async fn get_role(&self, id: RoleId) -> Result<Role, ClientError> {
        let res = self.authed(self.http.get(self.url(&format!("/v1/roles/{id}")))).await?;
        parse(res).await
    }

    pub async fn create_role(&self, input: &CreateRole) -> Result<Role, ClientError> {
        let req = self.http.post(self.url("/v1/roles")).json(input);
        let res = self.authed(req).await?;
        Ok(parse::<RoleBody>(res).await?.role)
    }

    pub async fn update_role(&self, id: RoleId, input: &UpdateRole) -> Result<Role, ClientError> {
        let req = self.http.put(self.url(&format!("/v1/roles/{id}"))).json(input);
        let res = self.authed(req).await?;
        Ok(parse::<RoleBody>(res).await?.role)
    }

    pub async fn delete_role(&self, id: RoleId) -> Result<(), ClientError> {
        self.authed(self.http.delete(self.url(&format!("/v1/roles/{id}"))))
            .await?;
        Ok(())
    }

    /// Send with the session's token. A 401 clears the session before the
    /// error is returned.
    async fn authed(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        let res = req.bearer_auth(&token).send().await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        if status == StatusCode::UNAUTHORIZED && self.session.invalidate_token(&token) {
            warn!("server rejected the session token; session cleared");
        }
        Err(ClientError::from_status(status, error_body(res).await))
    }
}

async fn error_body(res: Response) -> ErrorBody {
    res.json::<ErrorBody>().await.unwrap_or_default()
}

async fn parse<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if !status.is_success() {
        return Err(ClientError::from_status(status, error_body(res).await));
    }
    Ok(res.json::<T>().await?)
}
