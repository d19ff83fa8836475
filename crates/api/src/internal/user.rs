use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::{info, instrument, warn};

use portico_client::Params;

use crate::error::{Error, ErrorKind, Result};
use crate::types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, PaginationResponse, ProfileUpdate,
    RefreshTokenRequest, RefreshTokenResponse, RegisterRequest, User, UserListQuery,
};

impl super::InternalApi {
    /// Log in and store the issued tokens in the session.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let response: LoginResponse = self
            .client
            .post("/auth/login", Some(request), None)
            .await?;
        self.session.establish(&response.tokens())?;
        info!(user_id = response.user.id, "Logged in");
        Ok(response)
    }

    /// Create an account.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        Ok(self
            .client
            .post("/auth/register", Some(request), None)
            .await?)
    }

    /// The logged-in user's profile.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User> {
        Ok(self.client.get("/user/profile", None, None).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        Ok(self
            .client
            .put("/user/profile", Some(update), None)
            .await?)
    }

    #[instrument(skip_all)]
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "new password must not be empty".to_string(),
            )));
        }

        let body = ChangePasswordRequest {
            old_password,
            new_password,
        };
        let _: IgnoredAny = self
            .client
            .post("/user/change-password", Some(&body), None)
            .await?;
        Ok(())
    }

    /// Log out. The session is cleared even if the server call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let result: portico_client::Result<IgnoredAny> = self
            .client
            .post("/auth/logout", None::<&Value>, None)
            .await;

        self.session.clear()?;
        if let Err(err) = &result {
            warn!(error = %err, "Logout call failed; local session cleared anyway");
        }
        result?;
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token and store it.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<String> {
        let refresh_token = self
            .session
            .refresh_token()?
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::new(ErrorKind::NotAuthenticated))?;

        let body = RefreshTokenRequest {
            refresh_token: &refresh_token,
        };
        let response: RefreshTokenResponse = self
            .client
            .post("/auth/refresh", Some(&body), None)
            .await?;

        self.session.update_access_token(&response.token)?;
        info!("Access token refreshed");
        Ok(response.token)
    }

    /// Admin listing of users.
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: &UserListQuery) -> Result<PaginationResponse<User>> {
        let params = Params::from_serialize(query)?;
        Ok(self
            .client
            .get("/admin/users", Some(&params), None)
            .await?)
    }
}
