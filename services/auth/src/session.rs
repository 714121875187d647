//! Session management
//!
//! Issues and verifies stateless sessions for password and OAuth accounts.
//! Nothing is persisted per session; the only database writes happen when an
//! account is created.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    jwt::{JwtService, SessionUser, TokenType},
    models::{AccountType, NewUser},
    oauth::{AuthFlow, IdentityProvider, OAuthIdentity},
    password::{hash_password, verify_password},
    repositories::{CreateUserError, UserStore},
    validation::{validate_email, validate_password, validate_signup},
};

/// Tokens minted for a freshly authenticated user
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: SessionUser,
    /// Short-lived bearer token returned in the response body
    pub access_token: String,
    /// Longer-lived token destined for the HTTP-only cookie
    pub refresh_token: String,
}

/// Result of exchanging a refresh token
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub user: SessionUser,
    pub access_token: String,
}

/// Session manager for password and OAuth sign-in
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    jwt_service: JwtService,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        users: Arc<dyn UserStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            users,
            identity_provider,
            jwt_service,
        }
    }

    /// The JWT service backing this manager
    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Build the external authorization URL for a login or signup round-trip
    pub fn oauth_redirect_url(&self, flow: AuthFlow) -> AuthResult<String> {
        self.identity_provider.authorization_url(flow)
    }

    /// Exchange an authorization code for the provider's identity claims
    pub async fn exchange_code_for_identity(
        &self,
        code: &str,
        flow: AuthFlow,
    ) -> AuthResult<OAuthIdentity> {
        if code.trim().is_empty() {
            return Err(AuthError::Validation(
                "Authorization code must be provided".to_string(),
            ));
        }

        self.identity_provider.exchange_code(code, flow).await
    }

    /// Finish an OAuth round-trip for an identity the provider vouched for
    ///
    /// Login requires an existing account; signup creates an `oauth` account.
    pub async fn complete_oauth_login(
        &self,
        identity: OAuthIdentity,
        flow: AuthFlow,
    ) -> AuthResult<IssuedSession> {
        info!("Completing OAuth {} for {}", flow, identity.email);

        let user = match flow {
            AuthFlow::Login => self
                .users
                .find_by_email(&identity.email)
                .await?
                .ok_or_else(|| {
                    AuthError::NotFound("account not found please signup".to_string())
                })?,
            AuthFlow::Signup => {
                let new_user = NewUser {
                    name: identity.name.clone(),
                    email: identity.email.clone(),
                    password_hash: None,
                    account_type: AccountType::Oauth,
                };
                self.users.create(&new_user).await.map_err(|e| {
                    error!("OAuth account creation failed for {}: {}", identity.email, e);
                    AuthError::AccountCreation
                })?
            }
        };

        self.issue(SessionUser::from_user(&user, identity.picture))
    }

    /// Exchange the code and complete the OAuth flow in one step
    pub async fn sign_in_with_oauth(&self, code: &str, flow: AuthFlow) -> AuthResult<IssuedSession> {
        let identity = self.exchange_code_for_identity(code, flow).await?;
        self.complete_oauth_login(identity, flow).await
    }

    /// Create an email account and sign it in
    pub async fn signup_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<IssuedSession> {
        validate_signup(name, email, password).map_err(AuthError::Validation)?;

        info!("Password signup for {}", email);

        let new_user = NewUser {
            name: name.trim().to_string(),
            email: email.to_string(),
            password_hash: Some(hash_password(password)?),
            account_type: AccountType::Email,
        };

        let user = self.users.create(&new_user).await.map_err(|e| match e {
            CreateUserError::DuplicateEmail => {
                AuthError::Conflict("Account already exists".to_string())
            }
            CreateUserError::Other(e) => AuthError::Internal(e.to_string()),
        })?;

        self.issue(SessionUser::from_user(&user, None))
    }

    /// Sign in an email account
    pub async fn login_with_password(&self, email: &str, password: &str) -> AuthResult<IssuedSession> {
        validate_email(email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            warn!("Password login attempted on OAuth-only account {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, password_hash)? {
            warn!("Wrong password for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        info!("Password login for {}", email);
        self.issue(SessionUser::from_user(&user, None))
    }

    /// Mint a new bearer token from the refresh cookie
    pub async fn refresh(&self, refresh_token: Option<&str>) -> AuthResult<RefreshedSession> {
        let token = refresh_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        let user = self.verify_refresh_token(token)?;
        let access_token = self.jwt_service.generate_access_token(&user)?;

        Ok(RefreshedSession { user, access_token })
    }

    /// Verify a bearer token and return its identity
    pub fn verify_access_token(&self, token: &str) -> AuthResult<SessionUser> {
        Ok(self
            .jwt_service
            .validate_token_of_type(token, TokenType::Access)?
            .user())
    }

    /// Verify a refresh token and return its identity
    pub fn verify_refresh_token(&self, token: &str) -> AuthResult<SessionUser> {
        Ok(self
            .jwt_service
            .validate_token_of_type(token, TokenType::Refresh)?
            .user())
    }

    fn issue(&self, user: SessionUser) -> AuthResult<IssuedSession> {
        let access_token = self.jwt_service.generate_access_token(&user)?;
        let refresh_token = self.jwt_service.generate_refresh_token(&user)?;

        Ok(IssuedSession {
            user,
            access_token,
            refresh_token,
        })
    }
}
