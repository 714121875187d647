//! OAuth2 integration with Google
//!
//! The frontend is sent to the authorization URL; Google redirects back with
//! a code, which the API exchanges for an OpenID Connect identity token. Login
//! and signup use distinct redirect URLs so the callback can route correctly.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, ExtraTokenFields,
    RedirectUrl, RequestTokenError, Scope, StandardRevocableToken, StandardTokenResponse,
    TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
    reqwest::async_http_client,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{error, info};

use crate::error::{AuthError, AuthResult};

const OAUTH_SCOPES: [&str; 3] = ["openid", "profile", "email"];
const OAUTH_STATE: &str = "standard_oauth";

/// Which account flow an OAuth round-trip belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFlow {
    Login,
    Signup,
}

impl AuthFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFlow::Login => "login",
            AuthFlow::Signup => "signup",
        }
    }
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthFlow {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(AuthFlow::Login),
            "signup" => Ok(AuthFlow::Signup),
            other => Err(AuthError::Validation(format!(
                "Unknown auth type '{}', expected login or signup",
                other
            ))),
        }
    }
}

/// OAuth2 configuration for the provider
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    pub redirect_url_login: String,
    pub redirect_url_signup: String,
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Identity claims obtained from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

/// Identity provider adapter contract
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider's authorization URL for the given flow
    fn authorization_url(&self, flow: AuthFlow) -> AuthResult<String>;

    /// Exchange an authorization code for the user's identity
    async fn exchange_code(&self, code: &str, flow: AuthFlow) -> AuthResult<OAuthIdentity>;
}

/// Token endpoint fields beyond the OAuth2 standard ones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenFields {
    #[serde(default)]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type GoogleTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type GoogleClient = Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

/// Claims read out of Google's identity token
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Google OAuth2 client wrapper
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    login_client: GoogleClient,
    signup_client: GoogleClient,
}

impl GoogleIdentityProvider {
    /// Create a new Google identity provider
    pub fn new(config: &OAuthConfig) -> anyhow::Result<Self> {
        let base = GoogleClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone())?,
            Some(TokenUrl::new(config.token_url.clone())?),
        );

        Ok(Self {
            login_client: base
                .clone()
                .set_redirect_uri(RedirectUrl::new(config.redirect_url_login.clone())?),
            signup_client: base
                .set_redirect_uri(RedirectUrl::new(config.redirect_url_signup.clone())?),
        })
    }

    fn client(&self, flow: AuthFlow) -> &GoogleClient {
        match flow {
            AuthFlow::Login => &self.login_client,
            AuthFlow::Signup => &self.signup_client,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorization_url(&self, flow: AuthFlow) -> AuthResult<String> {
        info!("Generating authorization URL for {} flow", flow);

        let mut request = self
            .client(flow)
            .authorize_url(|| CsrfToken::new(OAUTH_STATE.to_string()));

        for scope in OAUTH_SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, _state) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        Ok(auth_url.to_string())
    }

    async fn exchange_code(&self, code: &str, flow: AuthFlow) -> AuthResult<OAuthIdentity> {
        info!("Exchanging authorization code for {} flow", flow);

        let token_response = self
            .client(flow)
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(response) => {
                    error!("Token endpoint rejected the code: {}", response);
                    AuthError::MissingIdToken
                }
                other => {
                    error!("Token exchange failed: {}", other);
                    AuthError::ExternalService(other.to_string())
                }
            })?;

        let id_token = token_response
            .extra_fields()
            .id_token
            .as_deref()
            .ok_or(AuthError::MissingIdToken)?;

        identity_from_id_token(id_token)
    }
}

/// Read the identity claims out of an OpenID Connect identity token
///
/// The token is received directly from the token endpoint over TLS, so its
/// signature is not re-checked here.
pub fn identity_from_id_token(id_token: &str) -> AuthResult<OAuthIdentity> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<IdTokenClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| {
                error!("Malformed identity token: {}", e);
                AuthError::MissingIdToken
            })?;

    let claims = data.claims;
    let name = claims
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| claims.email.clone());

    Ok(OAuthIdentity {
        name,
        email: claims.email,
        picture: claims.picture,
    })
}
