//! Authentication library for the YouTube notes backend
//!
//! Provides the credential store, password hashing, stateless JWT sessions
//! and the Google OAuth2 identity adapter used by the API service.

pub mod error;
pub mod jwt;
pub mod models;
pub mod oauth;
pub mod password;
pub mod repositories;
pub mod session;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, JwtConfig, JwtService, SessionUser, TokenType};
pub use models::{AccountType, NewUser, User};
pub use oauth::{AuthFlow, GoogleIdentityProvider, IdentityProvider, OAuthConfig, OAuthIdentity};
pub use repositories::{CreateUserError, UserRepository, UserStore};
pub use session::{IssuedSession, RefreshedSession, SessionManager};
