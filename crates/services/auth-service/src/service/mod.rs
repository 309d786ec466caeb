//! Service layer - application use cases and the services they rely on.

mod context;
mod token_service;
mod user_service;

pub use context::{AuthenticatedUser, CallContext, RequestId};
pub use token_service::{AuthClaims, JwtTokenService, TokenService};
pub use user_service::{UserChanges, UserManager, UserService, UserServiceOptions};
