pub mod auth;

pub use auth::{authorize, require_account_token, AuthorizedAccount, Denial, TOKEN_HEADER};
