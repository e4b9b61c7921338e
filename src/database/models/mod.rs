pub mod account;

pub use account::{Account, CreateAccountRequest, NewAccount, TransferRequest};
