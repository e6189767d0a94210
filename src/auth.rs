//! Client identity, token state, and the client-credentials exchange.

pub mod fetcher;
pub mod identity;
pub mod secret;
pub mod token;

pub use fetcher::*;
pub use identity::*;
pub use secret::*;
pub use token::*;
