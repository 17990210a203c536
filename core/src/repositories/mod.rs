pub mod session;
pub mod token;

pub use session::{InMemorySessionCache, SessionCache};
pub use token::{InMemoryTokenRepository, TokenRepository};
