use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

impl Claims {
    #[must_use]
    pub const fn new(sub: Uuid, exp: usize) -> Self {
        Self { sub, exp }
    }
}

/// A signed access token. Wrapped so it is never confused with the opaque
/// refresh token.
#[derive(Debug, Clone)]
pub struct Jwt(pub(crate) String);

impl Jwt {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
