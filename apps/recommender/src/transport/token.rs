/// Supplies the bearer token attached to outgoing requests.
///
/// Storage and refresh live outside this crate; `None` means the request is
/// sent without an `Authorization` header.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token resolved once.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
