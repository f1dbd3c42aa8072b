use crate::domain::entities::record::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    Message(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for RepoError {}

/// Durable home of the record store. Loads and saves always move the whole
/// store; the last save wins.
pub trait StoreRepository {
    fn load(&self) -> Result<Store, RepoError>;
    fn save(&self, store: &Store) -> Result<(), RepoError>;
}
