use super::domain::{Assignment, Identity, Request, RequestDraft, RequestId};

/// Storage abstraction so the registry can be exercised in isolation.
///
/// Every mutation goes through [`AdmissionRepository::transaction`]: the writes performed by
/// `work` become visible together when it returns `Ok`, and are discarded when it returns `Err`.
/// Implementations must serialize transactions that touch the same request.
pub trait AdmissionRepository: Send + Sync {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn AdmissionTransaction) -> Result<T, E>,
        E: From<RepositoryError>;

    /// All requests in storage order.
    fn requests(&self) -> Result<Vec<Request>, RepositoryError>;

    /// All assignments in storage order.
    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError>;

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError>;
}

/// Unit of work handed to [`AdmissionRepository::transaction`] callbacks.
pub trait AdmissionTransaction {
    fn requests(&self) -> Result<Vec<Request>, RepositoryError>;
    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError>;
    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError>;
    fn request_by_identity(&self, identity: &Identity) -> Result<Option<Request>, RepositoryError>;
    /// Persist a new pending request. Fails with `Conflict` when the identity is taken.
    fn insert_request(&mut self, draft: RequestDraft) -> Result<Request, RepositoryError>;
    fn update_request(&mut self, request: &Request) -> Result<(), RepositoryError>;
    fn remove_request(&mut self, id: RequestId) -> Result<Request, RepositoryError>;

    fn assignment(&self, identity: &Identity) -> Result<Option<Assignment>, RepositoryError>;
    /// Persist an assignment. Fails with `Conflict` when the request already has one and with
    /// `NotFound` when no request owns the identity.
    fn insert_assignment(&mut self, assignment: Assignment) -> Result<(), RepositoryError>;
    fn remove_assignment(
        &mut self,
        identity: &Identity,
    ) -> Result<Option<Assignment>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
