use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::assignment::AssignmentEngine;
use super::domain::{
    AssignmentView, Identity, Request, RequestForm, RequestId, RequestPatch, RequestStatus,
    TransitionOutcome,
};
use super::repository::{AdmissionRepository, RepositoryError};
use super::validation::{IntakeGuard, ValidationError};

/// Registry composing intake validation, storage, and the assignment engine.
pub struct RequestRegistry<R> {
    guard: IntakeGuard,
    repository: Arc<R>,
    engine: Arc<AssignmentEngine>,
}

impl<R> RequestRegistry<R>
where
    R: AdmissionRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: Arc<AssignmentEngine>) -> Self {
        Self::with_guard(IntakeGuard::default(), repository, engine)
    }

    pub fn with_guard(
        guard: IntakeGuard,
        repository: Arc<R>,
        engine: Arc<AssignmentEngine>,
    ) -> Self {
        Self {
            guard,
            repository,
            engine,
        }
    }

    /// Submit a new request. It is stored as pending.
    pub fn create(&self, form: RequestForm) -> Result<Request, RegistryError> {
        let draft = self.guard.draft_from_form(form)?;

        let request = self.repository.transaction(|tx| {
            if tx.request_by_identity(&draft.identity)?.is_some() {
                return Err(RegistryError::Conflict(ConflictReason::DuplicateIdentity(
                    draft.identity.clone(),
                )));
            }
            Ok(tx.insert_request(draft)?)
        });
        let request = self.observe(request)?;

        info!(id = %request.id, identity = %request.identity, "admission request created");
        Ok(request)
    }

    /// Apply the supplied fields to a pending request.
    ///
    /// A differing `identity` in the patch is checked for collisions but never written; the
    /// identity a request was created with is permanent.
    pub fn update(&self, id: RequestId, patch: RequestPatch) -> Result<Request, RegistryError> {
        let updated = self.repository.transaction(|tx| {
            let mut request = tx.request(id)?.ok_or(RegistryError::NotFound(id))?;
            let changes = self.guard.changes_from_patch(patch)?;
            if request.status != RequestStatus::Pending {
                return Err(RegistryError::InvalidState {
                    id,
                    status: request.status,
                });
            }

            if let Some(identity) = changes.identity.as_ref() {
                if identity != &request.identity && tx.request_by_identity(identity)?.is_some() {
                    return Err(RegistryError::Conflict(ConflictReason::DuplicateIdentity(
                        identity.clone(),
                    )));
                }
            }

            request.apply(changes);
            tx.update_request(&request)?;
            Ok(request)
        });
        let updated = self.observe(updated)?;

        info!(id = %id, "admission request updated");
        Ok(updated)
    }

    /// Move a pending request to `Approved` or `Rejected`.
    ///
    /// Approval draws and stores the grimoire in the same unit of work as the status write, so a
    /// failed assignment leaves the request pending.
    pub fn transition(
        &self,
        id: RequestId,
        target: RequestStatus,
    ) -> Result<TransitionOutcome, RegistryError> {
        self.close(id, || Ok(target))
    }

    /// String-typed variant of [`RequestRegistry::transition`] for transport layers.
    ///
    /// The raw status is only parsed once the request is known to exist.
    pub fn set_status(
        &self,
        id: RequestId,
        raw: &str,
    ) -> Result<TransitionOutcome, RegistryError> {
        self.close(id, || raw.parse::<RequestStatus>())
    }

    fn close<P>(&self, id: RequestId, target: P) -> Result<TransitionOutcome, RegistryError>
    where
        P: FnOnce() -> Result<RequestStatus, ValidationError>,
    {
        let outcome = self.repository.transaction(|tx| {
            let mut request = tx.request(id)?.ok_or(RegistryError::NotFound(id))?;
            let target = target()?;
            if !target.is_terminal() {
                return Err(ValidationError::StatusTarget(target.label()).into());
            }
            if request.status.is_terminal() {
                return Err(RegistryError::InvalidState {
                    id,
                    status: request.status,
                });
            }

            let category = match target {
                RequestStatus::Approved => Some(self.engine.assign(tx, &request)?.category),
                _ => None,
            };
            request.status = target;
            tx.update_request(&request)?;

            Ok(TransitionOutcome { request, category })
        });
        let outcome = self.observe(outcome)?;

        match outcome.category {
            Some(category) => info!(id = %id, %category, "admission request approved"),
            None => {
                info!(id = %id, status = %outcome.request.status, "admission request closed")
            }
        }
        Ok(outcome)
    }

    /// Remove a request together with its assignment, if any.
    pub fn delete(&self, id: RequestId) -> Result<(), RegistryError> {
        let removed = self.repository.transaction(|tx| {
            let request = tx.request(id)?.ok_or(RegistryError::NotFound(id))?;
            let assignment = tx.remove_assignment(&request.identity)?;
            tx.remove_request(id)?;
            Ok((request, assignment.is_some()))
        });
        let (request, had_assignment) = self.observe(removed)?;

        info!(id = %id, identity = %request.identity, had_assignment, "admission request deleted");
        Ok(())
    }

    pub fn get(&self, id: RequestId) -> Result<Request, RegistryError> {
        let request = self.observe(self.repository.request(id).map_err(RegistryError::from))?;
        request.ok_or(RegistryError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<Request>, RegistryError> {
        self.observe(self.repository.requests().map_err(RegistryError::from))
    }

    /// Join every assignment with its request. Assignments whose request has vanished are
    /// logged and skipped.
    pub fn list_assignments(&self) -> Result<Vec<AssignmentView>, RegistryError> {
        let (requests, assignments) = self.observe(
            self.repository
                .transaction(|tx| Ok::<_, RegistryError>((tx.requests()?, tx.assignments()?))),
        )?;

        let by_identity: HashMap<&Identity, &Request> = requests
            .iter()
            .map(|request| (&request.identity, request))
            .collect();

        let views = assignments
            .iter()
            .filter_map(|assignment| match by_identity.get(&assignment.request_identity) {
                Some(request) => Some(AssignmentView::join(request, assignment)),
                None => {
                    warn!(
                        identity = %assignment.request_identity,
                        category = %assignment.category,
                        "assignment has no matching request; skipping"
                    );
                    None
                }
            })
            .collect();

        Ok(views)
    }

    fn observe<T>(&self, result: Result<T, RegistryError>) -> Result<T, RegistryError> {
        if let Err(RegistryError::Internal(source)) = &result {
            error!(error = %source, "admission storage failure");
        }
        result
    }
}

/// Classification of registry failures, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Conflict,
    InvalidState,
    NotFound,
    Internal,
}

/// What a conflict collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    DuplicateIdentity(Identity),
    DuplicateAssignment(Identity),
    Storage,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictReason::DuplicateIdentity(identity) => {
                write!(f, "a request with identity {identity} already exists")
            }
            ConflictReason::DuplicateAssignment(identity) => {
                write!(f, "request {identity} already holds a grimoire")
            }
            ConflictReason::Storage => write!(f, "record already exists"),
        }
    }
}

/// Error raised by the request registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("{0}")]
    Conflict(ConflictReason),
    #[error("request {id} is {status} and can no longer change")]
    InvalidState { id: RequestId, status: RequestStatus },
    #[error("request {0} not found")]
    NotFound(RequestId),
    #[error("internal storage error")]
    Internal(#[source] RepositoryError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InvalidInput(_) => ErrorKind::InvalidInput,
            RegistryError::Conflict(_) => ErrorKind::Conflict,
            RegistryError::InvalidState { .. } => ErrorKind::InvalidState,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<RepositoryError> for RegistryError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => RegistryError::Conflict(ConflictReason::Storage),
            other => RegistryError::Internal(other),
        }
    }
}
