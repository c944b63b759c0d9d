use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::admissions::assignment::{AssignmentEngine, WeightTable};
use crate::admissions::domain::{
    Affinity, Assignment, CloverCategory, Identity, Request, RequestDraft, RequestForm, RequestId,
};
use crate::admissions::memory::InMemoryAdmissionRepository;
use crate::admissions::repository::{
    AdmissionRepository, AdmissionTransaction, RepositoryError,
};
use crate::admissions::service::RequestRegistry;

pub(super) const SEED: u64 = 7;

pub(super) fn noelle() -> RequestForm {
    RequestForm {
        identity: "ID123456".to_string(),
        given_name: "Noelle".to_string(),
        family_name: "Silva".to_string(),
        age: 25,
        affinity: Affinity::Light,
    }
}

pub(super) fn applicant(identity: &str) -> RequestForm {
    RequestForm {
        identity: identity.to_string(),
        given_name: "Yuno".to_string(),
        family_name: "Grinberryall".to_string(),
        age: 15,
        affinity: Affinity::Wind,
    }
}

pub(super) fn seeded_engine() -> Arc<AssignmentEngine> {
    Arc::new(AssignmentEngine::seeded(WeightTable::standard(), SEED))
}

pub(super) fn build_registry() -> (
    RequestRegistry<InMemoryAdmissionRepository>,
    Arc<InMemoryAdmissionRepository>,
) {
    let repository = Arc::new(InMemoryAdmissionRepository::default());
    let registry = RequestRegistry::new(repository.clone(), seeded_engine());
    (registry, repository)
}

pub(super) fn assignments_for(
    repository: &InMemoryAdmissionRepository,
    identity: &str,
) -> Vec<Assignment> {
    repository
        .assignments()
        .expect("assignments list")
        .into_iter()
        .filter(|assignment| assignment.request_identity.as_str() == identity)
        .collect()
}

/// Storage that is permanently offline.
pub(super) struct UnavailableRepository;

impl AdmissionRepository for UnavailableRepository {
    fn transaction<T, E, F>(&self, _work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn AdmissionTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn request(&self, _id: RequestId) -> Result<Option<Request>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// In-memory storage whose assignment table rejects every insert.
#[derive(Default)]
pub(super) struct RefusingAssignmentRepository {
    pub(super) inner: InMemoryAdmissionRepository,
}

struct RefusingAssignments<'a> {
    inner: &'a mut dyn AdmissionTransaction,
}

impl AdmissionTransaction for RefusingAssignments<'_> {
    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        self.inner.requests()
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        self.inner.assignments()
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        self.inner.request(id)
    }

    fn request_by_identity(&self, identity: &Identity) -> Result<Option<Request>, RepositoryError> {
        self.inner.request_by_identity(identity)
    }

    fn insert_request(&mut self, draft: RequestDraft) -> Result<Request, RepositoryError> {
        self.inner.insert_request(draft)
    }

    fn update_request(&mut self, request: &Request) -> Result<(), RepositoryError> {
        self.inner.update_request(request)
    }

    fn remove_request(&mut self, id: RequestId) -> Result<Request, RepositoryError> {
        self.inner.remove_request(id)
    }

    fn assignment(&self, identity: &Identity) -> Result<Option<Assignment>, RepositoryError> {
        self.inner.assignment(identity)
    }

    fn insert_assignment(&mut self, _assignment: Assignment) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("assignment table locked".to_string()))
    }

    fn remove_assignment(
        &mut self,
        identity: &Identity,
    ) -> Result<Option<Assignment>, RepositoryError> {
        self.inner.remove_assignment(identity)
    }
}

impl AdmissionRepository for RefusingAssignmentRepository {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn AdmissionTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.inner
            .transaction(|tx| work(&mut RefusingAssignments { inner: tx }))
    }

    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        self.inner.requests()
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        self.inner.assignments()
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        self.inner.request(id)
    }
}

fn ghost_assignment() -> Assignment {
    Assignment {
        request_identity: Identity("GHOST01".to_string()),
        category: CloverCategory::FourLeafClover,
        rarity_weight: 1.0,
        assigned_at: Utc::now(),
    }
}

/// In-memory storage that also reports an assignment whose request was removed out of band.
#[derive(Default)]
pub(super) struct OrphanedAssignmentRepository {
    pub(super) inner: InMemoryAdmissionRepository,
}

struct OrphanedAssignments<'a> {
    inner: &'a mut dyn AdmissionTransaction,
}

impl AdmissionTransaction for OrphanedAssignments<'_> {
    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        self.inner.requests()
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        let mut assignments = self.inner.assignments()?;
        assignments.push(ghost_assignment());
        Ok(assignments)
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        self.inner.request(id)
    }

    fn request_by_identity(&self, identity: &Identity) -> Result<Option<Request>, RepositoryError> {
        self.inner.request_by_identity(identity)
    }

    fn insert_request(&mut self, draft: RequestDraft) -> Result<Request, RepositoryError> {
        self.inner.insert_request(draft)
    }

    fn update_request(&mut self, request: &Request) -> Result<(), RepositoryError> {
        self.inner.update_request(request)
    }

    fn remove_request(&mut self, id: RequestId) -> Result<Request, RepositoryError> {
        self.inner.remove_request(id)
    }

    fn assignment(&self, identity: &Identity) -> Result<Option<Assignment>, RepositoryError> {
        self.inner.assignment(identity)
    }

    fn insert_assignment(&mut self, assignment: Assignment) -> Result<(), RepositoryError> {
        self.inner.insert_assignment(assignment)
    }

    fn remove_assignment(
        &mut self,
        identity: &Identity,
    ) -> Result<Option<Assignment>, RepositoryError> {
        self.inner.remove_assignment(identity)
    }
}

impl AdmissionRepository for OrphanedAssignmentRepository {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn AdmissionTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.inner
            .transaction(|tx| work(&mut OrphanedAssignments { inner: tx }))
    }

    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        self.inner.requests()
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        let mut assignments = self.inner.assignments()?;
        assignments.push(ghost_assignment());
        Ok(assignments)
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        self.inner.request(id)
    }
}

/// In-memory storage that only answers reads made inside a transaction.
#[derive(Default)]
pub(super) struct TransactionalReadsRepository {
    pub(super) inner: InMemoryAdmissionRepository,
}

impl AdmissionRepository for TransactionalReadsRepository {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn AdmissionTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.inner.transaction(work)
    }

    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        Err(RepositoryError::Unavailable("listing outside a transaction".to_string()))
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        Err(RepositoryError::Unavailable("listing outside a transaction".to_string()))
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        self.inner.request(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
