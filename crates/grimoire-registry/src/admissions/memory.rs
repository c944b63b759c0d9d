use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::domain::{Assignment, Identity, Request, RequestDraft, RequestId};
use super::repository::{AdmissionRepository, AdmissionTransaction, RepositoryError};

#[derive(Debug, Clone, Default)]
struct AdmissionTables {
    last_id: u64,
    requests: BTreeMap<RequestId, Request>,
    assignments: Vec<Assignment>,
}

/// Embedded repository holding both tables behind a single mutex.
///
/// Transactions run against a staged copy of the tables which replaces the live copy only when
/// the callback succeeds, so a failed unit of work leaves no trace.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAdmissionRepository {
    tables: Arc<Mutex<AdmissionTables>>,
}

impl InMemoryAdmissionRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, AdmissionTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("admission store lock poisoned".to_string()))
    }
}

impl AdmissionRepository for InMemoryAdmissionRepository {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn AdmissionTransaction) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut live = self.lock()?;
        let mut staged = live.clone();
        let outcome = work(&mut StagedTransaction {
            tables: &mut staged,
        })?;
        *live = staged;
        Ok(outcome)
    }

    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        Ok(self.lock()?.requests.values().cloned().collect())
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self.lock()?.assignments.clone())
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        Ok(self.lock()?.requests.get(&id).cloned())
    }
}

struct StagedTransaction<'a> {
    tables: &'a mut AdmissionTables,
}

impl AdmissionTransaction for StagedTransaction<'_> {
    fn requests(&self) -> Result<Vec<Request>, RepositoryError> {
        Ok(self.tables.requests.values().cloned().collect())
    }

    fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self.tables.assignments.clone())
    }

    fn request(&self, id: RequestId) -> Result<Option<Request>, RepositoryError> {
        Ok(self.tables.requests.get(&id).cloned())
    }

    fn request_by_identity(&self, identity: &Identity) -> Result<Option<Request>, RepositoryError> {
        Ok(self
            .tables
            .requests
            .values()
            .find(|request| &request.identity == identity)
            .cloned())
    }

    fn insert_request(&mut self, draft: RequestDraft) -> Result<Request, RepositoryError> {
        if self.request_by_identity(&draft.identity)?.is_some() {
            return Err(RepositoryError::Conflict);
        }
        self.tables.last_id += 1;
        let id = RequestId(self.tables.last_id);
        let request = Request::from_draft(id, draft, Utc::now());
        self.tables.requests.insert(id, request.clone());
        Ok(request)
    }

    fn update_request(&mut self, request: &Request) -> Result<(), RepositoryError> {
        let clashes = self
            .tables
            .requests
            .values()
            .any(|other| other.id != request.id && other.identity == request.identity);
        if clashes {
            return Err(RepositoryError::Conflict);
        }
        match self.tables.requests.get_mut(&request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove_request(&mut self, id: RequestId) -> Result<Request, RepositoryError> {
        self.tables
            .requests
            .remove(&id)
            .ok_or(RepositoryError::NotFound)
    }

    fn assignment(&self, identity: &Identity) -> Result<Option<Assignment>, RepositoryError> {
        Ok(self
            .tables
            .assignments
            .iter()
            .find(|assignment| &assignment.request_identity == identity)
            .cloned())
    }

    fn insert_assignment(&mut self, assignment: Assignment) -> Result<(), RepositoryError> {
        if self.request_by_identity(&assignment.request_identity)?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        if self.assignment(&assignment.request_identity)?.is_some() {
            return Err(RepositoryError::Conflict);
        }
        self.tables.assignments.push(assignment);
        Ok(())
    }

    fn remove_assignment(
        &mut self,
        identity: &Identity,
    ) -> Result<Option<Assignment>, RepositoryError> {
        let position = self
            .tables
            .assignments
            .iter()
            .position(|assignment| &assignment.request_identity == identity);
        Ok(position.map(|index| self.tables.assignments.remove(index)))
    }
}
