//! Admission requests for the magic academy and the grimoire each approved applicant receives.
//!
//! [`RequestRegistry`] owns the request lifecycle (pending → approved | rejected) and delegates the
//! one-time weighted draw to [`AssignmentEngine`]. Storage sits behind [`AdmissionRepository`];
//! [`InMemoryAdmissionRepository`] is the embedded implementation used by the service binary.

pub mod assignment;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use assignment::{AssignmentEngine, Draw, WeightTable, WeightTableError, STANDARD_WEIGHTS};
pub use domain::{
    Affinity, Assignment, AssignmentView, CloverCategory, Identity, Request, RequestChanges,
    RequestDraft, RequestForm, RequestId, RequestPatch, RequestStatus, TransitionOutcome,
};
pub use memory::InMemoryAdmissionRepository;
pub use repository::{AdmissionRepository, AdmissionTransaction, RepositoryError};
pub use router::{admission_router, status_for, StatusChange};
pub use service::{ConflictReason, ErrorKind, RegistryError, RequestRegistry};
pub use validation::{IntakeGuard, IntakeLimits, ValidationError};
