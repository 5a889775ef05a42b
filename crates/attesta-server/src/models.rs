//! Database models for Attesta.

pub mod certificate;
pub mod institution;
pub mod verification_attempt;

pub use certificate::{Certificate, CertificateStatus, NewCertificate};
pub use institution::Institution;
pub use verification_attempt::{AttemptStatus, NewVerificationAttempt, VerificationAttempt};
