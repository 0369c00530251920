//! Service-account authentication for tokenmint.
//!
//! Loads the service-account credential, signs jwt-bearer assertions with
//! it and exchanges them for access tokens at the provider's token endpoint.

pub mod assertion;
pub mod credentials;
pub mod exchange;
pub mod probe;

pub use assertion::{ASSERTION_LIFETIME_SECS, Assertion, AssertionBuilder, AssertionClaims, AssertionSigner};
pub use credentials::{CredentialError, CredentialSource, CredentialStore, Resolution, ServiceCredential};
pub use exchange::{HttpTokenExchanger, JWT_BEARER_GRANT, TokenExchanger, classify_status};
pub use probe::{HttpProbe, ReadinessProbe};
