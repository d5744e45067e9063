//! # Credential Vault
//!
//! Local account storage. A user's ledger key never touches disk in the
//! clear: it's sealed under their password when they register and only
//! reopened, into [`Credentials`](crate::crypto::keys::Credentials), when
//! they unlock.
//!
//! ```text
//! registry.rs — UserRecord / UserRegistry: register, unlock, load, save
//! login.rs    — LoginState passed explicitly to whoever needs it
//! policy.rs   — password rules checked at registration
//! ```

pub mod login;
pub mod policy;
pub mod registry;

pub use login::{LoginState, LoginStatus};
pub use policy::{PasswordPolicy, PolicyViolation};
pub use registry::{UserRecord, UserRegistry, VaultError};
