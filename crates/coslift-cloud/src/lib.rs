//! IBM Cloud operations for coslift.
//!
//! - [`auth`]: picks OIDC exchange or API key and produces a [`Credential`]
//! - [`storage`]: uploads archives to Cloud Object Storage
//! - [`reporter`]: posts deployment status to the Vercel Checks API
//!
//! All network access goes through [`HttpExecutor`], so every client can be
//! driven by a mock in tests.

pub mod auth;
pub mod executor;
pub mod reporter;
pub mod storage;
pub mod transport;

pub use auth::{
    API_KEY_GRANT_TYPE, AuthError, CR_TOKEN_GRANT_TYPE, Credential, ExchangeFailure, IamClient,
    IssuedToken, validate_api_key,
};
pub use executor::{EXCHANGE_TIMEOUT, HttpExecutor, ReqwestExecutor};
pub use reporter::{CHECK_NAME, CheckStatus, ChecksReporter, VERCEL_API_BASE};
pub use storage::{
    CosLocator, CosSettings, CosUploader, SERVICE_INSTANCE_HEADER, StorageError, UploadFailure,
    archive_object_key, create_client,
};
pub use transport::TransportError;
