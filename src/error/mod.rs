mod ops;

pub use ops::{ApiErrorBody, ApiErrorObject, OpsError};
