//! Response and error contract shared by every platform.
//!
//! - Canonical error codes and the legacy-message alias
//! - Legacy vs normalized recording payloads
//! - `{value}` / `{status}` response wrapping

pub mod codes;
pub mod format;
pub mod record_data;
pub mod response;

pub use codes::{
    to_canonical_error_code, ErrorCode, ServiceError, ServiceResult, CANNOT_RECORD_ON_THIS_PHONE,
};
pub use format::{resolve_response_format, ResponseFormat};
pub use record_data::{mime_type_for_extension, normalize_uri, RecordData};
pub use response::{data_response, fail_response, from_boolean, status_response, success_response};
