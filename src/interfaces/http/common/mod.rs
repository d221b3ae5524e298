//! Shared pieces of the HTTP layer: response envelope, error mapping and
//! extractors whose rejections use the envelope.

mod error;
pub mod extract;
mod response;
pub mod validated_json;

pub use error::{domain_error, ApiResult};
pub use extract::{ApiPath, ApiQuery};
pub use response::ApiResponse;
pub use validated_json::ValidatedJson;
