//! # Request Boundary
//!
//! Validated request types, success/error envelopes and the handlers that
//! connect them to [`InterviewService`](crate::services::InterviewService).

pub mod handlers;
pub mod requests;
pub mod response_types;

pub use handlers::InterviewApi;
pub use requests::{HistoryQuery, SessionQuery, StartInterviewRequest, SubmitAnswerRequest};
pub use response_types::{
    status_code, ApiError, ApiErrorResponse, ApiResponse, ApiResult, ErrorDiagnostic,
    InterviewHistoryResponse, StartInterviewResponse, SubmitAnswerResponse,
};
