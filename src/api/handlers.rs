//! # Interview Handlers
//!
//! Transport-independent entry points. Each handler validates its request,
//! calls [`InterviewService`] and renders either a success envelope or an
//! [`ApiError`] built from the service's error classifier. An HTTP or RPC
//! adapter only has to (de)serialize these types.

use super::requests::{HistoryQuery, SessionQuery, StartInterviewRequest, SubmitAnswerRequest};
use super::response_types::{
    ApiError, ApiResponse, ApiResult, InterviewHistoryResponse, StartInterviewResponse,
    SubmitAnswerResponse,
};
use crate::error::InterviewError;
use crate::logging::log_error;
use crate::models::{validate_user_id, Session};
use crate::services::{InterviewService, ResilienceStatus, UsageReport};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct InterviewApi {
    service: Arc<InterviewService>,
}

impl InterviewApi {
    pub fn new(service: Arc<InterviewService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<InterviewService> {
        &self.service
    }

    /// Classify, log and render a service error
    fn render_error(&self, operation: &str, error: InterviewError) -> ApiError {
        let classification = self.service.classifier().classify_error(&error);
        let api_error = ApiError::from(&classification);

        if api_error.status >= 500 {
            log_error(
                "api",
                operation,
                &classification.detail,
                Some(&classification.error_code),
            );
        } else {
            warn!(
                operation = operation,
                code = %classification.error_code,
                status = api_error.status,
                category = %classification.error_category,
                "⚠️ API: Request rejected"
            );
        }
        api_error
    }

    pub async fn start_interview(
        &self,
        request: StartInterviewRequest,
    ) -> ApiResult<StartInterviewResponse> {
        let (mode, difficulty) = request
            .validate()
            .map_err(|e| self.render_error("start_interview", e))?;

        let session = self
            .service
            .start_interview(&request.user_id, &request.position, mode, difficulty)
            .await
            .map_err(|e| self.render_error("start_interview", e))?;

        info!(
            session_id = %session.id,
            questions = session.questions.len(),
            "✅ API: Interview started"
        );
        Ok(ApiResponse::ok(StartInterviewResponse::from(&session)))
    }

    pub async fn submit_answer(&self, request: SubmitAnswerRequest) -> ApiResult<SubmitAnswerResponse> {
        let session_id = request
            .validate()
            .map_err(|e| self.render_error("submit_answer", e))?;

        let outcome = self
            .service
            .submit_answer(session_id, &request.user_id, &request.answer, request.skip)
            .await
            .map_err(|e| self.render_error("submit_answer", e))?;

        debug!(
            session_id = %session_id,
            next_action = outcome.next_action.label(),
            "API: Answer accepted"
        );
        Ok(ApiResponse::ok(SubmitAnswerResponse {
            session_id,
            stage: outcome.session.stage,
            overall_score: outcome.session.overall_score,
            next_action: outcome.next_action,
            score: outcome.score,
            progress: outcome.progress,
        }))
    }

    pub async fn get_session(&self, query: SessionQuery) -> ApiResult<Session> {
        let session_id = query
            .validate()
            .map_err(|e| self.render_error("get_session", e))?;

        self.service
            .get_session(session_id, &query.user_id)
            .await
            .map(ApiResponse::ok)
            .map_err(|e| self.render_error("get_session", e))
    }

    pub async fn interview_history(&self, query: HistoryQuery) -> ApiResult<InterviewHistoryResponse> {
        let limit = query
            .validate()
            .map_err(|e| self.render_error("interview_history", e))?;

        let interviews = self
            .service
            .user_interviews(&query.user_id, limit)
            .await
            .map_err(|e| self.render_error("interview_history", e))?;

        Ok(ApiResponse::ok(InterviewHistoryResponse {
            count: interviews.len(),
            interviews,
        }))
    }

    pub async fn usage(&self, user_id: &str) -> ApiResult<UsageReport> {
        validate_user_id(user_id).map_err(|e| self.render_error("usage", e))?;
        self.service
            .usage(user_id)
            .await
            .map(ApiResponse::ok)
            .map_err(|e| self.render_error("usage", e))
    }

    /// Breaker, degradation and cache state for operators
    pub fn health(&self) -> ApiResponse<ResilienceStatus> {
        ApiResponse::ok(self.service.resilience_status())
    }
}
