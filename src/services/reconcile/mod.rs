use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use crate::adapters::Identity;
use crate::models::reconcile::entities::PassOutcome;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{AssignmentTracker, error_response};

pub struct ReconcileService {
    tracker: Option<Arc<AssignmentTracker>>,
}

impl ReconcileService {
    pub fn new_lazy() -> Self {
        Self { tracker: None }
    }

    pub(crate) fn get_tracker(&self, request: &HttpRequest) -> Arc<AssignmentTracker> {
        if let Some(tracker) = &self.tracker {
            tracker.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<AssignmentTracker>>()
                .expect("AssignmentTracker not found in app data")
                .clone()
                .into_inner()
        }
    }

    /// 立即用调用方身份跑一轮对账
    pub async fn trigger_pass(
        &self,
        request: &HttpRequest,
        identity: &Identity,
    ) -> ActixResult<HttpResponse> {
        let tracker = self.get_tracker(request);

        match tracker.run_reconciliation_pass(identity).await {
            Ok(report) if report.outcome == PassOutcome::Skipped => Ok(HttpResponse::Conflict()
                .json(ApiResponse::error(
                    ErrorCode::ReconcileBusy,
                    report,
                    "已有对账正在进行",
                ))),
            Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report, "对账完成"))),
            Err(e) => {
                warn!("Manual reconciliation pass failed: {}", e);
                Ok(error_response(&e, "对账失败"))
            }
        }
    }
}
