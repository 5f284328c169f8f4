pub mod analytics;
pub mod detail;
pub mod list;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::adapters::Identity;
use crate::models::assignments::requests::AssignmentListParams;
use crate::services::AssignmentTracker;

pub struct AssignmentService {
    tracker: Option<Arc<AssignmentTracker>>,
}

impl AssignmentService {
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

    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        identity: &Identity,
        query: AssignmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request, identity, query).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        identity: &Identity,
        course_id: &str,
        course_work_id: &str,
    ) -> ActixResult<HttpResponse> {
        detail::get_assignment(self, request, identity, course_id, course_work_id).await
    }

    pub async fn get_analytics(
        &self,
        request: &HttpRequest,
        identity: &Identity,
    ) -> ActixResult<HttpResponse> {
        analytics::get_analytics(self, request, identity).await
    }

    pub async fn upload_submission(
        &self,
        request: &HttpRequest,
        title: &str,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(self, request, title, payload).await
    }
}
