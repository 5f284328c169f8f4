use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::ReconcileService;
use crate::utils::BearerIdentity;

static RECONCILE_SERVICE: Lazy<ReconcileService> = Lazy::new(ReconcileService::new_lazy);

// 手动触发一轮对账
pub async fn trigger_pass(req: HttpRequest, identity: BearerIdentity) -> ActixResult<HttpResponse> {
    RECONCILE_SERVICE.trigger_pass(&req, &identity.0).await
}

pub fn configure_reconcile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reconcile").service(web::resource("").route(web::post().to(trigger_pass))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classroom::entities::{SubmissionState, due_instant};
    use crate::test_support::{
        FakeClassroom, FakeNotifier, FakeRepository, coursework, fake_tracker, submission,
    };
    use actix_web::{App, test};
    use chrono::{TimeDelta, Utc};

    #[actix_web::test]
    async fn test_trigger_runs_pass() {
        let classroom = FakeClassroom::new();
        classroom.add_course("c1", "CS101");
        // 明天截止，处于提前量之内
        let due = (Utc::now() + TimeDelta::hours(12)).date_naive();
        assert!(due_instant(due) - Utc::now() <= TimeDelta::days(1));
        let hw1 = coursework("c1", "w1", "HW1", Some(due));
        classroom.add_submission(submission(&hw1, "s1", SubmissionState::Created));
        classroom.add_coursework(hw1);
        let repository = FakeRepository::new();
        repository.put("HW1/submission.txt", b"answer");
        let notifier = FakeNotifier::new();

        let tracker = fake_tracker(&classroom, &repository, &notifier);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(tracker))
                .configure(configure_reconcile_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/reconcile")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["outcome"]["outcome"], "completed");
        assert_eq!(body["data"]["submitted"], 1);
        assert_eq!(notifier.sent().len(), 1);
    }
}
