use tracing::debug;

use super::http::JsonClient;
use super::{CatalogGateway, GatewayError};
use crate::config::UpstreamConfig;
use crate::model::{CourseSnapshot, CourseSummary};

/// HTTP/JSON client for the course-content service.
///
/// Routes, relative to the configured base URL:
///
/// - `GET  contexts/{ctx}/courses`
/// - `GET  contexts/{ctx}/courses/{course}`
/// - `POST contexts/{ctx}/courses/{course}/modules/{module}/tasks/{task}/submit`
/// - `GET  health`
pub struct HttpCatalogClient {
    http: JsonClient,
}

impl HttpCatalogClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            http: JsonClient::new("catalog", config)?,
        })
    }
}

impl CatalogGateway for HttpCatalogClient {
    fn list_courses(&self, context_id: &str) -> Result<Vec<CourseSummary>, GatewayError> {
        debug!(context_id, "catalog: list courses");
        let request = self.http.get(&["contexts", context_id, "courses"])?;
        self.http.send_json(request)
    }

    fn get_course_data(
        &self,
        context_id: &str,
        course_id: &str,
    ) -> Result<CourseSnapshot, GatewayError> {
        debug!(context_id, course_id, "catalog: get course");
        let request = self
            .http
            .get(&["contexts", context_id, "courses", course_id])?;
        self.http.send_json(request)
    }

    fn submit_task(
        &self,
        context_id: &str,
        course_id: &str,
        module_id: &str,
        task_id: &str,
    ) -> Result<CourseSnapshot, GatewayError> {
        debug!(context_id, course_id, module_id, task_id, "catalog: submit task");
        let request = self.http.post(&[
            "contexts", context_id, "courses", course_id, "modules", module_id, "tasks",
            task_id, "submit",
        ])?;
        self.http.send_json(request)
    }

    fn ping(&self) -> Result<(), GatewayError> {
        let request = self.http.get(&["health"])?;
        self.http.send(request).map(|_| ())
    }
}
