use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use course_allocator::{
    AllocationConfig, AllocationError, AssignmentMatrix, AssignmentResult, Dataset,
    HeuristicConfig, ServerConfig, SolverStatus, run_baseline, solve_dataset,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub dataset: Dataset,
    #[serde(default)]
    pub config: AllocationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRequest {
    pub dataset: Dataset,
    #[serde(default)]
    pub heuristic: HeuristicConfig,
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub result: AssignmentResult,
    pub matrix: AssignmentMatrix,
}

impl From<AssignmentResult> for AllocationResponse {
    fn from(result: AssignmentResult) -> Self {
        let matrix = result.matrix();
        Self { result, matrix }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_status: Option<SolverStatus>,
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(code: StatusCode, solver_status: Option<SolverStatus>, error: String) -> ApiError {
    (
        code,
        Json(ErrorResponse {
            solver_status,
            error,
        }),
    )
}

impl From<AllocationError> for ErrorResponse {
    fn from(e: AllocationError) -> Self {
        Self {
            solver_status: None,
            error: e.to_string(),
        }
    }
}

fn allocation_error(e: AllocationError) -> ApiError {
    let code = match e {
        AllocationError::Data(_) | AllocationError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AllocationError::Solver(_) => {
            error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (code, Json(ErrorResponse::from(e)))
}

/// Runs `job` on the blocking pool. A job still running after `limit` is
/// reported as `NOT_SOLVED` and left to finish in the background.
async fn run_bounded<T, F>(limit: Duration, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("Solve task failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(SolverStatus::NotSolved),
                format!("solve task failed: {}", e),
            ))
        }
        Err(_) => {
            warn!("Solve exceeded {:?}; giving up.", limit);
            Err(api_error(
                StatusCode::GATEWAY_TIMEOUT,
                Some(SolverStatus::NotSolved),
                format!("no result within {:?}", limit),
            ))
        }
    }
}

async fn solve_handler(
    State(server): State<ServerConfig>,
    Json(input): Json<SolveRequest>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let outcome = run_bounded(server.solve_timeout, move || {
        solve_dataset(input.dataset, &input.config)
    })
    .await?;

    match outcome {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => Err(allocation_error(e)),
    }
}

async fn baseline_handler(
    State(server): State<ServerConfig>,
    Json(input): Json<BaselineRequest>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let outcome = run_bounded(server.solve_timeout, move || {
        let instance = input.dataset.into_instance()?;
        Ok::<_, AllocationError>(run_baseline(&instance, &input.heuristic))
    })
    .await?;

    match outcome {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => Err(allocation_error(e)),
    }
}

pub fn router(config: ServerConfig) -> Router {
    Router::new()
        .route("/v1/allocation/solve", post(solve_handler))
        .route("/v1/allocation/baseline", post(baseline_handler))
        .with_state(config)
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(config)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn post_json(path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router(ServerConfig::default())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn dataset(credits_c: i64) -> Value {
        json!({
            "faculty": ["F1", "F2"],
            "rows": [
                {"course": "A", "credits": 3, "period": 1, "scores": {"F1": 10, "F2": 1}},
                {"course": "B", "credits": 3, "period": 1, "scores": {"F1": 1, "F2": 10}},
                {"course": "C", "credits": credits_c, "period": 1, "scores": {"F1": 5, "F2": 5}}
            ]
        })
    }

    #[tokio::test]
    async fn solve_returns_result_and_matrix() {
        let config = json!({
            "trimesterLimit": 7, "annualMin": 3, "annualMax": 10,
            "coveragePolicy": "exactlyOne", "requireMinFacultyLoad": false
        });
        let (status, body) = post_json(
            "/v1/allocation/solve",
            json!({"dataset": dataset(4), "config": config}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["solverStatus"], "OPTIMAL");
        assert_eq!(body["result"]["happinessIndex"], 25);
        assert_eq!(body["matrix"]["cells"][0], json!([1, 0]));
        assert_eq!(body["matrix"]["cells"][1], json!([0, 1]));
    }

    #[tokio::test]
    async fn infeasible_is_data_not_error() {
        let config = json!({"trimesterLimit": 6, "annualMin": 0, "annualMax": 30});
        let (status, body) = post_json(
            "/v1/allocation/solve",
            json!({"dataset": dataset(20), "config": config}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["solverStatus"], "INFEASIBLE");
        assert_eq!(body["result"]["unassignedCourses"], json!(["A", "B", "C"]));
    }

    #[tokio::test]
    async fn bad_rows_are_unprocessable() {
        let (status, body) =
            post_json("/v1/allocation/solve", json!({"dataset": dataset(0)})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("row 3"));
    }

    #[tokio::test]
    async fn baseline_is_never_reported_feasible() {
        let (status, body) = post_json(
            "/v1/allocation/baseline",
            json!({"dataset": dataset(4), "heuristic": {"trials": 200, "seed": 5}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["solverStatus"], "NOT_SOLVED");
        assert_eq!(body["result"]["feasibilityChecked"], false);
        assert_eq!(body["result"]["happinessIndex"], 25);
    }

    #[tokio::test]
    async fn slow_jobs_time_out_as_not_solved() {
        let outcome = run_bounded(Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(300));
        })
        .await;
        let (code, Json(body)) = outcome.unwrap_err();
        assert_eq!(code, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body.solver_status, Some(SolverStatus::NotSolved));
    }
}
