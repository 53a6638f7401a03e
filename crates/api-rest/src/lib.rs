//! REST API for the PMR patient record system.
//!
//! This crate owns everything HTTP: the axum router, the request/response
//! types, the mapping from registry errors to status codes, and the
//! OpenAPI/Swagger documentation. All data semantics live in `pmr-core`;
//! handlers here only translate between the wire and the registry.

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use pmr_core::{
    Patient, PatientInput, PatientRegistry, PatientUpdate, RegistryError, SortField, SortOrder,
    StoredPatient,
};
use pmr_store::DocumentStore;
use pmr_types::lenient;

/// Type-erased document store, so handlers stay non-generic.
pub type SharedStore = Box<dyn DocumentStore<StoredPatient> + Send>;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    registry: PatientRegistry<SharedStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        about,
        health,
        view_patient,
        list_patients,
        sort_patients,
        create_patient,
        edit_patient,
        delete_patient,
    ),
    components(schemas(
        MessageRes,
        HealthRes,
        PatientRes,
        CreatePatientReq,
        UpdatePatientReq,
        ErrorRes,
        FieldErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the PMR REST router over the given document store.
///
/// Includes the Swagger UI at `/swagger-ui` and a permissive CORS layer.
pub fn router<S>(store: S) -> Router
where
    S: DocumentStore<StoredPatient> + Send + 'static,
{
    let state = AppState {
        registry: PatientRegistry::new(Box::new(store) as SharedStore),
    };

    Router::new()
        .route("/", get(root))
        .route("/about", get(about))
        .route("/health", get(health))
        .route("/patient/:id", get(view_patient))
        .route("/patients", get(list_patients))
        .route("/sort", post(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:id", put(edit_patient))
        .route("/delete/:id", delete(delete_patient))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Plain informational message.
#[derive(Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A patient record as returned to callers, derived fields included.
#[derive(Serialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub married: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_details: Option<BTreeMap<String, String>>,
    pub bmi: f64,
    pub verdict: String,
}

impl From<&Patient> for PatientRes {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id().to_owned(),
            name: patient.name().to_owned(),
            city: patient.city().to_owned(),
            age: patient.age(),
            gender: patient.gender().to_string(),
            height: patient.height(),
            weight: patient.weight(),
            email: patient.email().map(str::to_owned),
            married: patient.married(),
            allergies: patient.allergies().map(<[String]>::to_vec),
            contact_details: patient.contact_details().cloned(),
            bmi: patient.bmi(),
            verdict: patient.verdict().to_string(),
        }
    }
}

/// Request body for creating a patient.
///
/// Numeric and boolean fields accept string representations; coercion
/// happens at deserialisation via the shared lenient helpers.
#[derive(Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub id: String,
    pub name: String,
    pub city: String,
    #[serde(deserialize_with = "lenient::int")]
    pub age: i64,
    pub gender: String,
    #[serde(deserialize_with = "lenient::float")]
    pub height: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub weight: f64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_boolean")]
    pub married: Option<bool>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default)]
    pub contact_details: Option<BTreeMap<String, String>>,
}

impl From<CreatePatientReq> for PatientInput {
    fn from(req: CreatePatientReq) -> Self {
        PatientInput {
            id: req.id,
            name: req.name,
            city: req.city,
            age: req.age,
            gender: req.gender,
            height: req.height,
            weight: req.weight,
            email: req.email,
            married: req.married,
            allergies: req.allergies,
            contact_details: req.contact_details,
        }
    }
}

/// Request body for partially updating a patient.
///
/// All fields optional; absent fields keep their stored value. An `id` key
/// is ignored — the path parameter names the record and the key is
/// immutable.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdatePatientReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_int")]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_float")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_float")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_boolean")]
    pub married: Option<bool>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default)]
    pub contact_details: Option<BTreeMap<String, String>>,
}

impl From<UpdatePatientReq> for PatientUpdate {
    fn from(req: UpdatePatientReq) -> Self {
        PatientUpdate {
            name: req.name,
            city: req.city,
            age: req.age,
            gender: req.gender,
            height: req.height,
            weight: req.weight,
            email: req.email,
            married: req.married,
            allergies: req.allergies,
            contact_details: req.contact_details,
        }
    }
}

/// Query parameters for the sort endpoint.
#[derive(Deserialize, IntoParams)]
pub struct SortQuery {
    /// Field to sort by: `height`, `weight` or `bmi`
    pub sort_by: String,
    /// Sort direction: `asc` (default) or `desc`
    #[serde(default)]
    pub order: Option<String>,
}

/// One violated field constraint, as reported to the caller.
#[derive(Serialize, ToSchema)]
pub struct FieldErrorRes {
    pub field: String,
    pub reason: String,
}

/// Error response body.
#[derive(Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldErrorRes>>,
}

type ErrorReply = (StatusCode, Json<ErrorRes>);

/// Maps a registry error onto an HTTP status and response body.
///
/// Validation failures come back as 422 with one entry per violated field;
/// store failures are logged and surface as an opaque 500.
fn reject(err: RegistryError) -> ErrorReply {
    match err {
        RegistryError::Validation(e) => {
            let details = e
                .violations
                .iter()
                .map(|v| FieldErrorRes {
                    field: v.field.to_owned(),
                    reason: v.reason.clone(),
                })
                .collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorRes {
                    error: "validation failed".into(),
                    details: Some(details),
                }),
            )
        }
        e @ RegistryError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorRes {
                error: e.to_string(),
                details: None,
            }),
        ),
        e @ (RegistryError::Conflict(_)
        | RegistryError::InvalidSortField(_)
        | RegistryError::InvalidSortOrder(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes {
                error: e.to_string(),
                details: None,
            }),
        ),
        e @ (RegistryError::Store(_) | RegistryError::LockPoisoned) => {
            tracing::error!("registry failure: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "internal error".into(),
                    details: None,
                }),
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service description", body = MessageRes)
    )
)]
/// Root endpoint with a short service description.
async fn root() -> Json<MessageRes> {
    Json(MessageRes {
        message: "Patient Management System API".into(),
    })
}

#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "About message", body = MessageRes)
    )
)]
/// Longer description of what the service does.
async fn about() -> Json<MessageRes> {
    Json(MessageRes {
        message: "A fully functional API to manage your patient records".into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "PMR REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patient/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient record", body = PatientRes),
        (status = 404, description = "No patient under that id", body = ErrorRes)
    )
)]
/// Fetch a single patient record by id
///
/// Derived fields (`bmi`, `verdict`) are recomputed from the stored
/// height/weight on every read.
///
/// # Returns
/// * `Ok(Json<PatientRes>)` - The patient record
/// * `Err((StatusCode, Json<ErrorRes>))` - 404 if the id is absent
async fn view_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientRes>, ErrorReply> {
    let patient = state.registry.get(&id).map_err(reject)?;
    Ok(Json(PatientRes::from(&patient)))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patient records", body = [PatientRes]),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all patients in the system
///
/// Records come back in the order they were created.
async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientRes>>, ErrorReply> {
    let patients = state.registry.list().map_err(reject)?;
    Ok(Json(patients.iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/sort",
    params(SortQuery),
    responses(
        (status = 200, description = "Sorted patient records", body = [PatientRes]),
        (status = 400, description = "Unknown sort field or order", body = ErrorRes)
    )
)]
/// List all patients sorted by height, weight or live-computed BMI
///
/// `order` defaults to ascending when absent. Unknown tokens for either
/// parameter are rejected.
async fn sort_patients(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
) -> Result<Json<Vec<PatientRes>>, ErrorReply> {
    let field: SortField = query.sort_by.parse().map_err(reject)?;
    let order: SortOrder = match query.order.as_deref() {
        Some(token) => token.parse().map_err(reject)?,
        None => SortOrder::Ascending,
    };

    let patients = state.registry.sort_by(field, order).map_err(reject)?;
    Ok(Json(patients.iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/create",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Id already exists", body = ErrorRes),
        (status = 422, description = "Validation failed", body = ErrorRes)
    )
)]
/// Create a new patient record
///
/// The candidate is validated as a whole; on success the response carries
/// the record with its computed `bmi` and `verdict`.
///
/// # Returns
/// * `Ok((StatusCode::CREATED, Json<PatientRes>))` - The created record
/// * `Err((StatusCode, Json<ErrorRes>))` - 422 with per-field details, or
///   400 when the id is already taken
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<(StatusCode, Json<PatientRes>), ErrorReply> {
    let patient = state
        .registry
        .create(PatientInput::from(req))
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(PatientRes::from(&patient))))
}

#[utoipa::path(
    put,
    path = "/edit/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 404, description = "No patient under that id", body = ErrorRes),
        (status = 422, description = "Merged record failed validation", body = ErrorRes)
    )
)]
/// Partially update an existing patient record
///
/// Only the fields present in the body are changed; the merged record is
/// re-validated as a whole before it is written, so derived fields can
/// never go stale and a bad update leaves the record untouched.
async fn edit_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientRes>, ErrorReply> {
    let patient = state
        .registry
        .update(&id, &PatientUpdate::from(req))
        .map_err(reject)?;
    Ok(Json(PatientRes::from(&patient)))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "No patient under that id", body = ErrorRes)
    )
)]
/// Delete a patient record by id
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MessageRes>, ErrorReply> {
    state.registry.delete(&id).map_err(reject)?;
    Ok(Json(MessageRes {
        message: format!("patient {id} deleted"),
    }))
}
