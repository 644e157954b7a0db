//! Built-in artifact templates
//!
//! Both templates are rendered with block trimming enabled, so a line that
//! only holds a `{% %}` tag leaves nothing behind. Contexts are built by
//! [`TemplateRenderer`](super::renderer::TemplateRenderer); every Rust type and
//! expression arrives pre-computed.

/// Template name of the model artifact
pub const MODEL: &str = "model.rs";

/// Template name of the controller artifact
pub const CONTROLLER: &str = "controller.rs";

/// Every built-in template name
pub const TEMPLATE_NAMES: &[&str] = &[MODEL, CONTROLLER];

/// File name of an override for `name` inside the override directory
#[must_use]
pub fn override_file_name(name: &str) -> String {
    format!("{name}.jinja")
}

/// Built-in source of a template
#[must_use]
pub fn builtin(name: &str) -> Option<&'static str> {
    match name {
        MODEL => Some(MODEL_TEMPLATE),
        CONTROLLER => Some(CONTROLLER_TEMPLATE),
        _ => None,
    }
}

const MODEL_TEMPLATE: &str = r#"//! {{ names.title }} model

use serde::{Deserialize, Serialize};

use {{ runtime_import }};
{% for import in relation_imports %}
use {{ import }};
{% endfor %}

/// Identifier of a [`{{ names.type_name }}`]
pub type {{ names.type_name }}Id = i64;

/// {{ names.title }} record
#[derive(Debug, Clone, Serialize, Deserialize, Record)]
#[record(collection = "{{ names.plural_module }}")]
pub struct {{ names.type_name }} {
    /// Primary key
    #[record(id)]
    pub id: {{ names.type_name }}Id,
{% for field in fields %}
{% if field.doc %}
    /// {{ field.doc }}
{% endif %}
{% if field.attrs %}
    #[record({{ field.attrs }})]
{% endif %}
{% if field.write_only %}
    #[serde(skip_serializing)]
{% endif %}
    pub {{ field.ident }}: {{ field.rust_type }},
{% endfor %}
}
"#;

const CONTROLLER_TEMPLATE: &str = r#"//! {{ names.plural_title }} handlers
//!
//! Routes:
{% for route in route_docs %}
//! - `{{ route.method }} {{ route.path }}` → [`{{ route.handler }}`]
{% endfor %}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use {{ model_import }};
{% for import in relation_imports %}
use {{ import }};
{% endfor %}
use {{ runtime_import }};
use {{ state_import }};

/// Request body for creating a [`{{ names.type_name }}`]
#[derive(Debug, Deserialize)]
pub struct Create{{ names.type_name }} {
{% for field in create_fields %}
{% if field.doc %}
    /// {{ field.doc }}
{% endif %}
    pub {{ field.ident }}: {{ field.rust_type }},
{% endfor %}
}

/// Request body for updating a [`{{ names.type_name }}`]; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct Update{{ names.type_name }} {
{% for field in update_fields %}
{% if field.doc %}
    /// {{ field.doc }}
{% endif %}
    pub {{ field.ident }}: {{ field.rust_type }},
{% endfor %}
}

/// Public representation of a [`{{ names.type_name }}`]
#[derive(Debug, Serialize)]
pub struct {{ names.type_name }}Response {
    pub id: {{ names.type_name }}Id,
{% for field in response_fields %}
    pub {{ field.ident }}: {{ field.rust_type }},
{% endfor %}
}

impl From<{{ names.type_name }}> for {{ names.type_name }}Response {
    fn from(record: {{ names.type_name }}) -> Self {
        Self {
            id: record.id,
{% for field in response_fields %}
            {{ field.ident }}: record.{{ field.ident }},
{% endfor %}
        }
    }
}

/// Router for {{ names.route_path }}
pub fn routes() -> Router<{{ state_name }}> {
    Router::new()
        .route("{{ names.route_path }}", get(list).post(create))
        .route("{{ names.route_path }}/{id}", get(show).put(update).delete(delete))
{% for action in actions %}
        .route("{{ action.path }}", axum::routing::{{ action.routing_fn }}({{ action.ident }}))
{% endfor %}
}

/// `GET {{ names.route_path }}`
pub async fn list(
    State(state): State<{{ state_name }}>,
) -> Result<Json<Vec<{{ names.type_name }}Response>>, RecordError> {
    let records = {{ names.type_name }}::all(&state).await?;
    Ok(Json(records.into_iter().map({{ names.type_name }}Response::from).collect()))
}

/// `GET {{ names.route_path }}/{id}`
pub async fn show(
    State(state): State<{{ state_name }}>,
    Path(id): Path<{{ names.type_name }}Id>,
) -> Result<Json<{{ names.type_name }}Response>, RecordError> {
    let record = {{ names.type_name }}::find(&state, id)
        .await?
        .ok_or(RecordError::NotFound)?;
    Ok(Json(record.into()))
}

/// `POST {{ names.route_path }}`
pub async fn create(
    State(state): State<{{ state_name }}>,
    Json(input): Json<Create{{ names.type_name }}>,
) -> Result<(StatusCode, Json<{{ names.type_name }}Response>), RecordError> {
    let record = {{ names.type_name }} {
        id: {{ names.type_name }}Id::default(),
{% for field in create_assignments %}
        {{ field.ident }}: {{ field.expr }},
{% endfor %}
    };
    let record = record.insert(&state).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// `PUT {{ names.route_path }}/{id}`
pub async fn update(
    State(state): State<{{ state_name }}>,
    Path(id): Path<{{ names.type_name }}Id>,
    Json(input): Json<Update{{ names.type_name }}>,
) -> Result<Json<{{ names.type_name }}Response>, RecordError> {
    let mut record = {{ names.type_name }}::find(&state, id)
        .await?
        .ok_or(RecordError::NotFound)?;
{% for field in update_assignments %}
    if let Some(value) = input.{{ field.ident }} {
        record.{{ field.ident }} = {{ field.expr }};
    }
{% endfor %}
    record.save(&state).await?;
    Ok(Json(record.into()))
}

/// `DELETE {{ names.route_path }}/{id}`
pub async fn delete(
    State(state): State<{{ state_name }}>,
    Path(id): Path<{{ names.type_name }}Id>,
) -> Result<StatusCode, RecordError> {
    {{ names.type_name }}::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
{% for action in actions %}

/// `{{ action.method }} {{ action.path }}`
pub async fn {{ action.ident }}(
    State(_state): State<{{ state_name }}>,
) -> Result<StatusCode, RecordError> {
    Ok(StatusCode::NOT_IMPLEMENTED)
}
{% endfor %}
"#;
