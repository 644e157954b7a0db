//! Artifact rendering
//!
//! Turns a [`ResourceDescriptor`] into model and controller source text.
//! Rendering is pure: the same descriptor, actions and options always give
//! the same bytes.

use std::collections::BTreeSet;
use std::path::Path;

use minijinja::{AutoEscape, Environment};
use serde_json::{json, Value};
use tracing::debug;

use super::action::ControllerAction;
use super::field::FieldSpec;
use super::field_type::Multiplicity;
use super::helpers::TemplateHelpers;
use super::index::read_optional;
use super::modifiers::SecurityTransform;
use super::resource::ResourceDescriptor;
use super::templates::{self, CONTROLLER, MODEL, TEMPLATE_NAMES};
use crate::config::LayoutSettings;
use crate::error::GenerationError;

/// Host module paths the generated code refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Module models live in (`crate::models`)
    pub models_module: String,
    /// Application state type (`crate::state::AppState`)
    pub state_type: String,
    /// Module providing the record runtime (`acton_htmx::record`)
    pub record_module: String,
}

impl RenderOptions {
    /// Options matching a project layout
    #[must_use]
    pub fn from_layout(layout: &LayoutSettings) -> Self {
        Self {
            models_module: layout.models_module.clone(),
            state_type: layout.state_type.clone(),
            record_module: layout.record_module.clone(),
        }
    }

    fn state_name(&self) -> &str {
        self.state_type
            .rsplit("::")
            .next()
            .unwrap_or(&self.state_type)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_layout(&LayoutSettings::default())
    }
}

/// Template environment for model and controller artifacts
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Renderer with the built-in templates
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to compile
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Self::environment();
        for &name in TEMPLATE_NAMES {
            if let Some(source) = templates::builtin(name) {
                env.add_template(name, source)?;
            }
        }
        Ok(Self { env })
    }

    /// Renderer where `<dir>/model.rs.jinja` and `<dir>/controller.rs.jinja`
    /// replace the built-ins when present
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be read or does not compile
    pub fn with_overrides(dir: &Path) -> Result<Self, GenerationError> {
        let mut env = Self::environment();
        for &name in TEMPLATE_NAMES {
            let path = dir.join(templates::override_file_name(name));
            if let Some(content) = read_optional(&path)? {
                debug!(template = name, path = %path.display(), "Using template override");
                env.add_template_owned(name.to_string(), content)?;
            } else if let Some(source) = templates::builtin(name) {
                env.add_template(name, source)?;
            }
        }
        Ok(Self { env })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env
    }

    /// Render the model artifact
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render
    pub fn render_model(
        &self,
        resource: &ResourceDescriptor,
        options: &RenderOptions,
    ) -> Result<String, minijinja::Error> {
        self.render(MODEL, &model_context(resource, options))
    }

    /// Render the controller artifact with five CRUD handlers plus `actions`
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render
    pub fn render_controller(
        &self,
        resource: &ResourceDescriptor,
        actions: &[ControllerAction],
        options: &RenderOptions,
    ) -> Result<String, minijinja::Error> {
        self.render(CONTROLLER, &controller_context(resource, actions, options))
    }

    fn render(&self, name: &str, context: &Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}

fn model_context(resource: &ResourceDescriptor, options: &RenderOptions) -> Value {
    let names = resource.names();
    let fields: Vec<Value> = resource
        .fields()
        .iter()
        .map(|field| {
            json!({
                "ident": TemplateHelpers::to_rust_ident(field.name()),
                "rust_type": field.rust_type(),
                "attrs": record_attrs(field),
                "write_only": field.transform().is_applied(),
                "doc": stored_doc(field.transform()),
            })
        })
        .collect();

    let mut runtime = transforms_used(resource);
    runtime.insert("Record");

    json!({
        "names": names,
        "runtime_import": use_path(&options.record_module, &runtime),
        "relation_imports": relation_imports(resource, "super"),
        "fields": fields,
    })
}

fn controller_context(
    resource: &ResourceDescriptor,
    actions: &[ControllerAction],
    options: &RenderOptions,
) -> Value {
    let names = resource.names();
    let fields = resource.fields();
    let route = &names.route_path;
    let model_module = format!(
        "{}::{}",
        options.models_module,
        TemplateHelpers::to_rust_ident(&names.module_name)
    );

    let create_fields: Vec<Value> = fields
        .iter()
        .map(|field| {
            json!({
                "ident": TemplateHelpers::to_rust_ident(field.name()),
                "rust_type": field.input_type(),
                "doc": input_doc(field.transform()),
            })
        })
        .collect();

    let update_fields: Vec<Value> = fields
        .iter()
        .map(|field| {
            json!({
                "ident": TemplateHelpers::to_rust_ident(field.name()),
                "rust_type": format!("Option<{}>", field.kind().rust_type()),
                "doc": input_doc(field.transform()),
            })
        })
        .collect();

    let response_fields: Vec<Value> = fields
        .iter()
        .filter(|field| !field.transform().is_applied())
        .map(|field| {
            json!({
                "ident": TemplateHelpers::to_rust_ident(field.name()),
                "rust_type": field.rust_type(),
            })
        })
        .collect();

    let create_assignments: Vec<Value> = fields
        .iter()
        .map(|field| {
            let ident = TemplateHelpers::to_rust_ident(field.name());
            let expr = create_expr(field, &ident);
            json!({ "ident": ident, "expr": expr })
        })
        .collect();

    let update_assignments: Vec<Value> = fields
        .iter()
        .map(|field| {
            json!({
                "ident": TemplateHelpers::to_rust_ident(field.name()),
                "expr": update_expr(field),
            })
        })
        .collect();

    let actions: Vec<Value> = actions
        .iter()
        .map(|action| {
            json!({
                "ident": TemplateHelpers::to_rust_ident(&action.name),
                "routing_fn": action.method.routing_fn(),
                "method": action.method.to_string(),
                "path": format!("{route}/{}", action.path_segment()),
            })
        })
        .collect();

    let mut route_docs = vec![
        route_doc("GET", route, "list"),
        route_doc("GET", &format!("{route}/{{id}}"), "show"),
        route_doc("POST", route, "create"),
        route_doc("PUT", &format!("{route}/{{id}}"), "update"),
        route_doc("DELETE", &format!("{route}/{{id}}"), "delete"),
    ];
    route_docs.extend(actions.iter().map(|action| {
        json!({
            "method": action["method"],
            "path": action["path"],
            "handler": action["ident"],
        })
    }));

    let mut runtime = transforms_used(resource);
    runtime.insert("RecordError");
    let type_name = &names.type_name;

    json!({
        "names": names,
        "model_import": format!("{model_module}::{{{type_name}, {type_name}Id}}"),
        "relation_imports": relation_imports(resource, &options.models_module),
        "runtime_import": use_path(&options.record_module, &runtime),
        "state_import": options.state_type,
        "state_name": options.state_name(),
        "create_fields": create_fields,
        "update_fields": update_fields,
        "response_fields": response_fields,
        "create_assignments": create_assignments,
        "update_assignments": update_assignments,
        "actions": actions,
        "route_docs": route_docs,
    })
}

fn route_doc(method: &str, path: &str, handler: &str) -> Value {
    json!({ "method": method, "path": path, "handler": handler })
}

/// `#[record(...)]` arguments of a field, empty when there are none
fn record_attrs(field: &FieldSpec) -> String {
    let mut attrs = Vec::new();
    if field.unique() {
        attrs.push("unique".to_string());
    }
    if let Some(relation) = field.relation() {
        attrs.push(format!("references = \"{}\"", relation.target_model));
        if relation.multiplicity == Multiplicity::Many {
            attrs.push("many".to_string());
        }
    }
    match field.transform() {
        SecurityTransform::None => {}
        SecurityTransform::Hashed => attrs.push("hashed".to_string()),
        SecurityTransform::Encrypted => attrs.push("encrypted".to_string()),
    }
    attrs.join(", ")
}

const fn stored_doc(transform: SecurityTransform) -> &'static str {
    match transform {
        SecurityTransform::None => "",
        SecurityTransform::Hashed => "Hashed before it is stored; never serialized",
        SecurityTransform::Encrypted => "Encrypted at rest; never serialized",
    }
}

const fn input_doc(transform: SecurityTransform) -> &'static str {
    match transform {
        SecurityTransform::None => "",
        SecurityTransform::Hashed => "Write-only: hashed before it is stored",
        SecurityTransform::Encrypted => "Write-only: encrypted before it is stored",
    }
}

const fn wrapper(transform: SecurityTransform) -> Option<&'static str> {
    match transform {
        SecurityTransform::None => None,
        SecurityTransform::Hashed => Some("Hashed"),
        SecurityTransform::Encrypted => Some("Encrypted"),
    }
}

/// Value stored on create, read from `input`
fn create_expr(field: &FieldSpec, ident: &str) -> String {
    match (wrapper(field.transform()), field.optional()) {
        (None, _) => format!("input.{ident}"),
        (Some(wrapper), false) => format!("{wrapper}::from_plaintext(input.{ident})"),
        (Some(wrapper), true) => format!("input.{ident}.map({wrapper}::from_plaintext)"),
    }
}

/// Value stored on update, read from the `value` binding
fn update_expr(field: &FieldSpec) -> String {
    let value = wrapper(field.transform()).map_or_else(
        || "value".to_string(),
        |wrapper| format!("{wrapper}::from_plaintext(value)"),
    );
    if field.optional() {
        format!("Some({value})")
    } else {
        value
    }
}

fn transforms_used(resource: &ResourceDescriptor) -> BTreeSet<&'static str> {
    resource
        .fields()
        .iter()
        .filter_map(|field| wrapper(field.transform()))
        .collect()
}

/// `module::Name` or `module::{A, B}`
fn use_path(module: &str, items: &BTreeSet<&str>) -> String {
    let joined = items.iter().copied().collect::<Vec<_>>().join(", ");
    if items.len() == 1 {
        format!("{module}::{joined}")
    } else {
        format!("{module}::{{{joined}}}")
    }
}

/// Sorted id imports of every relation target other than the resource itself
fn relation_imports(resource: &ResourceDescriptor, parent: &str) -> Vec<String> {
    let own_type = &resource.names().type_name;
    resource
        .fields()
        .iter()
        .filter_map(FieldSpec::relation)
        .filter(|relation| TemplateHelpers::to_pascal_case(&relation.target_model) != *own_type)
        .map(|relation| {
            let module =
                TemplateHelpers::to_rust_ident(&TemplateHelpers::to_module_name(&relation.target_model));
            format!("{parent}::{module}::{}", relation.target_id_type())
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, fields: &[&str]) -> ResourceDescriptor {
        let tokens: Vec<String> = fields.iter().map(ToString::to_string).collect();
        ResourceDescriptor::parse(name, &tokens).unwrap()
    }

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new().unwrap()
    }

    #[test]
    fn test_model_declares_fields_in_order() {
        let post = resource("Post", &["title:str", "body:str"]);
        let model = renderer().render_model(&post, &RenderOptions::default()).unwrap();

        assert!(model.contains("pub type PostId = i64;"));
        assert!(model.contains("#[record(collection = \"posts\")]"));
        assert!(model.contains("pub struct Post {"));
        assert_eq!(model.matches(": String,").count(), 2);
        let title = model.find("pub title: String,").unwrap();
        let body = model.find("pub body: String,").unwrap();
        assert!(title < body);
        assert!(model.contains("use acton_htmx::record::Record;\n"));
        assert!(model.ends_with("}\n"));
    }

    #[test]
    fn test_model_field_attributes() {
        let user = resource(
            "User",
            &[
                "username^:str",
                "email_:str",
                "password_hashed:str",
                "ssn_encrypted:str",
                "team:ref:Team",
                "courses:list:ref:Course",
            ],
        );
        let model = renderer().render_model(&user, &RenderOptions::default()).unwrap();

        assert!(model.contains("    #[record(unique)]\n    pub username: String,"));
        assert!(model.contains("    pub email: Option<String>,"));
        assert!(model.contains(
            "    #[record(hashed)]\n    #[serde(skip_serializing)]\n    pub password: Hashed,"
        ));
        assert!(model.contains("    #[record(encrypted)]\n    #[serde(skip_serializing)]\n    pub ssn: Encrypted,"));
        assert!(model.contains("    #[record(references = \"Team\")]\n    pub team: TeamId,"));
        assert!(model.contains(
            "    #[record(references = \"Course\", many)]\n    pub courses: Vec<CourseId>,"
        ));
        assert!(model.contains("use acton_htmx::record::{Encrypted, Hashed, Record};"));
    }

    #[test]
    fn test_relation_imports_are_sorted_and_skip_self() {
        let category = resource(
            "Category",
            &["parent_:ref:Category", "owner:ref:User", "editors:list:ref:User", "tag:ref:Tag"],
        );
        let model = renderer().render_model(&category, &RenderOptions::default()).unwrap();

        assert!(model.contains("use super::tag::TagId;\nuse super::user::UserId;\n"));
        assert_eq!(model.matches("UserId;").count(), 1);
        assert!(!model.contains("super::category"));
        assert!(model.contains("pub parent: Option<CategoryId>,"));
    }

    #[test]
    fn test_keywords_become_raw_identifiers() {
        let item = resource("Item", &["type:str", "ref_:int"]);
        let model = renderer().render_model(&item, &RenderOptions::default()).unwrap();
        assert!(model.contains("pub r#type: String,"));
        assert!(model.contains("pub r#ref: Option<i64>,"));
    }

    #[test]
    fn test_controller_has_five_crud_handlers() {
        let post = resource("Post", &["title:str", "body:str"]);
        let controller = renderer()
            .render_controller(&post, &[], &RenderOptions::default())
            .unwrap();

        for handler in ["list", "show", "create", "update", "delete"] {
            assert_eq!(
                controller.matches(&format!("pub async fn {handler}(")).count(),
                1,
                "{handler}"
            );
        }
        assert_eq!(controller.matches("pub async fn ").count(), 5);
        assert!(controller.contains("use crate::models::post::{Post, PostId};"));
        assert!(controller.contains("use crate::state::AppState;"));
        assert!(controller.contains("pub fn routes() -> Router<AppState> {"));
        assert!(controller.contains(".route(\"/posts/{id}\", get(show).put(update).delete(delete))"));
        assert!(controller.contains("let records = Post::all(&state).await?;"));
    }

    #[test]
    fn test_transform_fields_are_write_only() {
        let user = resource("User", &["email:str", "password_hashed:str"]);
        let controller = renderer()
            .render_controller(&user, &[], &RenderOptions::default())
            .unwrap();

        let create = section(&controller, "pub struct CreateUser {");
        assert!(create.contains("/// Write-only: hashed before it is stored\n    pub password: String,"));
        assert!(create.contains("pub email: String,"));

        let update = section(&controller, "pub struct UpdateUser {");
        assert!(update.contains("pub password: Option<String>,"));
        assert!(update.contains("pub email: Option<String>,"));

        let response = section(&controller, "pub struct UserResponse {");
        assert!(response.contains("pub email: String,"));
        assert!(!response.contains("password"));

        assert!(controller.contains("password: Hashed::from_plaintext(input.password),"));
        assert!(controller.contains("record.password = Hashed::from_plaintext(value);"));
        assert!(controller.contains("use acton_htmx::record::{Hashed, RecordError};"));
    }

    #[test]
    fn test_relations_are_taken_by_id() {
        let post = resource("Post", &["author:ref:User", "reviewer_:ref:User"]);
        let controller = renderer()
            .render_controller(&post, &[], &RenderOptions::default())
            .unwrap();

        assert!(controller.contains("use crate::models::user::UserId;"));
        let create = section(&controller, "pub struct CreatePost {");
        assert!(create.contains("pub author: UserId,"));
        assert!(create.contains("pub reviewer: Option<UserId>,"));
        assert!(controller.contains("record.reviewer = Some(value);"));
    }

    #[test]
    fn test_custom_actions() {
        let post = resource("Post", &["title:str"]);
        let actions = vec![
            ControllerAction::parse("get:search").unwrap(),
            ControllerAction::parse("post:bulk_import").unwrap(),
        ];
        let controller = renderer()
            .render_controller(&post, &actions, &RenderOptions::default())
            .unwrap();

        assert_eq!(controller.matches("pub async fn ").count(), 7);
        assert!(controller.contains(".route(\"/posts/search\", axum::routing::get(search))"));
        assert!(controller.contains(".route(\"/posts/bulk-import\", axum::routing::post(bulk_import))"));
        assert!(controller.contains("/// `POST /posts/bulk-import`\npub async fn bulk_import("));
        assert!(controller.contains("//! - `GET /posts/search` → [`search`]"));
    }

    #[test]
    fn test_custom_layout_modules() {
        let options = RenderOptions {
            models_module: "crate::domain".to_string(),
            state_type: "crate::App".to_string(),
            record_module: "crate::db".to_string(),
        };
        let post = resource("Post", &["title:str"]);
        let controller = renderer().render_controller(&post, &[], &options).unwrap();

        assert!(controller.contains("use crate::domain::post::{Post, PostId};"));
        assert!(controller.contains("use crate::db::RecordError;"));
        assert!(controller.contains("State(state): State<App>,"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let post = resource("Post", &["title:str", "author:ref:User", "tags:list:str"]);
        let renderer = renderer();
        let options = RenderOptions::default();

        assert_eq!(
            renderer.render_model(&post, &options).unwrap(),
            renderer.render_model(&post, &options).unwrap()
        );
        assert_eq!(
            renderer.render_controller(&post, &[], &options).unwrap(),
            TemplateRenderer::new()
                .unwrap()
                .render_controller(&post, &[], &options)
                .unwrap()
        );
    }

    #[test]
    fn test_override_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("model.rs.jinja"),
            "// custom {{ names.type_name }}\n",
        )
        .unwrap();

        let renderer = TemplateRenderer::with_overrides(dir.path()).unwrap();
        let post = resource("Post", &["title:str"]);
        let options = RenderOptions::default();

        assert_eq!(renderer.render_model(&post, &options).unwrap(), "// custom Post\n");
        assert!(renderer
            .render_controller(&post, &[], &options)
            .unwrap()
            .contains("pub async fn list("));
    }

    #[test]
    fn test_broken_override_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("controller.rs.jinja"), "{% for %}").unwrap();
        assert!(matches!(
            TemplateRenderer::with_overrides(dir.path()),
            Err(GenerationError::Render(_))
        ));
    }

    fn section<'a>(text: &'a str, start: &str) -> &'a str {
        let begin = text.find(start).unwrap();
        let end = text[begin..].find("\n}\n").unwrap();
        &text[begin..begin + end]
    }
}
