// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Pipeline ---
        handlers::pipeline::get_board,
        handlers::pipeline::create_lead,
        handlers::pipeline::update_lead,
        handlers::pipeline::delete_lead,
        handlers::pipeline::move_lead,

        // --- Activities ---
        handlers::activities::list_activities,
        handlers::activities::create_activity,
        handlers::activities::update_activity,
        handlers::activities::toggle_activity,
        handlers::activities::attach_file,
        handlers::activities::delete_activity,
        handlers::activities::list_reminders,

        // --- Projects ---
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::resize_units,
        handlers::projects::delete_project,

        // --- Documents ---
        handlers::documents::list_documents,
        handlers::documents::create_document,
        handlers::documents::delete_document,

        // --- Suppliers ---
        handlers::suppliers::list_suppliers,
        handlers::suppliers::create_supplier,
        handlers::suppliers::update_supplier,
        handlers::suppliers::delete_supplier,

        // --- Analytics / Dashboard ---
        handlers::analytics::get_report,
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            models::auth::User,
            models::auth::AuthResponse,
            models::lead::Lead,
            models::lead::Stage,
            models::lead::Priority,
            models::lead::BoardColumn,
            models::activity::Activity,
            models::activity::ActivityType,
            models::activity::Attachment,
            models::activity::ReminderBucket,
            models::project::Project,
            models::project::ProjectStatus,
            models::project::Unit,
            models::project::UnitStatus,
            models::project::Milestone,
            models::project::PaymentInstallment,
            models::document::Document,
            models::document::DocumentType,
            models::supplier::Supplier,
            models::analytics::AnalyticsReport,
            models::analytics::TimeRange,
            models::analytics::FunnelStage,
            models::analytics::SourceCount,
            models::analytics::TrendPoint,
            models::dashboard::DashboardSummary,
            models::dashboard::ReminderEntry,
            models::dashboard::ReminderOverview,
            handlers::auth::RegisterPayload,
            handlers::auth::LoginPayload,
            handlers::pipeline::LeadPayload,
            handlers::pipeline::MoveLeadPayload,
            handlers::activities::ActivityPayload,
            handlers::activities::AttachmentPayload,
            handlers::projects::ProjectPayload,
            handlers::projects::ResizeUnitsPayload,
            handlers::documents::DocumentPayload,
            handlers::suppliers::SupplierPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Sessão do operador"),
        (name = "Pipeline", description = "Board de leads"),
        (name = "Activities", description = "Atividades e lembretes"),
        (name = "Projects", description = "Projetos e unidades"),
        (name = "Documents", description = "Documentos"),
        (name = "Suppliers", description = "Fornecedores"),
        (name = "Analytics", description = "Relatórios"),
        (name = "Dashboard", description = "Resumo geral")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn with_security() -> utoipa::openapi::OpenApi {
        let mut doc = <ApiDoc as OpenApi>::openapi();
        if let Some(components) = doc.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
        doc
    }
}
