// src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use utoipa_swagger_ui::SwaggerUi;

use crm_backend::config::AppState;
use crm_backend::docs::ApiDoc;
use crm_backend::handlers;
use crm_backend::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não
    // deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Com Postgres, roda as migrações do SQLx na inicialização (o
    // backend em memória já nasce com o schema completo).
    if let Some(pool) = &app_state.db_pool {
        sqlx::migrate!()
            .run(pool)
            .await
            .expect("Falha ao rodar as migrações do banco de dados.");
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let pipeline_routes = Router::new()
        .route("/board", get(handlers::pipeline::get_board))
        .route("/leads", post(handlers::pipeline::create_lead))
        .route(
            "/leads/{id}",
            put(handlers::pipeline::update_lead).delete(handlers::pipeline::delete_lead),
        )
        .route("/leads/{id}/stage", post(handlers::pipeline::move_lead))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let activity_routes = Router::new()
        .route(
            "/",
            get(handlers::activities::list_activities).post(handlers::activities::create_activity),
        )
        .route("/reminders", get(handlers::activities::list_reminders))
        .route(
            "/{id}",
            put(handlers::activities::update_activity).delete(handlers::activities::delete_activity),
        )
        .route("/{id}/toggle", post(handlers::activities::toggle_activity))
        .route("/{id}/attachment", post(handlers::activities::attach_file))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let project_routes = Router::new()
        .route(
            "/",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        // GET resolve o segmento como slug; PUT/DELETE como id.
        .route(
            "/{id}",
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route("/{id}/units", put(handlers::projects::resize_units))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let document_routes = Router::new()
        .route(
            "/",
            get(handlers::documents::list_documents).post(handlers::documents::create_document),
        )
        .route("/{id}", axum::routing::delete(handlers::documents::delete_document))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let supplier_routes = Router::new()
        .route(
            "/",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/{id}",
            put(handlers::suppliers::update_supplier).delete(handlers::suppliers::delete_supplier),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let analytics_routes = Router::new()
        .route("/", get(handlers::analytics::get_report))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/pipeline", pipeline_routes)
        .nest("/api/activities", activity_routes)
        .nest("/api/projects", project_routes)
        .nest("/api/documents", document_routes)
        .nest("/api/suppliers", supplier_routes)
        .nest("/api/analytics", analytics_routes)
        .nest("/api/dashboard", dashboard_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::with_security()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
