// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::services::{
    activity_service::ActivityService, analytics_service::AnalyticsService, auth::AuthService,
    dashboard_service::DashboardService, document_service::DocumentService,
    pipeline_service::PipelineService, project_service::ProjectService,
    supplier_service::SupplierService,
};
use crate::store::{LocalObjectStore, MemoryStore, ObjectStore, PgStore, RecordStore};

#[derive(Clone)]
pub struct AppState {
    // Presente só quando o backend é Postgres (para rodar migrações).
    pub db_pool: Option<PgPool>,
    pub jwt_secret: String,

    pub store: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStore>,

    pub auth_service: AuthService,
    pub pipeline_service: PipelineService,
    pub activity_service: ActivityService,
    pub project_service: ProjectService,
    pub document_service: DocumentService,
    pub supplier_service: SupplierService,
    pub analytics_service: AnalyticsService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // STORE_BACKEND=memory roda sem banco (demonstração/testes);
        // qualquer outra coisa usa Postgres.
        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
        let (store, db_pool): (Arc<dyn RecordStore>, Option<PgPool>) = if backend == "memory" {
            tracing::info!("⚠️ Usando o record store em memória (nada é persistido).");
            (Arc::new(MemoryStore::seeded()), None)
        } else {
            let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(&database_url)
                .await?;
            tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
            (Arc::new(PgStore::new(pool.clone())), Some(pool))
        };

        let storage_dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/storage".to_string());
        let objects: Arc<dyn ObjectStore> =
            Arc::new(LocalObjectStore::new(storage_dir, public_base_url));

        // --- Monta o gráfico de dependências ---
        let auth_service = AuthService::new(store.clone(), jwt_secret.clone());
        let pipeline_service = PipelineService::new(store.clone());
        let activity_service = ActivityService::new(store.clone(), objects.clone());
        let project_service = ProjectService::new(store.clone());
        let document_service = DocumentService::new(store.clone(), objects.clone());
        let supplier_service = SupplierService::new(store.clone());
        let analytics_service = AnalyticsService::new(store.clone());
        let dashboard_service = DashboardService::new(store.clone());

        Ok(Self {
            db_pool,
            jwt_secret,
            store,
            objects,
            auth_service,
            pipeline_service,
            activity_service,
            project_service,
            document_service,
            supplier_service,
            analytics_service,
            dashboard_service,
        })
    }
}
