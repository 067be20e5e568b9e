// tests/activity_flow.rs
//
// Anexos (com compensação de storage), toggle de conclusão e a
// propagação de rename do lead para as atividades.

use std::sync::Arc;

use crm_backend::services::activity_service::ActivityService;
use crm_backend::services::pipeline_service::PipelineService;
use crm_backend::store::{LocalObjectStore, MemoryStore, RecordStore};
use serde_json::{Value, json};

fn services(dir: &tempfile::TempDir) -> (MemoryStore, ActivityService, PipelineService) {
    let store = MemoryStore::seeded();
    let objects = Arc::new(LocalObjectStore::new(dir.path(), "http://localhost:3000/storage"));
    let activities = ActivityService::new(Arc::new(store.clone()), objects);
    let pipeline = PipelineService::new(Arc::new(store.clone()));
    (store, activities, pipeline)
}

#[tokio::test]
async fn attachment_upload_then_failed_write_cleans_the_orphan() {
    let dir = tempfile::tempdir().unwrap();
    let (store, activities, _) = services(&dir);

    let activity = activities
        .create("Enviar contrato", Some("document_sent"), "Jane Doe", "", "", "", None, None, "", false, None, "")
        .await
        .unwrap();

    // Caso feliz: objeto no disco + linha com os campos de anexo.
    let with_file = activities
        .attach_file(activity.id, "contrato.pdf", "application/pdf", b"pdf".to_vec())
        .await
        .unwrap();
    let att = with_file.attachment.expect("anexo salvo");
    assert_eq!(att.name, "contrato.pdf");
    assert!(dir.path().join("activity-attachments").join(&att.path).exists());

    // Escrita no banco falha depois do upload: o objeto recém-subido é
    // apagado para não ficar órfão.
    store.fail_next_write("permission denied for table activities");
    let err = activities
        .attach_file(activity.id, "segunda-via.pdf", "application/pdf", b"pdf2".to_vec())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("permission denied"));
    assert!(
        !dir.path()
            .join("activity-attachments")
            .join(format!("{}/segunda-via.pdf", activity.id))
            .exists()
    );
}

#[tokio::test]
async fn delete_cleans_the_attachment_first() {
    let dir = tempfile::tempdir().unwrap();
    let (store, activities, _) = services(&dir);

    let activity = activities
        .create("Visita", Some("site_visit"), "", "", "", "", None, None, "", false, None, "")
        .await
        .unwrap();
    let with_file = activities
        .attach_file(activity.id, "roteiro.pdf", "application/pdf", b"x".to_vec())
        .await
        .unwrap();
    let path = with_file.attachment.unwrap().path;

    activities.delete(activity.id).await.unwrap();
    assert!(!dir.path().join("activity-attachments").join(&path).exists());
    assert!(store.select("activities", None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_flips_completed_and_surfaces_backend_refusal() {
    let dir = tempfile::tempdir().unwrap();
    let (store, activities, _) = services(&dir);

    let activity = activities
        .create("Ligar", Some("call"), "", "", "", "", None, None, "", false, None, "")
        .await
        .unwrap();

    let done = activities.toggle_completed(activity.id).await.unwrap();
    assert!(done.completed);

    store.fail_next_write("permission denied for table activities");
    assert!(activities.toggle_completed(activity.id).await.is_err());

    // Nada mudou no backend: continua concluída.
    let rows = store.select("activities", None, None).await.unwrap();
    assert_eq!(rows[0].get("completed"), Some(&json!(true)));
}

#[tokio::test]
async fn renaming_a_lead_patches_matching_activities() {
    let dir = tempfile::tempdir().unwrap();
    let (store, activities, pipeline) = services(&dir);

    let lead = pipeline
        .create_lead("Jane Doe", "", "+1234", None, None, "", Value::Null, "", "", None, "", "")
        .await
        .unwrap();

    // Match de nome é case-insensitive; outra atividade não referencia.
    activities
        .create("Follow-up", None, "JANE DOE", "", "", "", None, None, "", false, None, "")
        .await
        .unwrap();
    activities
        .create("Outro lead", None, "Carlos", "", "", "", None, None, "", false, None, "")
        .await
        .unwrap();

    pipeline
        .update_lead(
            lead.id,
            "Jane Smith",
            "",
            "+1234",
            None,
            None,
            "",
            Value::Null,
            "",
            "",
            None,
            "",
            "",
        )
        .await
        .unwrap();

    let listed = activities.list().await.unwrap();
    let follow_up = listed.iter().find(|a| a.title == "Follow-up").unwrap();
    assert_eq!(follow_up.lead_name, "Jane Smith");
    let other = listed.iter().find(|a| a.title == "Outro lead").unwrap();
    assert_eq!(other.lead_name, "Carlos");

    // O lead em si também foi renomeado.
    let rows = store
        .select("leads", Some(("id", json!(lead.id.to_string()))), None)
        .await
        .unwrap();
    assert_eq!(rows[0].get("name"), Some(&json!("Jane Smith")));
}
