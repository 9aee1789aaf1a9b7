//! Shared test helpers: sample corpus fixture and test AppState factory.
#![allow(dead_code)] // helpers used across multiple test crates

use std::sync::Arc;

use oraculo_core::{
    AskEngine, IntentRule, JsonCorpusSource, KeywordIntentClassifier, Normalizer, RetrievalConfig,
};
use oraculo_gateway::AppState;
use tempfile::TempDir;

pub const SAMPLE_FAQ: &str = r#"[
  {
    "id": "faq-1",
    "question": "Fallo el despliegue a produccion",
    "answer": "Revisa la etapa que fallo y relanza el pipeline",
    "intent": "despliegues"
  },
  {
    "id": "faq-2",
    "question": "Como renuevo el certificado SSL",
    "answer": "Genera la solicitud y sube el certificado nuevo",
    "intent": "despliegues",
    "source_link": "https://docs.example/ssl"
  },
  {
    "id": "faq-3",
    "question": "El rollback dejo la version anterior",
    "answer": "Relanza la etapa final del pipeline",
    "intent": "despliegues"
  },
  {
    "id": "faq-4",
    "question": "No se guarda el formulario del portal",
    "answer": "Verifica permisos del usuario y validaciones requeridas",
    "intent": "portal"
  },
  {
    "id": "faq-5",
    "question": "Error E1234 al asignar un formulario",
    "answer": "Valida la configuracion y reinicia el servicio",
    "intent": "errores"
  }
]"#;

pub fn sample_rules() -> Vec<IntentRule> {
    vec![
        IntentRule {
            label: "despliegues".to_string(),
            keywords: vec![
                "despliegue".to_string(),
                "produccion".to_string(),
                "pipeline".to_string(),
                "certificado".to_string(),
                "ssl".to_string(),
                "rollback".to_string(),
            ],
        },
        IntentRule {
            label: "portal".to_string(),
            keywords: vec![
                "portal".to_string(),
                "formulario".to_string(),
                "guardar".to_string(),
            ],
        },
        IntentRule {
            label: "errores".to_string(),
            keywords: vec!["error".to_string(), "e1234".to_string()],
        },
    ]
}

/// Build a test AppState over a JSON corpus in a temp dir. The TempDir must
/// stay alive for as long as the state is used.
pub async fn make_test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("faq.json");
    std::fs::write(&path, SAMPLE_FAQ).unwrap();

    let classifier = Arc::new(KeywordIntentClassifier::new(
        sample_rules(),
        Normalizer::spanish(),
    ));
    let engine = AskEngine::new(
        RetrievalConfig::default(),
        Normalizer::spanish(),
        classifier,
        None,
        Arc::new(JsonCorpusSource::new(&path)),
    )
    .await
    .unwrap();

    (
        AppState {
            engine: Arc::new(engine),
            allowed_origins: vec![],
        },
        dir,
    )
}
