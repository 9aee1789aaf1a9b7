//! End-to-end tests for the ask pipeline: short-circuits, fallback routing,
//! ambiguity handling, reload semantics and hybrid scoring.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use oraculo_core::{
    AskEngine, AskOptions, ClassifierResult, CorpusSource, EmbeddingProvider, FaqDocument,
    IntentClassifier, Normalizer, RetrievalConfig, MSG_AMBIGUOUS_QUERY, MSG_COULD_NOT_UNDERSTAND,
    MSG_NO_INFORMATION,
};

/// Classifier returning a canned result and counting invocations.
struct FixedClassifier {
    label: String,
    confidence: f64,
    calls: AtomicUsize,
}

impl FixedClassifier {
    fn new(label: &str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            confidence,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassifierResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ClassifierResult {
            label: self.label.clone(),
            confidence: self.confidence,
        })
    }
}

struct FailingClassifier;

#[async_trait]
impl IntentClassifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassifierResult> {
        anyhow::bail!("classifier service unavailable")
    }
}

/// Corpus source backed by a mutable in-memory list, so tests can change
/// the documents between reloads.
struct StaticSource {
    docs: Mutex<Vec<FaqDocument>>,
}

impl StaticSource {
    fn new(docs: Vec<FaqDocument>) -> Arc<Self> {
        Arc::new(Self {
            docs: Mutex::new(docs),
        })
    }

    fn replace(&self, docs: Vec<FaqDocument>) {
        *self.docs.lock().unwrap() = docs;
    }
}

impl CorpusSource for StaticSource {
    fn load_documents(&self) -> Result<Vec<FaqDocument>> {
        Ok(self.docs.lock().unwrap().clone())
    }
}

/// Embeds any text to the first basis vector; enough to drive the hybrid
/// path deterministically.
struct StaticEmbedding;

#[async_trait]
impl EmbeddingProvider for StaticEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }
}

fn doc(id: &str, question: &str, answer: &str, intent: &str) -> FaqDocument {
    FaqDocument {
        id: id.to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        intent: intent.to_string(),
        tags: vec![],
        language: "es".to_string(),
        source_link: Some(format!("https://docs.example/{id}")),
        is_active: true,
        embedding: None,
    }
}

fn sample_docs() -> Vec<FaqDocument> {
    vec![
        doc(
            "faq-1",
            "Fallo el despliegue a produccion",
            "Revisa la etapa que fallo y relanza el pipeline",
            "despliegues",
        ),
        doc(
            "faq-2",
            "Como renuevo el certificado SSL",
            "Genera la solicitud y sube el certificado nuevo",
            "despliegues",
        ),
        doc(
            "faq-3",
            "El rollback dejo la version anterior",
            "Relanza la etapa final",
            "despliegues",
        ),
        doc(
            "faq-4",
            "No se guarda el formulario del portal",
            "Verifica permisos del usuario y validaciones requeridas",
            "portal",
        ),
        doc(
            "faq-5",
            "Error E1234 al asignar un formulario",
            "Valida la configuracion y reinicia el servicio",
            "errores",
        ),
    ]
}

async fn engine_with(
    classifier: Arc<dyn IntentClassifier>,
    docs: Vec<FaqDocument>,
) -> AskEngine {
    AskEngine::new(
        RetrievalConfig::default(),
        Normalizer::spanish(),
        classifier,
        None,
        StaticSource::new(docs),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_empty_query_short_circuits_without_classifier() {
    let classifier = FixedClassifier::new("despliegues", 0.9);
    let engine = engine_with(classifier.clone(), sample_docs()).await;

    for query in ["", "   ", "\t\n"] {
        let response = engine.ask(query, &AskOptions::default()).await.unwrap();
        assert_eq!(response.answer, MSG_COULD_NOT_UNDERSTAND);
        assert_eq!(response.intent, "unknown");
        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.score, 0.0);
        assert_eq!(response.source_id, "none");
        assert!(!response.used_fallback);
    }
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_confident_intent_answers_from_scoped_pool() {
    let classifier = FixedClassifier::new("despliegues", 0.9);
    let engine = engine_with(classifier.clone(), sample_docs()).await;

    let response = engine
        .ask("¿Cómo renuevo el certificado SSL?", &AskOptions::default())
        .await
        .unwrap();

    assert_eq!(response.source_id, "faq-2");
    assert_eq!(
        response.answer,
        "Genera la solicitud y sube el certificado nuevo"
    );
    assert_eq!(response.source_link.as_deref(), Some("https://docs.example/faq-2"));
    assert!(!response.used_fallback);
    assert!(response.score > 0.0);
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn test_wrong_confident_intent_falls_back_to_global() {
    // Classifier is sure this is a billing question, but the billing pool
    // cannot answer it; the global pool can.
    let mut docs = sample_docs();
    docs.push(doc(
        "faq-6",
        "Donde descargo la factura",
        "En el panel de cuenta, seccion facturacion",
        "billing",
    ));
    let classifier = FixedClassifier::new("billing", 0.9);
    let engine = engine_with(classifier, docs).await;

    let response = engine
        .ask("error E1234 al asignar un formulario", &AskOptions::default())
        .await
        .unwrap();

    assert!(response.used_fallback);
    assert_eq!(response.source_id, "faq-5");
}

#[tokio::test]
async fn test_low_confidence_goes_global_with_fallback_flag() {
    let classifier = FixedClassifier::new("despliegues", 0.2);
    let engine = engine_with(classifier, sample_docs()).await;

    let response = engine
        .ask("certificado ssl", &AskOptions::default())
        .await
        .unwrap();

    assert!(response.used_fallback);
    assert_eq!(response.source_id, "faq-2");
}

#[tokio::test]
async fn test_unmatched_query_is_ambiguous_with_suggestions() {
    // No token of this query survives in any document, so every score is
    // zero: weak top, zero separation → clarification response.
    let classifier = FixedClassifier::new("unknown", 0.1);
    let engine = engine_with(classifier, sample_docs()).await;

    let response = engine
        .ask("astronomia cuantica avanzada", &AskOptions::default())
        .await
        .unwrap();

    assert_eq!(response.answer, MSG_AMBIGUOUS_QUERY);
    let suggestions = response.suggestions.expect("clarification offers suggestions");
    assert!(!suggestions.is_empty() && suggestions.len() <= 3);
    // Metadata of the top candidate is preserved for telemetry
    assert_ne!(response.source_id, "none");
    assert!(response.used_fallback);
    assert!(response.source_link.is_none());
}

#[tokio::test]
async fn test_empty_corpus_reports_no_information() {
    let classifier = FixedClassifier::new("despliegues", 0.9);
    let engine = engine_with(classifier, vec![]).await;

    let response = engine
        .ask("cualquier pregunta", &AskOptions::default())
        .await
        .unwrap();

    assert_eq!(response.answer, MSG_NO_INFORMATION);
    assert_eq!(response.source_id, "none");
    assert_eq!(response.score, 0.0);
    assert!(response.suggestions.is_none());
}

#[tokio::test]
async fn test_classifier_failure_is_fatal_to_the_request() {
    let engine = engine_with(Arc::new(FailingClassifier), sample_docs()).await;

    let err = engine
        .ask("una pregunta valida", &AskOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Intent classification failed"));
}

#[tokio::test]
async fn test_reload_swaps_in_new_documents() {
    let classifier = FixedClassifier::new("general", 0.9);
    let source = StaticSource::new(sample_docs());
    let engine = AskEngine::new(
        RetrievalConfig::default(),
        Normalizer::spanish(),
        classifier,
        None,
        source.clone(),
    )
    .await
    .unwrap();
    assert_eq!(engine.corpus_size().await, 5);

    source.replace(vec![doc(
        "faq-new",
        "Como activo la autenticacion en dos pasos",
        "Desde el perfil, seccion seguridad",
        "general",
    )]);
    let size = engine.reload().await.unwrap();
    assert_eq!(size, 1);

    let response = engine
        .ask("activar autenticacion dos pasos", &AskOptions::default())
        .await
        .unwrap();
    assert_eq!(response.source_id, "faq-new");
}

#[tokio::test]
async fn test_reload_to_empty_corpus_behaves_as_no_candidates() {
    let classifier = FixedClassifier::new("despliegues", 0.9);
    let source = StaticSource::new(sample_docs());
    let engine = AskEngine::new(
        RetrievalConfig::default(),
        Normalizer::spanish(),
        classifier,
        None,
        source.clone(),
    )
    .await
    .unwrap();

    source.replace(vec![]);
    assert_eq!(engine.reload().await.unwrap(), 0);

    let response = engine
        .ask("certificado ssl", &AskOptions::default())
        .await
        .unwrap();
    assert_eq!(response.answer, MSG_NO_INFORMATION);
}

#[tokio::test]
async fn test_debug_flag_exposes_candidates_and_topk_override() {
    let classifier = FixedClassifier::new("despliegues", 0.9);
    let engine = engine_with(classifier, sample_docs()).await;

    let opts = AskOptions {
        topk: Some(1),
        debug: true,
        ..Default::default()
    };
    let response = engine.ask("certificado ssl", &opts).await.unwrap();

    let candidates = response.candidates.expect("debug response carries candidates");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, response.source_id);
    assert_eq!(candidates[0].score, response.score);

    // Without debug the list is omitted entirely
    let response = engine
        .ask("certificado ssl", &AskOptions::default())
        .await
        .unwrap();
    assert!(response.candidates.is_none());
}

#[tokio::test]
async fn test_hybrid_mode_embeds_corpus_and_ranks_semantically() {
    let mut docs = vec![
        doc("faq-a", "pregunta uno", "respuesta uno", "general"),
        doc("faq-b", "pregunta dos", "respuesta dos", "general"),
    ];
    // faq-b points away from the query vector; faq-a gets its embedding
    // filled in by the engine (StaticEmbedding returns [1, 0]).
    docs[1].embedding = Some(vec![0.0, 1.0]);

    let config = RetrievalConfig {
        hybrid: true,
        ..Default::default()
    };
    let engine = AskEngine::new(
        config,
        Normalizer::spanish(),
        FixedClassifier::new("general", 0.3),
        Some(Arc::new(StaticEmbedding)),
        StaticSource::new(docs),
    )
    .await
    .unwrap();

    let opts = AskOptions {
        debug: true,
        ..Default::default()
    };
    let response = engine.ask("algo sin coincidencias", &opts).await.unwrap();

    assert_eq!(response.source_id, "faq-a");
    assert!((response.score - 0.55).abs() < 1e-6);
    let candidates = response.candidates.unwrap();
    assert!((candidates[0].semantic_score - 1.0).abs() < 1e-6);
    assert_eq!(candidates[0].lexical_score, 0.0);
}

#[tokio::test]
async fn test_hybrid_without_embedder_is_rejected() {
    let config = RetrievalConfig {
        hybrid: true,
        ..Default::default()
    };
    let result = AskEngine::new(
        config,
        Normalizer::spanish(),
        FixedClassifier::new("general", 0.9),
        None,
        StaticSource::new(vec![]),
    )
    .await;
    assert!(result.is_err());
}
