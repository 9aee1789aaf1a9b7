use anyhow::Result;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Oraculo configuration

[corpus]
kind = "json"
path = "./faq.json"
watch = false

[retrieval]
tau_hi = 0.80
tau_lo = 0.50
min_score = 0.05
topk = 3
question_weight = 3
hybrid = false
alpha = 0.55
hybrid_top_k_per_side = 5

[classifier]
mode = "keyword"

[[classifier.intents]]
label = "despliegues"
keywords = ["deploy", "despliegue", "produccion", "pipeline", "rollback", "certificado", "ssl"]

[[classifier.intents]]
label = "portal"
keywords = ["portal", "formulario", "guardar", "asignacion"]

[[classifier.intents]]
label = "errores"
keywords = ["error", "errores", "e1234", "fallo"]

# Uncomment for hybrid (lexical + semantic) retrieval:
# [embedding]
# base_url = "http://localhost:8001/v1"
# model = "all-MiniLM-L6-v2"
# dimensions = 384
# api_key_env = "EMBEDDING_API_KEY"

[server]
host = "127.0.0.1"
port = 8080
allowed_origins = []
"#;

const SAMPLE_FAQ: &str = r#"[
  {
    "id": "faq-portal-guardado",
    "question": "No se guarda el Portal Form Assignment",
    "answer": "Verifica permisos del usuario, revisa validaciones requeridas y confirma que el servicio X esté activo. Si persiste, revisa logs del módulo Y.",
    "intent": "portal",
    "tags": ["portal", "form", "save", "assignment"],
    "language": "es",
    "source_link": "https://tu-doc-interna/portal/save"
  },
  {
    "id": "faq-error-e1234",
    "question": "Error E1234 al asignar un formulario",
    "answer": "El error E1234 suele ocurrir por configuración inválida. Valida el campo Z y reinicia el servicio X. Si hay cola, limpia caché Y.",
    "intent": "errores",
    "tags": ["E1234", "assignment", "config"],
    "language": "es",
    "source_link": "https://tu-doc-interna/errors/e1234"
  },
  {
    "id": "faq-deploy-fallido",
    "question": "Falló el despliegue a producción",
    "answer": "Revisa la etapa del pipeline que falló, corrige y relanza. Si el servicio quedó a medias, ejecuta el rollback documentado.",
    "intent": "despliegues",
    "tags": ["deploy", "cicd", "produccion"],
    "language": "es",
    "source_link": "https://tu-doc-interna/deploy/troubleshooting"
  },
  {
    "id": "faq-cert-ssl",
    "question": "¿Cómo renuevo el certificado SSL?",
    "answer": "Genera la solicitud de firma, renueva en el proveedor y sube el certificado nuevo antes de la fecha de expiración.",
    "intent": "despliegues",
    "tags": ["ssl", "certificado"],
    "language": "es",
    "source_link": "https://tu-doc-interna/deploy/ssl"
  }
]"#;

/// Write a starter config file and, if absent, a sample corpus next to it.
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);

    let faq_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("faq.json");
    if !faq_path.exists() {
        std::fs::write(&faq_path, SAMPLE_FAQ)?;
        println!("Created sample corpus at {:?}", faq_path);
    }

    Ok(())
}
