use std::collections::{HashMap, HashSet};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Baseline Spanish stopword set dropped during tokenization.
const SPANISH_STOPWORDS: &[&str] = &[
    "a", "al", "algo", "algunas", "algunos", "ante", "antes", "como", "con", "contra", "cual",
    "cuando", "de", "del", "desde", "donde", "dos", "el", "ella", "ellas", "ellos", "en", "entre",
    "era", "erais", "eran", "eras", "eres", "es", "esa", "esas", "ese", "eso", "esos", "esta",
    "estaba", "estaban", "estado", "estais", "estamos", "estan", "estar", "este", "esto", "estos",
    "estoy", "fin", "fue", "fueron", "fui", "ha", "hace", "hacen", "hacer", "haces", "hago", "han",
    "hasta", "hay", "la", "las", "le", "les", "lo", "los", "mas", "mi", "mis", "mucho", "muy",
    "nada", "ni", "no", "nos", "nosotros", "o", "otra", "otras", "otro", "otros", "para", "pero",
    "poco", "por", "porque", "que", "se", "sea", "segun", "ser", "si", "siempre", "sin", "sobre",
    "sois", "solamente", "solo", "somos", "son", "soy", "su", "sus", "tambien", "tanto", "te",
    "teneis", "tenemos", "tener", "tengo", "ti", "tiene", "tienen", "todo", "tras", "tu", "tus",
    "un", "una", "uno", "unos", "y", "ya",
];

/// Synonym table collapsing common variants onto one canonical token.
const SYNONYMS: &[(&str, &str)] = &[
    ("deploy", "despliegue"),
    ("deployment", "despliegue"),
    ("release", "despliegue"),
    ("prod", "produccion"),
    ("production", "produccion"),
    ("pipeline", "cicd"),
    ("ci/cd", "cicd"),
    ("ci-cd", "cicd"),
    ("pod", "k8s_pod"),
    ("pods", "k8s_pod"),
    ("api", "servicio_api"),
    ("errores", "error"),
];

/// Tokenizer shared by corpus build and query time. Both sides MUST use the
/// same instance-equivalent configuration, otherwise scores are meaningless.
///
/// Pipeline: lowercase → NFD decompose and strip combining marks →
/// non-word characters to spaces → split → drop stopwords → map synonyms.
/// Pure and deterministic; normalizing its own output is a fixpoint.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
    synonyms: HashMap<String, String>,
}

impl Normalizer {
    pub fn new<S, P>(stopwords: S, synonyms: P) -> Self
    where
        S: IntoIterator<Item = String>,
        P: IntoIterator<Item = (String, String)>,
    {
        Self {
            stopwords: stopwords.into_iter().collect(),
            synonyms: synonyms.into_iter().collect(),
        }
    }

    /// The default Spanish configuration.
    pub fn spanish() -> Self {
        Self::new(
            SPANISH_STOPWORDS.iter().map(|s| s.to_string()),
            SYNONYMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded: String = text
            .to_lowercase()
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .map(|c| {
                if c.is_alphanumeric() || c == '_' {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        folded
            .split_whitespace()
            .filter(|t| !self.stopwords.contains(*t))
            .map(|t| match self.synonyms.get(t) {
                Some(canonical) => canonical.clone(),
                None => t.to_string(),
            })
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::spanish()
    }
}
