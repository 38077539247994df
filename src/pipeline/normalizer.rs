//! Portuguese text normalization for previews.
//!
//! lowercase → strip non-letters → split → drop stop-words and short tokens
//! → stem → join with single spaces.

use std::collections::HashSet;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// Characters that are neither Portuguese letters nor whitespace.
static NON_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-záàâãéèêíïóôõöúçñ\s]").expect("valid regex"));

/// Tokens shorter than this are dropped.
const MIN_TOKEN_CHARS: usize = 3;

/// Number of leading characters used for the preview.
pub const PREVIEW_CHARS: usize = 200;

/// NLTK Portuguese stop-word list.
const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "a", "à", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às", "até",
    "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do", "dos",
    "e", "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "éramos", "essa",
    "essas", "esse", "esses", "esta", "está", "estamos", "estão", "estar", "estas", "estava",
    "estavam", "estávamos", "este", "esteja", "estejam", "estejamos", "estes", "esteve", "estive",
    "estivemos", "estiver", "estivera", "estiveram", "estivéramos", "estiverem", "estivermos",
    "estivesse", "estivessem", "estivéssemos", "estou", "eu", "foi", "fomos", "for", "fora",
    "foram", "fôramos", "forem", "formos", "fosse", "fossem", "fôssemos", "fui", "há", "haja",
    "hajam", "hajamos", "hão", "havemos", "haver", "hei", "houve", "houvemos", "houver",
    "houvera", "houverá", "houveram", "houvéramos", "houverão", "houverei", "houverem",
    "houveremos", "houveria", "houveriam", "houveríamos", "houvermos", "houvesse", "houvessem",
    "houvéssemos", "isso", "isto", "já", "lhe", "lhes", "mais", "mas", "me", "mesmo", "meu",
    "meus", "minha", "minhas", "muito", "na", "não", "nas", "nem", "no", "nos", "nós", "nossa",
    "nossas", "nosso", "nossos", "num", "numa", "o", "os", "ou", "para", "pela", "pelas", "pelo",
    "pelos", "por", "qual", "quando", "que", "quem", "são", "se", "seja", "sejam", "sejamos",
    "sem", "ser", "será", "serão", "serei", "seremos", "seria", "seriam", "seríamos", "seu",
    "seus", "só", "somos", "sou", "sua", "suas", "também", "te", "tem", "tém", "temos", "tenha",
    "tenham", "tenhamos", "tenho", "terá", "terão", "terei", "teremos", "teria", "teriam",
    "teríamos", "teu", "teus", "teve", "tinha", "tinham", "tínhamos", "tive", "tivemos", "tiver",
    "tivera", "tiveram", "tivéramos", "tiverem", "tivermos", "tivesse", "tivessem", "tivéssemos",
    "tu", "tua", "tuas", "um", "uma", "você", "vocês", "vos",
];

/// Process-wide language resources.
pub struct NlpResources {
    stop_words: HashSet<&'static str>,
    stemmer: Stemmer,
}

impl NlpResources {
    fn load() -> Self {
        tracing::debug!(
            stop_words = PORTUGUESE_STOP_WORDS.len(),
            "Loading Portuguese NLP resources"
        );
        Self {
            stop_words: PORTUGUESE_STOP_WORDS.iter().copied().collect(),
            stemmer: Stemmer::create(Algorithm::Portuguese),
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}

static RESOURCES: OnceLock<NlpResources> = OnceLock::new();

/// Initialize the shared NLP resources. Idempotent; later calls return the
/// same instance.
pub fn ensure_resources_loaded() -> &'static NlpResources {
    RESOURCES.get_or_init(NlpResources::load)
}

/// Turns raw text into a space-separated stream of stems.
#[derive(Clone, Copy)]
pub struct TextNormalizer {
    resources: &'static NlpResources,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            resources: ensure_resources_loaded(),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let letters_only = NON_LETTER.replace_all(&lowered, "");

        letters_only
            .split_whitespace()
            .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
            .filter(|word| !self.resources.is_stop_word(word))
            .map(|word| self.resources.stemmer.stem(word).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize the first `PREVIEW_CHARS` characters of `text`.
    pub fn preview(&self, text: &str) -> String {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        self.normalize(&head)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
