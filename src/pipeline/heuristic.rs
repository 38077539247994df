//! Local keyword classifier used when the remote service is unavailable.
//!
//! Scores are sums of case-insensitive substring occurrences, so partial
//! words count ("solicit" matches "solicitação" and "solicito"). Ties go to
//! Productive.

use tracing::debug;

use crate::pipeline::types::{Category, Classification};

/// Fragments that signal a request needing action.
const PRODUCTIVE_KEYWORDS: &[&str] = &[
    "solicit",
    "suporte",
    "problema",
    "erro",
    "ajuda",
    "dúvida",
    "duvida",
    "urgente",
    "prazo",
    "status",
    "atualiza",
    "pedido",
    "requisição",
    "chamado",
    "pendente",
    "acesso",
    "falha",
    "verificar",
    "precis",
    "relatório",
    "documento",
    "aguardo",
    "retorno",
];

/// Fragments that signal a message needing no action.
const UNPRODUCTIVE_KEYWORDS: &[&str] = &[
    "obrigad",
    "agradeç",
    "agradec",
    "parabéns",
    "parabens",
    "felicita",
    "feliz natal",
    "feliz ano",
    "boas festas",
    "abraço",
    "ótimo trabalho",
    "excelente trabalho",
    "bom fim de semana",
];

const PRODUCTIVE_REPLY: &str = "Olá,\n\n\
Agradecemos o seu contato. Confirmamos o recebimento da sua solicitação, que já foi \
encaminhada à equipe responsável e será analisada em breve. Retornaremos assim que possível.\n\n\
Atenciosamente,\n\
Equipe de Atendimento";

const UNPRODUCTIVE_REPLY: &str = "Olá,\n\n\
Muito obrigado pela sua mensagem! Ficamos felizes com o seu contato.\n\n\
Atenciosamente,\n\
Equipe de Atendimento";

/// Keyword hit counts for one email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordScores {
    pub productive: usize,
    pub unproductive: usize,
}

/// Keyword-scoring fallback classifier. Deterministic, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> KeywordScores {
        let lowered = text.to_lowercase();
        KeywordScores {
            productive: count_hits(&lowered, PRODUCTIVE_KEYWORDS),
            unproductive: count_hits(&lowered, UNPRODUCTIVE_KEYWORDS),
        }
    }

    pub fn classify(&self, text: &str) -> Classification {
        let scores = self.score(text);

        let category = if scores.unproductive > scores.productive {
            Category::Unproductive
        } else {
            Category::Productive
        };

        debug!(
            productive = scores.productive,
            unproductive = scores.unproductive,
            category = category.label(),
            "Local keyword classification"
        );

        Classification {
            category,
            response: reply_template(category).to_string(),
        }
    }
}

/// Canned reply for a category. `Error` never comes out of `classify`.
pub fn reply_template(category: Category) -> &'static str {
    match category {
        Category::Unproductive => UNPRODUCTIVE_REPLY,
        Category::Productive | Category::Error => PRODUCTIVE_REPLY,
    }
}

fn count_hits(haystack: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|kw| haystack.matches(kw).count()).sum()
}
