//! Display names for question type codes.
//!
//! Result files tag every question with a one letter category code. Grouped
//! outputs show the display name instead; codes outside the known set are
//! passed through untouched so they still show up as their own group.

/// Known question categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    BasicUnderstanding,
    Attribution,
    EventPrediction,
    ReverseReasoning,
    CounterfactualInference,
    Introspection,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::BasicUnderstanding,
        QuestionType::Attribution,
        QuestionType::EventPrediction,
        QuestionType::ReverseReasoning,
        QuestionType::CounterfactualInference,
        QuestionType::Introspection,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "U" => Some(QuestionType::BasicUnderstanding),
            "A" => Some(QuestionType::Attribution),
            "F" => Some(QuestionType::EventPrediction),
            "R" => Some(QuestionType::ReverseReasoning),
            "C" => Some(QuestionType::CounterfactualInference),
            "I" => Some(QuestionType::Introspection),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QuestionType::BasicUnderstanding => "U",
            QuestionType::Attribution => "A",
            QuestionType::EventPrediction => "F",
            QuestionType::ReverseReasoning => "R",
            QuestionType::CounterfactualInference => "C",
            QuestionType::Introspection => "I",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            QuestionType::BasicUnderstanding => "Compreensão Básica",
            QuestionType::Attribution => "Atribuição",
            QuestionType::EventPrediction => "Previsão de Eventos",
            QuestionType::ReverseReasoning => "Raciocínio Reversivo",
            QuestionType::CounterfactualInference => "Inferência Contrafactual",
            QuestionType::Introspection => "Introspecção",
        }
    }
}

/// Maps a raw code to its display label, keeping unknown codes as they are
pub fn label_for(code: &str) -> &str {
    QuestionType::from_code(code)
        .map(|question_type| question_type.display_name())
        .unwrap_or(code)
}
