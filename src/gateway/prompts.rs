//! Prompt builders for every inference call the pipeline makes.
//!
//! Each builder states the exact JSON shape expected back; the call site
//! owns the matching deserialization type.

use super::JsonRequest;
use crate::scoring::CriterionDefinition;
use crate::vectordb::RetrievedChunk;

/// Batched coarse relevance filter over raw candidates.
pub fn initial_filter(
    company_profile: &str,
    search_phrase: &str,
    candidates: &[(usize, &str, &str)],
) -> JsonRequest {
    let listing = candidates
        .iter()
        .map(|(id, name, organization)| format!("{id}. \"{name}\" — {organization}"))
        .collect::<Vec<_>>()
        .join("\n");

    JsonRequest {
        operation: "initial_filter",
        system: format!(
            "You screen procurement tenders for a buyer. Based only on the tender \
             name and issuing organization, select the tenders that could be \
             relevant to the buyer's profile. When in doubt, include the tender.\n\
             Respond with JSON only, listing ONLY the relevant tenders:\n\
             {{\"relevant\": [{{\"id\": <number from the list>, \"name\": \"<tender name>\", \
             \"organization\": \"<organization>\"}}]}}\n\n\
             Buyer profile:\n{company_profile}"
        ),
        user: format!("Search phrase: {search_phrase}\n\nCandidate tenders:\n{listing}"),
    }
}

/// Per-criterion evaluation against retrieved document context.
pub fn criterion_evaluation(
    criterion: &CriterionDefinition,
    context: &[RetrievedChunk],
    language: &str,
) -> JsonRequest {
    let context_block = if context.is_empty() {
        "(no matching document passages found)".to_string()
    } else {
        context
            .iter()
            .map(|c| format!("[{} #{}] {}", c.source_file, c.chunk_index, c.text))
            .collect::<Vec<_>>()
            .join("\n---\n")
    };

    let extra = criterion
        .instruction
        .as_deref()
        .map(|i| format!("\nAdditional instruction: {i}"))
        .unwrap_or_default();

    JsonRequest {
        operation: "criterion_evaluation",
        system: format!(
            "You evaluate one criterion against passages extracted from tender \
             documents. Judge only from the passages; do not invent facts. \
             Answer in {language}.\n\
             Respond with JSON only, in the form:\n\
             {{\"criteria\": \"{name}\", \"summary\": \"<evidence summary>\", \
             \"confidence\": \"LOW\"|\"MEDIUM\"|\"HIGH\", \"criteria_met\": true|false}}",
            name = criterion.name,
        ),
        user: format!(
            "Criterion: {name}\nQuestion: {description}{extra}\n\nDocument passages:\n{context_block}",
            name = criterion.name,
            description = criterion.description,
        ),
    }
}

/// Natural-language description (plus location fields) for one tender.
pub fn description(seed_text: &str, context: &[RetrievedChunk], language: &str) -> JsonRequest {
    let context_block = context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n");

    JsonRequest {
        operation: "description",
        system: format!(
            "You summarize procurement tenders for busy bid managers. Write a \
             factual description in {language}: subject, scope, buyer and key \
             dates if present. Also extract the delivery location when stated.\n\
             Respond with JSON only, in the form:\n\
             {{\"description\": \"<3-6 sentences>\", \"city\": \"<city or null>\", \
             \"region\": \"<region or null>\"}}"
        ),
        user: format!("Tender page summary:\n{seed_text}\n\nDocument passages:\n{context_block}"),
    }
}

/// Batched description-based filter over assembled analysis results.
pub fn description_filter(
    company_profile: &str,
    filtering_rules: Option<&str>,
    items: &[(usize, &str)],
) -> JsonRequest {
    let listing = items
        .iter()
        .map(|(id, description)| format!("{id}. {description}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    let rules = filtering_rules
        .map(|r| format!("\nAdditional filtering rules (binding):\n{r}"))
        .unwrap_or_default();

    JsonRequest {
        operation: "description_filter",
        system: format!(
            "You make the final relevance decision for analyzed tenders based on \
             their generated descriptions and the buyer's profile. Reject tenders \
             that clearly do not fit.\n\
             Respond with JSON only, in the form:\n\
             {{\"verdicts\": [{{\"id\": <number from the list>, \"keep\": true|false, \
             \"reason\": \"<short reason>\"}}]}}\n\
             Return one verdict per listed tender.\n\n\
             Buyer profile:\n{company_profile}{rules}"
        ),
        user: format!("Analyzed tenders:\n{listing}"),
    }
}
