//! Context builder: renders matched entries into the text block handed to the composer.

use crate::matcher::MatchCandidate;

/// Emitted when nothing matched.
pub const NO_MATCHES_NOTICE: &str =
    "No se encontraron coincidencias directas en la base de síntomas locales.";

/// One line per candidate, in candidate order:
/// `- <title>: <description> Síntomas comunes: <s1, s2, ...>.`
pub fn build_context(candidates: &[MatchCandidate]) -> String {
    if candidates.is_empty() {
        return NO_MATCHES_NOTICE.to_string();
    }
    candidates
        .iter()
        .map(|c| {
            format!(
                "- {}: {} Síntomas comunes: {}.",
                c.entry.title,
                c.entry.description,
                c.entry.common_symptoms.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
