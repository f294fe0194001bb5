//! Starter entries written the first time a store is opened against an empty backend.

use super::store::{KnowledgeEntry, KnowledgeMap};

/// The fixed starter set: general cancer information plus breast and lung cancer.
pub fn starter_entries() -> KnowledgeMap {
    let mut entries = KnowledgeMap::new();
    entries.insert(
        "cancer_general".to_string(),
        KnowledgeEntry::new(
            "Información general sobre el cáncer",
            "El cáncer es un conjunto de enfermedades caracterizadas por un crecimiento celular anormal. Los síntomas varían según el tipo y la etapa.",
            [
                "fatiga inusual",
                "pérdida de peso inexplicada",
                "dolor persistente",
                "bultos o masas palpables",
                "cambios en la piel",
                "sangrado anormal",
            ],
            "Esta entrada es informativa — no substituye la opinión de un profesional de la salud.",
        ),
    );
    entries.insert(
        "breast_cancer".to_string(),
        KnowledgeEntry::new(
            "Cáncer de mama",
            "Síntomas frecuentes de cáncer de mama incluyen bultos en la mama, cambios en la piel de la mama o secreción por el pezón.",
            [
                "bulto en la mama",
                "cambios en la piel de la mama",
                "secreción por el pezón",
                "dolor mamario persistente",
            ],
            "Ante la aparición de cualquier bulto o cambio, consulte a un profesional cuanto antes.",
        ),
    );
    entries.insert(
        "lung_cancer".to_string(),
        KnowledgeEntry::new(
            "Cáncer de pulmón",
            "Síntomas pueden incluir tos persistente, sangre al toser, dificultad para respirar y dolor torácico.",
            [
                "tos persistente",
                "hemoptisis (sangre al toser)",
                "dificultad para respirar",
                "dolor torácico",
            ],
            "Fumar y exposición a ciertos carcinógenos aumentan el riesgo.",
        ),
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_set_has_three_entries_with_symptoms() {
        let entries = starter_entries();
        assert_eq!(entries.len(), 3);
        for id in ["cancer_general", "breast_cancer", "lung_cancer"] {
            let entry = entries.get(id).expect(id);
            assert!(!entry.title.is_empty());
            assert!(!entry.common_symptoms.is_empty());
        }
    }

    #[test]
    fn general_entry_keeps_original_notes() {
        let entries = starter_entries();
        assert_eq!(
            entries["cancer_general"].notes,
            "Esta entrada es informativa — no substituye la opinión de un profesional de la salud."
        );
    }
}
