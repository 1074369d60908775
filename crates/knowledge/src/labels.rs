//! Locale-specific strings used in chunk headers, context blocks and fallback answers.

use medrag_core::Locale;

/// Fixed strings for one response language.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    /// Chunk header label preceding the document title
    pub title: &'static str,
    /// Chunk header label preceding the source URL
    pub source: &'static str,
    /// First line of a non-empty context block
    pub context_heading: &'static str,
    /// Per-document line prefix in the context block
    pub document: &'static str,
    /// Relevance label inside the per-document line
    pub relevance: &'static str,
    /// Label preceding the chunk content
    pub content: &'static str,
    /// Title used when a result has none
    pub untitled: &'static str,
    /// Context used when retrieval found nothing
    pub no_context: &'static str,
    /// Apology prefix used when generation fails
    pub apology: &'static str,
    /// Closing instruction appended to the apology
    pub contact_staff: &'static str,
    /// Recommendation appended when the model omitted it
    pub consult_recommendation: &'static str,
    /// Substrings that show the recommendation is already present
    pub consult_markers: &'static [&'static str],
}

const HEBREW: Labels = Labels {
    title: "כותרת",
    source: "מקור",
    context_heading: "מידע רלוונטי ממאגר המסמכים:",
    document: "מסמך",
    relevance: "רלוונטיות",
    content: "תוכן",
    untitled: "ללא כותרת",
    no_context: "לא נמצא מידע רלוונטי במאגר המסמכים.",
    apology: "מצטער, אירעה שגיאה בעת יצירת התשובה",
    contact_staff: "אנא פנה לצוות הרפואי לקבלת מידע מדויק.",
    consult_recommendation:
        "מומלץ להתייעץ עם רופא או איש מקצוע רפואי מוסמך בכל שאלה הנוגעת למצבך הרפואי.",
    consult_markers: &["רופא", "צוות הרפואי", "ייעוץ רפואי", "איש מקצוע"],
};

const ENGLISH: Labels = Labels {
    title: "title",
    source: "source",
    context_heading: "Relevant information from the document collection:",
    document: "Document",
    relevance: "relevance",
    content: "content",
    untitled: "Untitled",
    no_context: "No relevant information was found in the document collection.",
    apology: "Sorry, an error occurred while generating the answer",
    contact_staff: "Please contact the medical staff for accurate information.",
    consult_recommendation:
        "Please consult a physician or qualified medical professional about your specific situation.",
    consult_markers: &["physician", "doctor", "medical professional", "medical staff"],
};

/// Labels for the given locale.
pub fn labels(locale: Locale) -> &'static Labels {
    match locale {
        Locale::Hebrew => &HEBREW,
        Locale::English => &ENGLISH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_differs_from_heading() {
        for locale in [Locale::Hebrew, Locale::English] {
            let l = labels(locale);
            assert!(!l.no_context.is_empty());
            assert!(!l.no_context.starts_with(l.context_heading));
        }
    }

    #[test]
    fn test_recommendation_matches_own_markers() {
        for locale in [Locale::Hebrew, Locale::English] {
            let l = labels(locale);
            let lower = l.consult_recommendation.to_lowercase();
            assert!(l.consult_markers.iter().any(|m| lower.contains(m)));
        }
    }
}
