//! Lead status taxonomy.
//!
//! One table drives both status normalization and the "qualified lead"
//! predicate, so the two views over the funnel vocabulary cannot drift
//! apart. Matching is case-insensitive substring matching over the
//! trimmed input, evaluated in priority order (some terms are substrings
//! of others, e.g. "rechazado cefemex" vs "rechazado").

use serde::{Serialize, Serializer};

/// Canonical, finite-vocabulary form of a lead's free-text status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalStatus {
    LeadQualified,
    LeadConditioned,
    Rejected,
    RejectedByPartner,
    DocumentationIntegration,
    FinancialReview,
    CommitteeAuthorization,
    Unknown,
    /// Unrecognized status, kept verbatim with the first letter capitalized.
    Other(String),
}

impl CanonicalStatus {
    /// Display string shown in tables and badges. These are the labels the
    /// funnel itself uses, so re-normalizing a label reproduces the same
    /// display string.
    pub fn label(&self) -> &str {
        match self {
            CanonicalStatus::LeadQualified => "Lead Calificado",
            CanonicalStatus::LeadConditioned => "Lead Condicionado",
            CanonicalStatus::Rejected => "Rechazado",
            CanonicalStatus::RejectedByPartner => "Rechazado CEFEMEX",
            CanonicalStatus::DocumentationIntegration => "Documentación / Integración E1",
            CanonicalStatus::FinancialReview => "Revisión Financiera / Integración E2",
            CanonicalStatus::CommitteeAuthorization => "Comité / Autorización",
            CanonicalStatus::Unknown => "Desconocido",
            CanonicalStatus::Other(s) => s,
        }
    }

    /// Whether this status counts as a qualified lead. The metrics
    /// aggregator and the table view both go through this, so the KPI
    /// count and the table contents always agree.
    pub fn is_qualified(&self) -> bool {
        is_qualified_str(self.label())
    }
}

impl Serialize for CanonicalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One taxonomy rule: substring needles, the canonical category they map
/// to (if any), and whether a match counts as qualified. Rules without a
/// category only feed the qualification predicate (e.g. "integración"
/// qualifies but has no dedicated normalized status).
struct TaxonomyRule {
    needles: &'static [&'static str],
    status: Option<CanonicalStatus>,
    qualifies: bool,
}

/// Priority-ordered taxonomy. First matching categorized rule wins for
/// normalization; qualification is an any-match over qualifying rules.
const TAXONOMY: &[TaxonomyRule] = &[
    TaxonomyRule {
        needles: &["rechazado cefemex"],
        status: Some(CanonicalStatus::RejectedByPartner),
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["documentacion", "documentación"],
        status: Some(CanonicalStatus::DocumentationIntegration),
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["financiera"],
        status: Some(CanonicalStatus::FinancialReview),
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["comité", "comite"],
        status: Some(CanonicalStatus::CommitteeAuthorization),
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["calificado"],
        status: Some(CanonicalStatus::LeadQualified),
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["condicionado"],
        status: Some(CanonicalStatus::LeadConditioned),
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["rechazado"],
        status: Some(CanonicalStatus::Rejected),
        qualifies: false,
    },
    TaxonomyRule {
        needles: &["integración", "integracion"],
        status: None,
        qualifies: true,
    },
    TaxonomyRule {
        needles: &["autorización", "autorizacion"],
        status: None,
        qualifies: true,
    },
];

/// Maps a free-text status into its canonical form.
///
/// Missing or empty input maps to `Unknown`; anything the taxonomy does
/// not recognize is kept as `Other` with the first letter capitalized.
/// Never fails — one unrecognized status must not blank a dashboard.
pub fn normalize(raw: Option<&str>) -> CanonicalStatus {
    let Some(raw) = raw else {
        return CanonicalStatus::Unknown;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CanonicalStatus::Unknown;
    }

    let lowered = trimmed.to_lowercase();
    for rule in TAXONOMY {
        let Some(ref status) = rule.status else {
            continue;
        };
        if rule.needles.iter().any(|n| lowered.contains(n)) {
            return status.clone();
        }
    }

    CanonicalStatus::Other(capitalize_first(trimmed))
}

/// Qualification predicate over a raw or canonical status string.
pub fn is_qualified_str(status: &str) -> bool {
    let lowered = status.trim().to_lowercase();
    if lowered.is_empty() {
        return false;
    }
    TAXONOMY
        .iter()
        .filter(|rule| rule.qualifies)
        .any(|rule| rule.needles.iter().any(|n| lowered.contains(n)))
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_STATUSES: &[CanonicalStatus] = &[
        CanonicalStatus::LeadQualified,
        CanonicalStatus::LeadConditioned,
        CanonicalStatus::Rejected,
        CanonicalStatus::RejectedByPartner,
        CanonicalStatus::DocumentationIntegration,
        CanonicalStatus::FinancialReview,
        CanonicalStatus::CommitteeAuthorization,
    ];

    #[test]
    fn normalizes_funnel_statuses() {
        assert_eq!(
            normalize(Some("Lead Calificado")),
            CanonicalStatus::LeadQualified
        );
        assert_eq!(
            normalize(Some("lead condicionado ")),
            CanonicalStatus::LeadConditioned
        );
        assert_eq!(normalize(Some("RECHAZADO")), CanonicalStatus::Rejected);
        assert_eq!(
            normalize(Some("Rechazado CEFEMEX por comité")),
            CanonicalStatus::RejectedByPartner
        );
        assert_eq!(
            normalize(Some("en documentación")),
            CanonicalStatus::DocumentationIntegration
        );
        assert_eq!(
            normalize(Some("revisión financiera")),
            CanonicalStatus::FinancialReview
        );
        assert_eq!(
            normalize(Some("comite de crédito")),
            CanonicalStatus::CommitteeAuthorization
        );
    }

    #[test]
    fn missing_or_empty_status_is_unknown() {
        assert_eq!(normalize(None), CanonicalStatus::Unknown);
        assert_eq!(normalize(Some("")), CanonicalStatus::Unknown);
        assert_eq!(normalize(Some("   ")), CanonicalStatus::Unknown);
    }

    #[test]
    fn unrecognized_status_capitalized_as_other() {
        assert_eq!(
            normalize(Some("en llamada")),
            CanonicalStatus::Other("En llamada".to_string())
        );
    }

    #[test]
    fn partner_rejection_wins_over_plain_rejection() {
        // "rechazado cefemex" contains "rechazado"; priority order decides.
        assert_eq!(
            normalize(Some("rechazado cefemex")),
            CanonicalStatus::RejectedByPartner
        );
    }

    #[test]
    fn fixed_labels_renormalize_to_themselves() {
        // Each canonical display string must match exactly its own rule.
        for status in FIXED_STATUSES {
            assert_eq!(
                normalize(Some(status.label())),
                *status,
                "label {:?} did not renormalize to its own status",
                status.label()
            );
        }
    }

    #[test]
    fn display_string_normalization_is_idempotent() {
        for raw in [
            "Lead Calificado",
            "Desconocido",
            "rechazado",
            "algo inesperado",
            "",
        ] {
            let once = normalize(Some(raw));
            let twice = normalize(Some(once.label()));
            assert_eq!(once.label(), twice.label(), "raw input {:?}", raw);
        }
    }

    #[test]
    fn qualification_matches_term_list() {
        assert!(is_qualified_str("Lead Calificado"));
        assert!(is_qualified_str("Lead Condicionado"));
        assert!(is_qualified_str("Rechazado CEFEMEX"));
        assert!(is_qualified_str("Integración E2"));
        assert!(is_qualified_str("Autorización pendiente"));
        assert!(!is_qualified_str("Rechazado"));
        assert!(!is_qualified_str("Desconocido"));
        assert!(!is_qualified_str(""));
    }

    #[test]
    fn canonical_qualification_agrees_with_string_predicate() {
        assert!(CanonicalStatus::LeadQualified.is_qualified());
        assert!(CanonicalStatus::RejectedByPartner.is_qualified());
        assert!(CanonicalStatus::DocumentationIntegration.is_qualified());
        assert!(CanonicalStatus::FinancialReview.is_qualified());
        assert!(CanonicalStatus::CommitteeAuthorization.is_qualified());
        assert!(!CanonicalStatus::Rejected.is_qualified());
        assert!(!CanonicalStatus::Unknown.is_qualified());
        assert!(!CanonicalStatus::Other("En llamada".into()).is_qualified());
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&CanonicalStatus::LeadQualified).unwrap();
        assert_eq!(json, "\"Lead Calificado\"");
    }
}
