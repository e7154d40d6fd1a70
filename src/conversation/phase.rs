//! SDLC phases, their keyword catalog, and keyword-based phase detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One stage of the software development lifecycle.
///
/// Declaration order is significant: it is the catalog order used to break
/// ties during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Requirements,
    Design,
    Development,
    Testing,
    Deployment,
    Maintenance,
}

impl Phase {
    /// All phases in catalog order.
    pub const ALL: [Phase; 6] = [
        Phase::Requirements,
        Phase::Design,
        Phase::Development,
        Phase::Testing,
        Phase::Deployment,
        Phase::Maintenance,
    ];

    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::Design => "design",
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::Maintenance => "maintenance",
        }
    }

    /// Returns the capitalized display title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Requirements => "Requirements",
            Self::Design => "Design",
            Self::Development => "Development",
            Self::Testing => "Testing",
            Self::Deployment => "Deployment",
            Self::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown SDLC phase: {0}")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == needle)
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

/// Keywords and suggestions for a single phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    /// Lowercase keywords matched as substrings.
    pub keywords: Vec<&'static str>,
    /// Suggestions, most relevant first.
    pub suggestions: Vec<&'static str>,
}

impl PhaseInfo {
    /// Number of distinct keywords occurring in an already-lowercased message.
    fn score(&self, lowered: &str) -> usize {
        self.keywords
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count()
    }

    /// The first suggestion, if any.
    #[must_use]
    pub fn first_suggestion(&self) -> Option<&'static str> {
        self.suggestions.first().copied()
    }
}

/// Static catalog of the six SDLC phases.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseCatalog {
    phases: Vec<PhaseInfo>,
}

impl Default for PhaseCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseCatalog {
    /// Build the standard catalog.
    #[must_use]
    pub fn new() -> Self {
        let phases = vec![
            PhaseInfo {
                phase: Phase::Requirements,
                keywords: vec![
                    "requirement",
                    "user story",
                    "stakeholder",
                    "specification",
                    "acceptance criteria",
                    "scope",
                    "use case",
                ],
                suggestions: vec![
                    "Start by identifying your stakeholders and capturing their goals as user stories.",
                    "Define measurable acceptance criteria for every requirement.",
                    "Prioritize requirements with a method such as MoSCoW.",
                    "Document non-functional requirements like performance and security early.",
                ],
            },
            PhaseInfo {
                phase: Phase::Design,
                keywords: vec![
                    "design",
                    "architecture",
                    "diagram",
                    "uml",
                    "pattern",
                    "interface",
                    "schema",
                ],
                suggestions: vec![
                    "Sketch a high-level architecture diagram before diving into component details.",
                    "Define clear interfaces between components to keep them loosely coupled.",
                    "Consider which design patterns fit the problem instead of forcing one.",
                    "Record key architectural decisions and their trade-offs.",
                ],
            },
            PhaseInfo {
                phase: Phase::Development,
                keywords: vec![
                    "code",
                    "implement",
                    "develop",
                    "programming",
                    "function",
                    "refactor",
                    "compile",
                ],
                suggestions: vec![
                    "Break the work into small, reviewable changes and commit often.",
                    "Follow a consistent coding standard and enforce it with a linter.",
                    "Write unit tests alongside the code you implement.",
                    "Use code reviews to share knowledge and catch defects early.",
                ],
            },
            PhaseInfo {
                phase: Phase::Testing,
                keywords: vec![
                    "test",
                    "qa",
                    "bug",
                    "integration",
                    "coverage",
                    "regression",
                    "quality assurance",
                ],
                suggestions: vec![
                    "Build a test pyramid: many unit tests, fewer integration tests, a handful of end-to-end tests.",
                    "Automate your regression suite and run it on every change.",
                    "Track coverage, but focus on testing critical paths and edge cases.",
                    "Write a failing test that reproduces each bug before fixing it.",
                ],
            },
            PhaseInfo {
                phase: Phase::Deployment,
                keywords: vec![
                    "deploy",
                    "release",
                    "ci/cd",
                    "pipeline",
                    "docker",
                    "kubernetes",
                    "production",
                ],
                suggestions: vec![
                    "Automate deployments with a CI/CD pipeline so releases are repeatable.",
                    "Use staged rollouts or feature flags to limit the blast radius of a release.",
                    "Keep environment configuration out of the build artifact.",
                    "Prepare and rehearse a rollback plan for every release.",
                ],
            },
            PhaseInfo {
                phase: Phase::Maintenance,
                keywords: vec![
                    "maintain",
                    "monitor",
                    "update",
                    "patch",
                    "performance",
                    "logging",
                    "support",
                ],
                suggestions: vec![
                    "Set up monitoring and alerting on the metrics that matter to users.",
                    "Schedule regular dependency updates and security patches.",
                    "Keep a backlog of technical debt and pay it down continuously.",
                    "Use structured logging so incidents can be diagnosed quickly.",
                ],
            },
        ];

        Self { phases }
    }

    /// All phase entries in catalog order.
    #[must_use]
    pub fn phases(&self) -> &[PhaseInfo] {
        &self.phases
    }

    /// Look up the entry for a phase.
    #[must_use]
    pub fn get(&self, phase: Phase) -> Option<&PhaseInfo> {
        self.phases.iter().find(|info| info.phase == phase)
    }

    /// Detect the best-matching phase for a message.
    ///
    /// Each phase scores one point per keyword found anywhere in the message,
    /// case-insensitively. The highest score wins; ties go to the phase that
    /// comes first in catalog order. A zero score yields `None`.
    #[must_use]
    pub fn detect(&self, message: &str) -> Option<Phase> {
        let lowered = message.to_lowercase();
        let mut best: Option<(Phase, usize)> = None;

        for info in &self.phases {
            let score = info.score(&lowered);
            if score == 0 {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((info.phase, score)),
            }
        }

        let detected = best.map(|(phase, _)| phase);
        tracing::trace!(?detected, "Phase detection");
        detected
    }

    /// Format the suggestion list shown when a phase is selected directly.
    #[must_use]
    pub fn format_suggestions(&self, phase: Phase) -> String {
        let Some(info) = self.get(phase) else {
            return String::new();
        };

        let mut out = format!("**{} Phase Suggestions:**\n", phase.title());
        for (i, suggestion) in info.suggestions.iter().enumerate() {
            out.push_str(&format!("\n{}. {suggestion}", i + 1));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_six_phases_in_order() {
        let catalog = PhaseCatalog::new();
        let order: Vec<Phase> = catalog.phases().iter().map(|p| p.phase).collect();
        assert_eq!(order, Phase::ALL.to_vec());
        for info in catalog.phases() {
            assert!(!info.keywords.is_empty());
            assert!(info.first_suggestion().is_some());
        }
    }

    #[test]
    fn test_no_keywords_is_none() {
        let catalog = PhaseCatalog::new();
        assert_eq!(catalog.detect("Hello there, how are you?"), None);
        assert_eq!(catalog.detect(""), None);
        assert_eq!(catalog.detect("   \n\t "), None);
    }

    #[test]
    fn test_each_keyword_alone_detects_its_phase() {
        let catalog = PhaseCatalog::new();
        for info in catalog.phases() {
            for keyword in &info.keywords {
                let message = format!("Could you help me with {keyword} today?");
                assert_eq!(
                    catalog.detect(&message),
                    Some(info.phase),
                    "keyword {keyword:?} should map to {}",
                    info.phase
                );
            }
        }
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        let catalog = PhaseCatalog::new();
        assert_eq!(catalog.detect("KUBERNETES rollout"), Some(Phase::Deployment));
        assert_eq!(catalog.detect("Our Stakeholder said no"), Some(Phase::Requirements));
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let catalog = PhaseCatalog::new();
        // "docker" three times is still one point; two design keywords win.
        let message = "docker docker docker, but what architecture diagram fits?";
        assert_eq!(catalog.detect(message), Some(Phase::Design));
    }

    #[test]
    fn test_highest_score_wins() {
        let catalog = PhaseCatalog::new();
        let message = "We need more test coverage and a regression suite for this function";
        assert_eq!(catalog.detect(message), Some(Phase::Testing));
    }

    #[test]
    fn test_tie_goes_to_earliest_phase() {
        let catalog = PhaseCatalog::new();
        // design: 1, testing: 1
        let message = "How should I design this test?";
        for _ in 0..5 {
            assert_eq!(catalog.detect(message), Some(Phase::Design));
        }
        // deployment: 1, maintenance: 1
        assert_eq!(
            catalog.detect("docker monitor"),
            Some(Phase::Deployment)
        );
    }

    #[test]
    fn test_substring_over_match_is_kept() {
        let catalog = PhaseCatalog::new();
        assert_eq!(catalog.detect("what is the latest news"), Some(Phase::Testing));
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("testing".parse::<Phase>(), Ok(Phase::Testing));
        assert_eq!(" Design ".parse::<Phase>(), Ok(Phase::Design));
        assert_eq!(
            "shipping".parse::<Phase>(),
            Err(UnknownPhase("shipping".to_string()))
        );
    }

    #[test]
    fn test_phase_serialize() {
        let json = serde_json::to_string(&Phase::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
        let parsed: Phase = serde_json::from_str("\"requirements\"").unwrap();
        assert_eq!(parsed, Phase::Requirements);
    }

    #[test]
    fn test_format_suggestions() {
        let catalog = PhaseCatalog::new();
        let text = catalog.format_suggestions(Phase::Deployment);
        assert!(text.starts_with("**Deployment Phase Suggestions:**"));
        assert!(text.contains("\n1. Automate deployments"));
        assert!(text.contains("\n4. "));
    }
}
