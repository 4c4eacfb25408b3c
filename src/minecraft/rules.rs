use std::env::consts;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the version manifests call the platform we're on.
pub fn current_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "osx"
    } else {
        consts::OS
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOs {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    pub os: Option<RuleOs>,
    /// Kept opaque on purpose, only its presence is ever consulted.
    pub features: Option<Map<String, Value>>,
}

impl Rule {
    /// A rule without an os constraint matches every platform.
    pub fn matches_os(&self, os: &str) -> bool {
        match &self.os {
            Some(RuleOs { name: Some(name) }) => name.eq_ignore_ascii_case(os),
            _ => true,
        }
    }

    pub fn references_features(&self) -> bool {
        self.features.is_some()
    }
}

/// Folds over the whole list in order, no early exit. An allow rule that
/// doesn't match clears the entry, a disallow rule that does match clears
/// it too; nothing ever sets it back. No rules at all means included.
pub fn rules_allow(rules: &[Rule], os: &str) -> bool {
    let mut include = true;
    for rule in rules {
        let matched = rule.matches_os(os);
        match rule.action {
            RuleAction::Allow if !matched => include = false,
            RuleAction::Disallow if matched => include = false,
            _ => {}
        }
    }

    include
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_rule(action: RuleAction, name: Option<&str>) -> Rule {
        Rule {
            action,
            os: name.map(|n| RuleOs {
                name: Some(n.to_string()),
            }),
            features: None,
        }
    }

    #[test]
    fn empty_rule_list_includes() {
        assert!(rules_allow(&[], "windows"));
        assert!(rules_allow(&[], "linux"));
    }

    #[test]
    fn allow_for_one_platform_excludes_the_rest() {
        let rules = [os_rule(RuleAction::Allow, Some("windows"))];
        assert!(rules_allow(&rules, "windows"));
        assert!(!rules_allow(&rules, "linux"));
    }

    #[test]
    fn unconstrained_allow_matches_everywhere() {
        let rules = [os_rule(RuleAction::Allow, None)];
        assert!(rules_allow(&rules, "windows"));
        assert!(rules_allow(&rules, "osx"));
    }

    #[test]
    fn disallow_only_hits_the_named_platform() {
        let rules = [
            os_rule(RuleAction::Allow, None),
            os_rule(RuleAction::Disallow, Some("osx")),
        ];
        assert!(rules_allow(&rules, "windows"));
        assert!(rules_allow(&rules, "linux"));
        assert!(!rules_allow(&rules, "osx"));
    }

    #[test]
    fn unconstrained_disallow_always_clears() {
        let rules = [os_rule(RuleAction::Disallow, None)];
        assert!(!rules_allow(&rules, "windows"));
    }

    #[test]
    fn later_rules_are_still_applied_after_a_clear() {
        // once cleared nothing turns the entry back on
        let rules = [
            os_rule(RuleAction::Allow, Some("linux")),
            os_rule(RuleAction::Allow, None),
        ];
        assert!(!rules_allow(&rules, "windows"));
    }

    #[test]
    fn os_names_compare_case_insensitively() {
        let rules = [os_rule(RuleAction::Allow, Some("Windows"))];
        assert!(rules_allow(&rules, "windows"));
    }

    #[test]
    fn feature_rules_do_not_constrain_the_os_fold() {
        let rule = Rule {
            action: RuleAction::Allow,
            os: None,
            features: Some(Map::new()),
        };
        assert!(rule.references_features());
        assert!(rules_allow(&[rule], "windows"));
    }
}
