//! Approval rule catalog and reconciliation of risk classification outcomes.
//!
//! Administrators maintain a catalog of [`LocalApprovalRule`]s, each keyed by
//! a stable uid. A separate classification pass reduces each rule's condition
//! into either a [`ParsedApprovalRule`] (a recognised risk source and level)
//! or an [`UnrecognizedApprovalRule`]. Both refer back to the catalog by uid.
//!
//! [`resolve`] joins the three collections into an [`ApprovalConfig`]. The
//! collections are kept verbatim and in order; the join is exposed through
//! lookups. An outcome whose uid matches no rule is *unbound*: it stays in
//! the config and is reported by [`ApprovalConfig::unbound_outcomes`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::expr::Expr;

// ── Rules ───────────────────────────────────────────────────────

/// Approval flow attached to a rule. Opaque to reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTemplate {
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Ordered approval steps; each step lists the roles that may approve it.
    #[serde(default)]
    pub steps: Vec<ApprovalStep>,
}

/// One step of an approval flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Roles any one of which may approve this step.
    #[serde(default)]
    pub approvers: Vec<String>,
}

/// An administrator-defined approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalApprovalRule {
    /// Stable identifier; the join key for classification outcomes.
    pub uid: String,
    /// Condition selecting the risks this rule applies to.
    #[serde(default)]
    pub expr: Option<Expr>,
    /// Approval flow to run when the rule applies.
    #[serde(default)]
    pub template: ApprovalTemplate,
}

/// Ordered collection of rules with unique uids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleCatalog {
    rules: Vec<LocalApprovalRule>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl RuleCatalog {
    /// Build a catalog, rejecting duplicate uids.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateUid`] for the first repeated uid.
    pub fn new(rules: Vec<LocalApprovalRule>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for rule in rules {
            catalog.push(rule)?;
        }
        Ok(catalog)
    }

    /// Append a rule.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateUid`] if a rule with the same uid exists;
    /// the catalog is left unchanged.
    pub fn push(&mut self, rule: LocalApprovalRule) -> Result<(), CatalogError> {
        if self.index.contains_key(&rule.uid) {
            return Err(CatalogError::DuplicateUid { uid: rule.uid });
        }
        self.index.insert(rule.uid.clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// Rule with the given uid.
    pub fn get(&self, uid: &str) -> Option<&LocalApprovalRule> {
        self.index.get(uid).and_then(|&i| self.rules.get(i))
    }

    /// Whether a rule with the given uid exists.
    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> &[LocalApprovalRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ── Classification outcomes ─────────────────────────────────────

/// What kind of change a risk was classified from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskSource {
    /// Unknown source.
    SourceUnspecified,
    /// Schema change.
    Ddl,
    /// Data change.
    Dml,
    /// Database creation.
    CreateDatabase,
    /// Query access request.
    RequestQuery,
    /// Export access request.
    RequestExport,
}

/// A classification outcome with a recognised source and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedApprovalRule {
    /// Risk source.
    pub source: RiskSource,
    /// Risk level (e.g. 300 high, 200 moderate, 100 low, 0 default).
    pub level: i32,
    /// uid of the rule this outcome came from.
    pub rule: String,
}

/// A classification outcome whose condition could not be reduced to a
/// source and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrecognizedApprovalRule {
    /// The condition as classified, if any.
    #[serde(default)]
    pub expr: Option<Expr>,
    /// uid of the rule this outcome came from.
    pub rule: String,
}

// ── Reconciled view ─────────────────────────────────────────────

/// Result of looking up an outcome's rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleBinding<'a> {
    /// The uid names a rule in the catalog.
    Bound(&'a LocalApprovalRule),
    /// The uid names no rule.
    Unbound,
}

impl<'a> RuleBinding<'a> {
    /// The bound rule, if any.
    pub fn rule(self) -> Option<&'a LocalApprovalRule> {
        match self {
            Self::Bound(rule) => Some(rule),
            Self::Unbound => None,
        }
    }

    /// Whether the reference dangles.
    pub fn is_unbound(self) -> bool {
        matches!(self, Self::Unbound)
    }
}

/// An outcome whose rule uid is not in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnboundOutcome<'a> {
    /// Dangling parsed outcome.
    Parsed(&'a ParsedApprovalRule),
    /// Dangling unrecognized outcome.
    Unrecognized(&'a UnrecognizedApprovalRule),
}

impl UnboundOutcome<'_> {
    /// The uid that failed to resolve.
    pub fn rule(&self) -> &str {
        match self {
            Self::Parsed(p) => &p.rule,
            Self::Unrecognized(u) => &u.rule,
        }
    }
}

/// Reconciled approval settings: catalog plus classification outcomes.
///
/// Derived on demand; never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalConfig {
    /// Catalog rules in insertion order.
    pub rules: RuleCatalog,
    /// Parsed outcomes in input order.
    pub parsed: Vec<ParsedApprovalRule>,
    /// Unrecognized outcomes in input order.
    pub unrecognized: Vec<UnrecognizedApprovalRule>,
}

/// Reconcile a rule catalog with classification outcomes.
///
/// All three inputs are carried over unchanged. Dangling uids in the outcomes
/// are accepted.
///
/// # Errors
///
/// Returns [`CatalogError::DuplicateUid`] if two rules share a uid.
pub fn resolve(
    rules: Vec<LocalApprovalRule>,
    parsed: Vec<ParsedApprovalRule>,
    unrecognized: Vec<UnrecognizedApprovalRule>,
) -> Result<ApprovalConfig, CatalogError> {
    let rules = RuleCatalog::new(rules)?;
    let config = ApprovalConfig {
        rules,
        parsed,
        unrecognized,
    };

    let unbound = config.unbound_outcomes().len();
    if unbound > 0 {
        tracing::debug!(
            rules = config.rules.len(),
            parsed = config.parsed.len(),
            unrecognized = config.unrecognized.len(),
            unbound,
            "approval outcomes reference missing rules"
        );
    }
    Ok(config)
}

impl ApprovalConfig {
    /// Look up the rule named by `uid`.
    pub fn binding(&self, uid: &str) -> RuleBinding<'_> {
        match self.rules.get(uid) {
            Some(rule) => RuleBinding::Bound(rule),
            None => RuleBinding::Unbound,
        }
    }

    /// Parsed outcomes paired with the rule they resolve to.
    pub fn bound_parsed(&self) -> impl Iterator<Item = (&ParsedApprovalRule, &LocalApprovalRule)> {
        self.parsed
            .iter()
            .filter_map(|p| self.rules.get(&p.rule).map(|rule| (p, rule)))
    }

    /// Parsed outcomes whose rule uid is not in the catalog.
    pub fn unbound_parsed(&self) -> Vec<&ParsedApprovalRule> {
        self.parsed
            .iter()
            .filter(|p| !self.rules.contains(&p.rule))
            .collect()
    }

    /// Unrecognized outcomes whose rule uid is not in the catalog.
    pub fn unbound_unrecognized(&self) -> Vec<&UnrecognizedApprovalRule> {
        self.unrecognized
            .iter()
            .filter(|u| !self.rules.contains(&u.rule))
            .collect()
    }

    /// Every dangling outcome: parsed ones first, then unrecognized, each in input order.
    pub fn unbound_outcomes(&self) -> Vec<UnboundOutcome<'_>> {
        self.unbound_parsed()
            .into_iter()
            .map(UnboundOutcome::Parsed)
            .chain(
                self.unbound_unrecognized()
                    .into_iter()
                    .map(UnboundOutcome::Unrecognized),
            )
            .collect()
    }

    /// Catalog rules no outcome refers to.
    pub fn orphaned_rules(&self) -> Vec<&LocalApprovalRule> {
        let referenced: HashSet<&str> = self
            .parsed
            .iter()
            .map(|p| p.rule.as_str())
            .chain(self.unrecognized.iter().map(|u| u.rule.as_str()))
            .collect();
        self.rules
            .rules()
            .iter()
            .filter(|rule| !referenced.contains(rule.uid.as_str()))
            .collect()
    }

    /// Rule governing risks of `source` at `level`.
    ///
    /// First parsed outcome with that source and level whose rule exists.
    pub fn rule_for_risk(&self, source: RiskSource, level: i32) -> Option<&LocalApprovalRule> {
        self.bound_parsed()
            .find(|(p, _)| p.source == source && p.level == level)
            .map(|(_, rule)| rule)
    }
}
