//! Classification and consistency checking.
//!
//! The whole graph is classified at once under a closed-world reading with
//! unique names: an individual satisfies `∃p.C` only if a *recorded* `p` edge
//! reaches a `C`, and distinct names are distinct individuals. This is what
//! the defined classes and rules of the ontology are meant to compute over a
//! batch-built graph.
//!
//! Consistency is checked first. An inconsistent graph yields its violations
//! and no inferences, so "inconsistent" is never confused with "nothing
//! inferred".

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::axioms::{self, ClassExpr, PropertyExpr, Restricted, Rule};
use crate::graph::KnowledgeGraph;
use crate::model::Literal;
use crate::schema::{Class, DataProperty, ObjectProperty, Property, PublicationStatus};

/// Result of classifying a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Consistent(Inferences),
    Inconsistent(Vec<Violation>),
}

impl Classification {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent(_))
    }

    pub fn inferences(&self) -> Option<&Inferences> {
        match self {
            Self::Consistent(inferences) => Some(inferences),
            Self::Inconsistent(_) => None,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Consistent(_) => &[],
            Self::Inconsistent(violations) => violations,
        }
    }
}

/// An axiom broken by specific individuals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub axiom: String,
    pub subjects: Vec<String>,
    pub detail: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} violated by {}: {}",
            self.axiom,
            self.subjects.join(", "),
            self.detail
        )
    }
}

/// Derived class memberships and derived relations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inferences {
    memberships: BTreeMap<Class, BTreeSet<String>>,
    relations: BTreeMap<ObjectProperty, BTreeSet<(String, String)>>,
}

impl Inferences {
    pub fn is_member(&self, class: Class, name: &str) -> bool {
        self.memberships
            .get(&class)
            .is_some_and(|members| members.contains(name))
    }

    pub fn members(&self, class: Class) -> impl Iterator<Item = &str> {
        self.memberships
            .get(&class)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn count(&self, class: Class) -> usize {
        self.memberships.get(&class).map_or(0, BTreeSet::len)
    }

    /// Every derived class with its member count, including empty ones.
    pub fn class_counts(&self) -> impl Iterator<Item = (Class, usize)> + '_ {
        self.memberships.iter().map(|(c, m)| (*c, m.len()))
    }

    pub fn related(&self, property: ObjectProperty) -> impl Iterator<Item = (&str, &str)> {
        self.relations
            .get(&property)
            .into_iter()
            .flatten()
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn relation_count(&self, property: ObjectProperty) -> usize {
        self.relations.get(&property).map_or(0, BTreeSet::len)
    }

    /// Derived classes per individual, for writing them back as `rdf:type`.
    pub fn classes_by_individual(&self) -> FxHashMap<&str, Vec<Class>> {
        let mut by_name: FxHashMap<&str, Vec<Class>> = FxHashMap::default();
        for (class, members) in &self.memberships {
            for name in members {
                by_name.entry(name.as_str()).or_default().push(*class);
            }
        }
        by_name
    }

    /// Derived relations per subject, as `(property, object)`.
    pub fn relations_by_subject(&self) -> FxHashMap<&str, Vec<(ObjectProperty, &str)>> {
        let mut by_subject: FxHashMap<&str, Vec<(ObjectProperty, &str)>> = FxHashMap::default();
        for (property, pairs) in &self.relations {
            for (a, b) in pairs {
                by_subject.entry(a.as_str()).or_default().push((*property, b.as_str()));
            }
        }
        by_subject
    }

    /// Number of membership plus relation assertions.
    pub fn total(&self) -> usize {
        self.memberships.values().map(BTreeSet::len).sum::<usize>()
            + self.relations.values().map(BTreeSet::len).sum::<usize>()
    }
}

/// Indexed view of the graph used for evaluation.
struct Facts<'g> {
    order: Vec<&'g str>,
    class_of: FxHashMap<&'g str, Class>,
    forward: FxHashMap<(&'g str, ObjectProperty), Vec<&'g str>>,
    backward: FxHashMap<(&'g str, ObjectProperty), Vec<&'g str>>,
    data: FxHashMap<(&'g str, DataProperty), Vec<Literal>>,
}

impl<'g> Facts<'g> {
    fn build(graph: &'g KnowledgeGraph) -> Self {
        let mut facts = Facts {
            order: Vec::with_capacity(graph.len()),
            class_of: FxHashMap::default(),
            forward: FxHashMap::default(),
            backward: FxHashMap::default(),
            data: FxHashMap::default(),
        };
        for individual in graph.individuals() {
            let name = individual.name();
            facts.order.push(name);
            facts.class_of.insert(name, individual.class());
            for (property, target) in individual.object_values() {
                facts.add_edge(name, property, target);
            }
            for (property, value) in individual.data_values() {
                facts.data.entry((name, property)).or_default().push(value);
            }
        }
        // Rejected functional values still count as asserted
        for conflict in graph.conflicts() {
            let subject = conflict.subject.as_str();
            match conflict.property {
                Property::Object(p) => facts.add_edge(subject, p, &conflict.value),
                Property::Data(p) => {
                    let value = Literal::parse(p.range(), &conflict.value)
                        .unwrap_or_else(|| Literal::Text(conflict.value.clone()));
                    facts.data.entry((subject, p)).or_default().push(value);
                }
            }
        }
        facts
    }

    fn add_edge(&mut self, subject: &'g str, property: ObjectProperty, target: &'g str) {
        let targets = self.forward.entry((subject, property)).or_default();
        if !targets.contains(&target) {
            targets.push(target);
            self.backward.entry((target, property)).or_default().push(subject);
        }
    }

    fn successors(&self, name: &'g str, property: PropertyExpr) -> &[&'g str] {
        let found = match property {
            PropertyExpr::Direct(p) => self.forward.get(&(name, p)),
            PropertyExpr::Inverse(p) => self.backward.get(&(name, p)),
        };
        found.map(Vec::as_slice).unwrap_or(&[])
    }

    fn data_count(&self, name: &'g str, property: DataProperty) -> usize {
        self.data.get(&(name, property)).map_or(0, |values| {
            values.iter().collect::<FxHashSet<_>>().len()
        })
    }

    fn instance_of(&self, name: &'g str, class: Class) -> bool {
        if let Some(expr) = axioms::definition(class) {
            return self.holds(name, &expr);
        }
        if class == Class::PublicationStatus {
            return PublicationStatus::from_local_name(name).is_some();
        }
        self.class_of.get(name).is_some_and(|c| c.is_a(class))
    }

    fn holds(&self, name: &'g str, expr: &ClassExpr) -> bool {
        match expr {
            ClassExpr::Named(class) => self.instance_of(name, *class),
            ClassExpr::And(parts) => parts.iter().all(|e| self.holds(name, e)),
            ClassExpr::Or(parts) => parts.iter().any(|e| self.holds(name, e)),
            ClassExpr::Not(inner) => !self.holds(name, inner),
            ClassExpr::Some(property, filler) => self
                .successors(name, *property)
                .iter()
                .any(|&t| self.holds(t, filler)),
            ClassExpr::HasValue(property) => self.data_count(name, *property) > 0,
            ClassExpr::Count(cardinality, property, filler) => {
                let n = self
                    .successors(name, *property)
                    .iter()
                    .filter(|&&t| self.holds(t, filler))
                    .count();
                cardinality.admits(n)
            }
        }
    }

    fn members(&self, expr: &ClassExpr) -> BTreeSet<String> {
        self.order
            .iter()
            .copied()
            .filter(|&name| self.holds(name, expr))
            .map(|name| name.to_string())
            .collect()
    }

    fn shared_target_pairs(
        &self,
        via: ObjectProperty,
        at: ObjectProperty,
    ) -> BTreeSet<(String, String)> {
        let mut pairs = BTreeSet::new();
        for &a1 in &self.order {
            for &x in self.successors(a1, PropertyExpr::Direct(via)) {
                for &target in self.successors(x, PropertyExpr::Direct(at)) {
                    for &y in self.successors(target, PropertyExpr::Inverse(at)) {
                        for &a2 in self.successors(y, PropertyExpr::Inverse(via)) {
                            if a1 != a2 {
                                pairs.insert((a1.to_string(), a2.to_string()));
                            }
                        }
                    }
                }
            }
        }
        pairs
    }

    fn violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for restriction in axioms::restrictions() {
            for &name in &self.order {
                if !self.instance_of(name, restriction.class) {
                    continue;
                }
                let found = match restriction.on {
                    Restricted::Object(p, filler) => self
                        .successors(name, PropertyExpr::Direct(p))
                        .iter()
                        .filter(|&&t| self.instance_of(t, filler))
                        .count(),
                    Restricted::Data(p) => self.data_count(name, p),
                };
                if !restriction.cardinality.admits(found) {
                    violations.push(Violation {
                        axiom: restriction.to_string(),
                        subjects: vec![name.to_string()],
                        detail: format!("found {found}"),
                    });
                }
            }
        }

        for &name in &self.order {
            for p in ObjectProperty::ALL.into_iter().filter(|p| p.is_functional()) {
                let n = self.successors(name, PropertyExpr::Direct(p)).len();
                if n > 1 {
                    violations.push(functional_violation(name, Property::Object(p), n));
                }
            }
            for p in DataProperty::ALL.into_iter().filter(|p| p.is_functional()) {
                let n = self.data_count(name, p);
                if n > 1 {
                    violations.push(functional_violation(name, Property::Data(p), n));
                }
            }
        }

        for p in DataProperty::ALL.into_iter().filter(|p| p.is_inverse_functional()) {
            let mut holders: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
            for &name in &self.order {
                for value in self.data.get(&(name, p)).into_iter().flatten() {
                    holders.entry(value.lexical()).or_default().insert(name);
                }
            }
            for (value, subjects) in holders {
                if subjects.len() > 1 {
                    violations.push(Violation {
                        axiom: format!("{p} is inverse functional"),
                        subjects: subjects.into_iter().map(str::to_string).collect(),
                        detail: format!("shared value '{value}'"),
                    });
                }
            }
        }

        violations
    }
}

fn functional_violation(name: &str, property: Property, n: usize) -> Violation {
    Violation {
        axiom: format!("{property} is functional"),
        subjects: vec![name.to_string()],
        detail: format!("{n} distinct values"),
    }
}

/// Check every cardinality, functional and inverse-functional axiom.
pub fn check_consistency(graph: &KnowledgeGraph) -> Vec<Violation> {
    Facts::build(graph).violations()
}

/// Classify the whole graph: consistency first, then defined classes, then
/// rules.
pub fn classify(graph: &KnowledgeGraph) -> Classification {
    let facts = Facts::build(graph);

    let violations = facts.violations();
    if !violations.is_empty() {
        log::warn!("graph is inconsistent: {} violation(s)", violations.len());
        return Classification::Inconsistent(violations);
    }

    let mut inferences = Inferences::default();
    for (class, expr) in axioms::defined_classes() {
        inferences.memberships.insert(class, facts.members(&expr));
    }
    for rule in axioms::rules() {
        match rule {
            Rule::Class { head, body, .. } => {
                let members = facts.members(&body);
                inferences.memberships.entry(head).or_default().extend(members);
            }
            Rule::SharedTarget { head, via, at, .. } => {
                let pairs = facts.shared_target_pairs(via, at);
                inferences.relations.entry(head).or_default().extend(pairs);
            }
        }
    }

    log::debug!("classification produced {} assertions", inferences.total());
    Classification::Consistent(inferences)
}
