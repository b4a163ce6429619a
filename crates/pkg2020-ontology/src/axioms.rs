//! Axioms layered over the vocabulary: cardinality restrictions, defined
//! (equivalent) classes and SWRL-style rules.
//!
//! These are declared once and shared by the snapshot writer (which emits
//! them as OWL) and the classifier (which evaluates them).

use crate::schema::{Class, DataProperty, ObjectProperty};

/// A property used inside a class expression, optionally traversed backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyExpr {
    Direct(ObjectProperty),
    Inverse(ObjectProperty),
}

/// Class expressions needed by the PKG2020 definitions.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassExpr {
    Named(Class),
    And(Vec<ClassExpr>),
    Or(Vec<ClassExpr>),
    Not(Box<ClassExpr>),
    /// `∃ p . C`
    Some(PropertyExpr, Box<ClassExpr>),
    /// `∃ p . xsd:*` for a data property
    HasValue(DataProperty),
    /// Qualified cardinality `p (min|exactly|max) n C`
    Count(Cardinality, PropertyExpr, Box<ClassExpr>),
}

impl ClassExpr {
    pub fn named(class: Class) -> Self {
        Self::Named(class)
    }

    pub fn some(property: ObjectProperty, filler: Class) -> Self {
        Self::Some(PropertyExpr::Direct(property), Box::new(Self::Named(filler)))
    }

    pub fn count(cardinality: Cardinality, property: PropertyExpr, filler: Class) -> Self {
        Self::Count(cardinality, property, Box::new(Self::Named(filler)))
    }

    pub fn not(inner: ClassExpr) -> Self {
        Self::Not(Box::new(inner))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Min(u32),
    Exactly(u32),
    Max(u32),
}

impl Cardinality {
    pub fn admits(self, n: usize) -> bool {
        let n = n as u64;
        match self {
            Self::Min(m) => n >= u64::from(m),
            Self::Exactly(m) => n == u64::from(m),
            Self::Max(m) => n <= u64::from(m),
        }
    }

    pub fn bound(self) -> u32 {
        match self {
            Self::Min(m) | Self::Exactly(m) | Self::Max(m) => m,
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Min(n) => write!(f, "min {n}"),
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::Max(n) => write!(f, "max {n}"),
        }
    }
}

/// Target of a cardinality restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restricted {
    Object(ObjectProperty, Class),
    Data(DataProperty),
}

/// `class ⊑ property cardinality filler`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restriction {
    pub class: Class,
    pub on: Restricted,
    pub cardinality: Cardinality,
}

impl std::fmt::Display for Restriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.on {
            Restricted::Object(p, filler) => {
                write!(f, "{} ⊑ {p} {} {filler}", self.class, self.cardinality)
            }
            Restricted::Data(p) => write!(f, "{} ⊑ {p} {}", self.class, self.cardinality),
        }
    }
}

/// Subclass restrictions asserted on the base classes.
pub fn restrictions() -> [Restriction; 3] {
    [
        Restriction {
            class: Class::Article,
            on: Restricted::Object(ObjectProperty::WrittenBy, Class::Author),
            cardinality: Cardinality::Min(1),
        },
        Restriction {
            class: Class::Article,
            on: Restricted::Data(DataProperty::HasPmid),
            cardinality: Cardinality::Exactly(1),
        },
        Restriction {
            class: Class::Article,
            on: Restricted::Object(ObjectProperty::HasStatus, Class::PublicationStatus),
            cardinality: Cardinality::Max(1),
        },
    ]
}

/// Equivalent-class definition of a defined class.
pub fn definition(class: Class) -> Option<ClassExpr> {
    use ClassExpr as E;

    let author = || E::named(Class::Author);
    let article = || E::named(Class::Article);
    let written_by = PropertyExpr::Direct(ObjectProperty::WrittenBy);

    let expr = match class {
        Class::ActiveAuthor => E::And(vec![
            author(),
            E::HasValue(DataProperty::CareerStartYear),
        ]),
        Class::AnonymousAuthor => E::And(vec![
            author(),
            E::not(E::named(Class::ActiveAuthor)),
        ]),
        Class::ResearchEntity => E::Or(vec![author(), article()]),
        Class::ProlificAuthor => E::And(vec![
            author(),
            E::count(
                Cardinality::Min(5),
                PropertyExpr::Inverse(ObjectProperty::WrittenBy),
                Class::Article,
            ),
        ]),
        Class::SingleAuthorArticle => E::And(vec![
            article(),
            E::count(Cardinality::Exactly(1), written_by, Class::Author),
        ]),
        Class::MultiAuthorArticle => E::And(vec![
            article(),
            E::count(Cardinality::Min(2), written_by, Class::Author),
        ]),
        Class::FundedAuthor => E::And(vec![
            author(),
            E::some(ObjectProperty::HasProject, Class::NihProject),
        ]),
        _ => return None,
    };
    Some(expr)
}

/// Defined classes in evaluation order.
pub fn defined_classes() -> impl Iterator<Item = (Class, ClassExpr)> {
    Class::ALL
        .into_iter()
        .filter_map(|c| definition(c).map(|expr| (c, expr)))
}

/// Horn-style rules evaluated after the defined classes.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `head(x) ← body(x)`
    Class {
        head: Class,
        body: ClassExpr,
        text: &'static str,
    },
    /// `head(a, b) ← via(a, x) ∧ at(x, t) ∧ at(y, t) ∧ via(b, y) ∧ a ≠ b`
    SharedTarget {
        head: ObjectProperty,
        via: ObjectProperty,
        at: ObjectProperty,
        text: &'static str,
    },
}

impl Rule {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Class { text, .. } | Self::SharedTarget { text, .. } => text,
        }
    }
}

pub fn rules() -> Vec<Rule> {
    use ClassExpr as E;

    vec![
        Rule::Class {
            head: Class::FundedAuthor,
            body: E::And(vec![
                E::named(Class::Author),
                E::some(ObjectProperty::HasProject, Class::NihProject),
            ]),
            text: "Author(?a) ^ hasProject(?a, ?p) ^ NIHProject(?p) -> FundedAuthor(?a)",
        },
        Rule::Class {
            head: Class::EstablishedResearcher,
            body: E::And(vec![
                E::named(Class::Author),
                E::some(ObjectProperty::HasEmployment, Class::Employment),
                E::some(ObjectProperty::HasEducation, Class::Education),
            ]),
            text: "Author(?a) ^ hasEmployment(?a, ?e) ^ hasEducation(?a, ?d) -> EstablishedResearcher(?a)",
        },
        Rule::Class {
            head: Class::CollaborativeArticle,
            body: E::And(vec![
                E::named(Class::Article),
                E::count(
                    Cardinality::Min(2),
                    PropertyExpr::Direct(ObjectProperty::WrittenBy),
                    Class::Author,
                ),
            ]),
            text: "Article(?x) ^ writtenBy(?x, ?a1) ^ writtenBy(?x, ?a2) ^ differentFrom(?a1, ?a2) -> CollaborativeArticle(?x)",
        },
        Rule::Class {
            head: Class::GeneDiseaseLinkArticle,
            body: E::And(vec![
                E::named(Class::Article),
                E::some(ObjectProperty::MentionsBioEntity, Class::Gene),
                E::some(ObjectProperty::MentionsBioEntity, Class::Disease),
            ]),
            text: "Article(?x) ^ mentionsBioEntity(?x, ?g) ^ Gene(?g) ^ mentionsBioEntity(?x, ?d) ^ Disease(?d) -> GeneDiseaseLinkArticle(?x)",
        },
        Rule::SharedTarget {
            head: ObjectProperty::IsAlumniPeerOf,
            via: ObjectProperty::HasEducation,
            at: ObjectProperty::EducatedAt,
            text: "hasEducation(?a1, ?e1) ^ educatedAt(?e1, ?i) ^ hasEducation(?a2, ?e2) ^ educatedAt(?e2, ?i) ^ differentFrom(?a1, ?a2) -> isAlumniPeerOf(?a1, ?a2)",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_defined_class_has_a_definition() {
        let defined: Vec<Class> = defined_classes().map(|(c, _)| c).collect();
        assert_eq!(
            defined,
            vec![
                Class::ActiveAuthor,
                Class::AnonymousAuthor,
                Class::ResearchEntity,
                Class::ProlificAuthor,
                Class::SingleAuthorArticle,
                Class::MultiAuthorArticle,
                Class::FundedAuthor,
            ]
        );
        for (class, _) in defined_classes() {
            assert!(class.is_derived());
        }
    }

    #[test]
    fn rule_heads_are_derived() {
        for rule in rules() {
            match rule {
                Rule::Class { head, .. } => assert!(head.is_derived()),
                Rule::SharedTarget { head, .. } => assert!(head.is_derived()),
            }
        }
    }

    #[test]
    fn cardinality_admits() {
        assert!(Cardinality::Min(1).admits(1));
        assert!(!Cardinality::Min(1).admits(0));
        assert!(Cardinality::Exactly(1).admits(1));
        assert!(!Cardinality::Exactly(1).admits(2));
        assert!(Cardinality::Max(1).admits(0));
        assert!(!Cardinality::Max(1).admits(2));
    }

    #[test]
    fn restriction_display() {
        let [written_by, pmid, status] = restrictions();
        assert_eq!(written_by.to_string(), "Article ⊑ writtenBy min 1 Author");
        assert_eq!(pmid.to_string(), "Article ⊑ hasPMID exactly 1");
        assert_eq!(
            status.to_string(),
            "Article ⊑ hasStatus max 1 PublicationStatus"
        );
    }
}
