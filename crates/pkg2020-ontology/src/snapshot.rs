//! Snapshot codec: the RDF/XML document handed from one population stage to
//! the next.
//!
//! The writer emits the full T-Box followed by one `owl:NamedIndividual` per
//! entity. The reader skips the T-Box and rebuilds the typed graph from the
//! individuals, so entities are found again by their natural-key name.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::axioms::{self, Cardinality, ClassExpr, PropertyExpr, Restricted, Rule};
use crate::graph::{Conflict, KnowledgeGraph};
use crate::model::{Assertion, Literal};
use crate::reason::Inferences;
use crate::schema::{
    self, Class, DataProperty, ObjectProperty, Property, PublicationStatus, NS, ONTOLOGY_IRI,
    OWL_NS, RDFS_NS, RDF_NS, XSD_NS,
};

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    Malformed(String),
    UnknownType {
        individual: String,
        types: Vec<String>,
    },
    InvalidLiteral {
        individual: String,
        property: DataProperty,
        value: String,
    },
    DanglingReference {
        individual: String,
        property: ObjectProperty,
        target: String,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::Xml(e) => write!(f, "XML: {e}"),
            Self::Malformed(msg) => write!(f, "malformed snapshot: {msg}"),
            Self::UnknownType { individual, types } => {
                write!(f, "individual {individual} has no known type ({types:?})")
            }
            Self::InvalidLiteral {
                individual,
                property,
                value,
            } => write!(f, "{individual}: invalid {property} value '{value}'"),
            Self::DanglingReference {
                individual,
                property,
                target,
            } => write!(f, "{individual}: {property} points to missing {target}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Xml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<quick_xml::Error> for SnapshotError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

type Result<T> = std::result::Result<T, SnapshotError>;

// ============================================================
// Writing
// ============================================================

/// Drop characters XML 1.0 cannot carry, even escaped (C0 controls other
/// than tab/LF/CR, U+FFFE and U+FFFF).
fn xml_chars(text: &str) -> Cow<'_, str> {
    fn allowed(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
            || c >= '\u{10000}'
    }
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| allowed(c)).collect())
    }
}

struct RdfWriter<W: Write> {
    xml: Writer<W>,
}

impl<W: Write> RdfWriter<W> {
    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Start(start))?;
        Ok(())
    }

    fn end(&mut self, tag: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn text_element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(tag, attrs)?;
        self.xml
            .write_event(Event::Text(BytesText::new(&xml_chars(text))))?;
        self.end(tag)
    }

    fn resource(&mut self, tag: &str, iri: &str) -> Result<()> {
        self.empty(tag, &[("rdf:resource", iri)])
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.text_element("rdfs:comment", &[], text)
    }

    /// `<tag rdf:resource=.../>` for named classes, nested node otherwise.
    fn class_ref(&mut self, tag: &str, expr: &ClassExpr) -> Result<()> {
        if let ClassExpr::Named(class) = expr {
            return self.resource(tag, &class.iri());
        }
        self.start(tag, &[])?;
        self.class_expr(expr)?;
        self.end(tag)
    }

    fn on_property(&mut self, property: PropertyExpr) -> Result<()> {
        match property {
            PropertyExpr::Direct(p) => self.resource("owl:onProperty", &p.iri()),
            PropertyExpr::Inverse(p) => {
                self.start("owl:onProperty", &[])?;
                self.start("owl:ObjectProperty", &[])?;
                self.resource("owl:inverseOf", &p.iri())?;
                self.end("owl:ObjectProperty")?;
                self.end("owl:onProperty")
            }
        }
    }

    fn collection(&mut self, tag: &str, parts: &[ClassExpr]) -> Result<()> {
        self.start("owl:Class", &[])?;
        self.start(tag, &[("rdf:parseType", "Collection")])?;
        for part in parts {
            self.class_expr(part)?;
        }
        self.end(tag)?;
        self.end("owl:Class")
    }

    fn qualified_count(&mut self, cardinality: Cardinality) -> Result<()> {
        let tag = match cardinality {
            Cardinality::Min(_) => "owl:minQualifiedCardinality",
            Cardinality::Exactly(_) => "owl:qualifiedCardinality",
            Cardinality::Max(_) => "owl:maxQualifiedCardinality",
        };
        let datatype = format!("{XSD_NS}nonNegativeInteger");
        self.text_element(
            tag,
            &[("rdf:datatype", datatype.as_str())],
            &cardinality.bound().to_string(),
        )
    }

    fn class_expr(&mut self, expr: &ClassExpr) -> Result<()> {
        match expr {
            ClassExpr::Named(class) => self.empty("owl:Class", &[("rdf:about", class.iri().as_str())]),
            ClassExpr::And(parts) => self.collection("owl:intersectionOf", parts),
            ClassExpr::Or(parts) => self.collection("owl:unionOf", parts),
            ClassExpr::Not(inner) => {
                self.start("owl:Class", &[])?;
                self.class_ref("owl:complementOf", inner)?;
                self.end("owl:Class")
            }
            ClassExpr::Some(property, filler) => {
                self.start("owl:Restriction", &[])?;
                self.on_property(*property)?;
                self.class_ref("owl:someValuesFrom", filler)?;
                self.end("owl:Restriction")
            }
            ClassExpr::HasValue(property) => {
                self.start("owl:Restriction", &[])?;
                self.resource("owl:onProperty", &property.iri())?;
                self.resource("owl:someValuesFrom", &property.range().iri())?;
                self.end("owl:Restriction")
            }
            ClassExpr::Count(cardinality, property, filler) => {
                self.start("owl:Restriction", &[])?;
                self.on_property(*property)?;
                self.qualified_count(*cardinality)?;
                self.class_ref("owl:onClass", filler)?;
                self.end("owl:Restriction")
            }
        }
    }

    fn restriction(&mut self, on: Restricted, cardinality: Cardinality) -> Result<()> {
        self.start("rdfs:subClassOf", &[])?;
        self.start("owl:Restriction", &[])?;
        match on {
            Restricted::Object(p, filler) => {
                self.resource("owl:onProperty", &p.iri())?;
                self.qualified_count(cardinality)?;
                self.resource("owl:onClass", &filler.iri())?;
            }
            Restricted::Data(p) => {
                self.resource("owl:onProperty", &p.iri())?;
                self.qualified_count(cardinality)?;
                self.resource("owl:onDataRange", &p.range().iri())?;
            }
        }
        self.end("owl:Restriction")?;
        self.end("rdfs:subClassOf")
    }

    fn tbox(&mut self) -> Result<()> {
        self.empty("owl:Ontology", &[("rdf:about", ONTOLOGY_IRI)])?;

        let rule_texts: BTreeMap<String, &'static str> = axioms::rules()
            .iter()
            .map(|rule| match rule {
                Rule::Class { head, text, .. } => (head.local_name().to_string(), *text),
                Rule::SharedTarget { head, text, .. } => (head.local_name().to_string(), *text),
            })
            .collect();

        for class in Class::ALL {
            let iri = class.iri();
            self.start("owl:Class", &[("rdf:about", iri.as_str())])?;
            if let Some(text) = class.comment() {
                self.comment(text)?;
            }
            match axioms::definition(class) {
                Some(expr) => {
                    self.start("owl:equivalentClass", &[])?;
                    self.class_expr(&expr)?;
                    self.end("owl:equivalentClass")?;
                }
                None => {
                    if let Some(parent) = class.parent() {
                        self.resource("rdfs:subClassOf", &parent.iri())?;
                    }
                }
            }
            if class == Class::PublicationStatus {
                self.start("owl:equivalentClass", &[])?;
                self.start("owl:Class", &[])?;
                self.start("owl:oneOf", &[("rdf:parseType", "Collection")])?;
                for status in PublicationStatus::ALL {
                    self.empty("rdf:Description", &[("rdf:about", schema::iri(status.local_name()).as_str())])?;
                }
                self.end("owl:oneOf")?;
                self.end("owl:Class")?;
                self.end("owl:equivalentClass")?;
            }
            for r in axioms::restrictions().iter().filter(|r| r.class == class) {
                self.restriction(r.on, r.cardinality)?;
            }
            if let Some(text) = rule_texts.get(class.local_name()) {
                self.comment(&format!("SWRL: {text}"))?;
            }
            self.end("owl:Class")?;
        }

        for p in ObjectProperty::ALL {
            let iri = p.iri();
            self.start("owl:ObjectProperty", &[("rdf:about", iri.as_str())])?;
            if p.is_functional() {
                self.resource("rdf:type", &format!("{OWL_NS}FunctionalProperty"))?;
            }
            if p.is_symmetric() {
                self.resource("rdf:type", &format!("{OWL_NS}SymmetricProperty"))?;
            }
            self.resource("rdfs:domain", &p.domain().iri())?;
            self.resource("rdfs:range", &p.range().iri())?;
            if let Some(text) = rule_texts.get(p.local_name()) {
                self.comment(&format!("SWRL: {text}"))?;
            }
            self.end("owl:ObjectProperty")?;
        }

        for p in DataProperty::ALL {
            let iri = p.iri();
            self.start("owl:DatatypeProperty", &[("rdf:about", iri.as_str())])?;
            if p.is_functional() {
                self.resource("rdf:type", &format!("{OWL_NS}FunctionalProperty"))?;
            }
            if p.is_inverse_functional() {
                self.resource("rdf:type", &format!("{OWL_NS}InverseFunctionalProperty"))?;
            }
            if let Some(domain) = p.domain() {
                self.resource("rdfs:domain", &domain.iri())?;
            }
            self.resource("rdfs:range", &p.range().iri())?;
            self.end("owl:DatatypeProperty")?;
        }

        for status in PublicationStatus::ALL {
            let iri = schema::iri(status.local_name());
            self.start("owl:NamedIndividual", &[("rdf:about", iri.as_str())])?;
            self.resource("rdf:type", &Class::PublicationStatus.iri())?;
            self.end("owl:NamedIndividual")?;
        }
        Ok(())
    }

    fn data_value(&mut self, property: DataProperty, value: &Literal) -> Result<()> {
        self.text_element(
            property.local_name(),
            &[("rdf:datatype", value.datatype().iri().as_str())],
            &value.lexical(),
        )
    }

    fn abox(&mut self, graph: &KnowledgeGraph, inferences: Option<&Inferences>) -> Result<()> {
        let derived_types = inferences.map(Inferences::classes_by_individual).unwrap_or_default();
        let derived_links = inferences.map(Inferences::relations_by_subject).unwrap_or_default();
        let mut conflicts: BTreeMap<&str, Vec<&Conflict>> = BTreeMap::new();
        for c in graph.conflicts() {
            conflicts.entry(c.subject.as_str()).or_default().push(c);
        }

        for individual in graph.individuals() {
            let name = individual.name();
            let iri = schema::iri(name);
            self.start("owl:NamedIndividual", &[("rdf:about", iri.as_str())])?;
            self.resource("rdf:type", &individual.class().iri())?;
            for class in derived_types.get(name).into_iter().flatten() {
                self.resource("rdf:type", &class.iri())?;
            }
            for (property, value) in individual.data_values() {
                self.data_value(property, &value)?;
            }
            for (property, target) in individual.object_values() {
                self.resource(property.local_name(), &schema::iri(target))?;
            }
            for (property, target) in derived_links.get(name).into_iter().flatten() {
                self.resource(property.local_name(), &schema::iri(target))?;
            }
            for conflict in conflicts.get(name).into_iter().flatten() {
                match conflict.property {
                    Property::Data(p) => {
                        let value = Literal::parse(p.range(), &conflict.value)
                            .unwrap_or_else(|| Literal::Text(conflict.value.clone()));
                        self.data_value(p, &value)?;
                    }
                    Property::Object(p) => {
                        self.resource(p.local_name(), &schema::iri(&conflict.value))?;
                    }
                }
            }
            self.end("owl:NamedIndividual")?;
        }
        Ok(())
    }
}

/// Serialize the T-Box and every individual. With `inferences`, derived
/// class memberships and relations are written alongside the asserted ones.
pub fn write_snapshot<W: Write>(
    graph: &KnowledgeGraph,
    inferences: Option<&Inferences>,
    out: W,
) -> Result<()> {
    let mut w = RdfWriter {
        xml: Writer::new_with_indent(out, b' ', 2),
    };
    w.xml
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.start(
        "rdf:RDF",
        &[
            ("xmlns", NS),
            ("xmlns:rdf", RDF_NS),
            ("xmlns:rdfs", RDFS_NS),
            ("xmlns:owl", OWL_NS),
            ("xmlns:xsd", XSD_NS),
            ("xml:base", ONTOLOGY_IRI),
        ],
    )?;
    w.tbox()?;
    w.abox(graph, inferences)?;
    w.end("rdf:RDF")?;
    w.xml.get_mut().write_all(b"\n")?;
    Ok(())
}

/// Schema-only document.
pub fn write_tbox<W: Write>(out: W) -> Result<()> {
    write_snapshot(&KnowledgeGraph::new(), None, out)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write a snapshot file. The document goes to `<path>.tmp` first and is
/// renamed into place, so a failed write never leaves a partial snapshot.
pub fn save(graph: &KnowledgeGraph, inferences: Option<&Inferences>, path: &Path) -> Result<()> {
    let tmp = tmp_path(path);
    let mut out = BufWriter::new(File::create(&tmp)?);
    write_snapshot(graph, inferences, &mut out)?;
    out.flush()?;
    drop(out);
    fs::rename(&tmp, path)?;
    Ok(())
}

// ============================================================
// Reading
// ============================================================

#[derive(Debug, Default)]
struct RawIndividual {
    name: String,
    types: Vec<String>,
    objects: Vec<(String, String)>,
    data: Vec<(String, String)>,
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| SnapshotError::Malformed(format!("non-UTF-8 name: {e}")))
}

fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Text content up to the matching end tag.
fn read_literal(reader: &mut Reader<&[u8]>, end: QName) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(utf8(&e)?),
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name() == end {
                    break;
                }
            }
            Event::Eof => {
                return Err(SnapshotError::Malformed(
                    "unexpected end of document in literal".into(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

fn parse_individual(reader: &mut Reader<&[u8]>, name: String) -> Result<RawIndividual> {
    let mut raw = RawIndividual {
        name,
        ..Default::default()
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) => {
                let resource = attribute(&e, b"rdf:resource")?;
                if e.name().as_ref() == b"rdf:type" {
                    if let Some(r) = resource {
                        raw.types.push(schema::local_name(&r).to_string());
                    }
                } else {
                    let property = utf8(e.local_name().as_ref())?.to_string();
                    match resource {
                        Some(r) => raw.objects.push((property, schema::local_name(&r).to_string())),
                        None => raw.data.push((property, String::new())),
                    }
                }
            }
            Event::Start(e) => {
                let property = utf8(e.local_name().as_ref())?.to_string();
                let end = e.name().as_ref().to_vec();
                let value = read_literal(reader, QName(&end))?;
                raw.data.push((property, value));
            }
            Event::End(e) if e.name().as_ref() == b"owl:NamedIndividual" => break,
            Event::Eof => {
                return Err(SnapshotError::Malformed(format!(
                    "unexpected end of document inside {}",
                    raw.name
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(raw)
}

fn depth(class: Class) -> usize {
    std::iter::successors(Some(class), |c| c.parent()).count()
}

/// Most specific asserted (non-derived) class among the `rdf:type`s.
fn asserted_class(types: &[String]) -> Option<Class> {
    types
        .iter()
        .filter_map(|t| Class::from_local_name(t))
        .filter(|c| !c.is_derived())
        .max_by_key(|c| depth(*c))
}

fn absorb(graph: &mut KnowledgeGraph, raw: RawIndividual) -> Result<()> {
    let unknown = || SnapshotError::UnknownType {
        individual: raw.name.clone(),
        types: raw.types.clone(),
    };
    let class = asserted_class(&raw.types).ok_or_else(unknown)?;
    if class == Class::PublicationStatus {
        return Ok(());
    }

    let mut conflicts = Vec::new();
    let individual = graph.create_individual(class, &raw.name).ok_or_else(unknown)?;

    for (property, value) in &raw.data {
        let Some(p) = DataProperty::from_local_name(property) else {
            log::debug!("{}: skipping unknown data property {property}", raw.name);
            continue;
        };
        let literal =
            Literal::parse(p.range(), value).ok_or_else(|| SnapshotError::InvalidLiteral {
                individual: raw.name.clone(),
                property: p,
                value: value.clone(),
            })?;
        if let Assertion::Conflict(v) = individual.assert_data(p, literal) {
            conflicts.push((Property::Data(p), v));
        }
    }

    for (property, target) in &raw.objects {
        let Some(p) = ObjectProperty::from_local_name(property) else {
            log::debug!("{}: skipping unknown object property {property}", raw.name);
            continue;
        };
        if p.is_derived() {
            continue;
        }
        if let Assertion::Conflict(v) = individual.assert_object(p, target) {
            conflicts.push((Property::Object(p), v));
        }
    }

    for (property, value) in conflicts {
        graph.record_conflict(Conflict {
            subject: raw.name.clone(),
            property,
            value,
        });
    }
    Ok(())
}

fn check_references(graph: &KnowledgeGraph) -> Result<()> {
    for individual in graph.individuals() {
        for (property, target) in individual.object_values() {
            if !graph.has_individual(property.range(), target) {
                return Err(SnapshotError::DanglingReference {
                    individual: individual.name().to_string(),
                    property,
                    target: target.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Rebuild a graph from a snapshot document.
pub fn read_snapshot(xml: &str) -> Result<KnowledgeGraph> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut graph = KnowledgeGraph::new();
    let mut buf = Vec::new();
    let mut skip = Vec::new();
    let mut in_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"rdf:RDF" => in_root = true,
            Event::Start(e) if in_root && e.name().as_ref() == b"owl:NamedIndividual" => {
                let name = attribute(&e, b"rdf:about")?.ok_or_else(|| {
                    SnapshotError::Malformed("owl:NamedIndividual without rdf:about".into())
                })?;
                let raw = parse_individual(&mut reader, schema::local_name(&name).to_string())?;
                absorb(&mut graph, raw)?;
            }
            Event::Start(e) if in_root => {
                // T-Box element
                reader.read_to_end_into(e.name(), &mut skip)?;
                skip.clear();
            }
            Event::End(e) if e.name().as_ref() == b"rdf:RDF" => in_root = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if graph.is_empty() && !xml.contains("rdf:RDF") {
        return Err(SnapshotError::Malformed("missing rdf:RDF root".into()));
    }
    check_references(&graph)?;
    Ok(graph)
}

/// Load a snapshot file.
pub fn load(path: &Path) -> Result<KnowledgeGraph> {
    let xml = fs::read_to_string(path)?;
    read_snapshot(&xml)
}
