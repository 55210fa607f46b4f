//! Structured data embedded in HTML pages
//!
//! Three mechanisms are recognised: `<script type="application/ld+json">`
//! blocks, RDFa Lite attributes and item-typed microdata. Each extractor
//! takes the page text and the page URL (used as base and as the default
//! subject) and produces a triple set.

use super::formats::{looks_like_rdf_content_type, parse, RdfSerialization};
use super::vocab::{self, rdf_type};
use super::{Node, RdfError};
use oxrdf::{Graph, Literal, NamedNode, Term};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::rc::Rc;
use url::Url;

/// Prefixes every RDFa processor knows without a declaration
const RDFA_INITIAL_PREFIXES: &[(&str, &str)] = &[
    ("schema", vocab::SCHEMA),
    ("dc", vocab::DCTERMS),
    ("dcterms", vocab::DCTERMS),
    ("dcat", vocab::DCAT),
    ("foaf", vocab::FOAF),
    ("owl", vocab::OWL),
    ("prov", vocab::PROV),
    ("rdf", vocab::RDF),
    ("rdfs", vocab::RDFS),
    ("skos", vocab::SKOS),
    ("void", vocab::VOID),
    ("xsd", vocab::XSD),
];

const JSONLD_SCRIPT: &str = r#"script[type="application/ld+json"]"#;

/// Which embedded mechanisms a page carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedMarkers {
    pub jsonld: bool,
    pub rdfa: bool,
    pub microdata: bool,

    /// Raw `href` of an `alternate` link whose type names an RDF serialization
    pub rdf_alternate: Option<String>,
}

impl EmbeddedMarkers {
    /// Scans a page for embedded structured data
    ///
    /// RDFa counts when the `<html>` element declares `prefix` or `xmlns:*`,
    /// or when any element carries `property` or `typeof`. Microdata counts
    /// only for schema.org item types.
    pub fn scan(html: &str) -> Self {
        let document = Html::parse_document(html);

        let root = document.root_element().value();
        let declares_prefixes = root.attr("prefix").is_some()
            || root.attrs().any(|(name, _)| name.starts_with("xmlns:"));

        let microdata = select(&document, "[itemtype]").iter().any(|element| {
            element
                .value()
                .attr("itemtype")
                .map_or(false, |t| t.contains("schema.org"))
        });

        let rdf_alternate = select(&document, r#"link[rel~="alternate"][href]"#)
            .into_iter()
            .find(|link| {
                link.value()
                    .attr("type")
                    .map_or(false, looks_like_rdf_content_type)
            })
            .and_then(|link| link.value().attr("href"))
            .map(str::to_string);

        Self {
            jsonld: !select(&document, JSONLD_SCRIPT).is_empty(),
            rdfa: declares_prefixes
                || !select(&document, "[property]").is_empty()
                || !select(&document, "[typeof]").is_empty(),
            microdata,
            rdf_alternate,
        }
    }

    /// True when any embedded mechanism was found
    pub fn any(&self) -> bool {
        self.jsonld || self.rdfa || self.microdata
    }
}

/// Outcome of parsing every JSON-LD script block on a page
#[derive(Debug, Default)]
pub struct JsonLdExtraction {
    pub graph: Graph,

    /// Number of script blocks found, empty ones included
    pub scripts: usize,

    /// One message per block that failed to parse
    pub errors: Vec<String>,
}

/// Parses every JSON-LD script block, merging the results
pub fn extract_jsonld_scripts(html: &str, base: &str) -> JsonLdExtraction {
    let bodies: Vec<String> = {
        let document = Html::parse_document(html);
        select(&document, JSONLD_SCRIPT)
            .iter()
            .map(|script| script.text().collect::<String>())
            .collect()
    };

    let mut extraction = JsonLdExtraction {
        scripts: bodies.len(),
        ..Default::default()
    };

    for body in bodies.iter().filter(|b| !b.trim().is_empty()) {
        match parse(body.as_bytes(), RdfSerialization::JsonLd, base) {
            Ok(graph) => {
                for triple in graph.iter() {
                    extraction.graph.insert(triple);
                }
            }
            Err(e) => extraction.errors.push(e.to_string()),
        }
    }

    extraction
}

/// Lexical scope of an RDFa walk
#[derive(Debug, Clone)]
struct RdfaScope {
    vocab: Option<String>,
    prefixes: HashMap<String, String>,
    subject: Node,
}

impl RdfaScope {
    fn expand(&self, token: &str) -> Option<NamedNode> {
        if token.contains("://") {
            return NamedNode::new(token).ok();
        }
        if let Some((prefix, local)) = token.split_once(':') {
            let namespace = self.prefixes.get(prefix)?;
            return NamedNode::new(format!("{}{}", namespace, local)).ok();
        }
        let vocab = self.vocab.as_ref()?;
        NamedNode::new(format!("{}{}", vocab, token)).ok()
    }

    /// Applies `vocab`, `prefix` and `xmlns:*` declarations found on an element
    fn declare(&self, element: &scraper::node::Element) -> Option<Self> {
        let vocab = element.attr("vocab");
        let prefix = element.attr("prefix");
        let has_xmlns = element.attrs().any(|(name, _)| name.starts_with("xmlns:"));
        if vocab.is_none() && prefix.is_none() && !has_xmlns {
            return None;
        }

        let mut scope = self.clone();
        if let Some(vocab) = vocab {
            let vocab = vocab.trim();
            scope.vocab = (!vocab.is_empty()).then(|| vocab.to_string());
        }
        if let Some(prefix) = prefix {
            let tokens: Vec<&str> = prefix.split_whitespace().collect();
            for pair in tokens.chunks(2) {
                if let [name, namespace] = pair {
                    if let Some(name) = name.strip_suffix(':') {
                        scope.prefixes.insert(name.to_string(), namespace.to_string());
                    }
                }
            }
        }
        for (name, value) in element.attrs() {
            if let Some(name) = name.strip_prefix("xmlns:") {
                scope.prefixes.insert(name.to_string(), value.to_string());
            }
        }
        Some(scope)
    }
}

/// Extracts RDFa Lite annotations
///
/// Supports `vocab`, `prefix` (and `xmlns:*`), `typeof`, `property`,
/// `about`, `resource`/`href`/`src` objects and `content` overrides.
/// Properties outside any typed element describe the page itself.
pub fn extract_rdfa(html: &str, base: &str) -> Result<Graph, RdfError> {
    let base_url = Url::parse(base).map_err(|e| RdfError::Parse(e.to_string()))?;
    let document = Html::parse_document(html);

    let scope = RdfaScope {
        vocab: None,
        prefixes: RDFA_INITIAL_PREFIXES
            .iter()
            .map(|(name, ns)| (name.to_string(), ns.to_string()))
            .collect(),
        subject: Node::iri(base_url.as_str())?,
    };

    let mut graph = Graph::new();
    walk_rdfa(document.root_element(), scope, &base_url, &mut graph);
    Ok(graph)
}

/// Pushes the element children of `element` so they pop in document order
fn push_children<'a, T: Clone>(stack: &mut Vec<(ElementRef<'a>, T)>, element: ElementRef<'a>, with: T) {
    let start = stack.len();
    stack.extend(
        element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| (child, with.clone())),
    );
    stack[start..].reverse();
}

/// Walks the tree with an explicit stack; nesting depth is bounded only by memory
fn walk_rdfa(root: ElementRef<'_>, scope: RdfaScope, base: &Url, graph: &mut Graph) {
    let mut stack = vec![(root, Rc::new(scope))];
    while let Some((element, parent)) = stack.pop() {
        let next = visit_rdfa(element, parent, base, graph);
        push_children(&mut stack, element, next);
    }
}

/// Emits the triples of one element; returns the scope of its children
fn visit_rdfa(
    element: ElementRef<'_>,
    parent: Rc<RdfaScope>,
    base: &Url,
    graph: &mut Graph,
) -> Rc<RdfaScope> {
    let attrs = element.value();
    let scope = match parent.declare(attrs) {
        Some(declared) => Rc::new(declared),
        None => parent,
    };

    let about = attrs.attr("about").and_then(|v| resolve(base, v));
    let resource = ["resource", "href", "src"]
        .iter()
        .find_map(|name| attrs.attr(name))
        .and_then(|v| resolve(base, v));

    let typed_node = attrs.attr("typeof").map(|types| {
        let node = about
            .clone()
            .or_else(|| resource.clone())
            .map(Node::Iri)
            .unwrap_or_else(Node::blank);
        for token in types.split_whitespace() {
            if let Some(class) = scope.expand(token) {
                graph.insert(&node.triple(rdf_type(), class));
            }
        }
        node
    });

    let subject = match (&typed_node, &about) {
        (None, Some(about)) => Node::Iri(about.clone()),
        _ => scope.subject.clone(),
    };

    if let Some(properties) = attrs.attr("property") {
        let object: Term = match (&typed_node, attrs.attr("content"), &resource) {
            (Some(node), _, _) => node.to_term(),
            (None, Some(content), _) => Literal::new_simple_literal(content).into(),
            (None, None, Some(resource)) => resource.clone().into(),
            (None, None, None) => {
                let text = attrs
                    .attr("datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(element));
                Literal::new_simple_literal(text).into()
            }
        };

        for token in properties.split_whitespace() {
            if let Some(predicate) = scope.expand(token) {
                graph.insert(&subject.triple(predicate, object.clone()));
            }
        }
    }

    match typed_node.or_else(|| about.map(Node::Iri)) {
        Some(subject) => Rc::new(RdfaScope {
            subject,
            ..RdfaScope::clone(&scope)
        }),
        None => scope,
    }
}

/// Extracts item-typed microdata
///
/// Each top-level `itemscope` becomes a node (its `itemid`, or a blank
/// node); `itemtype` gives its classes and the vocabulary that unqualified
/// `itemprop` names are resolved against. Nested items become object nodes.
pub fn extract_microdata(html: &str, base: &str) -> Result<Graph, RdfError> {
    let base_url = Url::parse(base).map_err(|e| RdfError::Parse(e.to_string()))?;
    let document = Html::parse_document(html);

    let mut graph = Graph::new();
    for item in select(&document, "[itemscope]") {
        if item.value().attr("itemprop").is_none() {
            emit_items(item, &base_url, &mut graph);
        }
    }
    Ok(graph)
}

/// Node naming an item: its `itemid`, or a fresh blank node
fn item_subject(item: ElementRef<'_>, base: &Url) -> Node {
    item.value()
        .attr("itemid")
        .and_then(|id| resolve(base, id))
        .map(Node::Iri)
        .unwrap_or_else(Node::blank)
}

/// Emits a top-level item and every item nested under it
///
/// Nested items are queued rather than recursed into, so arbitrarily deep
/// nesting cannot exhaust the stack.
fn emit_items(root: ElementRef<'_>, base: &Url, graph: &mut Graph) {
    let mut pending = vec![(root, item_subject(root, base), None::<String>)];
    while let Some((item, subject, inherited)) = pending.pop() {
        let vocabulary = emit_item_types(item, &subject, inherited, graph);

        for property in collect_properties(item) {
            let value = if property.value().attr("itemscope").is_some() {
                let nested = item_subject(property, base);
                let term = nested.to_term();
                pending.push((property, nested, vocabulary.clone()));
                term
            } else {
                match property_value(property, base) {
                    Some(value) => value,
                    None => continue,
                }
            };

            let names = property.value().attr("itemprop").unwrap_or_default();
            for name in names.split_whitespace() {
                if let Some(predicate) = property_iri(name, vocabulary.as_deref()) {
                    graph.insert(&subject.triple(predicate, value.clone()));
                }
            }
        }
    }
}

/// Types an item and returns the vocabulary its property names resolve against
fn emit_item_types(
    item: ElementRef<'_>,
    subject: &Node,
    inherited: Option<String>,
    graph: &mut Graph,
) -> Option<String> {
    let attrs = item.value();
    let types: Vec<NamedNode> = attrs
        .attr("itemtype")
        .map(|t| {
            t.split_whitespace()
                .filter_map(|t| NamedNode::new(t).ok())
                .collect()
        })
        .unwrap_or_default();
    for class in &types {
        graph.insert(&subject.triple(rdf_type(), class.clone()));
    }

    types
        .first()
        .map(|class| vocabulary_of(class.as_str()))
        .or(inherited)
}

/// Descendants carrying `itemprop`, in document order, without entering nested items
fn collect_properties(item: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    push_children(&mut stack, item, ());
    while let Some((element, ())) = stack.pop() {
        if element.value().attr("itemprop").is_some() {
            out.push(element);
        }
        if element.value().attr("itemscope").is_none() {
            push_children(&mut stack, element, ());
        }
    }
    out
}

fn property_value(element: ElementRef<'_>, base: &Url) -> Option<Term> {
    let attrs = element.value();
    let iri = |name: &str| attrs.attr(name).and_then(|v| resolve(base, v)).map(Term::from);
    let literal = |value: &str| Some(Term::from(Literal::new_simple_literal(value)));

    match attrs.name() {
        "meta" => attrs.attr("content").and_then(literal),
        "audio" | "embed" | "iframe" | "img" | "source" | "track" | "video" => iri("src"),
        "a" | "area" | "link" => iri("href"),
        "object" => iri("data"),
        "data" | "meter" => attrs.attr("value").and_then(literal),
        "time" => match attrs.attr("datetime") {
            Some(datetime) => literal(datetime),
            None => literal(&element_text(element)),
        },
        _ => literal(&element_text(element)),
    }
}

fn property_iri(name: &str, vocabulary: Option<&str>) -> Option<NamedNode> {
    if name.contains("://") {
        return NamedNode::new(name).ok();
    }
    NamedNode::new(format!("{}{}", vocabulary?, name)).ok()
}

/// Namespace part of a type IRI: everything up to the last `/` or `#`
fn vocabulary_of(class: &str) -> String {
    match class.rfind(|c: char| c == '/' || c == '#') {
        Some(index) => class[..=index].to_string(),
        None => class.to_string(),
    }
}

fn resolve(base: &Url, value: &str) -> Option<NamedNode> {
    let joined = base.join(value.trim()).ok()?;
    NamedNode::new(joined.as_str()).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn select<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}
