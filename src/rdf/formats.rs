use super::RdfError;
use oxrdf::{Graph, Quad, Triple, TripleRef};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use serde_json::{json, Value};
use std::fmt;
use url::Url;

/// Accept header sent when asking a server for a machine-readable representation
pub const RDF_ACCEPT: &str =
    "application/rdf+xml, text/turtle, application/ld+json, text/n3, application/n-triples";

/// Media types that map onto a serialization
pub const RDF_MEDIA_TYPES: &[&str] = &[
    "application/rdf+xml",
    "text/turtle",
    "text/n3",
    "application/n-triples",
    "application/ld+json",
    "application/json",
    "application/n-quads",
    "application/trix",
    "application/trig",
];

/// RDF serializations the fetcher knows how to name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfSerialization {
    Turtle,
    RdfXml,
    JsonLd,
    N3,
    NTriples,
    NQuads,
    TriG,
    TriX,
    HexTuples,
}

/// Order tried when neither content type nor extension settles the format
pub const FALLBACK_ORDER: [RdfSerialization; 9] = [
    RdfSerialization::Turtle,
    RdfSerialization::RdfXml,
    RdfSerialization::JsonLd,
    RdfSerialization::N3,
    RdfSerialization::NTriples,
    RdfSerialization::NQuads,
    RdfSerialization::TriG,
    RdfSerialization::TriX,
    RdfSerialization::HexTuples,
];

const EXTENSIONS: &[(&str, RdfSerialization)] = &[
    (".rdf", RdfSerialization::RdfXml),
    (".ttl", RdfSerialization::Turtle),
    (".n3", RdfSerialization::N3),
    (".jsonld", RdfSerialization::JsonLd),
    (".json", RdfSerialization::JsonLd),
    (".nt", RdfSerialization::NTriples),
    (".nq", RdfSerialization::NQuads),
    (".trig", RdfSerialization::TriG),
    (".trix", RdfSerialization::TriX),
];

impl RdfSerialization {
    /// Short identifier recorded in provenance and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::RdfXml => "xml",
            Self::JsonLd => "json-ld",
            Self::N3 => "n3",
            Self::NTriples => "nt",
            Self::NQuads => "nquads",
            Self::TriG => "trig",
            Self::TriX => "trix",
            Self::HexTuples => "hext",
        }
    }

    /// Format hint from the extension of the URL path
    ///
    /// # Examples
    ///
    /// ```
    /// use signpost_harvest::rdf::RdfSerialization;
    ///
    /// assert_eq!(
    ///     RdfSerialization::from_extension("http://example.org/data.ttl?v=2"),
    ///     Some(RdfSerialization::Turtle)
    /// );
    /// assert_eq!(RdfSerialization::from_extension("http://example.org/page"), None);
    /// ```
    pub fn from_extension(url: &str) -> Option<Self> {
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_lowercase(),
            Err(_) => url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_lowercase(),
        };

        EXTENSIONS
            .iter()
            .find(|(ext, _)| path.ends_with(ext))
            .map(|(_, format)| *format)
    }

    /// Format named by a Content-Type header value, parameters ignored
    pub fn from_media_type(content_type: &str) -> Option<Self> {
        match base_media_type(content_type).as_str() {
            "application/rdf+xml" => Some(Self::RdfXml),
            "text/turtle" => Some(Self::Turtle),
            "text/n3" => Some(Self::N3),
            "application/n-triples" => Some(Self::NTriples),
            "application/ld+json" | "application/json" => Some(Self::JsonLd),
            "application/n-quads" => Some(Self::NQuads),
            "application/trix" => Some(Self::TriX),
            "application/trig" => Some(Self::TriG),
            _ => None,
        }
    }

    /// Serialization named by a user-facing format name
    ///
    /// Accepts the short names used on the command line (`turtle`, `ttl`,
    /// `rdf`, `xml`, `json-ld`, `jsonld`, `n3`, `nt`, `ntriples`, `nquads`,
    /// `trig`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "turtle" | "ttl" => Some(Self::Turtle),
            "rdf" | "xml" | "rdfxml" => Some(Self::RdfXml),
            "json-ld" | "jsonld" => Some(Self::JsonLd),
            "n3" => Some(Self::N3),
            "nt" | "ntriples" => Some(Self::NTriples),
            "nquads" | "nq" => Some(Self::NQuads),
            "trig" => Some(Self::TriG),
            _ => None,
        }
    }

    /// Canonical media type of the serialization
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::RdfXml => "application/rdf+xml",
            Self::JsonLd => "application/ld+json",
            Self::N3 => "text/n3",
            Self::NTriples => "application/n-triples",
            Self::NQuads => "application/n-quads",
            Self::TriG => "application/trig",
            Self::TriX => "application/trix",
            Self::HexTuples => "application/hex+x-ndjson",
        }
    }

    /// File extension used for exports
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::RdfXml => "rdf",
            Self::JsonLd => "jsonld",
            Self::N3 => "n3",
            Self::NTriples => "nt",
            Self::NQuads => "nq",
            Self::TriG => "trig",
            Self::TriX => "trix",
            Self::HexTuples => "hext",
        }
    }

    /// Whether the serialization keeps named graphs
    pub fn supports_datasets(&self) -> bool {
        matches!(self, Self::NQuads | Self::TriG | Self::TriX | Self::JsonLd | Self::HexTuples)
    }

    /// Parser backend for this serialization, if there is one
    fn parser_format(&self) -> Option<RdfFormat> {
        match self {
            Self::Turtle => Some(RdfFormat::Turtle),
            Self::RdfXml => Some(RdfFormat::RdfXml),
            Self::JsonLd => RdfFormat::from_extension("jsonld"),
            Self::N3 => Some(RdfFormat::N3),
            Self::NTriples => Some(RdfFormat::NTriples),
            Self::NQuads => Some(RdfFormat::NQuads),
            Self::TriG => Some(RdfFormat::TriG),
            Self::TriX | Self::HexTuples => None,
        }
    }
}

impl fmt::Display for RdfSerialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a resource's triples were actually obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatUsed {
    Serialization(RdfSerialization),
    Rdfa,
    Microdata,
}

impl FormatUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serialization(format) => format.as_str(),
            Self::Rdfa => "rdfa",
            Self::Microdata => "microdata",
        }
    }
}

impl fmt::Display for FormatUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lower-cased media type without parameters
pub fn base_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// True for media types that map onto a known serialization
pub fn is_rdf_media_type(content_type: &str) -> bool {
    RDF_MEDIA_TYPES.contains(&base_media_type(content_type).as_str())
}

pub fn is_html_media_type(content_type: &str) -> bool {
    matches!(
        base_media_type(content_type).as_str(),
        "text/html" | "application/xhtml+xml"
    )
}

/// Generic XML or HTML, either of which may carry RDF
pub fn is_xml_or_html_media_type(content_type: &str) -> bool {
    matches!(
        base_media_type(content_type).as_str(),
        "application/xml" | "text/xml"
    ) || is_html_media_type(content_type)
}

/// Loose check used by probes: any RDF-ish token in the header value
pub fn looks_like_rdf_content_type(content_type: &str) -> bool {
    const TOKENS: &[&str] = &[
        "rdf", "turtle", "n3", "json-ld", "ld+json", "n-triples", "n-quads", "trig", "trix",
    ];
    let lowered = content_type.to_lowercase();
    TOKENS.iter().any(|token| lowered.contains(token))
}

/// True when the URL path ends in an extension that names a serialization
pub fn has_rdf_extension(url: &str) -> bool {
    RdfSerialization::from_extension(url).is_some()
}

/// Parses `body` as `format`, resolving relative IRIs against `base`
///
/// Named graphs in quad formats are folded into a single triple set.
pub fn parse(body: &[u8], format: RdfSerialization, base: &str) -> Result<Graph, RdfError> {
    let parser_format = format
        .parser_format()
        .ok_or_else(|| RdfError::Unsupported(format.to_string()))?;

    let rewritten = match format {
        RdfSerialization::JsonLd => inline_schema_org_context(body),
        _ => None,
    };
    let input = rewritten.as_deref().unwrap_or(body);

    let parser = RdfParser::from_format(parser_format).with_base_iri(base)?;

    let mut graph = Graph::new();
    for quad in parser.for_reader(input) {
        let quad = quad.map_err(|e| RdfError::Parse(e.to_string()))?;
        graph.insert(&Triple::from(quad));
    }
    Ok(graph)
}

/// Serializes a triple set as N-Triples, one statement per line
pub fn to_ntriples(graph: &Graph) -> String {
    graph
        .iter()
        .map(|triple| format!("{} .\n", triple))
        .collect()
}

/// Serializes a triple set as Turtle with the given prefix declarations
pub fn to_turtle(graph: &Graph, prefixes: &[(&str, &str)]) -> Result<String, RdfError> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
    for (name, namespace) in prefixes {
        serializer = serializer.with_prefix(*name, *namespace)?;
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in graph.iter() {
        writer.serialize_triple(triple)?;
    }
    let bytes = writer.finish()?;

    String::from_utf8(bytes).map_err(|e| RdfError::Parse(e.to_string()))
}

/// Serializes quads as `format`
///
/// Dataset formats keep each quad's graph; triple formats merge every graph
/// into one triple set.
pub fn serialize_quads(quads: &[Quad], format: RdfSerialization) -> Result<Vec<u8>, RdfError> {
    let rdf_format = format
        .parser_format()
        .ok_or_else(|| RdfError::Unsupported(format.to_string()))?;
    let mut writer = RdfSerializer::from_format(rdf_format).for_writer(Vec::new());

    if format.supports_datasets() {
        for quad in quads {
            writer.serialize_quad(quad)?;
        }
    } else {
        let mut merged = Graph::new();
        for quad in quads {
            merged.insert(TripleRef::from(quad.as_ref()));
        }
        for triple in merged.iter() {
            writer.serialize_triple(triple)?;
        }
    }

    Ok(writer.finish()?)
}

/// Replaces remote schema.org `@context` references with an inline vocabulary
///
/// Returns `None` when the body is not JSON or references no such context.
fn inline_schema_org_context(body: &[u8]) -> Option<Vec<u8>> {
    let mut value: Value = serde_json::from_slice(body).ok()?;
    if !rewrite_contexts(&mut value) {
        return None;
    }
    serde_json::to_vec(&value).ok()
}

fn rewrite_contexts(value: &mut Value) -> bool {
    let mut changed = false;
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "@context" {
                    changed |= rewrite_context(child);
                } else {
                    changed |= rewrite_contexts(child);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                changed |= rewrite_contexts(item);
            }
        }
        _ => {}
    }
    changed
}

fn rewrite_context(context: &mut Value) -> bool {
    let is_remote_schema = matches!(context, Value::String(s) if is_schema_org_context(s));
    if is_remote_schema {
        *context = json!({ "@vocab": super::vocab::SCHEMA });
        return true;
    }

    match context {
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| rewrite_context(item) || changed),
        _ => false,
    }
}

fn is_schema_org_context(context: &str) -> bool {
    let lowered = context.trim().to_lowercase();
    let lowered = lowered.trim_end_matches('/');
    matches!(
        lowered,
        "http://schema.org"
            | "https://schema.org"
            | "http://schema.org/docs/jsonldcontext.json"
            | "https://schema.org/docs/jsonldcontext.json"
    )
}
