use crate::provenance::provenance_to_turtle;
use crate::rdf::{serialize_quads, RdfSerialization};
use crate::HarvestError;
use oxrdf::{Graph, Quad};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of a session's exported provenance
pub fn provenance_file_name(crawl_id: &str) -> String {
    format!("provenance-{}.ttl", crawl_id)
}

/// Writes a provenance graph as Turtle to `{dir}/provenance-{crawl_id}.ttl`
///
/// The directory is created when missing. Returns the written path.
pub fn write_provenance_file(
    dir: &Path,
    crawl_id: &str,
    graph: &Graph,
) -> Result<PathBuf, HarvestError> {
    let turtle = provenance_to_turtle(graph)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(provenance_file_name(crawl_id));
    fs::write(&path, turtle)?;
    Ok(path)
}

/// File name of an exported graph
///
/// A named graph is exported as `graph-{last path segment}`, the whole store
/// as `knowledge-graph`.
pub fn graph_file_name(graph: Option<&str>, format: RdfSerialization) -> String {
    let stem = match graph {
        Some(graph) => {
            let segment = graph
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default();
            let segment: String = segment
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || "._-".contains(c) { c } else { '_' })
                .collect();
            format!("graph-{}", segment)
        }
        None => "knowledge-graph".to_string(),
    };
    format!("{}.{}", stem, format.file_extension())
}

/// Serializes `quads` into `path`, creating parent directories
///
/// Formats without named graphs receive the union of all graphs.
pub fn write_graph_export(
    path: &Path,
    quads: &[Quad],
    format: RdfSerialization,
) -> Result<(), HarvestError> {
    let bytes = serialize_quads(quads, format)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}
