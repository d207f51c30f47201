use std::collections::HashMap;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::Error;

/// One structural difference, keyed by the dotted field path inside a
/// document. Values are carried pre-rendered so reporting stays a pure
/// formatting concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Added { path: String, value: String },
    Removed { path: String, value: String },
    Changed { path: String, from: String, to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Added,
    Removed,
    Modified,
}

/// All differences for one matched (or unmatched) document.
#[derive(Debug)]
pub struct DocumentDiff {
    pub label: String,
    pub status: DocumentStatus,
    pub changes: Vec<FieldChange>,
}

/// Resource identity used to match documents across the two sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DocumentId {
    api_version: String,
    kind: String,
    namespace: String,
    name: String,
}

impl DocumentId {
    fn from_value(doc: &Value) -> Option<Self> {
        let api_version = doc.get("apiVersion")?.as_str()?.to_string();
        let kind = doc.get("kind")?.as_str()?.to_string();
        let metadata = doc.get("metadata")?;
        let name = metadata.get("name")?.as_str()?.to_string();
        let namespace = metadata
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Some(Self {
            api_version,
            kind,
            namespace,
            name,
        })
    }

    fn label(&self) -> String {
        if self.namespace.is_empty() {
            format!("{}/{} {}", self.api_version, self.kind, self.name)
        } else {
            format!(
                "{}/{} {}/{}",
                self.api_version, self.kind, self.namespace, self.name
            )
        }
    }
}

/// Structural diff of two multi-document YAML streams.
///
/// Documents are matched by resource identity (apiVersion, kind, namespace,
/// name); documents without a usable identity, or whose identity is
/// duplicated on either side, are paired by ordinal position among
/// themselves. Key reordering and formatting-only differences parse to equal
/// values and report nothing.
pub fn compute(target_text: &str, local_text: &str) -> Result<Vec<DocumentDiff>, Error> {
    let target_docs = parse_stream(target_text)?;
    let local_docs = parse_stream(local_text)?;

    let target_ids: Vec<Option<DocumentId>> =
        target_docs.iter().map(DocumentId::from_value).collect();
    let local_ids: Vec<Option<DocumentId>> =
        local_docs.iter().map(DocumentId::from_value).collect();

    // An identity is only trustworthy when it appears at most once per side;
    // duplicates fall back to ordinal pairing alongside anonymous documents.
    let mut counts: HashMap<&DocumentId, (usize, usize)> = HashMap::new();
    for id in target_ids.iter().flatten() {
        counts.entry(id).or_default().0 += 1;
    }
    for id in local_ids.iter().flatten() {
        counts.entry(id).or_default().1 += 1;
    }
    let usable = |id: &DocumentId| {
        counts
            .get(id)
            .is_some_and(|(t, l)| *t <= 1 && *l <= 1)
    };

    let mut target_by_id: HashMap<&DocumentId, usize> = HashMap::new();
    for (index, id) in target_ids.iter().enumerate() {
        if let Some(id) = id {
            if usable(id) {
                target_by_id.insert(id, index);
            }
        }
    }

    let mut diffs = Vec::new();
    let mut matched_target = vec![false; target_docs.len()];
    let mut ordinal_local: Vec<usize> = Vec::new();

    for (index, doc) in local_docs.iter().enumerate() {
        match &local_ids[index] {
            Some(id) if usable(id) => match target_by_id.get(id) {
                Some(&target_index) => {
                    matched_target[target_index] = true;
                    let mut changes = Vec::new();
                    diff_values(&target_docs[target_index], doc, "", &mut changes);
                    if !changes.is_empty() {
                        diffs.push(DocumentDiff {
                            label: id.label(),
                            status: DocumentStatus::Modified,
                            changes,
                        });
                    }
                }
                None => diffs.push(whole_document(id.label(), doc, DocumentStatus::Added)),
            },
            _ => ordinal_local.push(index),
        }
    }

    let mut ordinal_target: Vec<usize> = Vec::new();
    for (index, doc) in target_docs.iter().enumerate() {
        if matched_target[index] {
            continue;
        }
        match &target_ids[index] {
            Some(id) if usable(id) => {
                diffs.push(whole_document(id.label(), doc, DocumentStatus::Removed));
            }
            _ => ordinal_target.push(index),
        }
    }

    // Ordinal fallback: the n-th anonymous/ambiguous document on one side is
    // compared against the n-th on the other.
    let paired = ordinal_local.len().min(ordinal_target.len());
    for pair in 0..paired {
        let local_index = ordinal_local[pair];
        let target_index = ordinal_target[pair];
        let mut changes = Vec::new();
        diff_values(
            &target_docs[target_index],
            &local_docs[local_index],
            "",
            &mut changes,
        );
        if !changes.is_empty() {
            diffs.push(DocumentDiff {
                label: format!("document #{}", local_index + 1),
                status: DocumentStatus::Modified,
                changes,
            });
        }
    }
    for &local_index in &ordinal_local[paired..] {
        diffs.push(whole_document(
            format!("document #{}", local_index + 1),
            &local_docs[local_index],
            DocumentStatus::Added,
        ));
    }
    for &target_index in &ordinal_target[paired..] {
        diffs.push(whole_document(
            format!("document #{}", target_index + 1),
            &target_docs[target_index],
            DocumentStatus::Removed,
        ));
    }

    Ok(diffs)
}

fn parse_stream(text: &str) -> Result<Vec<Value>, Error> {
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|err| Error::DiffEngine {
            detail: err.to_string(),
        })?;
        // `---` separators around empty documents parse as null; skip them.
        if value.is_null() {
            continue;
        }
        docs.push(value);
    }
    Ok(docs)
}

/// A document present on only one side: every leaf reports as added or
/// removed.
fn whole_document(label: String, doc: &Value, status: DocumentStatus) -> DocumentDiff {
    let mut changes = Vec::new();
    flatten(doc, "", status, &mut changes);
    DocumentDiff {
        label,
        status,
        changes,
    }
}

fn flatten(value: &Value, path: &str, status: DocumentStatus, out: &mut Vec<FieldChange>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let child_path = join(path, &render(key));
                flatten(child, &child_path, status, out);
            }
        }
        Value::Sequence(seq) => {
            for (index, child) in seq.iter().enumerate() {
                let child_path = format!("{path}[{index}]");
                flatten(child, &child_path, status, out);
            }
        }
        leaf => {
            let change = match status {
                DocumentStatus::Removed => FieldChange::Removed {
                    path: path.to_string(),
                    value: render(leaf),
                },
                _ => FieldChange::Added {
                    path: path.to_string(),
                    value: render(leaf),
                },
            };
            out.push(change);
        }
    }
}

/// Recursive structural comparison. Mappings are compared key-by-key (order
/// insensitive), sequences position-by-position, everything else by value.
fn diff_values(from: &Value, to: &Value, path: &str, out: &mut Vec<FieldChange>) {
    match (from, to) {
        (Value::Mapping(a), Value::Mapping(b)) => {
            for (key, from_child) in a {
                let child_path = join(path, &render(key));
                match b.get(key) {
                    Some(to_child) => diff_values(from_child, to_child, &child_path, out),
                    None => out.push(FieldChange::Removed {
                        path: child_path,
                        value: render(from_child),
                    }),
                }
            }
            for (key, to_child) in b {
                if !a.contains_key(key) {
                    out.push(FieldChange::Added {
                        path: join(path, &render(key)),
                        value: render(to_child),
                    });
                }
            }
        }
        (Value::Sequence(a), Value::Sequence(b)) => {
            let common = a.len().min(b.len());
            for index in 0..common {
                diff_values(&a[index], &b[index], &format!("{path}[{index}]"), out);
            }
            for (index, item) in a.iter().enumerate().skip(common) {
                out.push(FieldChange::Removed {
                    path: format!("{path}[{index}]"),
                    value: render(item),
                });
            }
            for (index, item) in b.iter().enumerate().skip(common) {
                out.push(FieldChange::Added {
                    path: format!("{path}[{index}]"),
                    value: render(item),
                });
            }
        }
        _ if from == to => {}
        _ => out.push(FieldChange::Changed {
            path: path.to_string(),
            from: render(from),
            to: render(to),
        }),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Compact single-line rendering for scalars; block YAML for subtrees.
fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}
