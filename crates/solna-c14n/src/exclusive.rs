#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//!
//! A namespace declaration is output on an element only when the element
//! visibly utilizes its prefix, i.e. the prefix is used by the element's own
//! name or by one of its attributes (the default namespace counts as
//! utilized by an unprefixed element), and only when the nearest output
//! ancestor has not already rendered the same binding.
//!
//! Prefixes are resolved against the declarations written in the tree,
//! never against the namespace URIs cached on `QName`s: that is what a
//! receiver parsing the serialized bytes will see.

use crate::escape;
use crate::render::{Attr, NsDecl};
use solna_core::{ns, Error};
use std::collections::{BTreeMap, BTreeSet};
use uppsala::{Document, Element, NodeId, NodeKind};

/// Namespace bindings considered in scope at a subtree root.
///
/// An absent or empty-URI default binding means "no default namespace".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    bindings: BTreeMap<String, String>,
}

impl NamespaceContext {
    /// A context with no bindings: the subtree must declare every prefix it uses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bindings declared on the ancestors of `node`, the way a receiver
    /// parsing the whole document sees them at `node`.
    pub fn inherited(doc: &Document<'_>, node: NodeId) -> Self {
        let mut chain = doc.ancestors(node);
        chain.reverse();
        chain
            .into_iter()
            .filter_map(|n| doc.element(n))
            .fold(Self::empty(), |ctx, elem| ctx.enter(elem))
    }

    /// Bind `prefix` (`""` for the default namespace) to `uri`.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if uri.is_empty() {
            self.bindings.remove(prefix);
        } else {
            self.bindings.insert(prefix.to_owned(), uri.to_owned());
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// The scope inside `elem`: this context plus the element's own declarations.
    fn enter(&self, elem: &Element<'_>) -> Self {
        let mut scope = self.clone();
        for (prefix, uri) in &elem.namespace_declarations {
            scope.bind(prefix, uri);
        }
        scope
    }
}

/// Canonicalize the subtree rooted at `node` with an empty starting context.
///
/// Every prefix used inside the subtree must be declared inside it; a
/// prefix bound only on an ancestor is an error.
pub fn canonicalize(doc: &Document<'_>, node: NodeId) -> Result<Vec<u8>, Error> {
    canonicalize_with(doc, node, &NamespaceContext::empty())
}

/// Canonicalize the subtree rooted at `node` with `context` in scope at its root.
pub fn canonicalize_with(
    doc: &Document<'_>,
    node: NodeId,
    context: &NamespaceContext,
) -> Result<Vec<u8>, Error> {
    if doc.element(node).is_none() {
        return Err(Error::Canonicalization(format!(
            "node {} is not an element",
            node.index()
        )));
    }
    let mut output = Vec::new();
    process_node(doc, node, context, &BTreeMap::new(), &mut output)?;
    Ok(output)
}

fn process_node(
    doc: &Document<'_>,
    id: NodeId,
    scope: &NamespaceContext,
    rendered_ns: &BTreeMap<String, String>,
    output: &mut Vec<u8>,
) -> Result<(), Error> {
    match doc.node_kind(id) {
        Some(NodeKind::Element(elem)) => {
            process_element(doc, id, elem, scope, rendered_ns, output)?;
        }
        Some(NodeKind::Text(text)) | Some(NodeKind::CData(text)) => {
            output.extend_from_slice(escape::escape_text(text).as_bytes());
        }
        Some(NodeKind::ProcessingInstruction(pi)) => {
            output.extend_from_slice(b"<?");
            output.extend_from_slice(pi.target.as_bytes());
            if let Some(data) = pi.data.as_deref().filter(|d| !d.is_empty()) {
                output.push(b' ');
                output.extend_from_slice(escape::escape_pi(data).as_bytes());
            }
            output.extend_from_slice(b"?>");
        }
        _ => {}
    }
    Ok(())
}

fn process_element(
    doc: &Document<'_>,
    id: NodeId,
    elem: &Element<'_>,
    parent_scope: &NamespaceContext,
    rendered_ns: &BTreeMap<String, String>,
    output: &mut Vec<u8>,
) -> Result<(), Error> {
    let scope = parent_scope.enter(elem);
    let name = elem.name.prefixed_name();

    let mut utilized: BTreeSet<&str> = BTreeSet::new();
    utilized.insert(elem.name.prefix.as_deref().unwrap_or(""));
    for attr in &elem.attributes {
        if let Some(prefix) = attr.name.prefix.as_deref().filter(|p| !p.is_empty()) {
            utilized.insert(prefix);
        }
    }

    let mut ns_decls = Vec::new();
    for prefix in utilized {
        if prefix == ns::prefix::XML {
            continue;
        }
        match scope.get(prefix) {
            Some(uri) => {
                if rendered_ns.get(prefix).map(String::as_str) != Some(uri) {
                    ns_decls.push(NsDecl {
                        prefix: prefix.to_owned(),
                        uri: uri.to_owned(),
                    });
                }
            }
            None if prefix.is_empty() => {
                if rendered_ns.get("").is_some_and(|uri| !uri.is_empty()) {
                    ns_decls.push(NsDecl {
                        prefix: String::new(),
                        uri: String::new(),
                    });
                }
            }
            None => {
                return Err(Error::Canonicalization(format!(
                    "prefix \"{prefix}\" used on <{name}> is not declared in scope"
                )));
            }
        }
    }
    ns_decls.sort();

    let mut attrs = Vec::with_capacity(elem.attributes.len());
    for attr in &elem.attributes {
        let ns_uri = match attr.name.prefix.as_deref().filter(|p| !p.is_empty()) {
            None => String::new(),
            Some(ns::prefix::XML) => ns::XML.to_owned(),
            Some(prefix) => scope
                .get(prefix)
                .ok_or_else(|| {
                    Error::Canonicalization(format!(
                        "prefix \"{prefix}\" of attribute {} is not declared in scope",
                        attr.name.prefixed_name()
                    ))
                })?
                .to_owned(),
        };
        attrs.push(Attr {
            ns_uri,
            local_name: attr.name.local_name.to_string(),
            qualified_name: attr.name.prefixed_name().into_owned(),
            value: attr.value.to_string(),
        });
    }
    attrs.sort();

    let mut start = String::new();
    start.push('<');
    start.push_str(&name);
    for decl in &ns_decls {
        decl.write_to(&mut start);
    }
    for attr in &attrs {
        attr.write_to(&mut start);
    }
    start.push('>');
    output.extend_from_slice(start.as_bytes());

    let child_rendered = if ns_decls.is_empty() {
        rendered_ns.clone()
    } else {
        let mut next = rendered_ns.clone();
        for decl in ns_decls {
            next.insert(decl.prefix, decl.uri);
        }
        next
    };

    for child in doc.children_iter(id) {
        process_node(doc, child, &scope, &child_rendered, output)?;
    }

    output.extend_from_slice(b"</");
    output.extend_from_slice(name.as_bytes());
    output.push(b'>');
    Ok(())
}
