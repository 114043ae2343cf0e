#![forbid(unsafe_code)]

//! Mutable XML document for building and signing envelopes.
//!
//! [`Document`] wraps an `uppsala::Document` and derefs to it for read
//! access (`element`, `children`, `parent`, `node_kind`, ...).  Writes go
//! through the methods here so that once a document is frozen nothing can
//! reach the tree mutably except [`FrozenDocument::fill_text`].
//!
//! Names are `uppsala::QName`s carrying prefix *and* namespace URI.  The
//! URI must match the binding in scope for the prefix, otherwise the
//! serializer would add declarations the tree does not hold.

use solna_core::Error;
use std::borrow::Cow;
use std::ops::Deref;
use uppsala::{NodeId, NodeKind, QName};

/// How whitespace is laid out when a document is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No whitespace is added.
    Compact,
    /// One element per line, indented by the given number of spaces per level.
    Indented(usize),
}

/// A mutable XML document with a single root element.
#[derive(Debug, Clone)]
pub struct Document {
    tree: uppsala::Document<'static>,
    root: NodeId,
}

impl Document {
    /// Create a document whose root element is `root`.
    pub fn new(root: QName<'static>) -> Self {
        let mut tree = uppsala::Document::new();
        let element = tree.create_element(root);
        let document_node = tree.root();
        tree.append_child(document_node, element);
        Self { tree, root: element }
    }

    pub(crate) fn from_tree(tree: uppsala::Document<'static>) -> Result<Self, Error> {
        let root = tree
            .document_element()
            .ok_or_else(|| Error::XmlParse("no root element".into()))?;
        Ok(Self { tree, root })
    }

    /// The root element (not the document node above it).
    pub fn root_element(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &uppsala::Document<'static> {
        &self.tree
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.tree
            .children_iter(id)
            .filter(|&c| self.tree.element(c).is_some())
    }

    /// First child element with the given local name, whatever its prefix.
    pub fn find_child(&self, parent: NodeId, local_name: &str) -> Option<NodeId> {
        self.child_elements(parent).find(|&c| {
            self.tree
                .element(c)
                .is_some_and(|e| e.name.local_name == local_name)
        })
    }

    /// Concatenated text of the direct text and CDATA children of `id`.
    pub fn text(&self, id: NodeId) -> String {
        self.tree
            .children_iter(id)
            .filter_map(|c| match self.tree.node_kind(c) {
                Some(NodeKind::Text(t)) | Some(NodeKind::CData(t)) => Some(t.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// The URI bound to `prefix` by a declaration written on element `id`.
    pub fn declared_namespace(&self, id: NodeId, prefix: &str) -> Option<&str> {
        self.tree.element(id).and_then(|e| {
            e.namespace_declarations
                .iter()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_ref())
        })
    }

    // ── Construction ─────────────────────────────────────────────────

    /// Append a child element to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: QName<'static>) -> NodeId {
        let id = self.tree.create_element(name);
        self.tree.append_child(parent, id);
        id
    }

    /// Insert a child element before every existing child of `parent`.
    pub fn prepend_element(&mut self, parent: NodeId, name: QName<'static>) -> NodeId {
        let id = self.tree.create_element(name);
        match self.tree.first_child(parent) {
            Some(first) => self.tree.insert_before(parent, id, first),
            None => self.tree.append_child(parent, id),
        }
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.tree.create_text(text.to_owned());
        self.tree.append_child(parent, id);
        id
    }

    /// Append a child element holding only `text`.
    pub fn append_text_element(
        &mut self,
        parent: NodeId,
        name: QName<'static>,
        text: &str,
    ) -> NodeId {
        let id = self.append_element(parent, name);
        self.append_text(id, text);
        id
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut uppsala::Element<'static>, Error> {
        self.tree
            .element_mut(id)
            .ok_or_else(|| Error::XmlStructure(format!("node {} is not an element", id.index())))
    }

    /// Set an attribute, replacing any attribute with the same name.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: QName<'static>,
        value: &str,
    ) -> Result<(), Error> {
        self.element_mut(id)?
            .set_attribute(name, Cow::Owned(value.to_owned()));
        Ok(())
    }

    /// Remove the first attribute with the given local name.
    pub fn remove_attribute(&mut self, id: NodeId, local_name: &str) -> Result<Option<String>, Error> {
        Ok(self
            .element_mut(id)?
            .remove_attribute(local_name)
            .map(Cow::into_owned))
    }

    /// Bind `prefix` (`""` for the default namespace) to `uri` on element
    /// `id`.  Re-declaring replaces the URI in place.
    pub fn declare_namespace(&mut self, id: NodeId, prefix: &str, uri: &str) -> Result<(), Error> {
        let prefix = (!prefix.is_empty()).then_some(prefix);
        if self.tree.declare_namespace(id, prefix, uri.to_owned()) {
            Ok(())
        } else {
            Err(Error::XmlStructure(format!("node {} is not an element", id.index())))
        }
    }

    pub fn remove_namespace(&mut self, id: NodeId, prefix: &str) -> Result<Option<String>, Error> {
        let decls = &mut self.element_mut(id)?.namespace_declarations;
        Ok(decls
            .iter()
            .position(|(p, _)| p == prefix)
            .map(|pos| decls.remove(pos).1.into_owned()))
    }

    /// Find the element whose `Id` attribute (any prefix, e.g. `wsu:Id`)
    /// equals `value`.  Two elements carrying the same value is an error.
    pub fn find_by_id(&self, value: &str) -> Result<Option<NodeId>, Error> {
        let mut found = None;
        for n in std::iter::once(self.root).chain(self.tree.descendants(self.root)) {
            let Some(elem) = self.tree.element(n) else { continue };
            let carries = elem
                .attributes
                .iter()
                .any(|a| a.name.local_name == "Id" && a.value == value);
            if carries {
                if found.is_some() {
                    return Err(Error::XmlStructure(format!(
                        "Id \"{value}\" is carried by more than one element"
                    )));
                }
                found = Some(n);
            }
        }
        Ok(found)
    }

    // ── Layout ───────────────────────────────────────────────────────

    /// Fix the document's whitespace layout for good.
    ///
    /// The returned [`FrozenDocument`] cannot be re-indented, and its only
    /// mutation fills the text of childless elements.
    pub fn freeze(mut self, layout: Layout) -> FrozenDocument {
        if let Layout::Indented(width) = layout {
            self.indent(self.root, 0, width);
        }
        FrozenDocument { doc: self }
    }

    fn indent(&mut self, id: NodeId, depth: usize, width: usize) {
        let children = self.tree.children(id);
        if !children.iter().any(|&c| self.tree.element(c).is_some()) {
            return;
        }
        for &child in &children {
            self.tree.detach(child);
        }

        for child in children {
            let blank = matches!(
                self.tree.node_kind(child),
                Some(NodeKind::Text(t)) if t.trim().is_empty()
            );
            if blank {
                continue;
            }
            let pad = self
                .tree
                .create_text(format!("\n{}", " ".repeat(width * (depth + 1))));
            self.tree.append_child(id, pad);
            self.tree.append_child(id, child);
            if self.tree.element(child).is_some() {
                self.indent(child, depth + 1, width);
            }
        }
        let pad = self.tree.create_text(format!("\n{}", " ".repeat(width * depth)));
        self.tree.append_child(id, pad);
    }
}

impl Deref for Document {
    type Target = uppsala::Document<'static>;

    fn deref(&self) -> &Self::Target {
        &self.tree
    }
}

/// A document whose layout is final.
///
/// Derefs to [`Document`] for read access.  The bytes produced by
/// [`FrozenDocument::to_bytes`] render the tree exactly as it is; nothing
/// is reformatted on the way out.
#[derive(Debug, Clone)]
pub struct FrozenDocument {
    doc: Document,
}

impl FrozenDocument {
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Set the text of an element that has no children yet.
    pub fn fill_text(&mut self, id: NodeId, text: &str) -> Result<(), Error> {
        let elem = self.doc.element(id).ok_or_else(|| {
            Error::XmlStructure(format!("node {} is not an element", id.index()))
        })?;
        if self.doc.first_child(id).is_some() {
            return Err(Error::XmlStructure(format!(
                "<{}> already has content",
                elem.name.prefixed_name()
            )));
        }
        self.doc.append_text(id, text);
        Ok(())
    }

    /// Serialize the document: declaration, root element, trailing newline.
    pub fn to_bytes(&self) -> Vec<u8> {
        crate::writer::serialize(&self.doc)
    }
}

impl Deref for FrozenDocument {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.doc
    }
}
