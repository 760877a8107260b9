// src/utils/html.rs

use std::{
    cell::RefCell,
    collections::BTreeSet,
    io,
    rc::Rc,
};

use html5ever::{
    Attribute, LocalName, Namespace, ParseOpts, QualName, parse_fragment,
    serialize::{SerializeOpts, TraversalScope, serialize},
    tendril::{StrTendril, TendrilSink},
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use url::Url;

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Elements that survive sanitization.
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "strong", "b", "em", "i", "a", "code", "ul", "ol", "li", "p", "br",
];

/// URL schemes an anchor `href` may resolve to.
pub const DEFAULT_ALLOWED_SCHEMES: &[&str] = &["http", "https"];

const LINK_TARGET: &str = "_blank";
const LINK_REL: &str = "noopener noreferrer";

/// Immutable allow-list configuration for [`Sanitizer`].
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct SanitizePolicy {
    allowed_tags: BTreeSet<&'static str>,
    allowed_schemes: BTreeSet<&'static str>,
    base_url: Option<Url>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().copied().collect(),
            allowed_schemes: DEFAULT_ALLOWED_SCHEMES.iter().copied().collect(),
            base_url: None,
        }
    }
}

impl SanitizePolicy {
    /// Relative hrefs are resolved against `base_url`.
    /// Without a base, only absolute hrefs can survive.
    pub fn with_base_url(base_url: Option<Url>) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn allowed_tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.allowed_tags.iter().copied()
    }

    pub fn allowed_schemes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.allowed_schemes.iter().copied()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn allows_element(&self, name: &QualName) -> bool {
        &*name.ns == HTML_NS && self.allowed_tags.contains(&*name.local)
    }

    /// Resolves an anchor href, returning `None` when it is malformed or
    /// its scheme is not allowed.
    pub fn resolve_href(&self, href: &str) -> Option<Url> {
        let url = match &self.base_url {
            Some(base) => base.join(href),
            None => Url::parse(href),
        }
        .ok()?;

        self.allowed_schemes
            .contains(url.scheme())
            .then_some(url)
    }
}

/// What the walk does with a single child node.
enum Disposition {
    /// Allow-listed element: scrub attributes and descend.
    Keep,
    /// Element outside the allow-list: replace with its flattened text.
    Demote,
    /// Text node: left as is.
    Text,
    /// Comments, doctypes, processing instructions.
    Drop,
}

/// Allow-list HTML sanitizer for assistant chat replies.
///
/// Elements outside the allow-list are demoted to their text content rather
/// than removed, so no readable text is lost. Attributes are stripped except
/// for an `href` on `<a>` that resolves to an allowed scheme; such links also
/// get `target="_blank"` and `rel="noopener noreferrer"`.
///
/// A disallowed element is flattened as a whole: allow-listed markup nested
/// inside it does not survive.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

impl Sanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SanitizePolicy {
        &self.policy
    }

    /// Returns a fragment that is safe to assign as inner HTML.
    ///
    /// Never fails: `None` and `""` give `""`, and if the cleaned tree cannot
    /// be serialized the input is returned escaped as plain text.
    pub fn sanitize<'a>(&self, raw: impl Into<Option<&'a str>>) -> String {
        let raw = match raw.into() {
            Some(raw) if !raw.is_empty() => raw,
            _ => return String::new(),
        };

        let dom = parse(raw);
        let Some(container) = fragment_root(&dom) else {
            tracing::warn!("Fragment parse produced no container, escaping as text");
            return ammonia::clean_text(raw);
        };

        let demoted = self.scrub(&container);
        if demoted > 0 {
            tracing::debug!("Demoted {} disallowed element(s) to text", demoted);
        }

        match serialize_children(&container) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to serialize sanitized fragment: {}", e);
                ammonia::clean_text(raw)
            }
        }
    }

    /// Concatenated text of the parsed input, ignoring comments.
    pub fn visible_text(&self, raw: &str) -> String {
        let dom = parse(raw);
        fragment_root(&dom)
            .map(|container| text_content(&container))
            .unwrap_or_default()
    }

    /// Depth-first pass over the container, mutating it in place.
    /// Returns the number of demoted elements.
    fn scrub(&self, container: &Handle) -> usize {
        let mut demoted = 0;
        let mut pending = vec![container.clone()];

        while let Some(node) = pending.pop() {
            let children = std::mem::take(&mut *node.children.borrow_mut());
            let mut kept = Vec::with_capacity(children.len());

            for child in children {
                match self.classify(&child) {
                    Disposition::Keep => {
                        if let NodeData::Element { name, attrs, .. } = &child.data {
                            self.scrub_attributes(name, attrs);
                        }
                        pending.push(child.clone());
                        kept.push(child);
                    }
                    Disposition::Demote => {
                        demoted += 1;
                        let text = text_content(&child);
                        child.parent.set(None);
                        if !text.is_empty() {
                            kept.push(text_node(&node, text));
                        }
                    }
                    Disposition::Text => kept.push(child),
                    Disposition::Drop => child.parent.set(None),
                }
            }

            *node.children.borrow_mut() = kept;
        }

        demoted
    }

    fn classify(&self, node: &Handle) -> Disposition {
        match &node.data {
            NodeData::Element { name, .. } if self.policy.allows_element(name) => {
                Disposition::Keep
            }
            NodeData::Element { .. } => Disposition::Demote,
            NodeData::Text { .. } => Disposition::Text,
            NodeData::Document
            | NodeData::Doctype { .. }
            | NodeData::Comment { .. }
            | NodeData::ProcessingInstruction { .. } => Disposition::Drop,
        }
    }

    fn scrub_attributes(&self, name: &QualName, attrs: &RefCell<Vec<Attribute>>) {
        let mut attrs = attrs.borrow_mut();
        if &*name.local != "a" {
            attrs.clear();
            return;
        }

        let href = attrs
            .iter()
            .find(|attr| attr.name.ns.is_empty() && &*attr.name.local == "href")
            .map(|attr| attr.value.to_string());
        attrs.clear();

        let Some(href) = href else {
            return;
        };
        match self.policy.resolve_href(&href) {
            Some(url) => {
                attrs.push(attribute("href", url.as_str()));
                attrs.push(attribute("target", LINK_TARGET));
                attrs.push(attribute("rel", LINK_REL));
            }
            None => tracing::debug!("Dropped unsafe href: {}", href),
        }
    }
}

/// Parses `raw` as the children of a synthetic `<div>`.
fn parse(raw: &str) -> RcDom {
    let context = QualName::new(None, Namespace::from(HTML_NS), LocalName::from("div"));
    parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(raw)
}

/// The element holding the parsed fragment.
///
/// The returned handle is only populated while `dom` is alive: dropping the
/// document detaches every descendant's children.
fn fragment_root(dom: &RcDom) -> Option<Handle> {
    let root = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned();
    root
}

/// Text of every descendant text node in document order.
fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    let mut pending: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();

    while let Some(current) = pending.pop() {
        match &current.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            NodeData::Element { .. } => {
                pending.extend(current.children.borrow().iter().rev().cloned());
            }
            _ => {}
        }
    }

    text
}

fn text_node(parent: &Handle, text: String) -> Handle {
    let node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    });
    node.parent.set(Some(Rc::downgrade(parent)));
    node
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from(value),
    }
}

fn serialize_children(container: &Handle) -> io::Result<String> {
    let mut out = Vec::new();
    let handle = SerializableHandle::from(container.clone());
    serialize(
        &mut out,
        &handle,
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
