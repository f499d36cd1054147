//! Owned XML element tree.
//!
//! `roxmltree` borrows its input, so the document is converted once into
//! owned [`Element`]s right after parsing. Only element names, leaf text and
//! child order are kept; attributes, comments and processing instructions
//! carry nothing the project model needs.

/// A single XML element with its children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    /// Text content, only recorded for leaf elements. `Some("")` for
    /// `<Tag/>` and `<Tag></Tag>`.
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Converts a parsed `roxmltree` node and its subtree.
    pub(crate) fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let children: Vec<Self> = node
            .children()
            .filter(roxmltree::Node::is_element)
            .map(Self::from_node)
            .collect();

        let text = if children.is_empty() {
            Some(
                node.children()
                    .filter(roxmltree::Node::is_text)
                    .filter_map(|t| t.text())
                    .collect(),
            )
        } else {
            None
        };

        Self {
            name: node.tag_name().name().to_owned(),
            text,
            children,
        }
    }

    /// Returns the element's tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the element's own text.
    ///
    /// `None` for elements with child elements, `Some("")` for empty leaves.
    #[must_use]
    pub fn own_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns an iterator over the direct children.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// Finds the first direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Returns the text of the first direct child with the given name.
    ///
    /// `None` when the child is missing, `Some("")` when it is present but
    /// empty.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::own_text)
    }

    /// Searches the subtree for `path` (`"A/B/C"`), where the first component
    /// may sit at any depth below `self` and the remaining components are
    /// direct children. Returns the first match in document order.
    ///
    /// Elements whose name is in `stop` are not descended into; this keeps a
    /// lookup on a target from reaching into its groups.
    #[must_use]
    pub fn find_scoped(&self, path: &str, stop: &[&str]) -> Option<&Element> {
        let mut components = path.split('/').filter(|c| !c.is_empty());
        let first = components.next()?;
        let rest: Vec<&str> = components.collect();
        self.find_descendant(first, &rest, stop)
    }

    /// Like [`Element::find_scoped`] with no stop set.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_scoped(path, &[])
    }

    /// Returns the text at `path`: `None` if absent, `Some("")` if empty.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        self.text_scoped(path, &[])
    }

    /// Returns the text at `path`, scoped as in [`Element::find_scoped`].
    #[must_use]
    pub fn text_scoped(&self, path: &str, stop: &[&str]) -> Option<&str> {
        self.find_scoped(path, stop).and_then(Element::own_text)
    }

    /// Returns all elements named `name` anywhere below `self`, in document
    /// order.
    #[must_use]
    pub fn descendants_named(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    /// Consumes the tree, returning every element named `name` that is not
    /// itself nested inside another match.
    pub(crate) fn into_outermost_named(self, name: &str, out: &mut Vec<Element>) {
        if self.name == name {
            out.push(self);
            return;
        }
        for child in self.children {
            child.into_outermost_named(name, out);
        }
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    fn find_descendant(&self, first: &str, rest: &[&str], stop: &[&str]) -> Option<&Element> {
        for child in &self.children {
            if child.name == first {
                if let Some(found) = child.follow(rest) {
                    return Some(found);
                }
            }
            if stop.contains(&child.name.as_str()) {
                continue;
            }
            if let Some(found) = child.find_descendant(first, rest, stop) {
                return Some(found);
            }
        }
        None
    }

    fn follow(&self, rest: &[&str]) -> Option<&Element> {
        rest.iter().try_fold(self, |current, name| current.child(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Element {
        let doc = roxmltree::Document::parse(xml).unwrap();
        Element::from_node(doc.root_element())
    }

    #[test]
    fn missing_and_empty_text_differ() {
        let root = parse("<R><Empty/><Blank></Blank><Full>x</Full></R>");
        assert_eq!(root.child_text("Empty"), Some(""));
        assert_eq!(root.child_text("Blank"), Some(""));
        assert_eq!(root.child_text("Full"), Some("x"));
        assert_eq!(root.child_text("Absent"), None);
    }

    #[test]
    fn container_has_no_text() {
        let root = parse("<R>\n  <A>1</A>\n</R>");
        assert_eq!(root.own_text(), None);
    }

    #[test]
    fn find_path_at_any_depth() {
        let root = parse("<R><X><Y><A><B>deep</B></A></Y></X></R>");
        assert_eq!(root.find("A/B").and_then(Element::own_text), Some("deep"));
        assert!(root.find("A/C").is_none());
    }

    #[test]
    fn find_returns_first_in_document_order() {
        let root = parse("<R><A><B>one</B></A><A><B>two</B></A></R>");
        assert_eq!(root.find("A/B").and_then(Element::own_text), Some("one"));
    }

    #[test]
    fn find_skips_first_component_without_rest() {
        // The first <A> lacks <B>; the search must continue to the second.
        let root = parse("<R><A><C/></A><Z><A><B>hit</B></A></Z></R>");
        assert_eq!(root.find("A/B").and_then(Element::own_text), Some("hit"));
    }

    #[test]
    fn stop_set_blocks_descent() {
        let root = parse("<R><Groups><G><Flag>0</Flag></G></Groups></R>");
        assert!(root.find_scoped("Flag", &["Groups"]).is_none());
        assert_eq!(root.text("Flag"), Some("0"));
    }

    #[test]
    fn descendants_in_document_order() {
        let root = parse("<R><F>a</F><N><F>b</F></N><F>c</F></R>");
        let texts: Vec<_> = root
            .descendants_named("F")
            .into_iter()
            .filter_map(Element::own_text)
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }
}
