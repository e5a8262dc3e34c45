use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) disabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let disabled = attrs.contains_key("disabled");
        let id_attr = attrs.get("id").filter(|id| !id.is_empty()).cloned();
        let element = Element {
            tag_name,
            attrs,
            value,
            disabled,
        };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = id_attr {
            self.id_index.entry(id_attr).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)?.attrs.get(name).cloned()
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|e| e.disabled)
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    /// Replaces the children of `node_id` with one text node.
    ///
    /// A lone text child is rewritten in place. Any other children are detached but stay in the
    /// arena, so repeated writes over element content grow `nodes`.
    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Runtime(
                "textContent target is not an element".into(),
            ));
        }
        let lone_child = match self.nodes[node_id.0].children.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        if let Some(child) = lone_child {
            if !value.is_empty() {
                if let NodeType::Text(text) = &mut self.nodes[child.0].node_type {
                    *text = value.to_string();
                    return Ok(());
                }
            }
        }

        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Runtime("value target is not an element".into()))?;
        Ok(element.value.clone())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Runtime("value target is not an element".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn initialize_form_control_values(&mut self) -> Result<()> {
        for node in self.all_element_nodes() {
            let is_textarea = self
                .tag_name(node)
                .is_some_and(|tag| tag.eq_ignore_ascii_case("textarea"));
            if !is_textarea {
                continue;
            }
            let text = self.text_content(node);
            let element = self
                .element_mut(node)
                .ok_or_else(|| Error::Runtime("textarea target is not an element".into()))?;
            element.value = text;
        }
        Ok(())
    }

    /// Parses `html` as a fragment and places its top-level nodes right after `target`,
    /// keeping their order. A detached target leaves the tree untouched.
    pub(crate) fn insert_html_after(&mut self, target: NodeId, html: &str) -> Result<Vec<NodeId>> {
        let fragment = parse_html(html)?;
        if self.parent(target).is_none() {
            return Ok(Vec::new());
        }

        let mut inserted = Vec::new();
        let mut anchor = target;
        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            let node = self.clone_subtree_from_dom(&fragment, child, None)?;
            self.insert_after(anchor, node)?;
            inserted.push(node);
            anchor = node;
        }

        self.rebuild_id_index();
        Ok(inserted)
    }

    fn clone_subtree_from_dom(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let node_type = match &source.nodes[source_node.0].node_type {
            NodeType::Document => {
                return Err(Error::Runtime(
                    "cannot clone document node into the page".into(),
                ));
            }
            NodeType::Element(element) => NodeType::Element(element.clone()),
            NodeType::Text(text) => NodeType::Text(text.clone()),
        };

        let node = self.create_node(parent, node_type);
        for child in &source.nodes[source_node.0].children {
            self.clone_subtree_from_dom(source, *child, Some(node))?;
        }
        Ok(node)
    }

    fn insert_after(&mut self, target: NodeId, node: NodeId) -> Result<()> {
        let Some(parent) = self.parent(target) else {
            return Ok(());
        };
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| *child == target)
            .ok_or_else(|| Error::Runtime("insert target is not a child of its parent".into()))?;
        self.nodes[parent.0].children.insert(position + 1, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].step.id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        Ok(self.filter_matching(ids, &groups))
    }

    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut ids = Vec::new();
        for child in &self.nodes[root.0].children {
            self.collect_elements_dfs(*child, &mut ids);
        }
        Ok(self.filter_matching(ids, &groups))
    }

    fn filter_matching(
        &self,
        candidates: Vec<NodeId>,
        groups: &[Vec<SelectorPart>],
    ) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for candidate in candidates {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(candidate, steps))
                && seen.insert(candidate)
            {
                matched.push(candidate);
            }
        }
        matched
    }

    pub(crate) fn matches_selector(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        if self.element(node_id).is_none() {
            return Ok(false);
        }

        let groups = parse_selector_groups(selector)?;
        Ok(groups
            .iter()
            .any(|steps| self.matches_selector_chain(node_id, steps)))
    }

    fn rebuild_id_index(&mut self) {
        let mut next = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let NodeType::Element(element) = &self.nodes[node.0].node_type {
                if let Some(id) = element.attrs.get("id") {
                    if !id.is_empty() {
                        next.entry(id.clone()).or_insert(node);
                    }
                }
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        self.id_index = next;
    }

    fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        if matches!(self.nodes[node_id.0].node_type, NodeType::Element(_)) {
            out.push(node_id);
        }
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    pub(crate) fn all_element_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_dfs(self.root, &mut out);
        out
    }

    fn matches_selector_chain(&self, node_id: NodeId, steps: &[SelectorPart]) -> bool {
        let Some(last) = steps.last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }

        let mut current = node_id;
        for idx in (1..steps.len()).rev() {
            let prev_step = &steps[idx - 1].step;
            let combinator = steps[idx]
                .combinator
                .unwrap_or(SelectorCombinator::Descendant);

            let matched = match combinator {
                SelectorCombinator::Child => self
                    .parent(current)
                    .filter(|parent| self.matches_step(*parent, prev_step)),
                SelectorCombinator::Descendant => {
                    let mut cursor = self.parent(current);
                    let mut found = None;
                    while let Some(parent) = cursor {
                        if self.matches_step(parent, prev_step) {
                            found = Some(parent);
                            break;
                        }
                        cursor = self.parent(parent);
                    }
                    found
                }
            };

            let Some(matched) = matched else {
                return false;
            };
            current = matched;
        }

        true
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }

        if step
            .classes
            .iter()
            .any(|class_name| !has_class(element, class_name))
        {
            return false;
        }

        step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
            SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            SelectorAttrCondition::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.starts_with(value.as_str())),
            SelectorAttrCondition::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.ends_with(value.as_str())),
        })
    }

    pub(crate) fn node_label(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => "#document".into(),
            NodeType::Text(_) => "#text".into(),
            NodeType::Element(element) => {
                let mut label = element.tag_name.clone();
                if let Some(id) = element.attrs.get("id").filter(|id| !id.is_empty()) {
                    label.push('#');
                    label.push_str(id);
                } else if let Some(first) = class_tokens(element).first() {
                    label.push('.');
                    label.push_str(first);
                }
                label
            }
        }
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort();
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(v);
                    out.push('"');
                }
                out.push('>');
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }
}

fn class_tokens(element: &Element) -> Vec<&str> {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().collect())
        .unwrap_or_default()
}

fn has_class(element: &Element, class_name: &str) -> bool {
    class_tokens(element).contains(&class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_html_after_keeps_fragment_order_and_indexes_ids() -> Result<()> {
        let mut dom = parse_html("<div id='host'><span id='anchor'></span><p id='tail'></p></div>")?;
        let anchor = dom
            .by_id("anchor")
            .ok_or_else(|| Error::SelectorNotFound("#anchor".into()))?;

        let inserted = dom.insert_html_after(anchor, "<h3>Late</h3><button id='late'>Go</button> > ")?;
        assert_eq!(inserted.len(), 3);

        let host = dom
            .by_id("host")
            .ok_or_else(|| Error::SelectorNotFound("#host".into()))?;
        assert_eq!(
            dom.dump_node(host),
            "<div id=\"host\"><span id=\"anchor\"></span><h3>Late</h3><button id=\"late\">Go</button> > <p id=\"tail\"></p></div>"
        );
        assert!(dom.by_id("late").is_some());
        Ok(())
    }

    #[test]
    fn insert_html_after_detached_target_is_a_noop() -> Result<()> {
        let mut dom = Dom::new();
        let detached = dom.create_node(None, NodeType::Text("x".into()));
        let inserted = dom.insert_html_after(detached, "<b id='b'></b>")?;
        assert!(inserted.is_empty());
        assert!(dom.by_id("b").is_none());
        Ok(())
    }

    #[test]
    fn set_text_content_replaces_children_and_drops_stale_ids() -> Result<()> {
        let mut dom = parse_html("<span id='out'><b id='old'>x</b></span>")?;
        let out = dom
            .by_id("out")
            .ok_or_else(|| Error::SelectorNotFound("#out".into()))?;
        dom.set_text_content(out, "1 2 3")?;
        assert_eq!(dom.text_content(out), "1 2 3");
        assert!(dom.by_id("old").is_none());

        dom.set_text_content(out, "")?;
        assert_eq!(dom.text_content(out), "");
        assert!(dom.nodes[out.0].children.is_empty());
        Ok(())
    }

    #[test]
    fn repeated_text_writes_reuse_the_lone_text_child() -> Result<()> {
        let mut dom = parse_html("<span id='out'>old</span>")?;
        let out = dom
            .by_id("out")
            .ok_or_else(|| Error::SelectorNotFound("#out".into()))?;
        let arena_len = dom.nodes.len();

        for text in ["3 1 2", "1 2 3", "a b"] {
            dom.set_text_content(out, text)?;
            assert_eq!(dom.text_content(out), text);
        }
        assert_eq!(dom.nodes.len(), arena_len);
        assert_eq!(dom.nodes[out.0].children.len(), 1);
        Ok(())
    }

    #[test]
    fn selectors_match_class_id_and_attribute_prefix() -> Result<()> {
        let dom = parse_html(
            "<div id='root'><button class='do-sort primary' id='do-a'></button>\
             <button class='other' id='do-b'></button><span id='result-a'></span></div>",
        )?;
        assert_eq!(dom.query_selector_all(".do-sort")?.len(), 1);
        assert_eq!(dom.query_selector_all("[id^=do-]")?.len(), 2);
        assert_eq!(dom.query_selector_all("#root > button")?.len(), 2);
        assert_eq!(dom.query_selector_all("div span")?.len(), 1);
        assert_eq!(dom.query_selector_all("button, span")?.len(), 3);

        let late = dom.query_selector("button.primary")?;
        let late = late.ok_or_else(|| Error::SelectorNotFound("button.primary".into()))?;
        assert!(dom.matches_selector(late, ".do-sort")?);
        assert!(!dom.matches_selector(late, ".other")?);
        assert_eq!(dom.node_label(late), "button#do-a");
        Ok(())
    }

    #[test]
    fn textarea_value_is_seeded_from_text() -> Result<()> {
        let dom = parse_html("<textarea id='t'>3 1 2</textarea>")?;
        let node = dom
            .by_id("t")
            .ok_or_else(|| Error::SelectorNotFound("#t".into()))?;
        assert_eq!(dom.value(node)?, "3 1 2");
        Ok(())
    }
}
