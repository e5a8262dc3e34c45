use super::*;

/// A deterministic in-memory page: a parsed tree plus the listeners bound to it.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) trace: TraceState,
}

// Deep delegated handler chains can recurse through dispatch; keep room for them.
const DISPATCH_STACK_SIZE: usize = 32 * 1024 * 1024;

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            trace: TraceState::default(),
        })
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        stacker::grow(DISPATCH_STACK_SIZE, || {
            self.dom.set_value(target, text)?;
            self.dispatch_event(target, "input")?;
            Ok(())
        })
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        stacker::grow(DISPATCH_STACK_SIZE, || {
            self.dispatch_event(target, "click")?;
            Ok(())
        })
    }

    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        stacker::grow(DISPATCH_STACK_SIZE, || {
            self.dispatch_event(target, event_type)?;
            Ok(())
        })
    }

    /// Parses `html` and inserts it directly after the first element matching `selector`.
    /// Returns `false` when nothing matches, leaving the page unchanged.
    pub fn insert_html_after(&mut self, selector: &str, html: &str) -> Result<bool> {
        let Some(anchor) = self.dom.query_selector(selector)? else {
            return Ok(false);
        };
        let inserted = self.dom.insert_html_after(anchor, html)?;
        self.trace_line(format!(
            "[dom] inserted {} node(s) after {}",
            inserted.len(),
            self.dom.node_label(anchor)
        ));
        Ok(true)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.dom.query_selector(selector)?.is_some())
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_text_matches(&self, selector: &str, pattern: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let regex = fancy_regex::Regex::new(pattern)
            .map_err(|err| Error::InvalidPattern(format!("{pattern}: {err}")))?;
        let actual = self.dom.text_content(target);
        let matched = regex
            .is_match(&actual)
            .map_err(|err| Error::InvalidPattern(format!("{pattern}: {err}")))?;
        if !matched {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("match /{pattern}/"),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        self.select_one(selector).map(|_| ())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub(crate) fn element_text_by_id(&self, id: &str) -> Option<String> {
        self.dom.by_id(id).map(|node| self.dom.text_content(node))
    }

    pub(crate) fn element_value_by_id(&self, id: &str) -> Option<String> {
        let node = self.dom.by_id(id)?;
        self.dom.value(node).ok()
    }

    /// Replaces the content of the element with `id`. Returns `false` when no such element exists.
    pub(crate) fn set_text_by_id(&mut self, id: &str, text: &str) -> Result<bool> {
        let Some(node) = self.dom.by_id(id) else {
            return Ok(false);
        };
        self.dom.set_text_content(node, text)?;
        Ok(true)
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_text_updates_value_and_fires_input() -> Result<()> {
        let mut page = Page::from_html("<input id='field'><p id='echo'></p>")?;
        page.bind("#field", "input", "echo", |page, _| {
            let value = page.element_value_by_id("field").unwrap_or_default();
            page.set_text_by_id("echo", &value)?;
            Ok(())
        })?;

        page.type_text("#field", "3 1 2")?;
        page.assert_value("#field", "3 1 2")?;
        page.assert_text("#echo", "3 1 2")?;
        Ok(())
    }

    #[test]
    fn type_text_rejects_non_form_controls() -> Result<()> {
        let mut page = Page::from_html("<span id='out'></span>")?;
        match page.type_text("#out", "x") {
            Err(Error::TypeMismatch { actual, .. }) => assert_eq!(actual, "span"),
            other => panic!("expected type mismatch, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn disabled_controls_ignore_clicks_and_typing() -> Result<()> {
        let mut page =
            Page::from_html("<input id='field' disabled><button id='go' disabled></button>")?;
        page.live("#go", "click", "never", |_, _| {
            Err(Error::Runtime("disabled button fired".into()))
        })?;
        page.click("#go")?;
        page.type_text("#field", "ignored")?;
        page.assert_value("#field", "")?;
        Ok(())
    }

    #[test]
    fn missing_selector_is_reported() -> Result<()> {
        let mut page = Page::from_html("<p id='p'></p>")?;
        assert_eq!(
            page.click("#missing"),
            Err(Error::SelectorNotFound("#missing".into()))
        );
        assert!(!page.exists("#missing")?);
        assert!(page.assert_exists("#p").is_ok());
        Ok(())
    }

    #[test]
    fn assert_text_reports_snippet_on_mismatch() -> Result<()> {
        let page = Page::from_html("<span id='out'>2 1</span>")?;
        match page.assert_text("#out", "1 2") {
            Err(Error::AssertionFailed {
                actual,
                dom_snippet,
                ..
            }) => {
                assert_eq!(actual, "2 1");
                assert_eq!(dom_snippet, "<span id=\"out\">2 1</span>");
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn assert_text_matches_uses_regex_patterns() -> Result<()> {
        let page = Page::from_html("<span id='out'>3 1 2</span>")?;
        page.assert_text_matches("#out", r"^\d( \d)*$")?;
        assert!(matches!(
            page.assert_text_matches("#out", "^[a-z]+$"),
            Err(Error::AssertionFailed { .. })
        ));
        assert!(matches!(
            page.assert_text_matches("#out", "("),
            Err(Error::InvalidPattern(_))
        ));
        Ok(())
    }

    #[test]
    fn insert_html_after_reports_missing_anchor() -> Result<()> {
        let mut page = Page::from_html("<p id='p'></p>")?;
        assert!(!page.insert_html_after("#missing", "<b id='b'></b>")?);
        assert!(page.insert_html_after("#p", "<b id='b'></b>")?);
        assert_eq!(page.count("p, b")?, 2);
        assert_eq!(page.dump_dom("#b")?, "<b id=\"b\"></b>");
        Ok(())
    }

    #[test]
    fn stray_less_than_stays_in_page_text() -> Result<()> {
        let mut page = Page::from_html("<p id='p'>1 < 2</p>")?;
        page.assert_text("#p", "1 < 2")?;

        page.enable_trace(true);
        page.set_trace_stderr(false);
        assert!(page.insert_html_after("#p", "<span id='s'>a <= b</span>")?);
        page.assert_text("#s", "a <= b")?;
        assert_eq!(
            page.take_trace_logs(),
            vec!["[dom] inserted 1 node(s) after p#p".to_string()]
        );
        Ok(())
    }
}
