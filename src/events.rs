use super::*;

pub(crate) type HandlerFn = Rc<dyn Fn(&mut Page, &mut Event) -> Result<()>>;

/// An event in flight. Ids are captured when the event reaches each listener, so handlers
/// only ever see identifier strings, never tree handles.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) delegate_target: Option<NodeId>,
    target_id: Option<String>,
    current_target_id: Option<String>,
    delegate_target_id: Option<String>,
    propagation_stopped: bool,
}

impl Event {
    pub(crate) fn new(event_type: &str, target: NodeId, target_id: Option<String>) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            delegate_target: None,
            current_target_id: target_id.clone(),
            target_id,
            delegate_target_id: None,
            propagation_stopped: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Id of the element the event was fired at.
    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    /// Id of the node the running listener is registered on.
    pub fn current_target_id(&self) -> Option<&str> {
        self.current_target_id.as_deref()
    }

    /// Id of the element that matched a delegated listener's selector.
    pub fn delegate_target_id(&self) -> Option<&str> {
        self.delegate_target_id.as_deref()
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) label: String,
    // Selector matched against the path below the bound node; `None` for direct listeners.
    pub(crate) delegate: Option<String>,
    pub(crate) handler: HandlerFn,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("label", &self.label)
            .field("delegate", &self.delegate)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(listener);
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Every registration as `(node, event type, listener)`, ordered by node then event type.
    pub(crate) fn entries(&self) -> Vec<(NodeId, &str, &Listener)> {
        let mut out = Vec::new();
        for (node, events) in &self.map {
            for (event, listeners) in events {
                for listener in listeners {
                    out.push((*node, event.as_str(), listener));
                }
            }
        }
        out.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        out
    }
}

/// Describes one registered handler so an automation driver can discover what to activate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandlerDescriptor {
    pub event_type: String,
    /// Label of the node the listener is registered on, e.g. `#document` or `button#go`.
    pub bound_to: String,
    pub delegate_selector: Option<String>,
    pub label: String,
    pub(crate) node: NodeId,
}

impl EventHandlerDescriptor {
    pub fn is_delegated(&self) -> bool {
        self.delegate_selector.is_some()
    }
}

impl Page {
    /// Registers `handler` on the document for `event_type`, firing for any current or future
    /// element matching `selector` that the event passes through.
    pub fn live<F>(
        &mut self,
        selector: &str,
        event_type: &str,
        label: &str,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        parse_selector_groups(selector)?;
        let root = self.dom.root;
        self.listeners.add(
            root,
            event_type.to_string(),
            Listener {
                label: label.to_string(),
                delegate: Some(selector.to_string()),
                handler: Rc::new(handler),
            },
        );
        self.trace_line(format!(
            "[event] live {event_type} selector={selector} handler={label}"
        ));
        Ok(())
    }

    /// Registers `handler` directly on each element matching `selector` right now.
    /// Elements inserted later are not covered. Returns how many elements were bound.
    pub fn bind<F>(
        &mut self,
        selector: &str,
        event_type: &str,
        label: &str,
        handler: F,
    ) -> Result<usize>
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        let targets = self.dom.query_selector_all(selector)?;
        let handler: HandlerFn = Rc::new(handler);
        for target in &targets {
            self.listeners.add(
                *target,
                event_type.to_string(),
                Listener {
                    label: label.to_string(),
                    delegate: None,
                    handler: Rc::clone(&handler),
                },
            );
        }
        self.trace_line(format!(
            "[event] bind {event_type} selector={selector} handler={label} count={}",
            targets.len()
        ));
        Ok(targets.len())
    }

    pub fn event_handlers(&self) -> Vec<EventHandlerDescriptor> {
        self.listeners
            .entries()
            .into_iter()
            .map(|(node, event_type, listener)| EventHandlerDescriptor {
                event_type: event_type.to_string(),
                bound_to: self.dom.node_label(node),
                delegate_selector: listener.delegate.clone(),
                label: listener.label.clone(),
                node,
            })
            .collect()
    }

    /// Labels of the elements whose activation currently reaches the described handler.
    pub fn handler_targets(&self, descriptor: &EventHandlerDescriptor) -> Result<Vec<String>> {
        let root = descriptor.node;
        let nodes = match &descriptor.delegate_selector {
            Some(selector) => self.dom.query_selector_all_from(root, selector)?,
            None => vec![root],
        };
        Ok(nodes
            .into_iter()
            .map(|node| self.dom.node_label(node))
            .collect())
    }

    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<Event> {
        let mut event = Event::new(event_type, target, self.dom.attr(target, "id"));

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        // Target first, then each ancestor up to the document.
        for (depth, node) in path.iter().enumerate() {
            event.current_target = *node;
            event.current_target_id = self.dom.attr(*node, "id");
            self.invoke_listeners(*node, &path[..depth], &mut event)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(
        &mut self,
        node: NodeId,
        below: &[NodeId],
        event: &mut Event,
    ) -> Result<()> {
        let listeners = self.listeners.get(node, &event.event_type);
        for listener in listeners {
            match &listener.delegate {
                None => {
                    event.delegate_target = None;
                    event.delegate_target_id = None;
                    self.trace_invoke(event, &listener);
                    (listener.handler)(self, event)?;
                }
                Some(selector) => {
                    // `below` runs from the target upward, so the closest match fires first.
                    for candidate in below {
                        if !self.dom.matches_selector(*candidate, selector)? {
                            continue;
                        }
                        event.delegate_target = Some(*candidate);
                        event.delegate_target_id = self.dom.attr(*candidate, "id");
                        self.trace_invoke(event, &listener);
                        (listener.handler)(self, event)?;
                        if event.propagation_stopped {
                            break;
                        }
                    }
                    event.delegate_target = None;
                    event.delegate_target_id = None;
                }
            }
        }
        Ok(())
    }

    fn trace_invoke(&mut self, event: &Event, listener: &Listener) {
        if !self.trace.enabled {
            return;
        }
        let target_label = self.dom.node_label(event.target);
        let current_label = self.dom.node_label(event.current_target);
        let delegate_label = event
            .delegate_target
            .map(|node| self.dom.node_label(node))
            .unwrap_or_else(|| "-".into());
        self.trace_event_line(format!(
            "[event] {} target={} current={} delegate={} handler={}",
            event.event_type, target_label, current_label, delegate_label, listener.label
        ));
    }

    fn trace_event_done(&mut self, event: &Event, outcome: &str) {
        if !self.trace.enabled {
            return;
        }
        let target_label = self.dom.node_label(event.target);
        self.trace_event_line(format!(
            "[event] done {} target={} outcome={}",
            event.event_type, target_label, outcome
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Seen = Rc<RefCell<Vec<String>>>;

    fn recorder() -> (Seen, impl Fn(&mut Page, &mut Event) -> Result<()> + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handler = move |_: &mut Page, event: &mut Event| -> Result<()> {
            sink.borrow_mut().push(format!(
                "{}:{}",
                event.delegate_target_id().unwrap_or("-"),
                event.target_id().unwrap_or("-")
            ));
            Ok(())
        };
        (seen, handler)
    }

    #[test]
    fn delegated_listener_fires_for_elements_inserted_after_binding() -> Result<()> {
        let mut page =
            Page::from_html("<div id='host'><button class='hit' id='early'></button></div>")?;
        let (seen, handler) = recorder();
        page.live(".hit", "click", "record", handler)?;

        page.insert_html_after("#early", "<button class='hit' id='late'></button>")?;
        page.click("#late")?;
        page.click("#early")?;
        assert_eq!(*seen.borrow(), vec!["late:late", "early:early"]);
        Ok(())
    }

    #[test]
    fn direct_binding_misses_elements_inserted_later() -> Result<()> {
        let mut page = Page::from_html("<div><button class='hit' id='early'></button></div>")?;
        let (seen, handler) = recorder();
        assert_eq!(page.bind(".hit", "click", "record", handler)?, 1);

        page.insert_html_after("#early", "<button class='hit' id='late'></button>")?;
        page.click("#late")?;
        assert!(seen.borrow().is_empty());

        page.click("#early")?;
        assert_eq!(*seen.borrow(), vec!["-:early"]);
        Ok(())
    }

    #[test]
    fn delegated_listener_matches_ancestors_of_the_target_closest_first() -> Result<()> {
        let mut page = Page::from_html(
            "<div class='hit' id='outer'><button class='hit' id='inner'><b id='icon'></b></button></div>",
        )?;
        let (seen, handler) = recorder();
        page.live(".hit", "click", "record", handler)?;

        page.click("#icon")?;
        assert_eq!(*seen.borrow(), vec!["inner:icon", "outer:icon"]);
        Ok(())
    }

    #[test]
    fn delegated_listener_ignores_other_event_types_and_non_matching_targets() -> Result<()> {
        let mut page =
            Page::from_html("<button class='hit' id='a'></button><button id='b'></button>")?;
        let (seen, handler) = recorder();
        page.live(".hit", "click", "record", handler)?;

        page.click("#b")?;
        page.dispatch("#a", "focus")?;
        assert!(seen.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn stop_propagation_halts_bubbling_to_document_listeners() -> Result<()> {
        let mut page =
            Page::from_html("<div id='wrap'><button class='hit' id='go'></button></div>")?;
        let (seen, handler) = recorder();
        page.live(".hit", "click", "record", handler)?;
        page.bind("#wrap", "click", "stopper", |_, event| {
            event.stop_propagation();
            Ok(())
        })?;

        page.click("#go")?;
        assert!(seen.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn handler_errors_propagate_to_the_caller() -> Result<()> {
        let mut page = Page::from_html("<button class='hit' id='boom'></button>")?;
        page.live(".hit", "click", "boom", |_, _| {
            Err(Error::Runtime("handler failed".into()))
        })?;
        assert_eq!(
            page.click("#boom"),
            Err(Error::Runtime("handler failed".into()))
        );
        Ok(())
    }

    #[test]
    fn descriptors_list_bound_nodes_and_resolve_live_targets() -> Result<()> {
        let mut page =
            Page::from_html("<div id='host'><button class='hit' id='early'></button></div>")?;
        page.live(".hit", "click", "record", |_, _| Ok(()))?;
        page.bind("#host", "mouseover", "hover", |_, _| Ok(()))?;
        page.insert_html_after("#early", "<button class='hit' id='late'></button>")?;

        let handlers = page.event_handlers();
        assert_eq!(handlers.len(), 2);

        let live = &handlers[0];
        assert_eq!(live.bound_to, "#document");
        assert_eq!(live.event_type, "click");
        assert!(live.is_delegated());
        assert_eq!(
            page.handler_targets(live)?,
            vec!["button#early".to_string(), "button#late".to_string()]
        );

        let direct = &handlers[1];
        assert_eq!(direct.bound_to, "div#host");
        assert!(!direct.is_delegated());
        assert_eq!(page.handler_targets(direct)?, vec!["div#host".to_string()]);
        Ok(())
    }

    #[test]
    fn live_rejects_unsupported_selectors() -> Result<()> {
        let mut page = Page::from_html("<p></p>")?;
        assert!(matches!(
            page.live("p:hover", "click", "x", |_, _| Ok(())),
            Err(Error::UnsupportedSelector(_))
        ));
        assert!(page.event_handlers().is_empty());
        Ok(())
    }

    #[test]
    fn trace_records_delegate_and_completion() -> Result<()> {
        let mut page = Page::from_html("<button class='hit' id='go'></button>")?;
        page.enable_trace(true);
        page.set_trace_stderr(false);
        page.live(".hit", "click", "record", |_, _| Ok(()))?;
        page.click("#go")?;

        let logs = page.take_trace_logs();
        let bound = "[event] live click selector=.hit";
        let invoked = "[event] click target=button#go current=#document delegate=button#go";
        let done = "[event] done click target=button#go outcome=completed";
        assert!(logs.iter().any(|line| line.starts_with(bound)));
        assert!(logs.iter().any(|line| line.starts_with(invoked)));
        assert!(logs.iter().any(|line| line == done));
        Ok(())
    }
}
