use super::*;

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) dispatch: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            dispatch: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

impl TraceState {
    fn push(&mut self, line: String) {
        if self.to_stderr {
            eprintln!("{line}");
        }
        while self.logs.len() >= self.log_limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }
}

impl Page {
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace.logs).into()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_dispatch(&mut self, enabled: bool) {
        self.trace.dispatch = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.log_limit = max_entries;
        while self.trace.logs.len() > self.trace.log_limit {
            self.trace.logs.pop_front();
        }
        Ok(())
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace.enabled && self.trace.events {
            self.trace.push(line);
        }
    }

    pub(crate) fn trace_dispatch_line(&mut self, line: String) {
        if self.trace.enabled && self.trace.dispatch {
            self.trace.push(line);
        }
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if self.trace.enabled {
            self.trace.push(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_page() -> Result<Page> {
        let mut page = Page::from_html("<p id='p'></p>")?;
        page.enable_trace(true);
        page.set_trace_stderr(false);
        Ok(page)
    }

    #[test]
    fn trace_logs_are_empty_when_trace_is_disabled() -> Result<()> {
        let mut page = Page::from_html("<p id='p'></p>")?;
        page.trace_line("[fixture] hidden".into());
        assert!(page.take_trace_logs().is_empty());
        Ok(())
    }

    #[test]
    fn trace_categories_can_be_disabled_independently() -> Result<()> {
        let mut page = quiet_page()?;
        page.set_trace_events(false);
        page.trace_event_line("[event] click".into());
        page.trace_dispatch_line("[dispatch] written".into());
        assert_eq!(
            page.take_trace_logs(),
            vec!["[dispatch] written".to_string()]
        );

        page.set_trace_events(true);
        page.set_trace_dispatch(false);
        page.trace_event_line("[event] click".into());
        page.trace_dispatch_line("[dispatch] written".into());
        assert_eq!(page.take_trace_logs(), vec!["[event] click".to_string()]);
        Ok(())
    }

    #[test]
    fn trace_log_limit_keeps_latest_entries() -> Result<()> {
        let mut page = quiet_page()?;
        for idx in 0..5 {
            page.trace_line(format!("line {idx}"));
        }
        page.set_trace_log_limit(2)?;
        assert_eq!(
            page.take_trace_logs(),
            vec!["line 3".to_string(), "line 4".to_string()]
        );

        page.trace_line("a".into());
        page.trace_line("b".into());
        page.trace_line("c".into());
        assert_eq!(
            page.take_trace_logs(),
            vec!["b".to_string(), "c".to_string()]
        );
        assert!(page.take_trace_logs().is_empty());
        Ok(())
    }

    #[test]
    fn trace_log_limit_rejects_zero() -> Result<()> {
        let mut page = quiet_page()?;
        assert!(matches!(
            page.set_trace_log_limit(0),
            Err(Error::Runtime(_))
        ));
        Ok(())
    }
}
