use super::*;

/// Trigger ids are `do-<name>`.
pub const TRIGGER_PREFIX: &str = "do-";
/// Output ids are `result-<name>`.
pub const RESULT_PREFIX: &str = "result-";
/// Class every trigger carries; the delegated binding matches on it.
pub const TRIGGER_CLASS: &str = "do-sort";
/// The single input field every algorithm reads from.
pub const INPUT_ID: &str = "sortable-input";

/// What one activation did. Only `Written` changes the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Written {
        algorithm: AlgorithmName,
        output: String,
    },
    NotATrigger {
        control_id: String,
    },
    UnknownAlgorithm(AlgorithmName),
    MissingInput(AlgorithmName),
    MissingOutput(AlgorithmName),
}

impl DispatchOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { algorithm, output } => {
                write!(f, "written algorithm={algorithm} output={output:?}")
            }
            Self::NotATrigger { control_id } => write!(f, "not_a_trigger id={control_id:?}"),
            Self::UnknownAlgorithm(name) => write!(f, "unknown_algorithm name={name}"),
            Self::MissingInput(name) => write!(f, "missing_input algorithm={name}"),
            Self::MissingOutput(name) => write!(f, "missing_output algorithm={name}"),
        }
    }
}

/// Maps an activated trigger to its algorithm and writes the result next to it.
#[derive(Debug, Clone)]
pub struct SortDispatcher {
    registry: Rc<AlgorithmRegistry>,
    input_id: String,
}

impl SortDispatcher {
    pub fn new(registry: Rc<AlgorithmRegistry>) -> Self {
        Self {
            registry,
            input_id: INPUT_ID.to_string(),
        }
    }

    pub fn with_input_id(mut self, input_id: impl Into<String>) -> Self {
        self.input_id = input_id.into();
        self
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn algorithm_for(control_id: &str) -> Option<AlgorithmName> {
        control_id
            .strip_prefix(TRIGGER_PREFIX)
            .map(AlgorithmName::from)
    }

    pub fn output_id(algorithm: &AlgorithmName) -> String {
        format!("{RESULT_PREFIX}{algorithm}")
    }

    /// Runs one activation of the trigger `control_id`.
    ///
    /// Unknown names, a missing input field and a missing output element all leave the page
    /// untouched; they are reported through the returned outcome and the dispatch trace.
    pub fn on_activate(&self, page: &mut Page, control_id: &str) -> Result<DispatchOutcome> {
        let outcome = self.run(page, control_id)?;
        page.trace_dispatch_line(format!("[dispatch] {control_id} {outcome}"));
        Ok(outcome)
    }

    fn run(&self, page: &mut Page, control_id: &str) -> Result<DispatchOutcome> {
        let Some(algorithm) = Self::algorithm_for(control_id) else {
            return Ok(DispatchOutcome::NotATrigger {
                control_id: control_id.to_string(),
            });
        };
        let Some(transform) = self.registry.resolve(&algorithm) else {
            return Ok(DispatchOutcome::UnknownAlgorithm(algorithm));
        };
        let Some(raw) = page.element_value_by_id(&self.input_id) else {
            return Ok(DispatchOutcome::MissingInput(algorithm));
        };

        let output = transform(TokenSequence::parse(&raw)).join();
        if !page.set_text_by_id(&Self::output_id(&algorithm), &output)? {
            return Ok(DispatchOutcome::MissingOutput(algorithm));
        }
        Ok(DispatchOutcome::Written { algorithm, output })
    }

    /// Installs the delegated click binding for every `.do-sort` element, present or future.
    pub fn bind(&self, page: &mut Page) -> Result<()> {
        let dispatcher = self.clone();
        page.live(
            &format!(".{TRIGGER_CLASS}"),
            "click",
            "do_sort_handler",
            move |page, event| {
                // The matched trigger, even when the click landed on its content.
                let control_id = event.delegate_target_id().or(event.target_id());
                let Some(control_id) = control_id.map(str::to_string) else {
                    return Ok(());
                };
                dispatcher.on_activate(page, &control_id)?;
                Ok(())
            },
        )
    }
}
