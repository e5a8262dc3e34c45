use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

mod algorithms;
mod dispatch;
mod dom;
mod events;
mod fixture;
mod html;
mod input;
mod page;
mod scope;
mod selector;
mod trace;

pub use algorithms::{
    AlgorithmName, AlgorithmRegistry, INSERTIONSORT, MERGESORT, QUICKSORT, Transform,
    insertionsort, mergesort, quicksort,
};
pub use dispatch::{
    DispatchOutcome, INPUT_ID, RESULT_PREFIX, SortDispatcher, TRIGGER_CLASS, TRIGGER_PREFIX,
};
pub use events::{Event, EventHandlerDescriptor};
pub use fixture::{FIXTURE_HTML, LATE_INSERTION_ANCHOR, LATE_INSERTION_HTML, SortFixture};
pub use input::TokenSequence;
pub use page::Page;
pub use scope::{INNER_VALUE, OUTER_INITIAL, ScopeDemo};

pub(crate) use dom::{Dom, NodeId};
pub(crate) use events::ListenerStore;
pub(crate) use html::parse_html;
pub(crate) use selector::{
    SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorStep, parse_selector_groups,
};
pub(crate) use trace::TraceState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Runtime(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    InvalidPattern(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::InvalidPattern(msg) => write!(f, "invalid pattern: {msg}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in value.chars().enumerate() {
        if count >= max_chars {
            out.push_str("...");
            return out;
        }
        out.push(ch);
    }
    out
}
