pub const OUTER_INITIAL: i32 = 1;
pub const INNER_VALUE: i32 = 2;

/// Holds the page-wide `outer` binding for the lifetime of the fixture.
///
/// `shadow_outer` declares a local binding with the same name; the page-wide value is only
/// readable through [`ScopeDemo::outer`] and stays at [`OUTER_INITIAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeDemo {
    outer: i32,
    invocations: usize,
    last_inner: Option<i32>,
}

impl Default for ScopeDemo {
    fn default() -> Self {
        Self {
            outer: OUTER_INITIAL,
            invocations: 0,
            last_inner: None,
        }
    }
}

impl ScopeDemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outer(&self) -> i32 {
        self.outer
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Value the local `outer` held during the most recent [`ScopeDemo::shadow_outer`] call.
    pub fn last_inner(&self) -> Option<i32> {
        self.last_inner
    }

    /// Returns the inner binding's value.
    pub fn shadow_outer(&mut self) -> i32 {
        self.invocations += 1;
        let outer = INNER_VALUE;
        self.last_inner = Some(outer);
        outer
    }
}
