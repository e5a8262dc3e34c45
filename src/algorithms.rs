use super::*;

pub const QUICKSORT: &str = "quicksort";
pub const MERGESORT: &str = "mergesort";
pub const INSERTIONSORT: &str = "insertionsort";

/// A pure token-to-token transform registered under an algorithm name.
pub type Transform = Rc<dyn Fn(TokenSequence) -> TokenSequence>;

/// Name a trigger control selects an algorithm by, e.g. `quicksort` for `do-quicksort`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlgorithmName(String);

impl AlgorithmName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlgorithmName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// Placeholders: the page checks that dispatch happened, not that anything got sorted.

pub fn quicksort(items: TokenSequence) -> TokenSequence {
    items
}

pub fn mergesort(items: TokenSequence) -> TokenSequence {
    items
}

pub fn insertionsort(items: TokenSequence) -> TokenSequence {
    items
}

#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    transforms: HashMap<AlgorithmName, Transform>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three identity placeholders the sorting page starts with.
    pub fn with_placeholders() -> Self {
        let mut registry = Self::new();
        registry.register(QUICKSORT, Rc::new(quicksort));
        registry.register(MERGESORT, Rc::new(mergesort));
        registry.register(INSERTIONSORT, Rc::new(insertionsort));
        registry
    }

    /// Stores `transform` under `name`, returning whatever was registered there before.
    pub fn register(
        &mut self,
        name: impl Into<AlgorithmName>,
        transform: Transform,
    ) -> Option<Transform> {
        self.transforms.insert(name.into(), transform)
    }

    pub fn resolve(&self, name: &AlgorithmName) -> Option<Transform> {
        self.transforms.get(name).cloned()
    }

    pub fn contains(&self, name: &AlgorithmName) -> bool {
        self.transforms.contains_key(name)
    }

    pub fn names(&self) -> Vec<AlgorithmName> {
        let mut names = self.transforms.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("names", &self.names())
            .finish()
    }
}
