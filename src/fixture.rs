use super::*;

/// The sorting page as served before any script runs.
pub const FIXTURE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Live event handlers</title>
</head>
<body>
  <h1>Sorting</h1>
  <p>Items: <input type="text" id="sortable-input" value="3 1 2"></p>

  <h3>Quicksort</h3>
  <button class="do-sort" id="do-quicksort">Sort!</button> > <span id="result-quicksort" style="border: 1px solid #000000;"></span>

  <h3>Mergesort</h3>
  <button class="do-sort" id="do-mergesort">Sort!</button> > <span id="result-mergesort" style="border: 1px solid #000000;"></span>
</body>
</html>
"#;

/// Element the late block is inserted after.
pub const LATE_INSERTION_ANCHOR: &str = "#result-mergesort";

/// Heading, trigger, separator and output for insertion sort, added after binding.
pub const LATE_INSERTION_HTML: &str = r#"<h3>Insertion-sort</h3><button class="do-sort" id="do-insertionsort">Sort!</button> > <span id="result-insertionsort" style="border: 1px solid #000000;"></span>"#;

/// A loaded sorting page with its binding installed and late controls inserted.
#[derive(Debug)]
pub struct SortFixture {
    page: Page,
    dispatcher: SortDispatcher,
    scope: ScopeDemo,
    late_inserted: bool,
}

impl SortFixture {
    pub fn load() -> Result<Self> {
        Self::load_html(FIXTURE_HTML)
    }

    pub fn load_html(html: &str) -> Result<Self> {
        let page = Page::from_html(html)?;
        Self::initialize(page, AlgorithmRegistry::with_placeholders())
    }

    /// Runs page initialization in order: registry, delegated binding, late insertion,
    /// then the scope demo.
    pub fn initialize(mut page: Page, registry: AlgorithmRegistry) -> Result<Self> {
        let dispatcher = SortDispatcher::new(Rc::new(registry));
        dispatcher.bind(&mut page)?;
        let late_inserted = insert_late_controls(&mut page)?;

        let mut scope = ScopeDemo::new();
        scope.shadow_outer();

        Ok(Self {
            page,
            dispatcher,
            scope,
            late_inserted,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    pub fn dispatcher(&self) -> &SortDispatcher {
        &self.dispatcher
    }

    pub fn scope(&self) -> &ScopeDemo {
        &self.scope
    }

    pub fn late_inserted(&self) -> bool {
        self.late_inserted
    }

    /// Types `input` into the shared field, clicks `do-<algorithm>` and reads
    /// `result-<algorithm>` back. `None` when the page has no such output.
    pub fn sort_with(&mut self, algorithm: &str, input: &str) -> Result<Option<String>> {
        self.page.type_text(&format!("#{INPUT_ID}"), input)?;
        self.page.click(&format!("#{TRIGGER_PREFIX}{algorithm}"))?;
        let output_id = SortDispatcher::output_id(&AlgorithmName::from(algorithm));
        Ok(self.page.element_text_by_id(&output_id))
    }
}

/// Adds the insertion-sort trigger and output after [`LATE_INSERTION_ANCHOR`].
/// Must run after the delegated binding is installed. Returns `false` if the anchor is absent.
fn insert_late_controls(page: &mut Page) -> Result<bool> {
    let inserted = page.insert_html_after(LATE_INSERTION_ANCHOR, LATE_INSERTION_HTML)?;
    if !inserted {
        page.trace_line(format!(
            "[fixture] late insertion skipped: {LATE_INSERTION_ANCHOR} not found"
        ));
    }
    Ok(inserted)
}
