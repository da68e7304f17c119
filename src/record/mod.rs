use std::collections::HashMap;

/// One filterable card, parsed out of the list container's markup.
/// Everything the filter and sort stages need is captured up front so
/// no markup is re-read after initialization.
#[derive(Clone, Debug)]
pub struct Record {
    pub id: usize,
    /// `data-*` attributes, keyed by their dataset name.
    pub attributes: HashMap<String, String>,
    /// Text of labeled facet sub-elements, keyed by category.
    pub facets: HashMap<String, String>,
    /// Whole visible text, whitespace-normalized.
    pub text: String,
    /// Source markup, kept for hosts that re-render cards verbatim.
    pub html: String,
}

impl Record {
    pub fn attribute(&self, dataset_key: &str) -> Option<&str> {
        self.attributes.get(dataset_key).map(String::as_str)
    }

    pub fn facet(&self, category: &str) -> Option<&str> {
        self.facets.get(category).map(String::as_str)
    }
}

/// A parsed card that has not been adopted into a store yet.
#[derive(Clone, Debug, Default)]
pub struct RecordSource {
    pub attributes: HashMap<String, String>,
    pub facets: HashMap<String, String>,
    pub text: String,
    pub html: String,
}

/// The authoritative record list plus the current filtered subset.
/// `filtered` holds ids into `all` and is always a reordering of a
/// subsequence of it.
#[derive(Clone, Debug, Default)]
pub struct ItemStore {
    all: Vec<Record>,
    filtered: Vec<usize>,
}

impl ItemStore {
    pub fn new(sources: Vec<RecordSource>) -> Self {
        let mut store = Self::default();
        store.append(sources);
        store.filtered = store.all.iter().map(|r| r.id).collect();
        store
    }

    /// Adopts crawled records at the end, preserving their order.
    pub fn append(&mut self, sources: Vec<RecordSource>) {
        for source in sources {
            let id = self.all.len();
            self.all.push(Record {
                id,
                attributes: source.attributes,
                facets: source.facets,
                text: source.text,
                html: source.html,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Record> {
        self.all.get(id)
    }

    pub fn records(&self) -> &[Record] {
        &self.all
    }

    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn set_filtered(&mut self, ids: Vec<usize>) {
        debug_assert!(ids.iter().all(|&id| id < self.all.len()));
        self.filtered = ids;
    }

    pub fn reset_filtered(&mut self) {
        self.filtered = self.all.iter().map(|r| r.id).collect();
    }

    pub fn filtered_records(&self) -> impl Iterator<Item = &Record> {
        self.filtered.iter().filter_map(|&id| self.all.get(id))
    }
}
