//! Row tree types

use std::fmt;

/// Kind of the column header row.
pub const HEADER: &str = "header";
/// Kind of a totals row.
pub const TOTALS: &str = "totals";
/// Kind of the header row shown above expandable columns.
pub const EXPANDABLE_HEADER: &str = "expandableHeader";

/// Row kinds the engine treats as chrome rather than data.
pub const RESERVED_ROW_KINDS: [&str; 3] = [HEADER, TOTALS, EXPANDABLE_HEADER];

/// Returns `true` if `kind` is one of the [`RESERVED_ROW_KINDS`].
pub fn is_reserved_kind(kind: &str) -> bool {
    RESERVED_ROW_KINDS.contains(&kind)
}

/// Placement override that bypasses sort comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    /// Always ordered before unpinned siblings.
    First,
    /// Always ordered after unpinned siblings.
    Last,
}

impl Pin {
    fn rank(pin: Option<Pin>) -> i8 {
        match pin {
            Some(Pin::First) => -1,
            None => 0,
            Some(Pin::Last) => 1,
        }
    }

    /// Sort rank of an optional pin: first < unpinned < last.
    pub(crate) fn order(a: Option<Pin>, b: Option<Pin>) -> std::cmp::Ordering {
        Self::rank(a).cmp(&Self::rank(b))
    }
}

/// Identity of a row across the whole tree: its kind plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    /// Row kind.
    pub kind: String,
    /// Row id, unique among rows of the same kind.
    pub id: String,
}

impl RowKey {
    /// Creates a key from a kind and id.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Key of the header row.
    pub fn header() -> Self {
        Self::new(HEADER, HEADER)
    }

    /// Returns `true` if this key belongs to a chrome row.
    pub fn is_reserved(&self) -> bool {
        is_reserved_kind(&self.kind)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

/// A caller-supplied row.
///
/// Rows form a tree through `children`. `kind` tags the row (the reserved
/// kinds mark chrome rows such as the header) and `data` carries whatever
/// the column cell functions need.
///
/// # Example
///
/// ```
/// use gridtable::model::Row;
///
/// let parent = Row::new("parent", "2", "b")
///     .with_children(vec![Row::new("child", "2.1", "b1"), Row::new("child", "2.2", "b2")]);
/// assert_eq!(parent.children.as_ref().map(Vec::len), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Row<D> {
    /// Row kind.
    pub kind: String,
    /// Row id, unique among rows of the same kind.
    pub id: String,
    /// Caller payload.
    pub data: D,
    /// Nested rows, if any.
    pub children: Option<Vec<Row<D>>>,
    /// Placement override.
    pub pin: Option<Pin>,
    /// `Some(false)` opts the row out of selection.
    pub selectable: Option<bool>,
    /// `Some(false)` stops a parent from deriving its selection from its children.
    pub infer_selected_state: Option<bool>,
}

impl<D> Row<D> {
    /// Create a row with no children.
    pub fn new(kind: impl Into<String>, id: impl Into<String>, data: D) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            data,
            children: None,
            pin: None,
            selectable: None,
            infer_selected_state: None,
        }
    }

    /// Create the header row.
    pub fn header(data: D) -> Self {
        Self::new(HEADER, HEADER, data)
    }

    /// Set the nested rows.
    pub fn with_children(mut self, children: Vec<Row<D>>) -> Self {
        self.children = Some(children);
        self
    }

    /// Pin the row first or last among its siblings.
    pub fn pinned(mut self, pin: Pin) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Set whether the row can be selected.
    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }

    /// Set whether a parent derives its selection from its children.
    pub fn infer_selected_state(mut self, infer: bool) -> Self {
        self.infer_selected_state = Some(infer);
        self
    }

    /// The `(kind, id)` key of this row.
    pub fn key(&self) -> RowKey {
        RowKey::new(self.kind.clone(), self.id.clone())
    }

    /// Returns `true` if this row has the given kind and id.
    pub fn is(&self, key: &RowKey) -> bool {
        self.kind == key.kind && self.id == key.id
    }

    /// Returns `true` for chrome rows (header, totals, expandable header).
    pub fn is_reserved(&self) -> bool {
        is_reserved_kind(&self.kind)
    }

    /// Returns `true` unless the row opted out of selection.
    pub fn is_selectable(&self) -> bool {
        self.selectable != Some(false)
    }

    /// Returns `true` unless the row opted out of inferring its selection.
    pub fn infers_selected_state(&self) -> bool {
        self.infer_selected_state != Some(false)
    }
}

impl<D: Clone> Row<D> {
    /// Clone every field except `children`.
    pub fn shallow_clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            id: self.id.clone(),
            data: self.data.clone(),
            children: None,
            pin: self.pin,
            selectable: self.selectable,
            infer_selected_state: self.infer_selected_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let row = Row::new("data", "1", ());
        assert_eq!(row.key().to_string(), "data-1");
        assert!(row.is(&RowKey::new("data", "1")));
        assert!(!row.is(&RowKey::new("other", "1")));
    }

    #[test]
    fn test_reserved_kinds() {
        assert!(Row::header(()).is_reserved());
        assert!(RowKey::new(TOTALS, "t").is_reserved());
        assert!(!RowKey::new("data", "header").is_reserved());
    }

    #[test]
    fn test_shallow_clone_drops_children() {
        let row = Row::new("parent", "p", 1).with_children(vec![Row::new("child", "c", 2)]);
        let copy = row.shallow_clone();
        assert!(copy.children.is_none());
        assert_eq!(copy.data, 1);
    }

    #[test]
    fn test_pin_order() {
        use std::cmp::Ordering;
        assert_eq!(Pin::order(Some(Pin::First), None), Ordering::Less);
        assert_eq!(Pin::order(Some(Pin::Last), None), Ordering::Greater);
        assert_eq!(Pin::order(Some(Pin::First), Some(Pin::First)), Ordering::Equal);
    }
}
