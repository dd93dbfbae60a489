//! Sort state and the click state machine.

use std::fmt;
use std::sync::Arc;

use crate::model::Column;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

/// An explicit sort: the clicked column plus an optional primary tie-break.
///
/// `column` is a column id for client-side sorting, or the column's sort key
/// for server-side sorting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortState {
    pub column: String,
    pub direction: Direction,
    /// Compared before `column`.
    pub primary: Option<(String, Direction)>,
}

impl SortState {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
            primary: None,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }

    pub fn with_primary(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.primary = Some((column.into(), direction));
        self
    }
}

/// Next sort state after a header click on `clicked`.
///
/// - a different column sorts ascending, keeping the primary tie-break
/// - the ascending column turns descending
/// - the descending column flips back to ascending when the initial sort is
///   on that same column, otherwise reverts to the initial sort (`None` when
///   there is none)
pub fn derive_sort_state(
    current: Option<&SortState>,
    clicked: &str,
    initial: Option<&SortState>,
) -> Option<SortState> {
    let primary = current
        .and_then(|s| s.primary.clone())
        .or_else(|| initial.and_then(|s| s.primary.clone()));

    let Some(current) = current.filter(|s| s.column == clicked) else {
        return Some(SortState {
            column: clicked.to_string(),
            direction: Direction::Asc,
            primary,
        });
    };

    match current.direction {
        Direction::Asc => Some(SortState {
            direction: Direction::Desc,
            ..current.clone()
        }),
        Direction::Desc => match initial {
            Some(initial) if initial.column == clicked => Some(SortState {
                direction: Direction::Asc,
                ..current.clone()
            }),
            other => other.cloned(),
        },
    }
}

/// Where a client-side sort starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitialSort {
    /// The first column that allows client-side sorting, ascending.
    #[default]
    FirstSortable,
    /// No sort until the user clicks a header.
    Unsorted,
    /// An explicit column and direction.
    Column(String, Direction),
}

/// Called with the new state whenever a server-side sort changes.
pub type SortCallback = Arc<dyn Fn(Option<&SortState>) + Send + Sync>;

/// How rows get sorted.
#[derive(Clone)]
pub enum SortConfig {
    /// The engine sorts rows itself.
    Client {
        initial: InitialSort,
        primary: Option<(String, Direction)>,
        case_sensitive: bool,
    },
    /// The caller sorts; the engine only tracks the state and reports clicks.
    Server {
        value: Option<SortState>,
        on_sort: Option<SortCallback>,
    },
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig::client()
    }
}

impl SortConfig {
    /// Client-side sorting on the first sortable column.
    pub fn client() -> Self {
        SortConfig::Client {
            initial: InitialSort::FirstSortable,
            primary: None,
            case_sensitive: false,
        }
    }

    /// Server-side sorting.
    pub fn server<F>(value: Option<SortState>, on_sort: F) -> Self
    where
        F: Fn(Option<&SortState>) + Send + Sync + 'static,
    {
        SortConfig::Server {
            value,
            on_sort: Some(Arc::new(on_sort)),
        }
    }

    pub fn with_initial(mut self, sort: InitialSort) -> Self {
        if let SortConfig::Client { initial, .. } = &mut self {
            *initial = sort;
        }
        self
    }

    pub fn with_primary(mut self, column: impl Into<String>, direction: Direction) -> Self {
        if let SortConfig::Client { primary, .. } = &mut self {
            *primary = Some((column.into(), direction));
        }
        self
    }

    pub fn with_case_sensitive(mut self, sensitive: bool) -> Self {
        if let SortConfig::Client { case_sensitive, .. } = &mut self {
            *case_sensitive = sensitive;
        }
        self
    }

    pub fn is_client_side(&self) -> bool {
        matches!(self, SortConfig::Client { .. })
    }
}

impl fmt::Debug for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortConfig::Client {
                initial,
                primary,
                case_sensitive,
            } => f
                .debug_struct("Client")
                .field("initial", initial)
                .field("primary", primary)
                .field("case_sensitive", case_sensitive)
                .finish(),
            SortConfig::Server { value, on_sort } => f
                .debug_struct("Server")
                .field("value", value)
                .field("on_sort", &on_sort.is_some())
                .finish(),
        }
    }
}

/// Holds the current sort and applies header clicks.
#[derive(Debug, Clone)]
pub struct SortController {
    config: SortConfig,
    initial: Option<SortState>,
    current: Option<SortState>,
}

impl SortController {
    /// Seed the sort state from `config`.
    ///
    /// The default client-side pick skips columns with client-side sorting
    /// disabled and action columns.
    pub fn new<D>(config: SortConfig, columns: &[Column<D>]) -> Self {
        let initial = match &config {
            SortConfig::Client {
                initial, primary, ..
            } => {
                let state = match initial {
                    InitialSort::Unsorted => None,
                    InitialSort::Column(column, direction) => {
                        Some(SortState::new(column.clone(), *direction))
                    }
                    InitialSort::FirstSortable => columns
                        .iter()
                        .find(|c| c.client_side_sort && !c.is_action)
                        .map(|c| SortState::asc(c.id.clone())),
                };
                state.map(|mut s| {
                    s.primary = primary.clone();
                    s
                })
            }
            SortConfig::Server { value, .. } => value.clone(),
        };
        log::debug!("Initial sort: {:?}", initial);
        Self {
            config,
            current: initial.clone(),
            initial,
        }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.current.as_ref()
    }

    pub fn initial_state(&self) -> Option<&SortState> {
        self.initial.as_ref()
    }

    pub fn is_client_side(&self) -> bool {
        self.config.is_client_side()
    }

    pub fn case_sensitive(&self) -> bool {
        matches!(
            self.config,
            SortConfig::Client {
                case_sensitive: true,
                ..
            }
        )
    }

    /// Apply a header click. Server-side configs report the new state to their callback.
    pub fn on_sort(&mut self, column_key: &str) -> Option<&SortState> {
        self.current = derive_sort_state(self.current.as_ref(), column_key, self.initial.as_ref());
        log::debug!("Sort changed: {:?}", self.current);
        if let SortConfig::Server {
            on_sort: Some(callback),
            ..
        } = &self.config
        {
            callback(self.current.as_ref());
        }
        self.current.as_ref()
    }

    /// Replace the state, e.g. when a server-side caller echoes its own value.
    pub fn set_sort_state(&mut self, state: Option<SortState>) {
        self.current = state;
    }
}
