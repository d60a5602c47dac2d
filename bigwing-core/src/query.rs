//! Backend-neutral description of a table query: which columns, which rows, in which
//! order and which slice. `bigwing-store` renders it to SQL.

use bigwing_shared::PageRequest;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

const MAX_IDENT_LEN: usize = 63;

/// A validated table or column name. Only ASCII letters, digits and underscores,
/// not starting with a digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn parse(name: &str) -> CoreResult<Self> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest || name.len() > MAX_IDENT_LEN {
            return Err(CoreError::ValidationError(format!("invalid identifier: {:?}", name)));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        FilterValue::Uuid(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(FilterValue),
    In(Vec<FilterValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: Ident,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<FilterValue>) -> CoreResult<Self> {
        Ok(Self {
            column: Ident::parse(column)?,
            op: FilterOp::Eq(value.into()),
        })
    }

    pub fn any_of<V: Into<FilterValue>>(
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> CoreResult<Self> {
        Ok(Self {
            column: Ident::parse(column)?,
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        })
    }
}

/// Case-insensitive partial match of `value` anywhere in `column`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchColumn {
    pub column: Ident,
    pub value: String,
}

impl SearchColumn {
    /// `ILIKE` pattern with the LIKE wildcards in the user's text escaped.
    pub fn pattern(&self) -> String {
        format!("%{}%", escape_like(&self.value))
    }
}

pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: Ident,
    pub ascending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window {
    /// Inclusive row range, zero based.
    Range { from: i64, to: i64 },
    Page(PageRequest),
}

impl Window {
    pub fn offset_limit(&self) -> (i64, i64) {
        match *self {
            Window::Range { from, to } => {
                let from = from.max(0);
                (from, to.saturating_sub(from).saturating_add(1).max(0))
            }
            Window::Page(page) => (page.offset(), page.limit()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub columns: Vec<Ident>,
    pub filters: Vec<Filter>,
    pub search: Vec<SearchColumn>,
    pub order_by: Option<OrderBy>,
    pub window: Option<Window>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &[&str]) -> CoreResult<Self> {
        self.columns = columns.iter().map(|c| Ident::parse(c)).collect::<CoreResult<_>>()?;
        Ok(self)
    }

    pub fn eq(mut self, column: &str, value: impl Into<FilterValue>) -> CoreResult<Self> {
        self.filters.push(Filter::eq(column, value)?);
        Ok(self)
    }

    pub fn any_of<V: Into<FilterValue>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> CoreResult<Self> {
        self.filters.push(Filter::any_of(column, values)?);
        Ok(self)
    }

    /// Adds a search column. Blank values are ignored so an empty search box
    /// matches everything.
    pub fn search(mut self, column: &str, value: &str) -> CoreResult<Self> {
        let value = value.trim();
        if !value.is_empty() {
            self.search.push(SearchColumn {
                column: Ident::parse(column)?,
                value: value.to_string(),
            });
        }
        Ok(self)
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> CoreResult<Self> {
        self.order_by = Some(OrderBy {
            column: Ident::parse(column)?,
            ascending,
        });
        Ok(self)
    }

    pub fn range(mut self, from: i64, to: i64) -> Self {
        self.window = Some(Window::Range { from, to });
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.window = Some(Window::Page(page));
        self
    }

    pub fn page_request(&self) -> Option<PageRequest> {
        match self.window {
            Some(Window::Page(page)) => Some(page),
            _ => None,
        }
    }
}
