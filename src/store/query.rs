/// Catalog columns a predicate may address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Field {
    Id,
    Type,
    Title,
    Artist,
    Album,
    Path,
    Url,
    Keywords,
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Type => "type",
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Path => "path",
            Self::Url => "url",
            Self::Keywords => "keywords",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(Field, String),
    /// SQL-style pattern: `%` any run, `_` one character, `\` makes the
    /// next character literal.
    Like {
        field: Field,
        pattern: String,
        case_sensitive: bool,
    },
    /// Record carries every listed tag.
    Tags(Vec<String>),
}

/// Escape `text` so it matches itself inside a [`Predicate::Like`] pattern.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// AND-chain of predicates with optional ordering and limit.
///
/// ```
/// use jukebot::store::{Condition, Field};
///
/// let c = Condition::new()
///     .and_equal(Field::Type, "file")
///     .and_like(Field::Path, "rock/%", true)
///     .order_by(Field::Path);
/// assert_eq!(c.predicates().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    predicates: Vec<Predicate>,
    order: Option<(Field, Order)>,
    limit: Option<usize>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and_equal(mut self, field: Field, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Equal(field, value.into()));
        self
    }

    pub fn and_like(mut self, field: Field, pattern: impl Into<String>, case_sensitive: bool) -> Self {
        self.predicates.push(Predicate::Like {
            field,
            pattern: pattern.into(),
            case_sensitive,
        });
        self
    }

    pub fn and_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predicates
            .push(Predicate::Tags(tags.into_iter().map(Into::into).collect()));
        self
    }

    pub fn order_by(mut self, field: Field) -> Self {
        self.order = Some((field, Order::Asc));
        self
    }

    pub fn order_by_desc(mut self, field: Field) -> Self {
        self.order = Some((field, Order::Desc));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn ordering(&self) -> Option<(Field, Order)> {
        self.order
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.limit
    }
}
