use serde::{Deserialize, Serialize};

/// A university record exactly as the directory endpoint returns it.
///
/// Field names follow the wire format so favorites persisted as JSON stay
/// readable by any client of the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(
        rename = "state-province",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_province: Option<String>,
    #[serde(default)]
    pub alpha_two_code: String,
    #[serde(default)]
    pub web_pages: Vec<String>,
}

impl University {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            state_province: None,
            alpha_two_code: String::new(),
            web_pages: Vec::new(),
        }
    }

    pub fn with_alpha_two_code(mut self, code: impl Into<String>) -> Self {
        self.alpha_two_code = code.into();
        self
    }

    pub fn with_state_province(mut self, state: impl Into<String>) -> Self {
        self.state_province = Some(state.into());
        self
    }

    pub fn with_web_page(mut self, url: impl Into<String>) -> Self {
        self.web_pages.push(url.into());
        self
    }

    /// Key for list rows: the same name may appear under several countries
    /// and even twice in one response, so the position is part of the key.
    pub fn row_key(&self, position: usize) -> String {
        format!("{}-{}-{}", self.alpha_two_code, self.name, position)
    }
}

/// One entry of the country picker. The "All" sentinel carries an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryFacet {
    pub label: String,
    pub value: String,
}

impl CountryFacet {
    pub const ALL_LABEL: &'static str = "All";

    pub fn all() -> Self {
        Self {
            label: Self::ALL_LABEL.to_string(),
            value: String::new(),
        }
    }

    pub fn country(name: &str) -> Self {
        Self {
            label: name.to_string(),
            value: name.to_string(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.value.is_empty()
    }
}

/// Active filters. An empty `selected_country` means every country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub selected_country: String,
}

impl FilterState {
    pub fn has_country(&self) -> bool {
        !self.selected_country.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Error(String),
}

impl LoadState {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error(_) => "error",
        }
    }
}

/// How two university records are judged to be the same favorite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Name equality; with duplicate names the first match wins.
    #[default]
    Name,
    /// Country code plus name.
    Composite,
}

impl IdentityPolicy {
    pub fn same(self, a: &University, b: &University) -> bool {
        match self {
            Self::Name => a.name == b.name,
            Self::Composite => a.name == b.name && a.alpha_two_code == b.alpha_two_code,
        }
    }
}

/// Non-fatal problems the stores report instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// Saved state could not be read or parsed; the store started empty.
    HydrationFailed { key: String, message: String },
    /// A best-effort write did not land.
    WriteFailed { key: String, message: String },
}
