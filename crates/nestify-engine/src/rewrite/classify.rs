//! Classification of request accesses into field groups.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldGroup {
    Params,
    Body,
    Query,
    User,
    UserData,
}

impl FieldGroup {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "query" => Some(Self::Query),
            "body" => Some(Self::Body),
            "params" => Some(Self::Params),
            "user" => Some(Self::User),
            "userData" => Some(Self::UserData),
            _ => None,
        }
    }

    /// Identifier that replaces `req.<group>` in rewritten code.
    pub fn binding_name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::Params => "params",
            Self::User => "requestUser",
            Self::UserData => "requestUserData",
        }
    }

    /// NestJS parameter decorator binding this group, when one exists.
    pub fn decorator(self) -> Option<&'static str> {
        match self {
            Self::Query => Some("Query"),
            Self::Body => Some("Body"),
            Self::Params => Some("Param"),
            Self::User | Self::UserData => None,
        }
    }
}

/// A request access as seen by a classifier: the full access text and, when
/// the tree made it available, the first path segment after `req`.
#[derive(Debug, Clone, Copy)]
pub struct AccessPath<'a> {
    pub text: &'a str,
    pub segment: Option<&'a str>,
}

pub trait AccessClassifier {
    fn classify(&self, access: &AccessPath<'_>) -> Option<FieldGroup>;
}

/// Classifies by the structural segment, falling back to splitting the
/// access text when no segment is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl AccessClassifier for DefaultClassifier {
    fn classify(&self, access: &AccessPath<'_>) -> Option<FieldGroup> {
        match access.segment {
            Some(segment) => FieldGroup::from_segment(segment),
            None => split_access_path(access.text)
                .get(1)
                .and_then(|s| FieldGroup::from_segment(s)),
        }
    }
}

/// `req?.query.$email` -> `["req", "query", "email"]`. Text after the first
/// whitespace, bracket, brace, parenthesis, comma or semicolon is ignored.
pub fn split_access_path(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '?' | '$' | '{' | '`'))
        .collect();
    let head = cleaned
        .split([' ', '\t', '\n', '}', '[', '(', ')', ',', ';'])
        .next()
        .unwrap_or_default();
    head.split('.')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
