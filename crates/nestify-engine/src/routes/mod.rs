//! Route table extraction and handler binding resolution.

pub mod binding;
pub mod extractor;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use binding::{convention_binding, resolve_binding, strip_mount_prefix, BindingSource, RouteBinding};
pub use extractor::{extract_routes, ExtractorSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Express router method name -> HTTP method.
    pub fn from_router_method(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// NestJS route decorator name.
    pub fn decorator_name(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Delete => "Delete",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered {method, path, handler, middlewares} binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub http_method: HttpMethod,
    pub path: String,
    /// Handler reference as written, wrappers removed (e.g. `users.show`).
    pub handler_ref: String,
    pub middlewares: SmallVec<[String; 2]>,
    /// 1-based line of the route registration.
    pub line: u32,
}
