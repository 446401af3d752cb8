//! Predicate selection for `out` / `in_`.

use crate::{Path, PathError, Result};
use std::sync::Arc;

/// Which predicates a directional step may traverse.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Via {
    /// Any predicate.
    #[default]
    Any,
    Name(String),
    /// Any of several predicates.
    Names(Vec<String>),
    /// Predicates produced by another path.
    Path(Arc<Path>),
}

/// One entry of a dynamically assembled via list; see [`Via::try_from_args`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViaArg {
    Name(String),
    Path(Arc<Path>),
}

impl Via {
    pub fn any() -> Self {
        Via::Any
    }

    /// Build a via from a mixed argument list.
    ///
    /// No entries means any predicate; one entry is used as-is; several
    /// entries must all be names. A path combined with anything else is
    /// rejected.
    pub fn try_from_args(args: impl IntoIterator<Item = ViaArg>) -> Result<Self> {
        let mut args: Vec<ViaArg> = args.into_iter().collect();
        if args.len() <= 1 {
            return Ok(match args.pop() {
                None => Via::Any,
                Some(ViaArg::Name(name)) => Via::Name(name),
                Some(ViaArg::Path(path)) => Via::Path(path),
            });
        }

        let mut names = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                ViaArg::Name(name) => names.push(name),
                ViaArg::Path(_) => {
                    return Err(PathError::InvalidVia {
                        reason: "a path cannot be combined with other via entries".to_string(),
                    })
                }
            }
        }
        Ok(Via::Names(names))
    }

    /// The predicate set as a template path over predicate nodes.
    pub(crate) fn to_path(&self) -> Arc<Path> {
        match self {
            Via::Any => Arc::new(Path::new_template(Vec::<String>::new())),
            Via::Name(name) => Arc::new(Path::new_template([name.as_str()])),
            Via::Names(names) => Arc::new(Path::new_template(names.iter().map(String::as_str))),
            Via::Path(path) => Arc::clone(path),
        }
    }
}

impl From<&str> for Via {
    fn from(name: &str) -> Self {
        Via::Name(name.to_string())
    }
}

impl From<String> for Via {
    fn from(name: String) -> Self {
        Via::Name(name)
    }
}

impl From<Vec<String>> for Via {
    fn from(mut names: Vec<String>) -> Self {
        match names.len() {
            0 => Via::Any,
            1 => Via::Name(names.remove(0)),
            _ => Via::Names(names),
        }
    }
}

impl From<Vec<&str>> for Via {
    fn from(names: Vec<&str>) -> Self {
        Via::from(names.into_iter().map(str::to_string).collect::<Vec<_>>())
    }
}

impl<const N: usize> From<[&str; N]> for Via {
    fn from(names: [&str; N]) -> Self {
        Via::from(Vec::from(names))
    }
}

impl From<Path> for Via {
    fn from(path: Path) -> Self {
        Via::Path(Arc::new(path))
    }
}

impl From<Arc<Path>> for Via {
    fn from(path: Arc<Path>) -> Self {
        Via::Path(path)
    }
}

impl From<&str> for ViaArg {
    fn from(name: &str) -> Self {
        ViaArg::Name(name.to_string())
    }
}

impl From<String> for ViaArg {
    fn from(name: String) -> Self {
        ViaArg::Name(name)
    }
}

impl From<Path> for ViaArg {
    fn from(path: Path) -> Self {
        ViaArg::Path(Arc::new(path))
    }
}

impl From<Arc<Path>> for ViaArg {
    fn from(path: Arc<Path>) -> Self {
        ViaArg::Path(path)
    }
}
