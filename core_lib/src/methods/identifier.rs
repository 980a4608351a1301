//! Parsing of method identifiers such as `db.ping` or `db.ping(request, options)`

use crate::error::{AppError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(
        r"^\s*([A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*)\s*(?:\(([^()]*)\))?\s*$"
    )
    .expect("method identifier pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodArg {
    Request,
    Options,
}

impl FromStr for MethodArg {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "request" => Ok(MethodArg::Request),
            "options" => Ok(MethodArg::Options),
            other => Err(AppError::InvalidMethod(format!(
                "unknown argument '{}', expected 'request' or 'options'",
                other
            ))),
        }
    }
}

impl fmt::Display for MethodArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodArg::Request => write!(f, "request"),
            MethodArg::Options => write!(f, "options"),
        }
    }
}

/// A parsed method identifier. `args` is empty for the bare form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub name: String,
    pub args: Vec<MethodArg>,
}

impl MethodRef {
    pub fn parse(identifier: &str) -> Result<Self> {
        let captures = IDENTIFIER_RE
            .captures(identifier)
            .ok_or_else(|| AppError::InvalidMethod(identifier.to_string()))?;

        let name = captures[1].to_string();

        let args = match captures.get(2) {
            Some(list) if !list.as_str().trim().is_empty() => list
                .as_str()
                .split(',')
                .map(|arg| arg.trim().parse::<MethodArg>())
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self { name, args })
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.name);
        }
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}
