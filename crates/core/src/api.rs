// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote service capability probing
//!
//! The service advertises an API version (e.g. `2.5`) and, for
//! single-tenant installations, a release string (e.g. `v202302-1`).

use std::fmt;

/// A `major.minor` remote API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let (major, minor) = s.trim().split_once('.')?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A single-tenant release such as `v202302-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Release {
    /// `YYYYMM`
    pub month: u32,
    pub sequence: u32,
}

impl Release {
    /// First release supporting structured output for CLI-driven runs
    pub const STRUCTURED_OUTPUT: Release = Release {
        month: 202302,
        sequence: 1,
    };

    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.trim().strip_prefix('v')?;
        let (month, sequence) = rest.split_once('-')?;
        if month.len() != 6 {
            return None;
        }
        Some(Self {
            month: month.parse().ok()?,
            sequence: sequence.parse().ok()?,
        })
    }
}

/// Run features gated on the remote API version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Targeting,
    RefreshSkip,
    RefreshOnly,
    ReplaceAddrs,
}

impl Capability {
    pub fn required(&self) -> ApiVersion {
        match self {
            Capability::Targeting => ApiVersion::new(2, 3),
            Capability::RefreshSkip | Capability::RefreshOnly | Capability::ReplaceAddrs => {
                ApiVersion::new(2, 4)
            }
        }
    }

    /// The command-line option that requests this capability
    pub fn option(&self) -> &'static str {
        match self {
            Capability::Targeting => "-target",
            Capability::RefreshSkip => "-refresh=false",
            Capability::RefreshOnly => "-refresh-only",
            Capability::ReplaceAddrs => "-replace",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Targeting => "resource targeting",
            Capability::RefreshSkip => "planning without refresh",
            Capability::RefreshOnly => "refresh-only mode",
            Capability::ReplaceAddrs => "forced replacement",
        };
        write!(f, "{}", s)
    }
}

/// What the remote service reports about itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInfo {
    pub api_version: Option<String>,
    /// Present only for single-tenant installations
    pub release: Option<String>,
}

impl ServiceInfo {
    pub fn api_version(&self) -> Option<ApiVersion> {
        self.api_version.as_deref().and_then(ApiVersion::parse)
    }

    /// An unknown or unparsable version supports nothing gated
    pub fn supports(&self, capability: Capability) -> bool {
        self.api_version()
            .is_some_and(|v| v >= capability.required())
    }

    pub fn is_single_tenant(&self) -> bool {
        self.release.is_some()
    }

    /// Whether the service renders structured output for CLI-driven runs
    pub fn supports_structured_output(&self) -> bool {
        match self.release.as_deref() {
            None => true,
            Some(release) => {
                Release::parse(release).is_some_and(|r| r >= Release::STRUCTURED_OUTPUT)
            }
        }
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
