use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Who may read a domain and its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    #[default]
    Private,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Private => "private",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Access::Public),
            "private" => Ok(Access::Private),
            other => Err(format!(
                "access must be \"public\" or \"private\", got: {}",
                other
            )),
        }
    }
}

/// A named collection of items sharing one tile grid resolution.
///
/// `zoom` and `owners` are set once at creation. Changing the zoom would
/// require re-indexing every item in the domain, so no update path touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub domain_id: String,
    pub name: String,
    pub zoom: u8,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub ttl: i64,
    pub owners: BTreeSet<String>,
    pub version: u64,
    /// Number of live items
    #[serde(default)]
    pub item_count: i64,
    /// Sum of the footprint sizes of all live items
    #[serde(default)]
    pub index_size: i64,
    pub created: DateTime<Utc>,
}

impl Domain {
    pub fn is_owner(&self, username: &str) -> bool {
        self.owners.contains(username)
    }

    /// Public domains are readable by anyone, private ones only by owners.
    pub fn is_readable_by(&self, username: Option<&str>) -> bool {
        match self.access {
            Access::Public => true,
            Access::Private => username.is_some_and(|u| self.is_owner(u)),
        }
    }

    /// Partition key of this domain's tiles in the zoom-ordered index.
    pub fn indexed_domain(&self) -> String {
        crate::index::indexed_domain(&self.domain_id, self.zoom)
    }
}

/// Request body for creating a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewDomain {
    pub name: String,
    pub zoom: u8,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub ttl: i64,
}

impl NewDomain {
    pub fn new(name: impl Into<String>, zoom: u8) -> Self {
        Self {
            name: name.into(),
            zoom,
            access: Access::default(),
            ttl: 0,
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Request body for updating a domain. Only `name`, `access` and `ttl` are
/// mutable; `version` must match the stored version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DomainUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    pub version: u64,
}

impl DomainUpdate {
    pub fn new(version: u64) -> Self {
        Self {
            name: None,
            access: None,
            ttl: None,
            version,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
