//! Resource names and their field schemas.
//!
//! Every collection the API exposes is described by a [`ResourceSpec`]: the
//! fields a fully populated entity carries, and which of them are nested
//! objects embedded by value (e.g. a user's `address.geo`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six collections exposed by the API.
///
/// The variant determines the URL path segment (`/posts`, `/albums`, ...) and
/// the expected entity shape via [`ResourceName::spec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceName {
    Posts,
    Albums,
    Comments,
    Photos,
    Todos,
    Users,
}

impl ResourceName {
    /// All resources in the order the suite visits them.
    pub const ALL: [ResourceName; 6] = [
        ResourceName::Posts,
        ResourceName::Albums,
        ResourceName::Comments,
        ResourceName::Photos,
        ResourceName::Todos,
        ResourceName::Users,
    ];

    /// The URL path segment for this collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceName::Posts => "posts",
            ResourceName::Albums => "albums",
            ResourceName::Comments => "comments",
            ResourceName::Photos => "photos",
            ResourceName::Todos => "todos",
            ResourceName::Users => "users",
        }
    }

    /// The field schema for entities of this resource.
    pub fn spec(&self) -> &'static ResourceSpec {
        match self {
            ResourceName::Posts => &POSTS,
            ResourceName::Albums => &ALBUMS,
            ResourceName::Comments => &COMMENTS,
            ResourceName::Photos => &PHOTOS,
            ResourceName::Todos => &TODOS,
            ResourceName::Users => &USERS,
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}

/// Shape of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A JSON scalar (string, number, bool).
    Scalar,
    /// An entity embedded by value, with its own fields.
    Nested(&'static [FieldSpec]),
}

/// A named field in a [`ResourceSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
        }
    }

    const fn nested(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            kind: FieldKind::Nested(fields),
        }
    }
}

/// Field schema for one resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub resource: ResourceName,
    pub fields: &'static [FieldSpec],
}

impl ResourceSpec {
    /// Fields a client submits on create, i.e. everything but `id`.
    pub fn payload_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|field| field.name != "id")
    }

    /// Deepest level of nesting (1 for flat resources).
    pub fn depth(&self) -> usize {
        fn depth_of(fields: &[FieldSpec]) -> usize {
            1 + fields
                .iter()
                .map(|field| match field.kind {
                    FieldKind::Scalar => 0,
                    FieldKind::Nested(inner) => depth_of(inner),
                })
                .max()
                .unwrap_or(0)
        }
        depth_of(self.fields)
    }
}

static POSTS: ResourceSpec = ResourceSpec {
    resource: ResourceName::Posts,
    fields: &[
        FieldSpec::scalar("userId"),
        FieldSpec::scalar("id"),
        FieldSpec::scalar("title"),
        FieldSpec::scalar("body"),
    ],
};

static ALBUMS: ResourceSpec = ResourceSpec {
    resource: ResourceName::Albums,
    fields: &[
        FieldSpec::scalar("userId"),
        FieldSpec::scalar("id"),
        FieldSpec::scalar("title"),
    ],
};

static COMMENTS: ResourceSpec = ResourceSpec {
    resource: ResourceName::Comments,
    fields: &[
        FieldSpec::scalar("postId"),
        FieldSpec::scalar("id"),
        FieldSpec::scalar("name"),
        FieldSpec::scalar("email"),
        FieldSpec::scalar("body"),
    ],
};

static PHOTOS: ResourceSpec = ResourceSpec {
    resource: ResourceName::Photos,
    fields: &[
        FieldSpec::scalar("albumId"),
        FieldSpec::scalar("id"),
        FieldSpec::scalar("title"),
        FieldSpec::scalar("url"),
        FieldSpec::scalar("thumbnailUrl"),
    ],
};

static TODOS: ResourceSpec = ResourceSpec {
    resource: ResourceName::Todos,
    fields: &[
        FieldSpec::scalar("userId"),
        FieldSpec::scalar("id"),
        FieldSpec::scalar("title"),
        FieldSpec::scalar("completed"),
    ],
};

static GEO: [FieldSpec; 2] = [FieldSpec::scalar("lat"), FieldSpec::scalar("lng")];

static ADDRESS: [FieldSpec; 5] = [
    FieldSpec::scalar("street"),
    FieldSpec::scalar("suite"),
    FieldSpec::scalar("city"),
    FieldSpec::scalar("zipcode"),
    FieldSpec::nested("geo", &GEO),
];

static COMPANY: [FieldSpec; 3] = [
    FieldSpec::scalar("name"),
    FieldSpec::scalar("catchPhrase"),
    FieldSpec::scalar("bs"),
];

static USERS: ResourceSpec = ResourceSpec {
    resource: ResourceName::Users,
    fields: &[
        FieldSpec::scalar("id"),
        FieldSpec::scalar("name"),
        FieldSpec::scalar("username"),
        FieldSpec::scalar("email"),
        FieldSpec::nested("address", &ADDRESS),
        FieldSpec::scalar("phone"),
        FieldSpec::scalar("website"),
        FieldSpec::nested("company", &COMPANY),
    ],
};
