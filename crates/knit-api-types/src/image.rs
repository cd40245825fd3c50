//! Container image references of Plans.

use crate::error::TypesError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DEFAULT_TAG: &str = "latest";
const DOCKER_HUB: &str = "index.docker.io";
const DOCKER_HUB_ALIAS: &str = "docker.io";

const TAG_MAX_LEN: usize = 128;
const REPOSITORY_MAX_LEN: usize = 255;

/// A docker image tag reference, split into repository and tag.
///
/// The grammar is `[registry[:port]/]name[:tag]`, see
/// <https://docs.docker.com/engine/reference/commandline/tag/#description>.
/// The repository keeps its registry part, if any. A missing tag means
/// `latest`. Digest references (`name@sha256:...`) are not tags and are
/// rejected.
///
/// The empty image (both fields empty) stands for "no image", as used by
/// system-builtin Plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Image {
    pub repository: String,
    pub tag: String,
}

impl Image {
    /// Create an image reference without validation.
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Parse an image tag reference.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let (base, tag) = match s.rsplit_once(':') {
            // A colon followed by a slash belongs to a registry port.
            Some((base, tag)) if !tag.contains('/') => (base, tag),
            _ => (s, ""),
        };

        if !tag.is_empty() {
            check_tag(s, tag)?;
        }

        if base.is_empty() {
            return Err(TypesError::image(s, "a repository name must be specified"));
        }

        let (registry, repository) = match base.split_once('/') {
            Some((head, rest)) if head.contains('.') || head.contains(':') => (head, rest),
            _ => ("", base),
        };
        check_repository(s, repository)?;
        check_registry(s, registry)?;

        let repository = match registry {
            "" => repository.to_owned(),
            DOCKER_HUB | DOCKER_HUB_ALIAS if !repository.contains('/') => {
                format!("{DOCKER_HUB}/library/{repository}")
            }
            DOCKER_HUB | DOCKER_HUB_ALIAS => format!("{DOCKER_HUB}/{repository}"),
            _ => format!("{registry}/{repository}"),
        };

        let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
        Ok(Self::new(repository, tag))
    }

    /// True for the "no image" value.
    pub fn is_empty(&self) -> bool {
        self.repository.is_empty() && self.tag.is_empty()
    }
}

fn check_tag(input: &str, tag: &str) -> Result<(), TypesError> {
    if tag.len() > TAG_MAX_LEN {
        return Err(TypesError::image(
            input,
            format!("tag must be at most {TAG_MAX_LEN} characters"),
        ));
    }
    let valid = tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(TypesError::image(
            input,
            format!("tag {tag:?} may contain only [a-zA-Z0-9_.-]"),
        ));
    }
    Ok(())
}

fn check_repository(input: &str, repository: &str) -> Result<(), TypesError> {
    if repository.is_empty() || repository.len() > REPOSITORY_MAX_LEN {
        return Err(TypesError::image(
            input,
            format!("repository must be 1 to {REPOSITORY_MAX_LEN} characters"),
        ));
    }
    let valid = repository.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.' | '/')
    });
    if !valid {
        return Err(TypesError::image(
            input,
            format!("repository {repository:?} may contain only [a-z0-9_.-/]"),
        ));
    }
    Ok(())
}

fn check_registry(input: &str, registry: &str) -> Result<(), TypesError> {
    if registry.is_empty() {
        return Ok(());
    }

    let (host, port) = match registry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (registry, None),
    };

    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
    let port_ok = port.map_or(true, |p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if !host_ok || !port_ok {
        return Err(TypesError::image(
            input,
            format!("registry {registry:?} is not a valid host[:port]"),
        ));
    }
    Ok(())
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl FromStr for Image {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Image {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
