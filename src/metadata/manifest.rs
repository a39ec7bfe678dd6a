//! Addon manifest (`addon.xml`) reading.
//!
//! Only the root `<addon>` element is inspected: its `id` attribute names the
//! addon and its `version` attribute versions it. Everything else in the
//! manifest belongs to the host application and is ignored.

use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Name of the root element every addon manifest must have.
const ROOT_ELEMENT: &[u8] = b"addon";

/// Identity fields read from an addon manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonManifest {
    name: String,
    version: String,
}

impl AddonManifest {
    /// Load and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ManifestRead`] if the file is missing, cannot be
    /// read, is not well-formed, or lacks a non-blank `id` or `version`.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| BuildError::ManifestRead {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        Self::parse(&contents).map_err(|reason| BuildError::ManifestRead {
            path: path.to_owned(),
            reason,
        })
    }

    /// Parse manifest XML, returning a human-readable reason on failure.
    ///
    /// # Errors
    ///
    /// Returns the reason the manifest is unusable.
    pub fn parse(xml: &str) -> std::result::Result<Self, String> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(element) | Event::Empty(element)) => {
                    return Self::from_root(&element);
                }
                Ok(Event::Eof) => return Err("no root element found".to_owned()),
                Ok(_) => {}
                Err(err) => {
                    return Err(format!(
                        "malformed XML at byte {}: {err}",
                        reader.error_position()
                    ));
                }
            }
        }
    }

    fn from_root(element: &BytesStart<'_>) -> std::result::Result<Self, String> {
        if element.name().as_ref() != ROOT_ELEMENT {
            return Err(format!(
                "root element is <{}>, expected <addon>",
                String::from_utf8_lossy(element.name().as_ref())
            ));
        }

        let mut name = None;
        let mut version = None;
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|err| format!("invalid attribute: {err}"))?;
            let slot = match attribute.key.as_ref() {
                b"id" => &mut name,
                b"version" => &mut version,
                _ => continue,
            };
            let value = attribute
                .unescape_value()
                .map_err(|err| format!("invalid attribute value: {err}"))?;
            *slot = Some(value.trim().to_owned());
        }

        Ok(Self {
            name: required(name, "id")?,
            version: required(version, "version")?,
        })
    }

    /// Return the addon name (the manifest's `id`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the addon version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

fn required(value: Option<String>, attribute: &str) -> std::result::Result<String, String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(format!("attribute `{attribute}` on <addon> is blank")),
        None => Err(format!("<addon> is missing the `{attribute}` attribute")),
    }
}

/// Resolve the manifest location relative to the project root.
#[must_use]
pub fn manifest_path(project_root: &Utf8Path, manifest: &Utf8Path) -> Utf8PathBuf {
    project_root.join(manifest)
}
