//! AndroidManifest.xml Editing
//!
//! Edits attributes of the root `<manifest>` element and passes every
//! other event through unchanged, so formatting and comments survive.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::ManifestError;

const ROOT: &[u8] = b"manifest";
const VERSION_CODE: &str = "android:versionCode";
const VERSION_NAME: &str = "android:versionName";

/// Value of attribute `key` on the root element
pub fn root_attribute(xml: &str, key: &str) -> Result<Option<String>, ManifestError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref() != ROOT {
                    return Err(ManifestError::InvalidStructure(
                        "root element is not <manifest>".into(),
                    ));
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    if attr.key.as_ref() == key.as_bytes() {
                        let value = attr.unescape_value()?;
                        return Ok(Some(value.into_owned()));
                    }
                }
                return Ok(None);
            }
            Event::Eof => {
                return Err(ManifestError::InvalidStructure("no root element".into()));
            }
            _ => {}
        }
    }
}

/// Set attributes on the root element, replacing existing values and
/// appending missing ones
pub fn set_root_attributes(xml: &str, values: &[(&str, &str)]) -> Result<String, ManifestError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut root_seen = false;

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(e) if !root_seen => {
                root_seen = true;
                writer.write_event(Event::Start(rewrite_root(&e, values)?))?;
            }
            Event::Empty(e) if !root_seen => {
                root_seen = true;
                writer.write_event(Event::Empty(rewrite_root(&e, values)?))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if !root_seen {
        return Err(ManifestError::InvalidStructure("no root element".into()));
    }
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn rewrite_root(e: &BytesStart, values: &[(&str, &str)]) -> Result<BytesStart<'static>, ManifestError> {
    if e.name().as_ref() != ROOT {
        return Err(ManifestError::InvalidStructure(
            "root element is not <manifest>".into(),
        ));
    }

    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut root = BytesStart::new(name);
    let mut pending: Vec<(&str, &str)> = values.to_vec();

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if let Some(pos) = pending.iter().position(|(k, _)| *k == key) {
            let (k, v) = pending.remove(pos);
            root.push_attribute((k, v));
        } else {
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            // Already escaped in the source
            root.push_attribute(Attribute {
                key: quick_xml::name::QName(key.as_bytes()),
                value: value.as_bytes().into(),
            });
        }
    }
    for (k, v) in pending {
        root.push_attribute((k, v));
    }
    Ok(root.into_owned())
}

/// AndroidManifest.xml of a platform project
#[derive(Debug, Clone)]
pub struct AndroidManifestFile {
    path: PathBuf,
}

impl AndroidManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<String, ManifestError> {
        if !self.path.is_file() {
            return Err(ManifestError::FileNotFound(self.path.display().to_string()));
        }
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    async fn set(&self, values: &[(&str, &str)]) -> Result<(), ManifestError> {
        let xml = self.read().await?;
        let updated = set_root_attributes(&xml, values)?;
        tokio::fs::write(&self.path, updated).await?;
        debug!("Updated {:?}: {:?}", self.path, values);
        Ok(())
    }

    pub async fn package(&self) -> Result<Option<String>, ManifestError> {
        root_attribute(&self.read().await?, "package")
    }

    pub async fn version_code(&self) -> Result<Option<String>, ManifestError> {
        root_attribute(&self.read().await?, VERSION_CODE)
    }

    pub async fn set_version_code(&self, code: &str) -> Result<(), ManifestError> {
        self.set(&[(VERSION_CODE, code)]).await
    }

    pub async fn version_name(&self) -> Result<Option<String>, ManifestError> {
        root_attribute(&self.read().await?, VERSION_NAME)
    }

    pub async fn set_version_name(&self, name: &str) -> Result<(), ManifestError> {
        self.set(&[(VERSION_NAME, name)]).await
    }
}
