//! Supporting documents for claims, bound to PDF forms and rendered lazily.

pub mod fields;
pub mod form;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use claimgen_core::ClaimApplication;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::GenerationError;
use form::TemplateStore;

/// Kinds of supporting document a claim can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DocumentType {
    #[serde(rename = "HCP")]
    HealthCareProvider,
    #[serde(rename = "MASSID")]
    MassId,
    #[serde(rename = "OOSID")]
    OutOfStateId,
    #[serde(rename = "PREGNANCY_MATERNITY_FORM")]
    PregnancyMaternityForm,
    #[serde(rename = "BIRTHCERTIFICATE")]
    BirthCertificate,
    #[serde(rename = "ADOPTIONCERT")]
    AdoptionCertificate,
    #[serde(rename = "FOSTERPLACEMENT")]
    FosterPlacement,
    #[serde(rename = "CARING")]
    Caring,
}

const CONFIRMATION: &str = "State managed Paid Leave Confirmation";
const IDENTIFICATION: &str = "Identification Proof";

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        Self::HealthCareProvider,
        Self::MassId,
        Self::OutOfStateId,
        Self::PregnancyMaternityForm,
        Self::BirthCertificate,
        Self::AdoptionCertificate,
        Self::FosterPlacement,
        Self::Caring,
    ];

    /// Short code used in file names and template lookups.
    pub fn code(self) -> &'static str {
        match self {
            Self::HealthCareProvider => "HCP",
            Self::MassId => "MASSID",
            Self::OutOfStateId => "OOSID",
            Self::PregnancyMaternityForm => "PREGNANCY_MATERNITY_FORM",
            Self::BirthCertificate => "BIRTHCERTIFICATE",
            Self::AdoptionCertificate => "ADOPTIONCERT",
            Self::FosterPlacement => "FOSTERPLACEMENT",
            Self::Caring => "CARING",
        }
    }

    /// Name the document is filed under. Service pack deployments file
    /// certification forms under reason-specific names.
    pub fn display_name(self, config: &DocumentConfig) -> &'static str {
        match (self, config.service_pack) {
            (Self::MassId | Self::OutOfStateId, _) => IDENTIFICATION,
            (_, false) => CONFIRMATION,
            (Self::HealthCareProvider, true) => "Own serious health condition form",
            (Self::PregnancyMaternityForm, true) => "Pregnancy/Maternity form",
            (Self::Caring, true) => "Care for a family member form",
            (Self::BirthCertificate | Self::AdoptionCertificate | Self::FosterPlacement, true) => {
                "Child bonding evidence form"
            }
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-document options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Produce a negative-path document with omitted or mismatched fields.
    pub invalid: bool,
}

/// Requested documents, keyed by type.
pub type DocsSpec = BTreeMap<DocumentType, DocumentOptions>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub service_pack: bool,
}

type Render = Arc<dyn Fn() -> Result<Vec<u8>, GenerationError> + Send + Sync>;

#[derive(Clone)]
enum DocumentSource {
    Pending(Render),
    Stored(PathBuf),
}

/// A document attached to a claim. Bytes are produced on each call to
/// [`GeneratedDocument::file`], never held by the handle itself.
#[derive(Clone)]
pub struct GeneratedDocument {
    pub document_type: DocumentType,
    pub name: String,
    source: DocumentSource,
}

impl fmt::Debug for GeneratedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("GeneratedDocument");
        debug
            .field("document_type", &self.document_type)
            .field("name", &self.name);
        match &self.source {
            DocumentSource::Pending(_) => debug.field("source", &"pending"),
            DocumentSource::Stored(path) => debug.field("source", path),
        };
        debug.finish()
    }
}

impl GeneratedDocument {
    pub fn pending<F>(document_type: DocumentType, name: impl Into<String>, render: F) -> Self
    where
        F: Fn() -> Result<Vec<u8>, GenerationError> + Send + Sync + 'static,
    {
        Self {
            document_type,
            name: name.into(),
            source: DocumentSource::Pending(Arc::new(render)),
        }
    }

    pub fn stored(document_type: DocumentType, name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            document_type,
            name: name.into(),
            source: DocumentSource::Stored(path),
        }
    }

    /// Backing file once the document has been realized on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            DocumentSource::Stored(path) => Some(path),
            DocumentSource::Pending(_) => None,
        }
    }

    /// Open a fresh byte stream over the document.
    pub fn file(&self) -> Result<DocumentStream, GenerationError> {
        match &self.source {
            DocumentSource::Pending(render) => Ok(DocumentStream {
                inner: Box::new(Cursor::new(render()?)),
            }),
            DocumentSource::Stored(path) => {
                let file = File::open(path).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::NotFound {
                        GenerationError::CorpusNotFound {
                            path: path.clone(),
                            source,
                        }
                    } else {
                        GenerationError::Io(source)
                    }
                })?;
                Ok(DocumentStream {
                    inner: Box::new(BufReader::new(file)),
                })
            }
        }
    }
}

/// Readable stream over a document's bytes.
pub struct DocumentStream {
    inner: Box<dyn Read + Send>,
}

impl DocumentStream {
    pub fn into_bytes(mut self) -> Result<Vec<u8>, GenerationError> {
        let mut bytes = Vec::new();
        self.inner.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for DocumentStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Produces the documents requested for a claim.
pub trait DocumentGenerator {
    fn generate_documents(
        &self,
        claim: &ClaimApplication,
        docs: &DocsSpec,
    ) -> Result<Vec<GeneratedDocument>, GenerationError>;
}

/// Fills PDF form templates with claim data.
#[derive(Debug, Clone, Default)]
pub struct FormDocumentGenerator {
    config: DocumentConfig,
    templates: Arc<TemplateStore>,
}

impl FormDocumentGenerator {
    pub fn new(config: DocumentConfig) -> Self {
        Self {
            config,
            templates: Arc::new(TemplateStore::default()),
        }
    }

    /// Read templates from `dir`, falling back to synthesized forms.
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates = Arc::new(TemplateStore::new(Some(dir.into())));
        self
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }
}

impl DocumentGenerator for FormDocumentGenerator {
    fn generate_documents(
        &self,
        claim: &ClaimApplication,
        docs: &DocsSpec,
    ) -> Result<Vec<GeneratedDocument>, GenerationError> {
        docs.iter()
            .map(|(document_type, options)| {
                let document_type = *document_type;
                // Surfaces unbindable templates before anything is rendered.
                self.templates.template(document_type)?;
                let values = fields::bind(document_type, claim, options.invalid);
                let templates = Arc::clone(&self.templates);
                debug!(
                    document = document_type.code(),
                    invalid = options.invalid,
                    "document bound"
                );
                Ok(GeneratedDocument::pending(
                    document_type,
                    document_type.display_name(&self.config),
                    move || {
                        let template = templates.template(document_type)?;
                        form::fill(document_type, &template, &values)
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_follow_service_pack() {
        let legacy = DocumentConfig::default();
        let service_pack = DocumentConfig { service_pack: true };
        assert_eq!(
            DocumentType::HealthCareProvider.display_name(&legacy),
            CONFIRMATION
        );
        assert_eq!(
            DocumentType::HealthCareProvider.display_name(&service_pack),
            "Own serious health condition form"
        );
        assert_eq!(DocumentType::MassId.display_name(&service_pack), IDENTIFICATION);
        assert_eq!(DocumentType::OutOfStateId.display_name(&legacy), IDENTIFICATION);
    }

    #[test]
    fn docs_spec_parses_type_codes() {
        let docs: DocsSpec =
            serde_json::from_str(r#"{"HCP": {}, "MASSID": {"invalid": true}}"#).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(!docs[&DocumentType::HealthCareProvider].invalid);
        assert!(docs[&DocumentType::MassId].invalid);
    }
}
