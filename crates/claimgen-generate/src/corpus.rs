//! NDJSON corpus persistence and the load-or-generate-and-save protocol.
//!
//! Every corpus is one JSON record per line. Claim documents are written as
//! separate files next to the corpus and referenced by file name.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;

use claimgen_core::{
    ClaimApplication, Employee, Employer, EmployerResponse, Metadata, PaymentPreference,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::claims::{ClaimPool, GeneratedClaim};
use crate::documents::{DocumentType, GeneratedDocument};
use crate::employees::EmployeePool;
use crate::employers::EmployerPool;
use crate::errors::GenerationError;
use crate::pool::UsedSet;

type CorpusWriter = CountingWriter<BufWriter<File>>;

/// Result of a corpus load that can fall back to generation.
pub struct CorpusLoad<T> {
    path: PathBuf,
    result: Result<T, GenerationError>,
    persist: Box<dyn FnOnce(T) -> Result<T, GenerationError>>,
}

impl<T> CorpusLoad<T> {
    fn new<P>(path: &Path, result: Result<T, GenerationError>, persist: P) -> Self
    where
        P: FnOnce(T) -> Result<T, GenerationError> + 'static,
    {
        Self {
            path: path.to_path_buf(),
            result,
            persist: Box::new(persist),
        }
    }

    /// True when the corpus file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(&self.result, Err(err) if err.is_corpus_not_found())
    }

    /// The loaded data, or the load error as-is.
    pub fn into_result(self) -> Result<T, GenerationError> {
        self.result
    }

    /// Return the loaded data; when the corpus does not exist, generate it,
    /// save it to the same location and return what was saved. Other load
    /// errors are returned unchanged.
    pub fn or_generate_and_save<F>(self, generate: F) -> Result<T, GenerationError>
    where
        F: FnOnce() -> Result<T, GenerationError>,
    {
        match self.result {
            Err(err) if err.is_corpus_not_found() => {
                info!(path = %self.path.display(), "corpus missing, generating");
                let fresh = generate()?;
                (self.persist)(fresh)
            }
            other => other,
        }
    }
}

/// Lazily decoded NDJSON records. Blank lines are skipped.
pub struct NdjsonReader<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for NdjsonReader<T> {
    type Item = Result<T, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|source| {
                GenerationError::Corrupt {
                    path: self.path.clone(),
                    line: self.line,
                    source,
                }
            }));
        }
    }
}

/// Open an NDJSON corpus. A missing file is reported as
/// [`GenerationError::CorpusNotFound`].
pub fn read_ndjson<T: DeserializeOwned>(path: &Path) -> Result<NdjsonReader<T>, GenerationError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            GenerationError::CorpusNotFound {
                path: path.to_path_buf(),
                source,
            }
        } else {
            GenerationError::Io(source)
        }
    })?;
    debug!(path = %path.display(), "corpus opened");
    Ok(NdjsonReader {
        path: path.to_path_buf(),
        lines: BufReader::new(file).lines(),
        line: 0,
        _record: PhantomData,
    })
}

fn write_line<T: Serialize>(writer: &mut CorpusWriter, record: &T) -> Result<(), GenerationError> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Replace `path` with whatever `write` produces, via a temporary sibling file.
/// Returns the number of bytes written.
fn write_atomic<F>(path: &Path, write: F) -> Result<u64, GenerationError>
where
    F: FnOnce(&mut CorpusWriter) -> Result<(), GenerationError>,
{
    ensure_parent(path)?;
    let tmp_path = temp_path(path)?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;

    match finish(file, write) {
        Ok(bytes) => {
            fs::rename(&tmp_path, path)?;
            sync_parent(path)?;
            Ok(bytes)
        }
        Err(err) => {
            let _ = fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}

fn append_to<F>(path: &Path, write: F) -> Result<u64, GenerationError>
where
    F: FnOnce(&mut CorpusWriter) -> Result<(), GenerationError>,
{
    ensure_parent(path)?;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    finish(file, write)
}

fn finish<F>(file: File, write: F) -> Result<u64, GenerationError>
where
    F: FnOnce(&mut CorpusWriter) -> Result<(), GenerationError>,
{
    let mut writer = CountingWriter::new(BufWriter::new(file));
    write(&mut writer)?;
    writer.flush()?;
    let bytes = writer.bytes_written();
    let file = writer.inner.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(bytes)
}

/// Write a whole file atomically.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), GenerationError> {
    write_atomic(path, |writer| {
        writer.write_all(data)?;
        Ok(())
    })
    .map(|_| ())
}

fn ensure_parent(path: &Path) -> Result<(), GenerationError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf, GenerationError> {
    let file_name = path.file_name().ok_or_else(|| {
        GenerationError::InvalidSpec(format!("invalid corpus path {}", path.display()))
    })?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            OpenOptions::new().read(true).open(parent)?.sync_all()
        }
        _ => Ok(()),
    }
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Persisted document reference: the file lives in the documents directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_type: DocumentType,
    pub name: String,
    pub file: String,
}

/// Persisted form of a [`GeneratedClaim`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: String,
    #[serde(default)]
    pub scenario: String,
    pub claim: ClaimApplication,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(rename = "employerResponse", default)]
    pub employer_response: Option<EmployerResponse>,
    #[serde(rename = "paymentPreference")]
    pub payment_preference: PaymentPreference,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
}

impl ClaimRecord {
    /// Render every document of `claim` into `documents_dir` and reference the
    /// files. Without a directory the documents are dropped.
    fn realize(
        claim: GeneratedClaim,
        documents_dir: Option<&Path>,
    ) -> Result<(Self, usize), GenerationError> {
        let mut documents = Vec::with_capacity(claim.documents.len());
        if let Some(dir) = documents_dir {
            for (idx, document) in claim.documents.iter().enumerate() {
                let file = format!("{}.{idx}.{}.pdf", claim.id, document.document_type.code());
                let bytes = document.file()?.into_bytes()?;
                write_bytes_atomic(&dir.join(&file), &bytes)?;
                documents.push(DocumentRecord {
                    document_type: document.document_type,
                    name: document.name.clone(),
                    file,
                });
            }
        }
        let dropped = claim.documents.len() - documents.len();

        Ok((
            Self {
                id: claim.id,
                scenario: claim.scenario,
                claim: claim.claim,
                metadata: claim.metadata,
                employer_response: claim.employer_response,
                payment_preference: claim.payment_preference,
                documents,
            },
            dropped,
        ))
    }

    fn into_claim(self, documents_dir: Option<&Path>) -> GeneratedClaim {
        let documents = match documents_dir {
            Some(dir) => self
                .documents
                .into_iter()
                .map(|doc| {
                    GeneratedDocument::stored(doc.document_type, doc.name, dir.join(doc.file))
                })
                .collect(),
            None => Vec::new(),
        };
        GeneratedClaim {
            id: self.id,
            scenario: self.scenario,
            claim: self.claim,
            metadata: self.metadata,
            employer_response: self.employer_response,
            payment_preference: self.payment_preference,
            documents,
        }
    }
}

impl ClaimPool {
    /// Write the pool to `path`, replacing any existing corpus, and realize
    /// documents into `documents_dir`. Returns the number of claims written.
    pub fn save(self, path: &Path, documents_dir: Option<&Path>) -> Result<usize, GenerationError> {
        self.write(path, documents_dir, false)
    }

    /// Add the pool's claims to the end of the corpus at `path`.
    pub fn append(
        self,
        path: &Path,
        documents_dir: Option<&Path>,
    ) -> Result<usize, GenerationError> {
        self.write(path, documents_dir, true)
    }

    fn write(
        self,
        path: &Path,
        documents_dir: Option<&Path>,
        append: bool,
    ) -> Result<usize, GenerationError> {
        let start = Instant::now();
        let mut count = 0usize;
        let mut documents = 0usize;
        let mut dropped = 0usize;
        let write_claims = |writer: &mut CorpusWriter| -> Result<(), GenerationError> {
            for claim in self {
                let (record, claim_dropped) = ClaimRecord::realize(claim?, documents_dir)?;
                documents += record.documents.len();
                dropped += claim_dropped;
                write_line(writer, &record)?;
                count += 1;
            }
            Ok(())
        };
        let bytes_written = if append {
            append_to(path, write_claims)?
        } else {
            write_atomic(path, write_claims)?
        };

        if dropped > 0 {
            warn!(
                path = %path.display(),
                dropped,
                "no documents directory, document references dropped"
            );
        }
        info!(
            path = %path.display(),
            count,
            documents,
            append,
            bytes_written,
            duration_ms = start.elapsed().as_millis() as u64,
            "claims saved"
        );
        Ok(count)
    }

    /// Stream claims from `path`, re-attaching documents stored in
    /// `documents_dir`.
    pub fn load(path: &Path, documents_dir: Option<&Path>) -> CorpusLoad<ClaimPool> {
        let dir = documents_dir.map(Path::to_path_buf);
        let result = read_ndjson::<ClaimRecord>(path).map(|reader| {
            let dir = dir.clone();
            ClaimPool::from_results(
                reader.map(move |record| record.map(|record| record.into_claim(dir.as_deref()))),
            )
        });
        let target = path.to_path_buf();
        CorpusLoad::new(path, result, move |pool: ClaimPool| {
            pool.save(&target, dir.as_deref())?;
            ClaimPool::load(&target, dir.as_deref()).into_result()
        })
    }
}

impl EmployerPool {
    pub fn save(&self, path: &Path) -> Result<u64, GenerationError> {
        let bytes_written = write_atomic(path, |writer| {
            for employer in self.iter() {
                write_line(writer, employer)?;
            }
            Ok(())
        })?;
        info!(path = %path.display(), count = self.len(), bytes_written, "employers saved");
        Ok(bytes_written)
    }

    pub fn load(path: &Path) -> CorpusLoad<EmployerPool> {
        let result = read_ndjson::<Employer>(path)
            .and_then(|reader| reader.collect::<Result<Vec<_>, _>>())
            .map(EmployerPool::from_employers);
        let target = path.to_path_buf();
        CorpusLoad::new(path, result, move |pool: EmployerPool| {
            pool.save(&target)?;
            Ok(pool)
        })
    }
}

impl EmployeePool {
    /// Write employees to `path` and the used set to `used_path`.
    pub fn save(&self, path: &Path, used_path: &Path) -> Result<u64, GenerationError> {
        let bytes_written = write_atomic(path, |writer| {
            for employee in self.iter() {
                write_line(writer, employee)?;
            }
            Ok(())
        })?;
        write_atomic(used_path, |writer| {
            for ssn in self.used().iter() {
                write_line(writer, &ssn)?;
            }
            Ok(())
        })?;
        info!(
            path = %path.display(),
            count = self.len(),
            used = self.used().len(),
            bytes_written,
            "employees saved"
        );
        Ok(bytes_written)
    }

    /// Load employees and merge the persisted used set. A missing used-set
    /// file means nothing has been picked yet.
    pub fn load(path: &Path, used_path: &Path) -> CorpusLoad<EmployeePool> {
        let result = load_employees(path, used_path);
        let target = path.to_path_buf();
        let used_target = used_path.to_path_buf();
        CorpusLoad::new(path, result, move |pool: EmployeePool| {
            pool.save(&target, &used_target)?;
            Ok(pool)
        })
    }
}

fn load_employees(path: &Path, used_path: &Path) -> Result<EmployeePool, GenerationError> {
    let employees = read_ndjson::<Employee>(path)?.collect::<Result<Vec<_>, _>>()?;
    let used = match read_ndjson::<String>(used_path) {
        Ok(reader) => reader.collect::<Result<UsedSet, _>>()?,
        Err(err) if err.is_corpus_not_found() => UsedSet::new(),
        Err(err) => return Err(err),
    };
    debug!(
        path = %path.display(),
        count = employees.len(),
        used = used.len(),
        "employees loaded"
    );
    Ok(EmployeePool::from_employees(employees).with_used(used))
}
