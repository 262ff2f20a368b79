//! Word document outcomes
//!
//! A `.docx` file is a zip archive of XML parts. The body, header and footer
//! parts are rendered as templates with XML escaping; every other entry is
//! copied unchanged. Word often splits a typed `{{ field }}` across several
//! runs, so run boundaries inside a tag are removed before rendering and the
//! tag takes the formatting of the run it starts in.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::outcome::OutcomeAdapter;
use crate::domain::storage::StorageBackend;
use crate::domain::{Context, DomainError};
use crate::infrastructure::storage::LocalStorage;
use crate::infrastructure::template::{self, Escaping};

fn is_template_part(name: &str) -> bool {
    let Some(part) = name.strip_prefix("word/") else {
        return false;
    };
    part == "document.xml"
        || (part.ends_with(".xml") && (part.starts_with("header") || part.starts_with("footer")))
}

/// `{` and a following `{`/`%` separated by markup
static SPLIT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?:<[^>]*>)+([{%])").expect("valid open regex"));
/// `}`/`%` and a following `}` separated by markup
static SPLIT_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([}%])(?:<[^>]*>)+\}").expect("valid close regex"));
static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("valid tag regex"));
/// End of one text run up to the start of the next one
static RUN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</w:t>.*?<w:t(?:\s[^>]*)?>").expect("valid run regex"));

/// Pull template tags that Word split across runs back into a single run
pub fn join_split_tags(xml: &str) -> String {
    let xml = SPLIT_OPEN.replace_all(xml, "{$1");
    let xml = SPLIT_CLOSE.replace_all(&xml, "$1}");
    TAG.replace_all(&xml, |tag: &Captures| RUN_BREAK.replace_all(&tag[0], "").into_owned())
        .into_owned()
}

/// Render the templated parts of a `.docx` archive
pub fn render_docx(document: &[u8], data: &Context) -> Result<Vec<u8>, DomainError> {
    let zip_err = |e: zip::result::ZipError| DomainError::template(format!("invalid document: {}", e));

    let mut archive = ZipArchive::new(Cursor::new(document)).map_err(zip_err)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_err)?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer.add_directory(name, options).map_err(zip_err)?;
            continue;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;

        if is_template_part(&name) {
            let xml = String::from_utf8(contents)
                .map_err(|e| DomainError::template(format!("{} is not UTF-8: {}", name, e)))?;
            contents = template::render(&join_split_tags(&xml), data, Escaping::Xml)?.into_bytes();
        }

        writer.start_file(name, options).map_err(zip_err)?;
        writer.write_all(&contents)?;
    }

    Ok(writer.finish().map_err(zip_err)?.into_inner())
}

#[derive(Debug)]
pub struct WordOutcome {
    name: String,
    input: LocalStorage,
    output: LocalStorage,
    rendered: Option<Vec<u8>>,
}

impl WordOutcome {
    pub fn new(name: impl Into<String>, input: LocalStorage, output: LocalStorage) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            rendered: None,
        }
    }

    pub(super) fn rendered_document(&self) -> Result<&[u8], DomainError> {
        self.rendered
            .as_deref()
            .ok_or_else(|| DomainError::outcome(&self.name, "nothing has been rendered"))
    }

    pub(super) fn output(&self) -> &LocalStorage {
        &self.output
    }
}

#[async_trait]
impl OutcomeAdapter for WordOutcome {
    async fn render(&mut self, data: &Context) -> Result<(), DomainError> {
        let document = self.input.get_bytes().await?;
        let rendered =
            render_docx(&document, data).map_err(|e| DomainError::outcome(&self.name, e.to_string()))?;
        self.output.render(data)?;
        debug!(outcome = %self.name, bytes = rendered.len(), "Rendered Word outcome");
        self.rendered = Some(rendered);
        Ok(())
    }

    async fn save(&mut self) -> Result<(), DomainError> {
        let document = self.rendered_document()?;
        self.output.save_file(document).await
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.path()
    }
}
