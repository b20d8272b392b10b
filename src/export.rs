use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::domain::email::{EmailCollection, EmailRecord};

/// Flat CSV row; derived columns are empty until their stage has run.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    fecha: Option<String>,
    correo: Option<&'a str>,
    titulo: Option<&'a str>,
    contenido: &'a str,
    contenido_limpio: Option<&'a str>,
    clasificacion: Option<&'a str>,
}

impl<'a> From<&'a EmailRecord> for CsvRow<'a> {
    fn from(r: &'a EmailRecord) -> Self {
        Self {
            fecha: r.date.map(|d| d.to_rfc3339()),
            correo: r.sender.as_deref(),
            titulo: r.subject.as_deref(),
            contenido: &r.body,
            contenido_limpio: r.cleaned_body.as_deref(),
            clasificacion: r.classification.as_ref().map(|c| c.as_text()),
        }
    }
}

pub fn write_csv_to<W: Write>(emails: &EmailCollection, out: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);
    for record in emails {
        w.serialize(CsvRow::from(record))?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_csv(emails: &EmailCollection, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv_to(emails, file)?;
    log::info!("wrote {} rows to {}", emails.len(), path.display());
    Ok(())
}
