use crate::compose::{BadgeTemplate, DEFAULT_COMPANY_WRAP_WIDTH, DEFAULT_SCALE_FACTOR};
use crate::error::{ArchiveError, TemplateLoadError};
use crate::model::{AttendeeRecord, BadgeFields};
use crate::registry::{TemplateId, TemplateRegistry, TemplateStore, resolve_type};
use crate::render::{Rasterizer, raster_request};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Seek, Write};
use std::time::Duration;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const FALLBACK_FILENAME: &str = "my-badge.png";

/// `badge-<first>-<last>.png`, lowercased, whitespace runs collapsed to `-`.
pub fn badge_filename(first_name: &str, last_name: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();
    if first.is_empty() && last.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }
    let name = format!("badge-{first}-{last}.png").to_lowercase();
    WHITESPACE_RE.replace_all(&name, "-").into_owned()
}

/// Pacing and rendering settings for a bulk run. Items are processed one at a time,
/// in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    /// Pause between two rasterizations.
    pub delay: Duration,
    pub scale: f64,
    pub company_wrap_width: usize,
    pub location: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(50),
            scale: DEFAULT_SCALE_FACTOR,
            company_wrap_width: DEFAULT_COMPANY_WRAP_WIDTH,
            location: "Belgium".to_string(),
        }
    }
}

/// Where each attendee's template comes from.
pub enum TemplateSource<'a, S> {
    /// Every attendee uses the uploaded template.
    Custom(&'a BadgeTemplate),
    /// Each attendee gets the built-in template of their type.
    BuiltIn(&'a mut TemplateRegistry<S>),
}

impl<S: TemplateStore> TemplateSource<'_, S> {
    fn template_for(&mut self, id: TemplateId) -> Result<Cow<'_, BadgeTemplate>, TemplateLoadError> {
        match self {
            TemplateSource::Custom(template) => Ok(Cow::Borrowed(*template)),
            TemplateSource::BuiltIn(registry) => {
                let record = registry.load(id)?;
                Ok(Cow::Owned(BadgeTemplate::BuiltIn { id, record }))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    /// Archive entry names, in order.
    pub written: Vec<String>,
    /// Full names of attendees that were skipped.
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }
}

/// Renders every attendee into a ZIP written to `writer`.
///
/// `progress` is called with `(done, total)` before each attendee. A failed template
/// load or rasterization skips that attendee; only archive I/O aborts the run.
pub fn generate_archive<S, R, W, F>(
    attendees: &[AttendeeRecord],
    mut source: TemplateSource<'_, S>,
    rasterizer: &R,
    settings: &BatchSettings,
    writer: W,
    mut progress: F,
) -> Result<(W, BatchReport), ArchiveError>
where
    S: TemplateStore,
    R: Rasterizer + ?Sized,
    W: Write + Seek,
    F: FnMut(usize, usize),
{
    let mut zip = zip::ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));
    let mut report = BatchReport {
        total: attendees.len(),
        ..Default::default()
    };
    let mut used_names: HashMap<String, usize> = HashMap::new();

    for (idx, attendee) in attendees.iter().enumerate() {
        progress(idx + 1, attendees.len());
        if idx > 0 && !settings.delay.is_zero() {
            std::thread::sleep(settings.delay);
        }

        match render_attendee(attendee, &mut source, rasterizer, settings) {
            Ok(png) => {
                let name = unique_name(
                    &mut used_names,
                    badge_filename(&attendee.first_name, &attendee.last_name),
                );
                zip.start_file(name.as_str(), options)?;
                zip.write_all(&png)?;
                report.written.push(name);
            }
            Err(reason) => {
                warn!(
                    "failed to generate badge for {}: {reason}",
                    attendee.full_name().trim()
                );
                report.skipped.push(attendee.full_name().trim().to_string());
            }
        }
    }

    let writer = zip.finish()?;
    info!(
        "generated {} of {} badges",
        report.succeeded(),
        report.total
    );
    Ok((writer, report))
}

fn render_attendee<S, R>(
    attendee: &AttendeeRecord,
    source: &mut TemplateSource<'_, S>,
    rasterizer: &R,
    settings: &BatchSettings,
) -> Result<Vec<u8>, String>
where
    S: TemplateStore,
    R: Rasterizer + ?Sized,
{
    let resolution = resolve_type(&attendee.attendee_type);
    let fields = BadgeFields::for_attendee(attendee, &resolution, &settings.location);
    let template = source
        .template_for(resolution.template)
        .map_err(|err| err.to_string())?;
    let (_, request) = raster_request(&template, &fields, settings.company_wrap_width, settings.scale);
    rasterizer.rasterize(&request).map_err(|err| err.to_string())
}

// badge-ana.png, badge-ana-2.png, badge-ana-3.png, ...
fn unique_name(used: &mut HashMap<String, usize>, name: String) -> String {
    let count = used.entry(name.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return name;
    }
    let stem = name.strip_suffix(".png").unwrap_or(&name);
    let candidate = format!("{stem}-{count}.png");
    unique_name(used, candidate)
}
