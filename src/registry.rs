use crate::error::TemplateLoadError;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_WIDTH: f64 = 336.0;
pub const DEFAULT_HEIGHT: f64 = 528.0;

static VIEWBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"viewBox\s*=\s*["']([^"']+)["']"#).unwrap());
pub(crate) static ROOT_SVG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<svg\b[^>]*>").unwrap());
static WIDTH_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\swidth\s*=\s*["']\s*(\d+(?:\.\d+)?)"#).unwrap());
static HEIGHT_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\sheight\s*=\s*["']\s*(\d+(?:\.\d+)?)"#).unwrap());

/// The four pre-authored badge layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateId {
    Staff = 1,
    Attendee = 2,
    Speaker = 3,
    Partner = 4,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Staff,
        TemplateId::Attendee,
        TemplateId::Speaker,
        TemplateId::Partner,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn file_name(self) -> String {
        format!("badge-template-{}.svg", self.number())
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.number() == number)
    }

    /// Where the location line sits in this template and where its center lies.
    pub fn location_anchor(self) -> LocationAnchor {
        // Templates 2-4 were cut from one wide artboard, so their content sits under a
        // translate(-468 * n) group and the center moves by the same amount.
        let (min_x, max_x, center_x) = match self {
            TemplateId::Staff => (140.0, 150.0, 224.0),
            TemplateId::Attendee => (600.0, 700.0, 692.0),
            TemplateId::Speaker => (1000.0, 1100.0, 1160.0),
            TemplateId::Partner => (1500.0, 1600.0, 1628.0),
        };
        LocationAnchor {
            min_x,
            max_x,
            baseline_y: 128.17907,
            center_x,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template-{}", self.number())
    }
}

/// Horizontal band in which a template's location text starts, and the x coordinate
/// it is moved to once centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationAnchor {
    pub min_x: f64,
    pub max_x: f64,
    pub baseline_y: f64,
    pub center_x: f64,
}

impl LocationAnchor {
    pub fn matches(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x < self.max_x && (y - self.baseline_y).abs() < 1e-3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeLabel {
    Staff,
    Attendee,
    Speaker,
    Partner,
    Vip,
}

impl BadgeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeLabel::Staff => "Staff",
            BadgeLabel::Attendee => "Attendee",
            BadgeLabel::Speaker => "Speaker",
            BadgeLabel::Partner => "Partner",
            BadgeLabel::Vip => "VIP",
        }
    }
}

impl fmt::Display for BadgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template and label for a type code, resolved once and reused by every caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeResolution {
    pub template: TemplateId,
    pub label: BadgeLabel,
}

impl Default for TypeResolution {
    fn default() -> Self {
        Self {
            template: TemplateId::Attendee,
            label: BadgeLabel::Attendee,
        }
    }
}

// "staf" and "atendee" are misspellings found in real exports.
const TYPE_TABLE: &[(&str, TemplateId, BadgeLabel)] = &[
    ("1", TemplateId::Staff, BadgeLabel::Staff),
    ("staff", TemplateId::Staff, BadgeLabel::Staff),
    ("staf", TemplateId::Staff, BadgeLabel::Staff),
    ("2", TemplateId::Attendee, BadgeLabel::Attendee),
    ("attendee", TemplateId::Attendee, BadgeLabel::Attendee),
    ("atendee", TemplateId::Attendee, BadgeLabel::Attendee),
    ("3", TemplateId::Speaker, BadgeLabel::Speaker),
    ("speaker", TemplateId::Speaker, BadgeLabel::Speaker),
    ("4", TemplateId::Partner, BadgeLabel::Partner),
    ("partner", TemplateId::Partner, BadgeLabel::Partner),
    ("sponsor", TemplateId::Partner, BadgeLabel::Partner),
    ("vip", TemplateId::Partner, BadgeLabel::Vip),
];

pub fn resolve_type(code: &str) -> TypeResolution {
    let key = code.trim().to_lowercase();
    TYPE_TABLE
        .iter()
        .find(|(alias, _, _)| *alias == key)
        .map(|(_, template, label)| TypeResolution {
            template: *template,
            label: *label,
        })
        .unwrap_or_default()
}

pub fn resolve(code: &str) -> TemplateId {
    resolve_type(code).template
}

pub fn label(code: &str) -> &'static str {
    resolve_type(code).label.as_str()
}

/// A template body together with the dimensions detected from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRecord {
    pub id: String,
    pub body: String,
    pub width: f64,
    pub height: f64,
}

impl TemplateRecord {
    pub fn from_body(id: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let (width, height) = extract_dimensions(&body);
        Self {
            id: id.into(),
            body,
            width,
            height,
        }
    }
}

/// Reads dimensions from the viewBox, then from the root width/height attributes,
/// falling back to 336x528. Never fails.
pub fn extract_dimensions(svg: &str) -> (f64, f64) {
    if let Some(caps) = VIEWBOX_RE.captures(svg) {
        let parts: Vec<f64> = caps[1]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();
        if parts.len() >= 4 && parts[2] > 0.0 && parts[3] > 0.0 {
            return (parts[2], parts[3]);
        }
    }

    let root = ROOT_SVG_RE.find(svg).map(|m| m.as_str()).unwrap_or("");
    let attr = |re: &Regex| {
        re.captures(root)
            .and_then(|caps| caps[1].parse::<f64>().ok())
    };
    (
        attr(&WIDTH_ATTR_RE).unwrap_or(DEFAULT_WIDTH),
        attr(&HEIGHT_ATTR_RE).unwrap_or(DEFAULT_HEIGHT),
    )
}

/// Source of built-in template bodies.
pub trait TemplateStore {
    fn fetch(&self, name: &str) -> std::io::Result<String>;
}

/// Serves templates from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirTemplateStore {
    root: PathBuf,
}

impl DirTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateStore for DirTemplateStore {
    fn fetch(&self, name: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.root.join(name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    bodies: HashMap<String, String>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.bodies.insert(name.into(), body.into());
    }

    pub fn with_template(mut self, id: TemplateId, body: impl Into<String>) -> Self {
        self.insert(id.file_name(), body);
        self
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn fetch(&self, name: &str) -> std::io::Result<String> {
        self.bodies.get(name).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("template '{name}' not found"),
            )
        })
    }
}

/// Loaded built-in templates. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    entries: HashMap<TemplateId, Arc<TemplateRecord>>,
}

impl TemplateCache {
    pub fn get(&self, id: TemplateId) -> Option<Arc<TemplateRecord>> {
        self.entries.get(&id).cloned()
    }

    pub fn insert(&mut self, id: TemplateId, record: Arc<TemplateRecord>) {
        self.entries.insert(id, record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct TemplateRegistry<S> {
    store: S,
    cache: TemplateCache,
}

impl<S: TemplateStore> TemplateRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: TemplateCache::default(),
        }
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn load(&mut self, id: TemplateId) -> Result<Arc<TemplateRecord>, TemplateLoadError> {
        if let Some(record) = self.cache.get(id) {
            debug!("template cache hit for {id}");
            return Ok(record);
        }
        let name = id.file_name();
        let body = self
            .store
            .fetch(&name)
            .map_err(|source| TemplateLoadError::new(name.clone(), source))?;
        let record = Arc::new(TemplateRecord::from_body(name, body));
        info!(
            "loaded {id} ({}x{})",
            record.width, record.height
        );
        self.cache.insert(id, Arc::clone(&record));
        Ok(record)
    }
}
