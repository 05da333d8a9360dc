use crate::model::{BadgeFields, Field, PlaceholderMap};
use crate::placeholder;
use crate::registry::{LocationAnchor, ROOT_SVG_RE, TemplateId, TemplateRecord};
use crate::text::wrap;
use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::sync::Arc;

pub const DEFAULT_COMPANY_WRAP_WIDTH: usize = 20;
pub const DEFAULT_SCALE_FACTOR: f64 = 3.0;

// Sentinel texts authored into the built-in templates.
const FIRST_NAME_SENTINEL: &str = ">Michelangelo<";
const LAST_NAME_SENTINEL: &str = ">Muchlongername<";
const TITLE_SENTINEL: &str = ">Title<";
const COMPANY_SENTINEL: &str = ">Organization<";
const LOCATION_SENTINEL: &str = ">Editable Location<";

/// Texts the built-in templates ship in their badge-type slot. Anything else in that
/// slot is left alone.
pub const KNOWN_BADGE_TYPE_TEXTS: [&str; 8] = [
    "Staf",
    "Atendee",
    "Speaker",
    "Volunteer",
    "Organizer",
    "Sponsor",
    "All-Access",
    "Partner",
];

static MATRIX_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(<text\b[^>]*?)transform="matrix\(\s*([-0-9.eE]+)\s*,\s*0\s*,\s*0\s*,\s*([-0-9.eE]+)\s*,\s*([-0-9.eE]+)\s*,\s*([-0-9.eE]+)\s*\)"([^>]*>)"#,
    )
    .unwrap()
});
// One pass over the template: badge-type slot, sentinel texts and `{{field}}` tokens.
// Inserted values are never scanned again.
static BUILTIN_SLOT_RE: Lazy<Regex> = Lazy::new(|| {
    let badge_types = KNOWN_BADGE_TYPE_TEXTS
        .iter()
        .map(|text| regex::escape(text))
        .collect::<Vec<_>>()
        .join("|");
    let sentinels = [
        FIRST_NAME_SENTINEL,
        LAST_NAME_SENTINEL,
        TITLE_SENTINEL,
        COMPANY_SENTINEL,
        LOCATION_SENTINEL,
    ]
    .iter()
    .map(|text| regex::escape(text))
    .collect::<Vec<_>>()
    .join("|");
    Regex::new(&format!(
        r#"<tspan(?P<attrs>[^>]*?)style="(?P<s1>[^"]*?)font-weight:500(?P<s2>[^"]*?)font-size:27px(?P<s3>[^"]*?)"(?P<pre>[^>]*?\s)y="0"(?P<post>[^>]*)>(?:{badge_types})</tspan>|(?P<sentinel>{sentinels})|(?i:\{{\{{(?P<token>firstName|lastName|title|company|location|badgeType)\}}\}})"#
    ))
    .unwrap()
});
static SIZE_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s(?:width|height)\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn escape_fields(fields: &BadgeFields) -> BadgeFields {
    BadgeFields {
        first_name: escape_xml(&fields.first_name),
        last_name: escape_xml(&fields.last_name),
        title: escape_xml(&fields.title),
        company: escape_xml(&fields.company),
        location: escape_xml(&fields.location),
        badge_type: escape_xml(&fields.badge_type),
    }
}

/// Replaces every literal occurrence of each defined placeholder with the escaped value.
///
/// All placeholders are matched in a single pass, longest first, so a value that
/// happens to contain another field's placeholder is inserted as is.
pub fn compose_custom(template: &str, placeholders: &PlaceholderMap, fields: &BadgeFields) -> String {
    let mut defined: Vec<(Field, &str)> = Vec::new();
    for (field, placeholder) in placeholders.defined() {
        // the first field claiming a placeholder keeps it
        if !defined.iter().any(|(_, seen)| *seen == placeholder) {
            defined.push((field, placeholder));
        }
    }
    if defined.is_empty() {
        return template.to_string();
    }
    defined.sort_by_key(|(_, placeholder)| std::cmp::Reverse(placeholder.len()));

    let pattern = defined
        .iter()
        .map(|(_, placeholder)| regex::escape(placeholder))
        .collect::<Vec<_>>()
        .join("|");
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => {
            warn!("placeholder pattern rejected, template left unchanged: {err}");
            return template.to_string();
        }
    };

    let escaped = escape_fields(fields);
    re.replace_all(template, |caps: &Captures| {
        defined
            .iter()
            .find(|(_, placeholder)| *placeholder == &caps[0])
            .map(|(field, _)| escaped.get(*field).to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Per-template settings for the built-in compositor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinLayout {
    pub anchor: LocationAnchor,
    pub company_wrap_width: usize,
}

impl BuiltinLayout {
    pub fn for_template(id: TemplateId) -> Self {
        Self {
            anchor: id.location_anchor(),
            company_wrap_width: DEFAULT_COMPANY_WRAP_WIDTH,
        }
    }

    pub fn with_company_wrap_width(mut self, width: usize) -> Self {
        self.company_wrap_width = width.max(1);
        self
    }
}

pub fn compose_builtin(template: &str, fields: &BadgeFields, layout: &BuiltinLayout) -> String {
    let escaped = escape_fields(fields);
    let company = company_runs(&fields.company, layout.company_wrap_width);
    let centered = center_location(template, &layout.anchor);

    BUILTIN_SLOT_RE
        .replace_all(&centered, |caps: &Captures| {
            if let Some(sentinel) = caps.name("sentinel") {
                let value = match sentinel.as_str() {
                    FIRST_NAME_SENTINEL => escaped.first_name.as_str(),
                    LAST_NAME_SENTINEL => escaped.last_name.as_str(),
                    TITLE_SENTINEL => non_empty(&escaped.title),
                    COMPANY_SENTINEL => company.as_str(),
                    _ => escaped.location.as_str(),
                };
                return format!(">{value}<");
            }
            if let Some(token) = caps.name("token") {
                return match token.as_str().parse::<Field>() {
                    Ok(field) => escaped.get(field).to_string(),
                    Err(_) => caps[0].to_string(),
                };
            }
            format!(
                r#"<tspan{}style="{}font-weight:700{}font-size:22px{}"{}y="0"{}>{}</tspan>"#,
                &caps["attrs"],
                &caps["s1"],
                &caps["s2"],
                &caps["s3"],
                &caps["pre"],
                &caps["post"],
                escaped.badge_type
            )
        })
        .into_owned()
}

// Keeps the element non-empty so the text node survives.
fn non_empty(value: &str) -> &str {
    if value.is_empty() { " " } else { value }
}

fn company_runs(company: &str, wrap_width: usize) -> String {
    let lines = wrap(company, wrap_width);
    match lines.as_slice() {
        [first, rest @ ..] if !rest.is_empty() => format!(
            r#"<tspan x="0" dy="0" style="font-weight:700">{}</tspan><tspan x="0" dy="1.2em" style="font-weight:700">{}</tspan>"#,
            escape_xml(first),
            escape_xml(&rest.join(" "))
        ),
        _ => format!(
            r#"<tspan style="font-weight:700">{}</tspan>"#,
            non_empty(&escape_xml(company))
        ),
    }
}

/// Moves the location text to the template's center and anchors it there.
fn center_location(svg: &str, anchor: &LocationAnchor) -> String {
    MATRIX_TEXT_RE
        .replace_all(svg, |caps: &Captures| {
            let x = caps[4].parse::<f64>().ok();
            let y = caps[5].parse::<f64>().ok();
            match (x, y) {
                (Some(x), Some(y)) if anchor.matches(x, y) => {
                    let anchored = caps[1].contains("text-anchor=") || caps[6].contains("text-anchor=");
                    format!(
                        r#"{}transform="matrix({},0,0,{},{},{})"{}{}"#,
                        &caps[1],
                        &caps[2],
                        &caps[3],
                        anchor.center_x,
                        &caps[5],
                        if anchored { "" } else { r#" text-anchor="middle""# },
                        &caps[6]
                    )
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Pixel size of an exported badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSize {
    pub width: u32,
    pub height: u32,
}

impl ExportSize {
    pub fn scaled(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width: (width * scale).round().max(1.0) as u32,
            height: (height * scale).round().max(1.0) as u32,
        }
    }
}

/// Rewrites the root element's width/height to `size`, dropping any previous values.
pub fn export_svg(svg: &str, size: ExportSize) -> String {
    let Some(root) = ROOT_SVG_RE.find(svg) else {
        warn!("no root <svg> element found, export sizing skipped");
        return svg.to_string();
    };
    let tag = SIZE_ATTR_RE.replace_all(root.as_str(), "");
    let (open, close) = match tag.strip_suffix("/>") {
        Some(open) => (open, "/>"),
        None => (tag.strip_suffix('>').unwrap_or(tag.as_ref()), ">"),
    };
    format!(
        r#"{}{} width="{}" height="{}"{}{}"#,
        &svg[..root.start()],
        open.trim_end(),
        size.width,
        size.height,
        close,
        &svg[root.end()..]
    )
}

/// The template a badge is composed against.
#[derive(Debug, Clone)]
pub enum BadgeTemplate {
    BuiltIn {
        id: TemplateId,
        record: Arc<TemplateRecord>,
    },
    Custom {
        record: TemplateRecord,
        placeholders: PlaceholderMap,
    },
}

impl BadgeTemplate {
    /// Wraps an uploaded template, detecting its placeholders.
    pub fn custom(record: TemplateRecord) -> Self {
        let placeholders = placeholder::detect(&record.body);
        BadgeTemplate::Custom {
            record,
            placeholders,
        }
    }

    pub fn record(&self) -> &TemplateRecord {
        match self {
            BadgeTemplate::BuiltIn { record, .. } => record,
            BadgeTemplate::Custom { record, .. } => record,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, BadgeTemplate::Custom { .. })
    }

    pub fn export_size(&self, scale: f64) -> ExportSize {
        let record = self.record();
        ExportSize::scaled(record.width, record.height, scale)
    }

    pub fn compose(&self, fields: &BadgeFields, company_wrap_width: usize) -> String {
        match self {
            BadgeTemplate::BuiltIn { id, record } => {
                let layout =
                    BuiltinLayout::for_template(*id).with_company_wrap_width(company_wrap_width);
                compose_builtin(&record.body, fields, &layout)
            }
            BadgeTemplate::Custom {
                record,
                placeholders,
            } => compose_custom(&record.body, placeholders, fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAFF: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="336" height="528" viewBox="0 0 448 704"><g><text transform="matrix(1.3333333,0,0,1.3333333,40,300)"><tspan x="0" y="0">Michelangelo</tspan><tspan style="font-weight:500;font-size:27px" x="0" y="31.049999">Muchlongername</tspan></text><text transform="matrix(1.3333333,0,0,1.3333333,40,360)"><tspan x="0" y="0">Title</tspan></text><text transform="matrix(1.3333333,0,0,1.3333333,40,390)"><tspan x="0" y="0">Organization</tspan></text><text transform="matrix(1.3333333,0,0,1.3333333,143.28,128.17907)"><tspan x="0" y="0">Editable Location</tspan></text><text transform="matrix(1.3333333,0,0,1.3333333,40,600)"><tspan style="font-family:Inter;font-weight:500;fill:#000;font-size:27px" x="0" y="0">Staf</tspan></text></g></svg>"#;

    fn fields() -> BadgeFields {
        BadgeFields {
            first_name: "Ana".into(),
            last_name: "O'Brien & Co".into(),
            title: "CTO".into(),
            company: "Acme".into(),
            location: "Brussels".into(),
            badge_type: "Staff".into(),
        }
    }

    fn staff_layout() -> BuiltinLayout {
        BuiltinLayout::for_template(TemplateId::Staff)
    }

    #[test]
    fn escape_xml_covers_all_specials() {
        assert_eq!(escape_xml(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }

    #[test]
    fn builtin_substitutes_escaped_names() {
        let svg = compose_builtin(STAFF, &fields(), &staff_layout());
        assert!(svg.contains(">Ana<"));
        assert!(svg.contains(">O&apos;Brien &amp; Co<"));
        assert!(!svg.contains("O'Brien"));
        assert!(!svg.contains("Michelangelo"));
        assert!(!svg.contains("Muchlongername"));
    }

    #[test]
    fn builtin_keeps_empty_title_non_empty() {
        let mut values = fields();
        values.title.clear();
        let svg = compose_builtin(STAFF, &values, &staff_layout());
        assert!(svg.contains(r#"<tspan x="0" y="0"> </tspan>"#));
    }

    #[test]
    fn short_company_is_a_single_bold_run() {
        let svg = compose_builtin(STAFF, &fields(), &staff_layout());
        assert!(svg.contains(r#"<tspan style="font-weight:700">Acme</tspan>"#));
    }

    #[test]
    fn long_company_is_two_stacked_runs() {
        let mut values = fields();
        values.company = "International Business Machines & Sons".into();
        let svg = compose_builtin(STAFF, &values, &staff_layout());
        assert!(svg.contains(r#"<tspan x="0" dy="0" style="font-weight:700">International</tspan>"#));
        assert!(svg.contains(
            r#"<tspan x="0" dy="1.2em" style="font-weight:700">Business Machines &amp; Sons</tspan>"#
        ));
    }

    #[test]
    fn location_is_centered_for_its_template() {
        let svg = compose_builtin(STAFF, &fields(), &staff_layout());
        assert!(svg.contains(
            r#"transform="matrix(1.3333333,0,0,1.3333333,224,128.17907)" text-anchor="middle""#
        ));
        assert!(svg.contains(">Brussels<"));
        // other text elements keep their offsets
        assert!(svg.contains("matrix(1.3333333,0,0,1.3333333,40,300)"));
    }

    #[test]
    fn location_outside_band_is_not_moved() {
        let layout = BuiltinLayout::for_template(TemplateId::Partner);
        let svg = compose_builtin(STAFF, &fields(), &layout);
        assert!(svg.contains("143.28,128.17907"));
        assert!(!svg.contains("text-anchor"));
    }

    #[test]
    fn badge_type_slot_is_restyled() {
        let mut values = fields();
        values.badge_type = "VIP".into();
        let svg = compose_builtin(STAFF, &values, &staff_layout());
        assert!(svg.contains(
            r#"<tspan style="font-family:Inter;font-weight:700;fill:#000;font-size:22px" x="0" y="0">VIP</tspan>"#
        ));
        assert!(!svg.contains(">Staf<"));
        // the surname shares the styling but sits on another line
        assert!(svg.contains(r#"font-weight:500;font-size:27px" x="0" y="31.049999""#));
    }

    #[test]
    fn field_tokens_are_a_catch_all() {
        let template = r#"<svg><text>{{FIRSTNAME}} {{company}}</text><text>{{nickname}}</text></svg>"#;
        let mut values = fields();
        values.company = "R&D".into();
        let svg = compose_builtin(template, &values, &staff_layout());
        assert!(svg.contains("<text>Ana R&amp;D</text>"));
        assert!(svg.contains("{{nickname}}"));
    }

    #[test]
    fn custom_replaces_all_literal_occurrences() {
        let template = "<svg><text>First Name</text><desc>First Name</desc><text>$x.*</text></svg>";
        let mut map = PlaceholderMap::default();
        map.set(Field::FirstName, "First Name");
        map.set(Field::Company, "$x.*");
        let mut values = fields();
        values.first_name = "<Zoë>".into();
        values.company = "$1".into();
        let svg = compose_custom(template, &map, &values);
        assert_eq!(
            svg,
            "<svg><text>&lt;Zoë&gt;</text><desc>&lt;Zoë&gt;</desc><text>$1</text></svg>"
        );
    }

    #[test]
    fn custom_ignores_disabled_fields() {
        let template = "<svg><text>Title</text></svg>";
        let svg = compose_custom(template, &PlaceholderMap::default(), &fields());
        assert_eq!(svg, template);
    }

    #[test]
    fn custom_values_are_not_substituted_again() {
        let template = "<svg><text>Title</text><text>Company</text></svg>";
        let mut map = PlaceholderMap::default();
        map.set(Field::Title, "Title");
        map.set(Field::Company, "Company");
        let mut values = fields();
        values.title = "Company Secretary".into();
        values.company = "Acme".into();
        assert_eq!(
            compose_custom(template, &map, &values),
            "<svg><text>Company Secretary</text><text>Acme</text></svg>"
        );
    }

    #[test]
    fn custom_prefers_longest_placeholder() {
        let template = "<svg><text>First Name</text><text>Name</text></svg>";
        let mut map = PlaceholderMap::default();
        map.set(Field::LastName, "Name");
        map.set(Field::FirstName, "First Name");
        assert_eq!(
            compose_custom(template, &map, &fields()),
            "<svg><text>Ana</text><text>O&apos;Brien &amp; Co</text></svg>"
        );
    }

    #[test]
    fn builtin_values_are_not_substituted_again() {
        let mut values = fields();
        values.first_name = "{{company}}".into();
        values.title = "Organization".into();
        values.company = "Acme".into();
        let svg = compose_builtin(STAFF, &values, &staff_layout());
        assert!(svg.contains(r#"<tspan x="0" y="0">{{company}}</tspan>"#));
        assert!(svg.contains(r#"<tspan x="0" y="0">Organization</tspan>"#));
        assert_eq!(svg.matches(">Acme<").count(), 1);
    }

    #[test]
    fn export_replaces_root_size() {
        let svg = r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="336" height='528' viewBox="0 0 336 528"><rect width="10" height="10" stroke-width="2"/></svg>"#;
        let out = export_svg(svg, ExportSize::scaled(336.0, 528.0, 3.0));
        assert!(out.starts_with(r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 336 528" width="1008" height="1584">"#));
        assert!(out.contains(r#"<rect width="10" height="10" stroke-width="2"/>"#));
        assert_eq!(out.matches("width=\"1008\"").count(), 1);
    }

    #[test]
    fn export_adds_size_when_missing() {
        let out = export_svg("<svg viewBox=\"0 0 10 20\"/>", ExportSize::scaled(10.0, 20.0, 3.0));
        assert_eq!(out, r#"<svg viewBox="0 0 10 20" width="30" height="60"/>"#);
        assert_eq!(export_svg("not svg", ExportSize::scaled(1.0, 1.0, 1.0)), "not svg");
    }

    #[test]
    fn custom_template_detects_placeholders() {
        let record = TemplateRecord::from_body("upload.svg", "<svg><text>{{firstName}}</text></svg>");
        let template = BadgeTemplate::custom(record);
        assert!(template.is_custom());
        let svg = template.compose(&fields(), DEFAULT_COMPANY_WRAP_WIDTH);
        assert_eq!(svg, "<svg><text>Ana</text></svg>");
        assert_eq!(
            template.export_size(DEFAULT_SCALE_FACTOR),
            ExportSize { width: 1008, height: 1584 }
        );
    }
}
