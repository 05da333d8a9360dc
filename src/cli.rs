use crate::batch::{TemplateSource, badge_filename, generate_archive};
use crate::compose::BadgeTemplate;
use crate::config::{Config, load_config};
use crate::import::load_catalog;
use crate::model::{AttendeeRecord, BadgeFields, Field};
use crate::placeholder;
use crate::registry::{DirTemplateStore, TemplateRecord, TemplateRegistry, resolve_type};
use crate::render::{Rasterizer, raster_request, render_single, write_badge, write_output_svg};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "badgr", version, about = "Conference badge renderer (SVG templates to PNG)")]
pub struct Args {
    /// Config JSON file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding badge-template-{1..4}.svg
    #[arg(long = "templates-dir", global = true)]
    pub templates_dir: Option<PathBuf>,

    /// Export scale factor applied to the template size
    #[arg(long = "scale", global = true)]
    pub scale: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a single badge
    Render(RenderArgs),
    /// Render every attendee of an import file into a ZIP archive
    Batch(BatchArgs),
    /// Search attendees of an import file
    Search(SearchArgs),
    /// Show the placeholders detected in a custom template
    Detect(DetectArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    #[arg(long = "first-name", default_value = "")]
    pub first_name: String,

    #[arg(long = "last-name", default_value = "")]
    pub last_name: String,

    #[arg(long = "title", default_value = "")]
    pub title: String,

    #[arg(long = "company", default_value = "")]
    pub company: String,

    /// Defaults to the configured location
    #[arg(long = "location")]
    pub location: Option<String>,

    /// Attendee type code (1-4, staff, attendee, speaker, partner, vip)
    #[arg(long = "type", default_value = "")]
    pub attendee_type: String,

    /// Import file (.csv, .json, .xlsx) to pick the attendee from
    #[arg(short = 'i', long = "input", requires = "query")]
    pub input: Option<PathBuf>,

    /// Search query; the first match is rendered
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// Custom SVG template instead of the built-in one for the type
    #[arg(short = 't', long = "template")]
    pub template: Option<PathBuf>,

    /// Placeholder override for a custom template, e.g. firstName=NAME
    #[arg(short = 'p', long = "placeholder", value_parser = parse_placeholder)]
    pub placeholders: Vec<(Field, String)>,

    #[arg(short = 'e', long = "format", value_enum, default_value = "png")]
    pub format: OutputFormat,

    /// Output file. Defaults to badge-<first>-<last>.png (SVG goes to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct BatchArgs {
    /// Import file (.csv, .json, .xlsx)
    pub input: PathBuf,

    /// Archive path. Defaults to badges-YYYY-MM-DD.zip
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Custom SVG template used for every attendee
    #[arg(short = 't', long = "template")]
    pub template: Option<PathBuf>,

    #[arg(short = 'p', long = "placeholder", value_parser = parse_placeholder)]
    pub placeholders: Vec<(Field, String)>,

    #[arg(long = "location")]
    pub location: Option<String>,

    /// Pause between badges in milliseconds
    #[arg(long = "delay-ms")]
    pub delay_ms: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    pub input: PathBuf,

    #[arg(default_value = "")]
    pub query: String,
}

#[derive(ClapArgs, Debug)]
pub struct DetectArgs {
    pub template: PathBuf,

    #[arg(short = 'p', long = "placeholder", value_parser = parse_placeholder)]
    pub placeholders: Vec<(Field, String)>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.templates_dir {
        config.templates_dir = dir;
    }
    if let Some(scale) = args.scale {
        if scale <= 0.0 || !scale.is_finite() {
            anyhow::bail!("--scale must be a positive number");
        }
        config.scale_factor = scale;
    }

    match args.command {
        Command::Render(render) => run_render(&config, render),
        Command::Batch(batch) => run_batch(&config, batch),
        Command::Search(search) => run_search(&search),
        Command::Detect(detect) => run_detect(&detect),
    }
}

fn run_render(config: &Config, args: RenderArgs) -> Result<()> {
    let record = match (&args.input, &args.query) {
        (Some(input), Some(query)) => {
            let catalog = load_catalog(input)?;
            catalog
                .search(query)
                .first()
                .map(|record| (*record).clone())
                .ok_or_else(|| anyhow::anyhow!("No attendee matches '{query}'"))?
        }
        _ => AttendeeRecord {
            first_name: args.first_name.clone(),
            last_name: args.last_name.clone(),
            title: args.title.clone(),
            company: args.company.clone(),
            attendee_type: args.attendee_type.clone(),
            ..Default::default()
        },
    };

    let resolution = resolve_type(&record.attendee_type);
    let location = args.location.as_deref().unwrap_or(&config.default_location);
    let fields = BadgeFields::for_attendee(&record, &resolution, location);

    let template = match &args.template {
        Some(path) => custom_template(path, &args.placeholders)?,
        None => {
            if !args.placeholders.is_empty() {
                warn!("--placeholder only applies to custom templates; ignoring");
            }
            let mut registry = TemplateRegistry::new(DirTemplateStore::new(&config.templates_dir));
            let record = registry.load(resolution.template)?;
            BadgeTemplate::BuiltIn {
                id: resolution.template,
                record,
            }
        }
    };

    match args.format {
        OutputFormat::Svg => {
            let (_, request) =
                raster_request(&template, &fields, config.company_wrap_width, config.scale_factor);
            write_output_svg(&request.svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let rasterizer = rasterizer(config);
            let badge = render_single(
                &template,
                &fields,
                &*rasterizer,
                config.company_wrap_width,
                config.scale_factor,
            );
            let output = args.output.unwrap_or_else(|| {
                PathBuf::from(badge_filename(&fields.first_name, &fields.last_name))
            });
            let written = write_badge(&badge, &output)?;
            println!("wrote {}", written.display());
        }
    }
    Ok(())
}

fn run_batch(config: &Config, args: BatchArgs) -> Result<()> {
    let catalog = load_catalog(&args.input)?;
    let mut settings = config.batch_settings();
    if let Some(location) = args.location {
        settings.location = location;
    }
    if let Some(delay) = args.delay_ms {
        settings.delay = Duration::from_millis(delay);
    }

    let output = args.output.unwrap_or_else(default_archive_name);
    let file = std::fs::File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let rasterizer = rasterizer(config);

    let progress = |done: usize, total: usize| {
        eprint!("\rGenerating badge {done} of {total}...");
        let _ = std::io::stderr().flush();
    };
    let custom;
    let mut registry;
    let source = match &args.template {
        Some(path) => {
            custom = custom_template(path, &args.placeholders)?;
            TemplateSource::Custom(&custom)
        }
        None => {
            registry = TemplateRegistry::new(DirTemplateStore::new(&config.templates_dir));
            TemplateSource::BuiltIn(&mut registry)
        }
    };
    let (_, report) = generate_archive(
        catalog.records(),
        source,
        &*rasterizer,
        &settings,
        file,
        progress,
    )?;
    eprintln!();

    println!(
        "Generated {} of {} badges into {}",
        report.succeeded(),
        report.total,
        output.display()
    );
    for name in &report.skipped {
        println!("  skipped: {name}");
    }
    Ok(())
}

fn run_search(args: &SearchArgs) -> Result<()> {
    let catalog = load_catalog(&args.input)?;
    if args.query.trim().is_empty() && !catalog.shows_all_on_focus() {
        println!("{} attendees loaded; type a query to search", catalog.len());
        return Ok(());
    }
    let matches = catalog.search(&args.query);
    if matches.is_empty() {
        println!("No attendees found");
    }
    for record in matches {
        println!("{}", search_line(record));
    }
    Ok(())
}

// Name, then title/company, then the type label. The label stands in for empty details.
fn search_line(record: &AttendeeRecord) -> String {
    let label = resolve_type(&record.attendee_type).label;
    let details = record.details();
    let details = if details.is_empty() {
        label.to_string()
    } else {
        details
    };
    format!("{}\t{}\t[{}]", record.full_name().trim(), details, label)
}

fn run_detect(args: &DetectArgs) -> Result<()> {
    let template = custom_template(&args.template, &args.placeholders)?;
    if let BadgeTemplate::Custom {
        record,
        placeholders,
    } = &template
    {
        println!("{}", serde_json::to_string_pretty(placeholders)?);
        println!("{}", placeholder::validate(placeholders, &record.body));
    }
    Ok(())
}

fn custom_template(path: &Path, overrides: &[(Field, String)]) -> Result<BadgeTemplate> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut template = BadgeTemplate::custom(TemplateRecord::from_body(id, body));
    if let BadgeTemplate::Custom {
        record,
        placeholders,
    } = &mut template
    {
        for (field, text) in overrides {
            placeholders.set(*field, text.clone());
        }
        info!("{}", placeholder::validate(placeholders, &record.body));
    }
    Ok(template)
}

fn parse_placeholder(value: &str) -> Result<(Field, String), String> {
    let (field, text) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=TEXT, got '{value}'"))?;
    Ok((field.parse::<Field>()?, text.to_string()))
}

fn default_archive_name() -> PathBuf {
    PathBuf::from(format!(
        "badges-{}.zip",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

#[cfg(feature = "png")]
fn rasterizer(config: &Config) -> Box<dyn Rasterizer> {
    Box::new(crate::render::ResvgRasterizer::new(
        config.render.font_family.clone(),
    ))
}

#[cfg(not(feature = "png"))]
fn rasterizer(_config: &Config) -> Box<dyn Rasterizer> {
    struct SvgOnly;

    impl Rasterizer for SvgOnly {
        fn rasterize(
            &self,
            _request: &crate::render::RasterRequest,
        ) -> Result<Vec<u8>, crate::error::RasterizationError> {
            Err(crate::error::RasterizationError::Unavailable(
                "built without the `png` feature".into(),
            ))
        }
    }

    Box::new(SvgOnly)
}
