//! Configuration types for fragment-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the InterSpec
//! help export: `peak_manager_help.xml` from
//! `InterSpec_resources/static_text/`, a 10.5in × 65in page, and the five
//! stylesheets the help window loads.
//!
//! Nothing here reads or changes the process working directory. Relative
//! paths are joined onto [`ConversionConfig::root_dir`] when the conversion
//! runs, and the base directory for stylesheets and images is handed to the
//! engine as an absolute URI.

use crate::error::Help2PdfError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ── Defaults ─────────────────────────────────────────────────────────────

/// Help topic converted when none is named.
pub const DEFAULT_FRAGMENT: &str = "peak_manager_help.xml";

/// Directory, relative to the root, holding the help fragments.
pub const DEFAULT_RESOURCE_DIR: &str = "InterSpec_resources/static_text";

/// `<title>` of the wrapped document.
pub const DEFAULT_TITLE: &str = "InterSpec Help";

/// Page width: one help window wide.
pub const DEFAULT_PAGE_WIDTH: &str = "10.5in";

/// Page height: tall enough that a whole topic lands on a single page.
pub const DEFAULT_PAGE_HEIGHT: &str = "65in";

/// Stylesheets linked into every document, relative to the base directory.
pub const DEFAULT_STYLESHEETS: &[&str] = &[
    "InterSpec_resources/HelpWindow.css",
    "InterSpec_resources/InterSpec.css",
    "build_xcode/resources/style.css",
    "build_xcode/resources/form.css",
    "build_xcode/resources/themes/default/wt.css",
];

// ── Length ───────────────────────────────────────────────────────────────

/// Unit of a [`Length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    In,
    Cm,
    Mm,
    /// CSS pixel, 1/96 in.
    Px,
    /// Point, 1/72 in.
    Pt,
}

impl LengthUnit {
    fn per_inch(self) -> f64 {
        match self {
            LengthUnit::In => 1.0,
            LengthUnit::Cm => 2.54,
            LengthUnit::Mm => 25.4,
            LengthUnit::Px => 96.0,
            LengthUnit::Pt => 72.0,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Px => "px",
            LengthUnit::Pt => "pt",
        }
    }
}

/// A physical page dimension such as `10.5in` or `210mm`.
///
/// A bare number is read as CSS pixels. Serialises as its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    value: f64,
    unit: LengthUnit,
}

static LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([0-9]*\.?[0-9]+)\s*(in|cm|mm|px|pt)?\s*$").expect("valid regex")
});

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn inches(value: f64) -> Self {
        Self::new(value, LengthUnit::In)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// The length in inches, the unit the DevTools print API expects.
    pub fn to_inches(&self) -> f64 {
        self.value / self.unit.per_inch()
    }
}

impl FromStr for Length {
    type Err = Help2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Help2PdfError::InvalidLength {
            value: s.to_string(),
        };
        let caps = LENGTH_RE.captures(s).ok_or_else(invalid)?;
        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid());
        }
        let unit = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
            Some("in") => LengthUnit::In,
            Some("cm") => LengthUnit::Cm,
            Some("mm") => LengthUnit::Mm,
            Some("pt") => LengthUnit::Pt,
            Some("px") | None => LengthUnit::Px,
            Some(_) => return Err(invalid()),
        };
        Ok(Self { value, unit })
    }
}

impl TryFrom<String> for Length {
    type Error = Help2PdfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Length> for String {
    fn from(l: Length) -> Self {
        l.to_string()
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

fn default_length(s: &str) -> Length {
    // Defaults are compile-time constants covered by tests.
    s.parse().unwrap_or(Length::inches(1.0))
}

// ── ConversionConfig ─────────────────────────────────────────────────────

/// Configuration for a fragment-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use help2pdf::{ConversionConfig, Length};
///
/// let config = ConversionConfig::builder()
///     .root_dir("/src/InterSpec")
///     .fragment("energy_calibration_help.xml")
///     .page_height("40in".parse::<Length>().unwrap())
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory every other relative path is resolved against. Default: `.`.
    pub root_dir: PathBuf,

    /// Directory holding the fragments, relative to `root_dir` unless
    /// absolute. Default: [`DEFAULT_RESOURCE_DIR`].
    pub resource_dir: PathBuf,

    /// File name of the fragment to convert. Default: [`DEFAULT_FRAGMENT`].
    pub fragment: String,

    /// Directory stylesheets and images are resolved against. If None,
    /// `root_dir` is used.
    pub base_dir: Option<PathBuf>,

    /// Where the PDF is written. Default: `.`, the directory the process
    /// was started from.
    pub output_dir: PathBuf,

    /// Page width. Default: 10.5in.
    pub page_width: Length,

    /// Page height. Default: 65in.
    pub page_height: Length,

    /// Margin applied on all four sides. Default: none.
    pub margin: Option<Length>,

    /// Document title. Default: [`DEFAULT_TITLE`].
    pub title: String,

    /// Stylesheet hrefs, linked in order. Not checked for existence.
    pub stylesheets: Vec<String>,

    /// Print CSS backgrounds. Default: true.
    pub print_background: bool,

    /// Upper bound on the engine step in seconds. Default: 60.
    pub render_timeout_secs: u64,

    /// Browser executable. If None, located by `chrome-locate`.
    pub chrome_path: Option<PathBuf>,

    /// Run the browser sandboxed. Default: true.
    pub sandbox: bool,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            resource_dir: PathBuf::from(DEFAULT_RESOURCE_DIR),
            fragment: DEFAULT_FRAGMENT.to_string(),
            base_dir: None,
            output_dir: PathBuf::from("."),
            page_width: default_length(DEFAULT_PAGE_WIDTH),
            page_height: default_length(DEFAULT_PAGE_HEIGHT),
            margin: None,
            title: DEFAULT_TITLE.to_string(),
            stylesheets: DEFAULT_STYLESHEETS.iter().map(|s| s.to_string()).collect(),
            print_background: true,
            render_timeout_secs: 60,
            chrome_path: None,
            sandbox: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("root_dir", &self.root_dir)
            .field("resource_dir", &self.resource_dir)
            .field("fragment", &self.fragment)
            .field("base_dir", &self.base_dir)
            .field("output_dir", &self.output_dir)
            .field("page_width", &self.page_width)
            .field("page_height", &self.page_height)
            .field("margin", &self.margin)
            .field("title", &self.title)
            .field("stylesheets", &self.stylesheets)
            .field("print_background", &self.print_background)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("chrome_path", &self.chrome_path)
            .field("sandbox", &self.sandbox)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full path of the fragment file.
    pub fn fragment_path(&self) -> PathBuf {
        self.root_dir.join(&self.resource_dir).join(&self.fragment)
    }

    /// Directory relative resources resolve against (not yet canonical).
    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or(&self.root_dir)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.root_dir = dir.into();
        self
    }

    pub fn resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.resource_dir = dir.into();
        self
    }

    pub fn fragment(mut self, name: impl Into<String>) -> Self {
        self.config.fragment = name.into();
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn page_width(mut self, width: Length) -> Self {
        self.config.page_width = width;
        self
    }

    pub fn page_height(mut self, height: Length) -> Self {
        self.config.page_height = height;
        self
    }

    pub fn margin(mut self, margin: Length) -> Self {
        self.config.margin = Some(margin);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Replace the stylesheet list.
    pub fn stylesheets<I, S>(mut self, hrefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stylesheets = hrefs.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_stylesheet(mut self, href: impl Into<String>) -> Self {
        self.config.stylesheets.push(href.into());
        self
    }

    pub fn print_background(mut self, v: bool) -> Self {
        self.config.print_background = v;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Help2PdfError> {
        let c = &self.config;

        let name = Path::new(&c.fragment);
        if c.fragment.trim().is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(Help2PdfError::InvalidConfig(format!(
                "fragment must be a plain file name, got '{}'",
                c.fragment
            )));
        }
        if c.render_timeout_secs == 0 {
            return Err(Help2PdfError::InvalidConfig(
                "render timeout must be ≥ 1 second".into(),
            ));
        }
        for (what, len) in [("width", c.page_width), ("height", c.page_height)] {
            let printable = len.to_inches() - 2.0 * c.margin.map_or(0.0, |m| m.to_inches());
            if printable.is_nan() || printable <= 0.0 {
                return Err(Help2PdfError::InvalidConfig(format!(
                    "page {what} {len} leaves no printable area"
                )));
            }
        }
        Ok(self.config)
    }
}
