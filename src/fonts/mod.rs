//! Font discovery for exported answers.
//!
//! `genpdf` needs TrueType data for text metrics, so a family is looked up on
//! disk in this order:
//!
//! 1. a Liberation Sans directory: `LEARNING_ASSISTANT_FONTS_DIR`,
//!    `assets/fonts` beside the executable, `assets/fonts` in this crate, then
//!    the usual system locations
//! 2. the DejaVu Sans family shipped by most Linux distributions
//! 3. the Windows Arial family (`LEARNING_ASSISTANT_WINDOWS_FONTS_DIR` or
//!    `%WINDIR%\Fonts`)

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::warn;

/// Name of the preferred font family; metric-compatible with Arial.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "LiberationSans";

/// Environment variable pointing at a directory with the preferred family.
pub const FONTS_DIR_ENV: &str = "LEARNING_ASSISTANT_FONTS_DIR";

/// Environment variable pointing at a Windows font directory.
pub const WINDOWS_FONTS_DIR_ENV: &str = "LEARNING_ASSISTANT_WINDOWS_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "LiberationSans-Regular.ttf",
    "LiberationSans-Bold.ttf",
    "LiberationSans-Italic.ttf",
    "LiberationSans-BoldItalic.ttf",
];

const SYSTEM_LIBERATION_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation",
];

const DEJAVU_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu-sans-fonts",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
];

/// A font family made of individually named files.
///
/// Over-long words are split assuming no Latin-1 glyph is wider than
/// `MAX_GLYPH_WIDTH_EM` (1.1 em, see the builder); a new fallback family must
/// stay within that bound.
struct FallbackFamily {
    name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

static DEJAVU_FAMILY: FallbackFamily = FallbackFamily {
    name: "DejaVu Sans",
    regular: "DejaVuSans.ttf",
    bold: "DejaVuSans-Bold.ttf",
    italic: "DejaVuSans-Oblique.ttf",
    bold_italic: "DejaVuSans-BoldOblique.ttf",
};

static WINDOWS_FAMILY: FallbackFamily = FallbackFamily {
    name: "Arial",
    regular: "arial.ttf",
    bold: "arialbd.ttf",
    italic: "ariali.ttf",
    bold_italic: "arialbi.ttf",
};

impl FallbackFamily {
    fn files(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }

    fn is_complete_in(&self, directory: &Path) -> bool {
        self.files()
            .iter()
            .all(|file| directory.join(file).is_file())
    }

    fn load_from(&self, directory: &Path) -> Result<FontFamily<FontData>, Error> {
        Ok(FontFamily {
            regular: load_font_file(directory, self.regular, self.name, "regular")?,
            bold: load_font_file(directory, self.bold, self.name, "bold")?,
            italic: load_font_file(directory, self.italic, self.name, "italic")?,
            bold_italic: load_font_file(directory, self.bold_italic, self.name, "bold italic")?,
        })
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

/// Directory holding the bundled font files inside the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.iter().any(|existing| existing == &candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }

    push(bundled_fonts_source_dir());

    for dir in SYSTEM_LIBERATION_DIRS {
        push(PathBuf::from(dir));
    }

    candidates
}

fn missing_font_files(path: &Path) -> Vec<PathBuf> {
    FONT_FILES
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            "directory missing".to_string()
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };

        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(Error::new(
        format!(
            "Unable to locate the {} font family. Checked: {}. Set {} to a directory containing {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV,
            FONT_FILES.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

fn load_preferred_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory()?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn load_font_file(directory: &Path, file: &str, family: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let io_kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!(
                "Failed to load {} {} font at {}: {}",
                family,
                style,
                path.display(),
                err
            ),
            io::Error::new(io_kind, err.to_string()),
        )
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env_path(var) {
            let candidate = root.join("Fonts");
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
    }

    None
}

fn fallback_sources() -> Vec<(&'static FallbackFamily, PathBuf)> {
    let mut sources: Vec<(&'static FallbackFamily, PathBuf)> = DEJAVU_DIRS
        .iter()
        .map(|dir| (&DEJAVU_FAMILY, PathBuf::from(dir)))
        .collect();
    if let Some(directory) = windows_font_directory() {
        sources.push((&WINDOWS_FAMILY, directory));
    }
    sources
}

fn fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let (family, directory) = fallback_sources()
        .into_iter()
        .find(|(family, directory)| family.is_complete_in(directory))
        .ok_or_else(|| {
            Error::new(
                "No DejaVu Sans or Arial fallback family found",
                io::Error::new(io::ErrorKind::NotFound, "fallback fonts not found"),
            )
        })?;

    let loaded = family.load_from(&directory)?;
    warn!(
        "Using fallback '{}' font family from {}",
        family.name,
        directory.display()
    );
    Ok(loaded)
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the Liberation Sans family, falling back to DejaVu Sans or Arial
/// when it is not installed.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match load_preferred_font_family() {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match fallback_font_family() {
            Ok(fallback) => {
                warn!("{} font family unavailable ({})", DEFAULT_FONT_FAMILY_NAME, err);
                Ok(fallback)
            }
            Err(fallback_err) => {
                warn!(
                    "{} font family unavailable ({}); fallback failed: {}",
                    DEFAULT_FONT_FAMILY_NAME, err, fallback_err
                );
                Err(Error::new(
                    format!(
                        "No usable font family found: {}. Set {} to a directory with the {} fonts.",
                        fallback_err, FONTS_DIR_ENV, DEFAULT_FONT_FAMILY_NAME
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether [`default_font_family`] can find a family on this system.
pub fn default_fonts_available() -> bool {
    resolve_font_directory().is_ok()
        || fallback_sources()
            .iter()
            .any(|(family, directory)| family.is_complete_in(directory))
}
