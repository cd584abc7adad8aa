use std::io::Write;

use anyhow::Context;
use thiserror::Error;

use crate::cli::Args;
use crate::fixture::{load_fixture, Fixture, FixtureError};
use crate::format::obj::{parse_labels, parse_linking, parse_object, LinkKind, ObjectFile};
use crate::format::FormatError;
use crate::report::render_payload_diff;

pub const EXIT_NOT_AN_OBJECT: i32 = 1;
pub const EXIT_UNSUPPORTED_VERSION: i32 = 2;
pub const EXIT_VALIDATION_FAILED: i32 = 3;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("expecting origin {expected:#06x}; found {actual:#06x}")]
    OriginMismatch { expected: u16, actual: u16 },
    #[error(
        "expected {expected} byte payload; found {actual} byte payload (difference {})",
        signed_difference(.expected, .actual)
    )]
    PayloadLengthMismatch { expected: usize, actual: usize },
    #[error("payload differs at byte {index}: expecting {expected:#04x}; found {actual:#04x}")]
    PayloadByteMismatch { index: usize, expected: u8, actual: u8 },
    #[error("cannot write diagnostics")]
    Io(#[from] std::io::Error),
}

impl CheckError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Format(FormatError::NotAnObjectFile) => EXIT_NOT_AN_OBJECT,
            Self::Format(FormatError::UnsupportedVersion { .. }) => EXIT_UNSUPPORTED_VERSION,
            _ => EXIT_VALIDATION_FAILED,
        }
    }
}

fn signed_difference(expected: &usize, actual: &usize) -> i128 {
    *expected as i128 - *actual as i128
}

/// Maps a failed run to the process exit code.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CheckError>())
        .map_or(EXIT_VALIDATION_FAILED, CheckError::exit_code)
}

/// Message printed for a failed run. Object-format rejections are reported
/// as-is; everything else is a validation failure with its cause chain.
#[must_use]
pub fn failure_message(err: &anyhow::Error) -> String {
    match exit_code(err) {
        EXIT_VALIDATION_FAILED => format!("error while validating: {err:#}"),
        _ => err.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub verbose: bool,
    pub quiet: bool,
}

impl From<&Args> for CheckOptions {
    fn from(args: &Args) -> Self {
        Self {
            verbose: args.verbose,
            quiet: args.quiet,
        }
    }
}

/// Compares a parsed object file against its fixture, stopping at the first
/// failing check. Progress, diffs and advisories are written to `out`.
///
/// # Errors
/// Returns the `CheckError` of the first failing check.
pub fn check<W: Write>(
    fixture: &Fixture,
    object: &ObjectFile,
    options: CheckOptions,
    out: &mut W,
) -> Result<(), CheckError> {
    if options.verbose {
        describe_object(object, out)?;
    }

    if object.header.payload_origin != fixture.origin {
        return Err(CheckError::OriginMismatch {
            expected: fixture.origin,
            actual: object.header.payload_origin,
        });
    }
    if !options.quiet {
        writeln!(out, "origin matches!")?;
    }

    let expected = &fixture.payload;
    let actual = &object.payload;
    if expected.len() != actual.len() {
        return Err(CheckError::PayloadLengthMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    if let Some(index) = expected.iter().zip(actual).position(|(e, a)| e != a) {
        out.write_all(render_payload_diff(expected, actual, index).as_bytes())?;
        return Err(CheckError::PayloadByteMismatch {
            index,
            expected: expected[index],
            actual: actual[index],
        });
    }
    if !options.quiet {
        writeln!(out, "payload matches!")?;
    }

    let has_extensions = !object.labels.is_empty()
        || !object.linking.is_empty()
        || fixture.has_symbols
        || fixture.has_linking;
    if has_extensions {
        writeln!(out, "verifying symbols and linking not yet supported")?;
    }
    Ok(())
}

fn describe_object<W: Write>(object: &ObjectFile, out: &mut W) -> std::io::Result<()> {
    let header = &object.header;
    writeln!(
        out,
        "object: version {}.{} origin {:#06x} payload {} word(s) at {:#010x}",
        header.version_major,
        header.version_minor,
        header.payload_origin,
        header.payload_size,
        header.payload_offset
    )?;
    let Some(tables) = header.tables else {
        return Ok(());
    };
    writeln!(
        out,
        "object: labels {} byte(s) at {:#010x}, linking {} byte(s) at {:#010x}",
        tables.label_size, tables.label_offset, tables.linking_size, tables.linking_offset
    )?;

    match parse_labels(&object.labels) {
        Ok(labels) => {
            for label in labels {
                let name = String::from_utf8_lossy(&label.name);
                writeln!(out, "  label {:#06x} {name}", label.target)?;
            }
        }
        Err(err) => writeln!(out, "  {err}")?,
    }
    match parse_linking(&object.linking) {
        Ok(entries) => {
            for entry in entries {
                let kind = match entry.kind {
                    LinkKind::AbsoluteWord => "abs16".to_string(),
                    LinkKind::OffsetPlusOneImm9 => "pcoffset9".to_string(),
                    LinkKind::Unknown(code) => format!("unknown({code})"),
                };
                let name = String::from_utf8_lossy(&entry.name);
                writeln!(out, "  link {:#06x} {kind} {name}", entry.address)?;
            }
        }
        Err(err) => writeln!(out, "  {err}")?,
    }
    Ok(())
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    run_to(&args, &mut out)
}

/// Runs one fixture-vs-object comparison, writing diagnostics to `out`.
///
/// # Errors
/// Fails when either file cannot be read or any check fails; the chain carries
/// a `CheckError` for `exit_code`.
pub fn run_to<W: Write>(args: &Args, out: &mut W) -> anyhow::Result<()> {
    let fixture_context = || format!("fixture {}", args.fixture.display());
    let document = load_fixture(&args.fixture)
        .map_err(CheckError::from)
        .with_context(fixture_context)?;
    let bytes = std::fs::read(&args.object)
        .with_context(|| format!("cannot read object file {}", args.object.display()))?;
    let object = parse_object(&bytes).map_err(CheckError::from)?;
    // keys are only checked once the object is known to be a supported LC-3 file
    let fixture = document
        .resolve()
        .map_err(CheckError::from)
        .with_context(fixture_context)?;

    check(&fixture, &object, CheckOptions::from(args), out)?;

    if !args.quiet {
        writeln!(out, "success!")?;
    }
    Ok(())
}
