//! Format dispatch: the single entry point the CLI drives.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::TargetFormat;
use crate::output::ConversionReport;
use crate::{excel, ppt, word};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert the PDF at `input` into `format`, writing the result to `output`.
///
/// # Errors
/// - [`ConvertError::InputNotFound`] when `input` is not a file; nothing is
///   attempted and no output is created.
/// - Any error of the selected routine. A failed conversion never leaves a
///   file at `output`.
///
/// An `output` whose extension does not match `format` is accepted with a
/// warning; the file is written where asked.
pub fn convert_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    format: TargetFormat,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.is_file() {
        return Err(ConvertError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    if !format.matches_extension(output) {
        warn!(
            "Output '{}' does not end in .{}; writing {} content anyway",
            output.display(),
            format.extension(),
            format.display_name()
        );
    }

    info!(
        "Converting '{}' to {} ({})",
        input.display(),
        format.display_name(),
        output.display()
    );
    let start = Instant::now();

    let mut report = match format {
        TargetFormat::Word => word::convert(input, output, config)?,
        TargetFormat::Excel => excel::convert(input, output, config)?,
        TargetFormat::Ppt => ppt::convert(input, output, config)?,
    };
    report.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "{} written: {} bytes in {}ms via {:?}",
        format.display_name(),
        report.bytes,
        report.duration_ms,
        report.strategy
    );
    Ok(report)
}
