use std::path::Path;

use crate::errors::SieveError;
use crate::utils::{read_lines, write_lines};
use crate::SinkRef;

/// Normalizes a raw URL list into the file-mode target list.
///
/// Lines are trimmed and blank lines dropped; `output` is overwritten.
/// A missing `input` yields `SieveError::InputMissing` and leaves `output`
/// untouched.
pub fn format_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    sink: &SinkRef,
) -> Result<usize, SieveError> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.is_file() {
        return Err(SieveError::InputMissing(input.to_path_buf()));
    }

    let lines = read_lines(input)?;
    write_lines(output, &lines)?;

    sink.on_log(
        "success",
        &format!(
            "[+] File formatted: {} target(s) from {} saved to {}",
            lines.len(),
            input.display(),
            output.display()
        ),
    );
    Ok(lines.len())
}
