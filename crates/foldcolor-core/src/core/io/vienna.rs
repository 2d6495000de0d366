use std::io::{self, Write};

/// Writes the three-line Vienna form: `>name`, the sequence, then the dot-bracket structure.
pub fn write_vienna<W: Write>(
    writer: &mut W,
    name: &str,
    sequence: &str,
    structure: &str,
) -> io::Result<()> {
    writeln!(writer, ">{}", name)?;
    writeln!(writer, "{}", sequence)?;
    writeln!(writer, "{}", structure)?;
    Ok(())
}
